//! External interfaces (§6): the dispatch response and report request
//! exchanged with workers, and the persisted state shape. These are pure
//! data — the surrounding web stack (HTTP router, session/auth) that
//! actually ships them over the wire is out of scope (§1).

use crate::history::HistoryRecord;
use crate::param::Param;
use crate::task::Dispatch;
use crate::variant::Variant;
use serde::Deserialize;
use serde::Serialize;

/// Server -> worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub theta_white: Vec<f64>,
    pub theta_black: Vec<f64>,
    pub k0: u64,
    pub packed_flips: Vec<u8>,
    pub signature: u64,
    pub num_games: u32,
}

impl From<Dispatch> for DispatchResponse {
    fn from(dispatch: Dispatch) -> Self {
        Self {
            theta_white: dispatch.theta_white,
            theta_black: dispatch.theta_black,
            k0: dispatch.task.k0,
            packed_flips: dispatch.task.packed_flips,
            signature: dispatch.task.signature,
            num_games: dispatch.task.num_games,
        }
    }
}

/// Worker -> server. `num_games` must equal the value the corresponding
/// [`DispatchResponse`] carried, and `wins + losses + draws` must equal
/// `num_games`; both are caller-side invariants (the task record that
/// pins down "corresponding" is not retained by this crate — see
/// [`crate::task`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub k0: u64,
    pub packed_flips: Vec<u8>,
    pub signature: u64,
    pub wins: i64,
    pub losses: i64,
    pub draws: i64,
    pub num_games: u32,
}

/// One persisted parameter record, the on-disk twin of [`Param`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedParam {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub c_end: f64,
    pub r_end: f64,
    pub c: f64,
    pub a: f64,
    pub theta: f64,
    pub z: Option<f64>,
    pub v: Option<f64>,
}

impl From<&Param> for PersistedParam {
    fn from(p: &Param) -> Self {
        Self {
            name: p.spec.name.clone(),
            min: p.spec.min,
            max: p.spec.max,
            c_end: p.spec.c_end,
            r_end: p.spec.r_end,
            c: p.c,
            a: p.a,
            theta: p.theta,
            z: p.z,
            v: p.v,
        }
    }
}

impl From<PersistedParam> for Param {
    fn from(p: PersistedParam) -> Self {
        Param {
            spec: crate::param::ParamSpec {
                name: p.name,
                min: p.min,
                max: p.max,
                c_end: p.c_end,
                r_end: p.r_end,
            },
            c: p.c,
            a: p.a,
            theta: p.theta,
            z: p.z,
            v: p.v,
        }
    }
}

/// The full persisted state object for one run (§6: "an object per run
/// containing the fields of S ... plus a list of parameter records").
/// Every field of `S` is flattened here regardless of variant, so that a
/// persisted object round-trips through [`crate::run::Run::new_from_persisted`]
/// without loss, including inapplicable fields for the run's variant
/// (e.g. `sf_beta2`/`sf_eps` on a classic run, left at their construction
/// defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    pub iter: u64,
    pub num_iter: u64,
    pub a_const: f64,
    pub alpha: f64,
    pub gamma: f64,
    pub variant: Variant,
    pub sf_lr: f64,
    pub sf_beta1: f64,
    pub sf_beta2: f64,
    pub sf_eps: f64,
    pub sf_weight_sum: f64,
    pub signature: u64,
    pub params: Vec<PersistedParam>,
    pub history: Vec<HistoryRecord>,
}
