//! Parameter store (C3): typed per-parameter records with bounds, and the
//! clamp helper every update variant commits through.

use crate::schedule;
use crate::variant::Variant;
use serde::Deserialize;
use serde::Serialize;

/// User-supplied description of one tuned parameter, fixed for the
/// lifetime of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub c_end: f64,
    pub r_end: f64,
}

/// Live per-parameter state (`P[i]` in the data model).
///
/// `z` and `v` are `None` for a classic run, and `None` on an individual
/// parameter within a schedule-free run marks a legacy record: the update
/// engine falls back to the classic update for that parameter alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub spec: ParamSpec,
    /// base `c = c_end * num_iter^gamma`, fixed at run creation.
    pub c: f64,
    /// base `a = r_end * c_end^2 * (A + num_iter)^alpha`, fixed at run
    /// creation and still meaningful under schedule-free variants: it is
    /// what history telemetry reports as `R`, and what a legacy parameter
    /// without `z` falls back to.
    pub a: f64,
    pub theta: f64,
    pub z: Option<f64>,
    pub v: Option<f64>,
}

impl Param {
    /// `clamp_i(x) = min(max(x, min), max)`.
    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.spec.min, self.spec.max)
    }

    /// Builds a fresh parameter record at run creation, deriving `z`/`v`
    /// from the run's variant. `initial` is the starting value supplied by
    /// the embedder (run creation is out of scope for this crate; see
    /// SPEC_FULL.md §9 decisions).
    ///
    /// Callers must validate `spec.min <= spec.max` themselves (see
    /// [`crate::run::Run::new`]) before calling this — it has no failure
    /// mode of its own.
    pub fn fresh(
        spec: ParamSpec,
        initial: f64,
        variant: Variant,
        gamma: f64,
        alpha: f64,
        a_const: f64,
        num_iter: u64,
    ) -> Self {
        let c = schedule::base_c(spec.c_end, gamma, num_iter);
        let a = schedule::base_a(spec.r_end, spec.c_end, alpha, a_const, num_iter);
        let theta = initial.clamp(spec.min, spec.max);
        let (z, v) = match variant {
            Variant::Classic => (None, None),
            Variant::ScheduleFreeSgd => (Some(initial), None),
            Variant::ScheduleFreeAdam => (Some(initial), Some(0.0)),
        };
        Self {
            spec,
            c,
            a,
            theta,
            z,
            v,
        }
    }
}
