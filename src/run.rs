//! One tuning run: ties the parameter store (C3), dispatch engine (C4),
//! update engine (C5), and history sampler (C6) together behind the
//! concurrency guard (C7).
//!
//! [`Run`] holds its mutable state behind a single [`tokio::sync::RwLock`]:
//! many concurrent [`Run::dispatch`] calls take the read side, while
//! [`Run::report`] takes the write side and serializes against every other
//! writer and reader for the duration of one update.

use rand::RngCore;
use rand::rng;
use tokio::sync::RwLock;

use crate::codec;
use crate::error::RunError;
use crate::error::UpdateError;
use crate::history;
use crate::history::HistoryRecord;
use crate::param::Param;
use crate::param::ParamSpec;
use crate::schedule;
use crate::task::Dispatch;
use crate::task::Task;
use crate::update;
use crate::variant::Variant;
use crate::wire::PersistedParam;
use crate::wire::PersistedState;
use crate::wire::ReportRequest;

/// User-supplied run-wide configuration (`S`'s scalar fields, minus the
/// per-parameter list and the counters this crate owns).
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    pub num_iter: u64,
    pub a_const: f64,
    pub alpha: f64,
    pub gamma: f64,
    pub variant: Variant,
    pub sf_lr: f64,
    pub sf_beta1: f64,
    pub sf_beta2: f64,
    pub sf_eps: f64,
}

/// Live state `S` (§3), everything the update engine (C5) reads and
/// writes under the write lock.
pub struct RunState {
    pub params: Vec<Param>,
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
    pub history: Vec<HistoryRecord>,
}

/// A snapshot of [`RunState`] taken under the read lock, safe to hold
/// after the lock is released.
#[derive(Clone)]
pub struct Snapshot {
    pub params: Vec<Param>,
    pub iter: u64,
    pub signature: u64,
    pub sf_weight_sum: f64,
    pub history: Vec<HistoryRecord>,
}

/// One tuning run (C7): state behind a single reader/writer lock.
pub struct Run {
    state: RwLock<RunState>,
}

/// FNV-1a 64-bit hash, binding a task record's signature to the *identity*
/// of the parameter list a run was created with — `(name, min, max, c_end,
/// r_end)` per parameter, in list order — so a report computed against a
/// stale or foreign parameter list is rejected rather than silently
/// misapplied.
fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

fn signature_of(specs: &[ParamSpec]) -> u64 {
    let mut text = String::new();
    for spec in specs {
        text.push_str(&spec.name);
        text.push('\n');
        text.push_str(&spec.min.to_bits().to_string());
        text.push('\n');
        text.push_str(&spec.max.to_bits().to_string());
        text.push('\n');
        text.push_str(&spec.c_end.to_bits().to_string());
        text.push('\n');
        text.push_str(&spec.r_end.to_bits().to_string());
        text.push('\n');
    }
    fnv1a64(text.as_bytes())
}

/// Checks every parameter's `min <= max` (§7: `BoundsViolation`). Shared by
/// [`Run::new`] and [`Run::new_from_persisted`] — "at load time" in §7
/// covers both a freshly-constructed run and one rebuilt from disk.
fn validate_bounds(specs: &[ParamSpec]) -> Result<(), RunError> {
    for (index, spec) in specs.iter().enumerate() {
        if spec.min > spec.max {
            return Err(RunError::BoundsViolation {
                index,
                name: spec.name.clone(),
                min: spec.min,
                max: spec.max,
            });
        }
    }
    Ok(())
}

/// Checks the run-wide schedule coefficients (§3: `alpha, gamma in (0,1]`,
/// `sf_beta2 in [0,1)`, `A >= 0`). Shared by [`Run::new`] and
/// [`Run::new_from_persisted`] for the same reason as [`validate_bounds`].
fn validate_schedule(
    alpha: f64,
    gamma: f64,
    sf_beta2: f64,
    a_const: f64,
    variant: Variant,
) -> Result<(), RunError> {
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(RunError::BadSchedule {
            what: format!("alpha must be in (0, 1], got {alpha}"),
        });
    }
    if !(gamma > 0.0 && gamma <= 1.0) {
        return Err(RunError::BadSchedule {
            what: format!("gamma must be in (0, 1], got {gamma}"),
        });
    }
    if variant.is_schedule_free() && !(sf_beta2 >= 0.0 && sf_beta2 < 1.0) {
        return Err(RunError::BadSchedule {
            what: format!("sf_beta2 must be in [0, 1), got {sf_beta2}"),
        });
    }
    if a_const < 0.0 {
        return Err(RunError::BadSchedule {
            what: format!("a_const must be >= 0, got {a_const}"),
        });
    }
    Ok(())
}

/// Checks that every parameter's `(z, v)` pair is one `Param::fresh` could
/// actually have produced for `variant` (§3's legacy contract): a classic
/// run never carries `z`/`v`; an sf-sgd run's parameter either has `z` (and
/// no `v`) or neither (legacy fallback); an sf-adam run's parameter either
/// has both `z` and `v`, or neither. `z: Some, v: None` under sf-adam is
/// the one combination [`crate::update::apply_report`] cannot execute
/// safely, and only a hand-edited or corrupted persisted state can produce
/// it — [`Run::new`] never does, via [`Param::fresh`].
fn validate_param_states(variant: Variant, params: &[Param]) -> Result<(), RunError> {
    for (index, param) in params.iter().enumerate() {
        let (has_z, has_v) = (param.z.is_some(), param.v.is_some());
        let ok = match variant {
            Variant::Classic => !has_z && !has_v,
            Variant::ScheduleFreeSgd => !has_v,
            Variant::ScheduleFreeAdam => has_z == has_v,
        };
        if !ok {
            return Err(RunError::InconsistentParamState {
                index,
                name: param.spec.name.clone(),
                has_z,
                has_v,
                variant,
            });
        }
    }
    Ok(())
}

impl Run {
    /// Builds a new run from its configuration and a `(spec, initial)` pair
    /// per parameter. Validates every parameter's bounds and every schedule
    /// coefficient up front — no partially constructed run is ever
    /// returned.
    pub fn new(config: RunConfig, params: Vec<(ParamSpec, f64)>) -> Result<Self, RunError> {
        let specs: Vec<ParamSpec> = params.iter().map(|(spec, _)| spec.clone()).collect();
        validate_bounds(&specs)?;
        validate_schedule(
            config.alpha,
            config.gamma,
            config.sf_beta2,
            config.a_const,
            config.variant,
        )?;

        let signature = signature_of(&specs);

        let built: Vec<Param> = params
            .into_iter()
            .map(|(spec, initial)| {
                Param::fresh(
                    spec,
                    initial,
                    config.variant,
                    config.gamma,
                    config.alpha,
                    config.a_const,
                    config.num_iter,
                )
            })
            .collect();
        validate_param_states(config.variant, &built)?;

        Ok(Self {
            state: RwLock::new(RunState {
                params: built,
                iter: 0,
                num_iter: config.num_iter,
                a_const: config.a_const,
                alpha: config.alpha,
                gamma: config.gamma,
                variant: config.variant,
                sf_lr: config.sf_lr,
                sf_beta1: config.sf_beta1,
                sf_beta2: config.sf_beta2,
                sf_eps: config.sf_eps,
                sf_weight_sum: 0.0,
                signature,
                history: Vec::new(),
            }),
        })
    }

    /// Rebuilds a run from a previously persisted state (§6). Re-derives
    /// the signature from the restored parameter list rather than trusting
    /// the one on disk, so a hand-edited or truncated persisted file can't
    /// smuggle in a signature that doesn't match its own parameters — and
    /// runs the exact same bounds/schedule/`z`-`v` validation [`Run::new`]
    /// does, since restoring a persisted run is itself "load time" per §7:
    /// a corrupted or hand-edited file must be refused, not loaded as-is.
    pub fn new_from_persisted(persisted: PersistedState) -> Result<Self, RunError> {
        let specs: Vec<ParamSpec> = persisted
            .params
            .iter()
            .map(|p| ParamSpec {
                name: p.name.clone(),
                min: p.min,
                max: p.max,
                c_end: p.c_end,
                r_end: p.r_end,
            })
            .collect();
        validate_bounds(&specs)?;
        validate_schedule(
            persisted.alpha,
            persisted.gamma,
            persisted.sf_beta2,
            persisted.a_const,
            persisted.variant,
        )?;

        let signature = signature_of(&specs);
        let params: Vec<Param> = persisted.params.into_iter().map(Param::from).collect();
        validate_param_states(persisted.variant, &params)?;

        Ok(Self {
            state: RwLock::new(RunState {
                params,
                iter: persisted.iter,
                num_iter: persisted.num_iter,
                a_const: persisted.a_const,
                alpha: persisted.alpha,
                gamma: persisted.gamma,
                variant: persisted.variant,
                sf_lr: persisted.sf_lr,
                sf_beta1: persisted.sf_beta1,
                sf_beta2: persisted.sf_beta2,
                sf_eps: persisted.sf_eps,
                sf_weight_sum: persisted.sf_weight_sum,
                signature,
                history: persisted.history,
            }),
        })
    }

    /// Current signature, for callers building a [`ReportRequest`] in
    /// tests or out-of-process workers that need it ahead of a dispatch.
    pub async fn signature(&self) -> u64 {
        self.state.read().await.signature
    }

    /// A read-locked copy of the run's live state.
    pub async fn snapshot(&self) -> Snapshot {
        let guard = self.state.read().await;
        Snapshot {
            params: guard.params.clone(),
            iter: guard.iter,
            signature: guard.signature,
            sf_weight_sum: guard.sf_weight_sum,
            history: guard.history.clone(),
        }
    }

    /// Serializes the run to its persisted form (§6).
    pub async fn to_persisted(&self) -> PersistedState {
        let guard = self.state.read().await;
        PersistedState {
            iter: guard.iter,
            num_iter: guard.num_iter,
            a_const: guard.a_const,
            alpha: guard.alpha,
            gamma: guard.gamma,
            variant: guard.variant,
            sf_lr: guard.sf_lr,
            sf_beta1: guard.sf_beta1,
            sf_beta2: guard.sf_beta2,
            sf_eps: guard.sf_eps,
            sf_weight_sum: guard.sf_weight_sum,
            signature: guard.signature,
            params: guard.params.iter().map(PersistedParam::from).collect(),
            history: guard.history.clone(),
        }
    }

    /// Dispatch engine (C4): draws a fresh Rademacher flip vector, derives
    /// the two probe parameter vectors `theta +/- c*flip`, and hands back a
    /// task record the caller must keep until the matching report arrives.
    ///
    /// Takes the read lock only — many dispatches run concurrently with
    /// each other and are blocked only by an in-flight [`Run::report`].
    pub async fn dispatch(&self, num_games: u32) -> Dispatch {
        let guard = self.state.read().await;
        let d = guard.params.len();
        let mut rng = rng();
        let flips: Vec<i8> = (0..d)
            .map(|_| if rng.next_u32() & 1 == 0 { 1 } else { -1 })
            .collect();

        let mut theta_white = Vec::with_capacity(d);
        let mut theta_black = Vec::with_capacity(d);
        for (param, &flip) in guard.params.iter().zip(flips.iter()) {
            let iter_local = guard.iter + 1;
            let c_i = schedule::c_at(param.c, guard.gamma, iter_local as f64);
            let perturb = c_i * flip as f64;
            theta_white.push(param.clamp(param.theta + perturb));
            theta_black.push(param.clamp(param.theta - perturb));
        }

        let k0 = guard.iter;
        log::debug!("dispatching task at k0={k0} for {num_games} games");

        Dispatch {
            theta_white,
            theta_black,
            task: Task {
                k0,
                packed_flips: codec::pack(&flips),
                signature: guard.signature,
                num_games,
            },
        }
    }

    /// Update engine entry point (C5): validates and applies one report,
    /// then samples history (C6) at the run's cadence. Takes the write
    /// lock, serializing against every other reader and writer.
    pub async fn report(&self, report: &ReportRequest) -> Result<(), UpdateError> {
        let mut guard = self.state.write().await;
        let iter_before = guard.iter;
        let variant = guard.variant;
        let outcome = match update::apply_report(&mut guard, report) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::warn!("rejected report at k0={}: {err}", report.k0);
                return Err(err);
            }
        };

        let d = guard.params.len();
        let period = history::period_for(guard.num_iter * 2, d);
        if history::should_record(guard.history.len(), guard.iter, period) {
            // classic-form schedules evaluated at the post-update iter, not the
            // fixed base c/a every parameter carries.
            let k = guard.iter as f64;
            let gamma = guard.gamma;
            let alpha = guard.alpha;
            let a_const = guard.a_const;
            let mut r = Vec::with_capacity(d);
            let mut c = Vec::with_capacity(d);
            for p in guard.params.iter() {
                let c_i = schedule::c_at(p.c, gamma, k);
                let a_i = schedule::a_at(p.a, alpha, a_const, k);
                r.push(schedule::r_at(a_i, c_i));
                c.push(c_i);
            }
            guard.history.push(HistoryRecord {
                iter: guard.iter,
                theta: outcome.exported,
                r,
                c,
            });
            log::debug!("recorded history sample at iter={}", guard.iter);
        }

        log::info!(
            "accepted report: iter {iter_before} -> {} ({:?})",
            guard.iter,
            variant
        );
        Ok(())
    }
}
