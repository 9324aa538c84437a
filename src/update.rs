//! Update engine (C5): the numerical core. Consumes one report, validates
//! it in full before touching any state, then applies the run's variant
//! to every axis and advances the run's counters.
//!
//! Every per-axis formula here is a closed form over `N` identical
//! micro-steps (§9): no explicit per-micro-step loop. Floating-point
//! rounding would make a loop and the closed form disagree, and the
//! closed form is the contract, not an optimization of the loop.

use crate::codec;
use crate::error::UpdateError;
use crate::param::Param;
use crate::run::RunState;
use crate::schedule;
use crate::variant::Variant;
use crate::wire::ReportRequest;

/// Result of a single accepted report: the per-axis value history should
/// sample (`x_new` under a nonzero Polyak blend, `theta_new` otherwise).
pub struct Outcome {
    pub exported: Vec<f64>,
}

/// Applies one report to `state` in place (C5). `state` must already be
/// held under the run's write lock by the caller ([`crate::run::Run::report`]).
///
/// Rejects without mutating `state` at all on [`UpdateError::SignatureMismatch`],
/// [`UpdateError::EmptyReport`], or [`UpdateError::MalformedFlips`].
pub fn apply_report(state: &mut RunState, report: &ReportRequest) -> Result<Outcome, UpdateError> {
    if report.signature != state.signature {
        return Err(UpdateError::SignatureMismatch {
            got: report.signature,
            want: state.signature,
        });
    }
    let n = report.num_games as i64 / 2;
    if n <= 0 {
        return Err(UpdateError::EmptyReport {
            num_games: report.num_games,
        });
    }
    let flips = codec::unpack(&report.packed_flips, state.params.len())?;

    let n = n as u64;
    let iter_local = report.k0 + 1;
    let result = report.wins - report.losses;
    let iter_before = state.iter;
    let iter_after = iter_before + n;
    let w_prev = state.sf_weight_sum;

    let mut exported = Vec::with_capacity(state.params.len());
    for (param, &flip) in state.params.iter_mut().zip(flips.iter()) {
        let c_i = schedule::c_at(param.c, state.gamma, iter_local as f64);
        let flip = flip as f64;
        let value = match (state.variant, param.z, param.v) {
            (Variant::ScheduleFreeSgd, Some(_), _) => sf_sgd_update(
                param,
                state.sf_lr,
                state.sf_beta1,
                w_prev,
                n,
                c_i,
                result,
                flip,
            ),
            (Variant::ScheduleFreeAdam, Some(_), Some(_)) => sf_adam_update(
                param,
                state.sf_lr,
                state.sf_beta1,
                state.sf_beta2,
                state.sf_eps,
                w_prev,
                iter_before,
                n,
                c_i,
                result,
                flip,
            ),
            // classic variant, a schedule-free run's legacy parameter that
            // never carried a `z`, or an sf-adam parameter missing its `v`
            // (a combination `Param::fresh` never produces, but a
            // hand-edited persisted state could if it slipped past
            // `Run::new_from_persisted`'s validation) — all fall back to
            // §4.5.1 rather than panic.
            _ => classic_update(param, state.a_const, state.alpha, iter_local, c_i, result, flip),
        };
        exported.push(value);
    }

    state.iter = iter_after;
    if state.variant.is_schedule_free() {
        state.sf_weight_sum = w_prev + state.sf_lr * n as f64;
    }

    Ok(Outcome { exported })
}

/// §4.5.1: classic SPSA.
fn classic_update(
    param: &mut Param,
    a_const: f64,
    alpha: f64,
    iter_local: u64,
    c_i: f64,
    result: i64,
    flip: f64,
) -> f64 {
    let a_i = schedule::a_at(param.a, alpha, a_const, iter_local as f64);
    let step = (a_i / c_i) * result as f64 * flip;
    param.theta = param.clamp(param.theta + step);
    param.theta
}

/// §4.5.2: schedule-free SGD.
fn sf_sgd_update(
    param: &mut Param,
    sf_lr: f64,
    sf_beta1: f64,
    w_prev: f64,
    n: u64,
    c_i: f64,
    result: i64,
    flip: f64,
) -> f64 {
    let z_prev = param.z.expect("schedule-free SGD update requires z");
    let delta = sf_lr * c_i * result as f64 * flip;
    let z_new = z_prev + delta;

    let exported = if sf_beta1 > 0.0 {
        let x_prev = param.clamp((param.theta - (1.0 - sf_beta1) * z_prev) / sf_beta1);
        let weight = sf_lr;
        let report_weight = weight * n as f64;
        let w_curr = w_prev + report_weight;
        let tri = (n as f64 + 1.0) / 2.0;
        let x_new =
            param.clamp((w_prev * x_prev + report_weight * z_prev + weight * delta * tri) / w_curr);
        let theta_new = param.clamp((1.0 - sf_beta1) * z_new + sf_beta1 * x_new);
        param.theta = theta_new;
        x_new
    } else {
        let theta_new = param.clamp(z_new);
        param.theta = theta_new;
        theta_new
    };

    param.z = Some(z_new);
    exported
}

/// §4.5.3: schedule-free AdamW, with the closed-form `v` EMA and the
/// micro-batch damping factor `k(N, beta2)`.
#[allow(clippy::too_many_arguments)]
fn sf_adam_update(
    param: &mut Param,
    sf_lr: f64,
    sf_beta1: f64,
    sf_beta2: f64,
    sf_eps: f64,
    w_prev: f64,
    iter_before: u64,
    n: u64,
    c_i: f64,
    result: i64,
    flip: f64,
) -> f64 {
    let z_prev = param.z.expect("schedule-free Adam update requires z");
    let v_prev = param.v.expect("schedule-free Adam update requires v");

    let g_mean = result as f64 / n as f64;
    let micro_steps = iter_before + n;
    let beta2_n = schedule::stable_pow(sf_beta2, n as f64);
    let v_new = beta2_n * v_prev + (1.0 - beta2_n) * g_mean * g_mean;
    let bias_corr = 1.0 - schedule::stable_pow(sf_beta2, micro_steps as f64);
    let v_hat = v_new / bias_corr;
    let denom = v_hat.sqrt() + sf_eps;

    let damping = micro_batch_damping(n, sf_beta2);
    let step_phi = (sf_lr * result as f64 * flip / denom) * damping;
    let z_new = z_prev + step_phi * c_i;

    let exported = if sf_beta1 > 0.0 {
        let x_prev = param.clamp((param.theta - (1.0 - sf_beta1) * z_prev) / sf_beta1);
        let report_weight = sf_lr * n as f64;
        let w_curr = w_prev + report_weight;
        let a_k = report_weight / w_curr;
        let x_new = param.clamp((1.0 - a_k) * x_prev + a_k * z_new);
        let theta_new = param.clamp((1.0 - sf_beta1) * z_new + sf_beta1 * x_new);
        param.theta = theta_new;
        x_new
    } else {
        let theta_new = param.clamp(z_new);
        param.theta = theta_new;
        theta_new
    };

    param.z = Some(z_new);
    param.v = Some(v_new);
    exported
}

/// `k(N, beta2)` from §4.5.3: exact form away from `beta2 -> 1`, stable
/// series expansion near it, `1` for single-pair reports.
fn micro_batch_damping(n: u64, sf_beta2: f64) -> f64 {
    if n <= 1 || !(sf_beta2 > 0.0 && sf_beta2 < 1.0) {
        return 1.0;
    }
    let n = n as f64;
    let sqrt_beta2 = sf_beta2.sqrt();
    let denom = 1.0 - sqrt_beta2;
    let k = if denom < 1e-6 {
        1.0 - ((n - 1.0) / 4.0) * (1.0 - sf_beta2)
    } else {
        let numer = 1.0 - schedule::stable_pow(sf_beta2, n / 2.0);
        numer / (n * denom)
    };
    k.clamp(0.0, 1.0)
}
