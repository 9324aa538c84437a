//! The three optimizer variants, modeled as a tagged sum per the source's
//! design note (§9): a run is permanently one of these, chosen at
//! creation, and the update engine (C5) dispatches on it once per report
//! rather than threading a dynamic trait object through the hot path.
//!
//! The hyperparameters a variant needs (`A`/`alpha` for classic,
//! `sf_lr`/`sf_beta1`/`sf_beta2`/`sf_eps` for the schedule-free pair) live
//! flat on [`crate::run::RunState`] rather than nested inside each variant,
//! because the legacy fallback (§4.5.4: a schedule-free parameter missing
//! `z` uses the classic update) needs `A`/`alpha` to be available no
//! matter which variant the run is tagged with.

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    Classic,
    ScheduleFreeSgd,
    ScheduleFreeAdam,
}

impl Variant {
    pub fn is_schedule_free(&self) -> bool {
        !matches!(self, Variant::Classic)
    }
}
