use thiserror::Error;

use crate::variant::Variant;

/// Errors surfaced to the caller of the update engine (C5).
///
/// Every variant here leaves the run's state untouched — the engine
/// validates a report in full before committing any part of it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UpdateError {
    #[error("report signature {got} does not match run signature {want}")]
    SignatureMismatch { got: u64, want: u64 },

    #[error("report carries num_games={num_games}, which yields N <= 0 pairs")]
    EmptyReport { num_games: u32 },

    #[error("packed flip payload does not decode to {expected} axes (got {got} bytes)")]
    MalformedFlips { expected: usize, got: usize },
}

/// Errors raised when a run is constructed with an invalid parameter list.
/// Unlike [`UpdateError`], these abort run creation entirely — there is no
/// live state to leave unchanged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RunError {
    #[error("parameter {index} ({name:?}) has min={min} > max={max}")]
    BoundsViolation {
        index: usize,
        name: String,
        min: f64,
        max: f64,
    },

    #[error("schedule coefficient out of range: {what}")]
    BadSchedule { what: String },

    /// A restored parameter carries a `z`/`v` combination `Param::fresh`
    /// never produces for its variant (e.g. `z: Some`, `v: None` on an
    /// sf-adam run) — only a hand-edited or corrupted persisted state can
    /// reach this, never [`crate::run::Run::new`].
    #[error(
        "parameter {index} ({name:?}) has z={has_z} v={has_v}, inconsistent with variant {variant:?}"
    )]
    InconsistentParamState {
        index: usize,
        name: String,
        has_z: bool,
        has_v: bool,
        variant: Variant,
    },
}
