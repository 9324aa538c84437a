//! The task record `T` (§3): the dispatch engine's receipt for one probe
//! batch, immutable until a matching report consumes it. This crate does
//! not store or expire task records — that lifecycle belongs to the
//! surrounding task manager (§5) — it only shapes the value.

/// `T = {k0, packed_flips, signature, num_games}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub k0: u64,
    pub packed_flips: Vec<u8>,
    pub signature: u64,
    pub num_games: u32,
}

/// Output of the dispatch engine (C4): the two probe parameter vectors
/// plus the task record the caller must hand back to the worker and keep
/// until a report arrives.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub theta_white: Vec<f64>,
    pub theta_black: Vec<f64>,
    pub task: Task,
}
