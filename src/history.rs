//! History sampler (C6): down-samples parameter trajectories at a
//! run-wide cadence so telemetry doesn't grow one record per report.

use serde::Deserialize;
use serde::Serialize;

/// One sampled trajectory point: the exported parameter vector at the
/// time of sampling, alongside the classic-form `R`/`c` schedule values
/// evaluated at the post-update `iter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub iter: u64,
    pub theta: Vec<f64>,
    pub r: Vec<f64>,
    pub c: Vec<f64>,
}

/// `samples = 100` below 100 axes, `10000 / d` between 100 and 1000, else 1.
pub fn samples_for(d: usize) -> u64 {
    if d < 100 {
        100
    } else if d < 1000 {
        (10_000 / d as u64).max(1)
    } else {
        1
    }
}

/// Sampling period in pairs. Deliberately driven by `num_games` (the full
/// run budget), not `num_iter` — preserved exactly per the source's open
/// question, though the two differ only by the constant factor of 2 that
/// cancels out below (`num_games / 2 == num_iter`).
///
/// Clamped to at least 1 so a vanishingly small run budget can't produce a
/// zero period and divide by zero in [`should_record`].
pub fn period_for(num_games: u64, d: usize) -> u64 {
    let samples = samples_for(d);
    (num_games / 2 / samples).max(1)
}

/// `|history| + 1 > iter / period`.
pub fn should_record(history_len: usize, iter: u64, period: u64) -> bool {
    history_len as u64 + 1 > iter / period
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_below_100_axes() {
        assert_eq!(samples_for(1), 100);
        assert_eq!(samples_for(99), 100);
    }

    #[test]
    fn samples_between_100_and_1000_axes() {
        assert_eq!(samples_for(100), 100);
        assert_eq!(samples_for(200), 50);
        assert_eq!(samples_for(999), 10);
    }

    #[test]
    fn samples_at_or_above_1000_axes() {
        assert_eq!(samples_for(1000), 1);
        assert_eq!(samples_for(5000), 1);
    }

    #[test]
    fn should_record_fires_on_the_expected_cadence() {
        let period = 10u64;
        // first record should fire once iter crosses the first period.
        assert!(!should_record(0, 5, period));
        assert!(should_record(0, 10, period));
        assert!(!should_record(1, 15, period));
        assert!(should_record(1, 20, period));
    }

    #[test]
    fn tiny_run_budget_never_divides_by_zero() {
        let period = period_for(1, 50);
        assert_eq!(period, 1);
        assert!(should_record(0, 1, period));
    }
}
