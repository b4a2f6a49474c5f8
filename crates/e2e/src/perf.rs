//! Timing budgets
//!
//! Measured operations are recorded with their verdict against the configured
//! [`Threshold`]. Going over budget logs a warning and shows up in the report;
//! it never fails the test on its own.

use std::future::Future;
use std::time::Instant;

use hrm_common::{Threshold, TimingVerdict};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One measured operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub label: String,
    pub duration_ms: u64,
    pub verdict: TimingVerdict,
}

/// Await `future`, recording how long it took against `threshold`
pub async fn timed<F>(timings: &mut Vec<Timing>, label: &str, threshold: &Threshold, future: F) -> F::Output
where
    F: Future,
{
    let start = Instant::now();
    let output = future.await;
    let elapsed = start.elapsed();
    let verdict = threshold.classify(elapsed);
    let duration_ms = elapsed.as_millis() as u64;

    match verdict {
        TimingVerdict::WithinBudget => debug!("{} took {} ms", label, duration_ms),
        TimingVerdict::Slow => warn!(
            "{} took {} ms (warning threshold {} ms)",
            label, duration_ms, threshold.warning_ms
        ),
        TimingVerdict::OverBudget => warn!(
            "{} took {} ms, over its {} ms budget",
            label, duration_ms, threshold.max_ms
        ),
    }

    timings.push(Timing {
        label: label.to_string(),
        duration_ms,
        verdict,
    });
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_timed_records_and_passes_output_through() {
        let mut timings = Vec::new();
        let value = timed(&mut timings, "noop", &Threshold::new(1000, 500), async { 42 }).await;

        assert_eq!(value, 42);
        assert_eq!(timings.len(), 1);
        assert_eq!(timings[0].label, "noop");
        assert_eq!(timings[0].verdict, TimingVerdict::WithinBudget);
    }

    #[tokio::test]
    async fn test_over_budget_is_recorded_not_failed() {
        let mut timings = Vec::new();
        let result: Result<(), ()> = timed(&mut timings, "sleepy", &Threshold::new(5, 1), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(())
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(timings[0].verdict, TimingVerdict::OverBudget);
        assert!(timings[0].duration_ms >= 20);
    }
}
