// src/scheduler.rs
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::cycle::SearchCycle;

/// Run `cycle` immediately, then once per `interval`, until `cancel` fires.
///
/// A cycle that overruns the interval delays the next tick instead of
/// triggering a burst of catch-up runs. Returns the number of cycles run.
pub async fn run_scheduler(
    cycle: &SearchCycle,
    interval: Duration,
    cancel: CancellationToken,
) -> u64 {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(
        target: "scheduler",
        interval_secs = interval.as_secs(),
        "scheduler started"
    );

    let mut runs = 0u64;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            // The first tick completes immediately.
            _ = ticker.tick() => {}
        }
        let report = cycle.run_search_cycle(&cancel).await;
        runs += 1;
        tracing::debug!(target: "scheduler", run = runs, results = report.results.len(), "tick done");
    }

    tracing::info!(target: "scheduler", runs, "scheduler stopped");
    runs
}
