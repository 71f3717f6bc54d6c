// src/metrics.rs
use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration, so series carry help text once a recorder
/// is installed by the embedding binary.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "shopper_listings_kept_total",
            "Listings that passed all filters, per platform."
        );
        describe_counter!(
            "shopper_fetch_failures_total",
            "Requests that timed out, failed to connect or returned non-2xx."
        );
        describe_counter!(
            "shopper_blocked_total",
            "Search pages replaced by an anti-bot interstitial, per platform."
        );
        describe_counter!(
            "shopper_adapter_errors_total",
            "Adapter calls that errored or panicked, per platform."
        );
        describe_counter!("shopper_rows_inserted_total", "New listings stored.");
        describe_counter!(
            "shopper_rows_ignored_total",
            "Listings skipped because their link was already stored."
        );
        describe_histogram!("shopper_cycle_ms", "Search cycle wall time in milliseconds.");
    });
}
