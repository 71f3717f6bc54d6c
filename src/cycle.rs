// src/cycle.rs
//! One search cycle: load items, query every adapter for every item, persist.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::FutureExt;
use metrics::{counter, histogram};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::input::ItemSource;
use crate::metrics::ensure_metrics_described;
use crate::model::{ItemRequest, SearchResult};
use crate::output::write_results;
use crate::scrape::registry::AdapterRegistry;
use crate::scrape::types::SourceAdapter;
use crate::store::{ResultStore, SaveSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    LoadingItems,
    Searching,
    Persisting,
}

/// What one cycle did.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub items: usize,
    pub results: Vec<SearchResult>,
    /// Adapter calls that returned an error or panicked.
    pub adapter_errors: usize,
    /// `None` when the cycle ended before persisting or the save failed.
    pub saved: Option<SaveSummary>,
    pub cancelled: bool,
    pub elapsed: Duration,
}

pub struct SearchCycle {
    items: Box<dyn ItemSource>,
    registry: AdapterRegistry,
    store: Arc<dyn ResultStore>,
    output_path: Option<PathBuf>,
    phase: Mutex<CyclePhase>,
}

impl SearchCycle {
    pub fn new(
        items: Box<dyn ItemSource>,
        registry: AdapterRegistry,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            items,
            registry,
            store,
            output_path: None,
            phase: Mutex::new(CyclePhase::Idle),
        }
    }

    /// Also write each cycle's matches to a JSON file.
    pub fn with_output(mut self, path: Option<PathBuf>) -> Self {
        self.output_path = path;
        self
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase.lock().map(|p| *p).unwrap_or(CyclePhase::Idle)
    }

    fn enter(&self, next: CyclePhase) {
        if let Ok(mut p) = self.phase.lock() {
            debug!(target: "cycle", from = ?*p, to = ?next, "phase");
            *p = next;
        }
    }

    /// Run one cycle. Never fails: problems are logged and reflected in the
    /// report. Cancellation is honoured between items; results gathered up to
    /// that point are still persisted.
    pub async fn run_search_cycle(&self, cancel: &CancellationToken) -> CycleReport {
        ensure_metrics_described();
        let started = Instant::now();
        let mut report = CycleReport::default();
        info!(target: "cycle", "search cycle started");

        self.enter(CyclePhase::LoadingItems);
        let items = self.items.read().await;
        report.items = items.len();
        if items.is_empty() {
            warn!(target: "cycle", "no items to search for, ending cycle");
            return self.finish(report, started);
        }

        self.enter(CyclePhase::Searching);
        for item in &items {
            if cancel.is_cancelled() {
                info!(target: "cycle", "cancelled between items");
                report.cancelled = true;
                break;
            }
            for adapter in self.registry.adapters() {
                match search_isolated(adapter.as_ref(), item).await {
                    Some(mut found) => report.results.append(&mut found),
                    None => report.adapter_errors += 1,
                }
            }
        }

        self.enter(CyclePhase::Persisting);
        match self.store.save(&report.results).await {
            Ok(summary) => report.saved = Some(summary),
            Err(e) => error!(target: "cycle", error = ?e, "saving results failed"),
        }
        if let Some(path) = &self.output_path {
            if let Err(e) = write_results(path, &report.results).await {
                warn!(target: "cycle", error = ?e, "writing results file failed");
            }
        }

        self.finish(report, started)
    }

    fn finish(&self, mut report: CycleReport, started: Instant) -> CycleReport {
        report.elapsed = started.elapsed();
        histogram!("shopper_cycle_ms").record(report.elapsed.as_secs_f64() * 1000.0);
        info!(
            target: "cycle",
            items = report.items,
            results = report.results.len(),
            adapter_errors = report.adapter_errors,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "search cycle finished"
        );
        self.enter(CyclePhase::Idle);
        report
    }
}

/// Call one adapter for one item. `None` means it errored or panicked; the
/// failure has been logged and counted.
async fn search_isolated(adapter: &dyn SourceAdapter, item: &ItemRequest) -> Option<Vec<SearchResult>> {
    let platform = adapter.platform();
    match AssertUnwindSafe(adapter.search(item)).catch_unwind().await {
        Ok(Ok(found)) => Some(found),
        Ok(Err(e)) => {
            warn!(target: "cycle", error = ?e, provider = adapter.name(), item = %item.name, "adapter error");
            counter!("shopper_adapter_errors_total", "platform" => platform.as_str()).increment(1);
            None
        }
        Err(panic) => {
            warn!(
                target: "cycle",
                provider = adapter.name(),
                item = %item.name,
                panic = %panic_message(panic.as_ref()),
                "adapter panicked"
            );
            counter!("shopper_adapter_errors_total", "platform" => platform.as_str()).increment(1);
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
