// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod cycle;
pub mod error;
pub mod input;
pub mod metrics;
pub mod model;
pub mod output;
pub mod relevance;
pub mod scheduler;
pub mod scrape;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::config::{FetchSettings, ShopperConfig};
pub use crate::cycle::{CyclePhase, CycleReport, SearchCycle};
pub use crate::model::{ItemRequest, Platform, SearchResult};
pub use crate::scrape::registry::AdapterRegistry;
pub use crate::scrape::types::{FilterPolicy, SourceAdapter};
pub use crate::store::{ResultStore, SaveSummary, SqliteStore};
