// src/scrape/types.rs
use anyhow::Result;

use crate::model::{ItemRequest, Platform, SearchResult};

/// One platform's search capability.
///
/// Implementations degrade every page-level problem (failed fetch, block page,
/// malformed markup) to an empty or partial `Ok`. An `Err` means something
/// unexpected happened inside the adapter; the cycle logs it and moves on to
/// the next platform.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    fn name(&self) -> &'static str {
        self.platform().as_str()
    }

    async fn search(&self, item: &ItemRequest) -> Result<Vec<SearchResult>>;
}

/// Fields pulled out of one listing container before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawListing {
    pub title: Option<String>,
    pub price_text: Option<String>,
    pub link: Option<String>,
    pub rating_text: Option<String>,
    pub sponsored: bool,
}

/// Filters shared by all adapters beyond the per-item price/rating rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterPolicy {
    /// 0 disables the title relevance check.
    pub min_title_relevance: u8,
}
