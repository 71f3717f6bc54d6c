// src/scrape/registry.rs
//! Platform name → adapter constructor, resolved once at startup.

use std::collections::HashSet;

use anyhow::Result;

use crate::config::FetchSettings;
use crate::error::AdapterLoadError;
use crate::model::Platform;
use crate::scrape::providers::{AmazonAdapter, BestBuyAdapter, EbayAdapter, WalmartAdapter};
use crate::scrape::types::{FilterPolicy, SourceAdapter};

type Constructor = fn(FetchSettings, FilterPolicy) -> Result<Box<dyn SourceAdapter>>;

fn ebay(s: FetchSettings, p: FilterPolicy) -> Result<Box<dyn SourceAdapter>> {
    Ok(Box::new(EbayAdapter::new(s, p)?))
}

fn amazon(s: FetchSettings, p: FilterPolicy) -> Result<Box<dyn SourceAdapter>> {
    Ok(Box::new(AmazonAdapter::new(s, p)?))
}

fn walmart(s: FetchSettings, p: FilterPolicy) -> Result<Box<dyn SourceAdapter>> {
    Ok(Box::new(WalmartAdapter::new(s, p)?))
}

fn bestbuy(s: FetchSettings, p: FilterPolicy) -> Result<Box<dyn SourceAdapter>> {
    Ok(Box::new(BestBuyAdapter::new(s, p)?))
}

fn constructor(platform: Platform) -> Constructor {
    match platform {
        Platform::Ebay => ebay,
        Platform::Amazon => amazon,
        Platform::Walmart => walmart,
        Platform::BestBuy => bestbuy,
    }
}

/// The adapters a search cycle iterates, in configuration order.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    /// Build one adapter per enabled platform name.
    ///
    /// Unknown names, duplicates and adapters that fail to construct are
    /// skipped with a warning. Ending up with no adapter at all is an error.
    pub fn load(
        names: &[String],
        settings: &FetchSettings,
        policy: FilterPolicy,
    ) -> Result<Self, AdapterLoadError> {
        let mut seen = HashSet::new();
        let mut adapters: Vec<Box<dyn SourceAdapter>> = Vec::new();

        for name in names {
            let Some(platform) = Platform::from_config_name(name) else {
                tracing::warn!(target: "registry", name = %name, "unknown platform, skipping");
                continue;
            };
            if !seen.insert(platform) {
                tracing::warn!(target: "registry", %platform, "platform listed twice, skipping duplicate");
                continue;
            }
            match constructor(platform)(settings.clone(), policy) {
                Ok(adapter) => {
                    tracing::info!(target: "registry", %platform, "adapter loaded");
                    adapters.push(adapter);
                }
                Err(e) => {
                    tracing::warn!(target: "registry", %platform, error = ?e, "adapter failed to initialize, skipping");
                }
            }
        }

        if adapters.is_empty() {
            return Err(AdapterLoadError {
                requested: names.to_vec(),
            });
        }
        Ok(Self { adapters })
    }

    /// Wrap pre-built adapters (tests, embedding).
    pub fn from_adapters(adapters: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn adapters(&self) -> &[Box<dyn SourceAdapter>] {
        &self.adapters
    }

    pub fn platforms(&self) -> Vec<Platform> {
        self.adapters.iter().map(|a| a.platform()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
