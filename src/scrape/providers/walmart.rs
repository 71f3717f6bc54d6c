// src/scrape/providers/walmart.rs
//! Walmart search results.
//!
//! Walmart renders search client-side from a JSON blob embedded in the page
//! (`__NEXT_DATA__`, older pages used `searchContent.preso`). That blob is the
//! preferred source; JSON-LD and the server-rendered tiles are fallbacks.

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

use crate::config::FetchSettings;
use crate::error::ExtractionFailure;
use crate::model::{ItemRequest, Platform, SearchResult};
use crate::scrape::extract::{
    containers, first_attr, first_text, has_any, keep_link, parse_containers, run_search,
    SiteProfile, Strategy,
};
use crate::scrape::fetch::{FetchedPage, Fetcher, HttpFetcher};
use crate::scrape::providers::search_url;
use crate::scrape::structured::{json_ld_listings, path, scalar_text};
use crate::scrape::types::{FilterPolicy, RawListing, SourceAdapter};
use crate::scrape::first_amount;

const SEARCH_BASE: &str = "https://www.walmart.com/search";

static EMBEDDED: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script#__NEXT_DATA__, script[type='application/json']").unwrap()
});
static TILE: Lazy<Selector> = Lazy::new(|| Selector::parse("div[data-item-id]").unwrap());
static TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span[data-automation-id='product-title']").unwrap());
static PRICE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div[data-automation-id='product-price']").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[link-identifier]").unwrap());
static LINK_IP: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href*='/ip/']").unwrap());
static SPONSORED: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("[data-automation-id='sponsored-label'], [data-testid='sponsored-flag']")
        .unwrap()
});

const ITEM_STACKS: &[&str] = &["props", "pageProps", "initialData", "searchResult", "itemStacks"];
const PRESO_ITEMS: &[&str] = &["searchContent", "preso", "items"];

fn detect_block(page: &FetchedPage) -> Option<&'static str> {
    if let Ok(u) = Url::parse(&page.final_url) {
        let p = u.path().to_ascii_lowercase();
        if p.starts_with("/blocked") {
            return Some("blocked redirect");
        }
        if p.starts_with("/error") {
            return Some("error redirect");
        }
    }
    if page.body.contains("Robot or human") {
        return Some("Robot or human");
    }
    None
}

/// Items from the embedded search state, in display order.
fn embedded_items(v: &Value) -> Vec<&Value> {
    if let Some(Value::Array(stacks)) = path(v, ITEM_STACKS) {
        return stacks
            .iter()
            .filter_map(|s| s.get("items").and_then(Value::as_array))
            .flatten()
            .collect();
    }
    match path(v, PRESO_ITEMS) {
        Some(Value::Array(items)) => items.iter().collect(),
        _ => Vec::new(),
    }
}

fn is_ad(item: &Value) -> bool {
    let typename = item.get("__typename").and_then(Value::as_str).unwrap_or("");
    typename.contains("Ad")
        || item.get("isSponsoredFlag").and_then(Value::as_bool) == Some(true)
}

fn embedded_listing(item: &Value) -> RawListing {
    let price_text = [
        &["priceInfo", "currentPrice", "price"][..],
        &["priceInfo", "linePrice"][..],
        &["primaryOffer", "offerPrice"][..],
        &["primaryOffer", "minPrice"][..],
        &["price"][..],
    ]
    .iter()
    .find_map(|p| path(item, p).and_then(scalar_text));

    RawListing {
        title: ["name", "title"]
            .iter()
            .find_map(|k| item.get(*k).and_then(scalar_text)),
        price_text,
        link: item.get("canonicalUrl").and_then(scalar_text),
        rating_text: None,
        sponsored: is_ad(item),
    }
}

fn embedded_json(doc: &Html) -> Vec<RawListing> {
    for script in doc.select(&EMBEDDED) {
        let text: String = script.text().collect();
        if !(text.contains("itemStacks") || text.contains("searchContent")) {
            continue;
        }
        let v: Value = match serde_json::from_str(text.trim()) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(target: "scrape", error = %e, "embedded search state unparsable");
                continue;
            }
        };
        let items = embedded_items(&v);
        if !items.is_empty() {
            return items.into_iter().map(embedded_listing).collect();
        }
    }
    Vec::new()
}

fn parse_tile(el: ElementRef<'_>) -> Result<RawListing, ExtractionFailure> {
    Ok(RawListing {
        title: first_text(el, &[&TITLE]),
        price_text: first_text(el, &[&PRICE]).and_then(|p| first_amount(&p)),
        link: first_attr(el, &[&LINK, &LINK_IP], "href"),
        rating_text: None,
        sponsored: has_any(el, &[&SPONSORED]),
    })
}

fn html_tiles(doc: &Html) -> Vec<RawListing> {
    parse_containers(Platform::Walmart, containers(doc, &[&TILE]), parse_tile)
}

static STRATEGIES: [Strategy; 3] = [
    Strategy {
        name: "embedded_json",
        run: embedded_json,
    },
    Strategy {
        name: "json_ld",
        run: json_ld_listings,
    },
    Strategy {
        name: "html",
        run: html_tiles,
    },
];

pub static SITE: SiteProfile = SiteProfile {
    platform: Platform::Walmart,
    origin: "https://www.walmart.com",
    detect_block,
    strategies: &STRATEGIES,
    canonicalize: keep_link,
};

pub struct WalmartAdapter {
    fetcher: Box<dyn Fetcher>,
    policy: FilterPolicy,
}

impl WalmartAdapter {
    pub fn new(settings: FetchSettings, policy: FilterPolicy) -> Result<Self> {
        Ok(Self::with_fetcher(Box::new(HttpFetcher::new(settings)?), policy))
    }

    pub fn with_fetcher(fetcher: Box<dyn Fetcher>, policy: FilterPolicy) -> Self {
        Self { fetcher, policy }
    }

    pub fn search_url(term: &str) -> String {
        search_url(SEARCH_BASE, "q", term)
    }
}

#[async_trait]
impl SourceAdapter for WalmartAdapter {
    fn platform(&self) -> Platform {
        Platform::Walmart
    }

    async fn search(&self, item: &ItemRequest) -> Result<Vec<SearchResult>> {
        let url = Self::search_url(&item.name);
        Ok(run_search(self.fetcher.as_ref(), &SITE, self.policy, &url, item).await)
    }
}
