// src/scrape/providers/bestbuy.rs
//! Best Buy search results.

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::config::FetchSettings;
use crate::error::ExtractionFailure;
use crate::model::{ItemRequest, Platform, SearchResult};
use crate::scrape::extract::{
    containers, first_attr, first_text, has_any, keep_link, parse_containers, run_search,
    SiteProfile, Strategy,
};
use crate::scrape::fetch::{FetchedPage, Fetcher, HttpFetcher};
use crate::scrape::providers::search_url;
use crate::scrape::structured::json_ld_listings;
use crate::scrape::types::{FilterPolicy, RawListing, SourceAdapter};

// `intl=nosplash` skips the country picker served to non-US clients.
const SEARCH_BASE: &str = "https://www.bestbuy.com/site/searchpage.jsp?intl=nosplash";

static SKU: Lazy<Selector> = Lazy::new(|| Selector::parse("li.sku-item").unwrap());
static SKU_V2: Lazy<Selector> = Lazy::new(|| Selector::parse("li.product-list-item").unwrap());
static TITLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h4.sku-title a, h4.sku-header a, .sku-title a").unwrap());
static TITLE_V2: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2.product-title, .product-title").unwrap());
static LINK_V2: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.product-list-item-link, a[href*='/site/']").unwrap());
static PRICE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "div.priceView-hero-price span[aria-hidden='true'], div.priceView-customer-price span[aria-hidden='true']",
    )
    .unwrap()
});
static PRICE_V2: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("[data-testid='customer-price'] span, .customer-price").unwrap()
});
static SPONSORED: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".sponsored-label, .is-sponsored").unwrap());

fn detect_block(page: &FetchedPage) -> Option<&'static str> {
    page.body
        .contains("Access Denied")
        .then_some("Access Denied")
}

fn parse_sku(el: ElementRef<'_>) -> Result<RawListing, ExtractionFailure> {
    Ok(RawListing {
        title: first_text(el, &[&TITLE_LINK, &TITLE_V2]),
        price_text: first_text(el, &[&PRICE, &PRICE_V2]),
        link: first_attr(el, &[&TITLE_LINK, &LINK_V2], "href"),
        rating_text: None,
        sponsored: has_any(el, &[&SPONSORED]),
    })
}

fn html_skus(doc: &Html) -> Vec<RawListing> {
    parse_containers(Platform::BestBuy, containers(doc, &[&SKU, &SKU_V2]), parse_sku)
}

static STRATEGIES: [Strategy; 2] = [
    Strategy {
        name: "json_ld",
        run: json_ld_listings,
    },
    Strategy {
        name: "html",
        run: html_skus,
    },
];

pub static SITE: SiteProfile = SiteProfile {
    platform: Platform::BestBuy,
    origin: "https://www.bestbuy.com",
    detect_block,
    strategies: &STRATEGIES,
    canonicalize: keep_link,
};

pub struct BestBuyAdapter {
    fetcher: Box<dyn Fetcher>,
    policy: FilterPolicy,
}

impl BestBuyAdapter {
    pub fn new(settings: FetchSettings, policy: FilterPolicy) -> Result<Self> {
        Ok(Self::with_fetcher(Box::new(HttpFetcher::new(settings)?), policy))
    }

    pub fn with_fetcher(fetcher: Box<dyn Fetcher>, policy: FilterPolicy) -> Self {
        Self { fetcher, policy }
    }

    pub fn search_url(term: &str) -> String {
        search_url(SEARCH_BASE, "st", term)
    }
}

#[async_trait]
impl SourceAdapter for BestBuyAdapter {
    fn platform(&self) -> Platform {
        Platform::BestBuy
    }

    async fn search(&self, item: &ItemRequest) -> Result<Vec<SearchResult>> {
        let url = Self::search_url(&item.name);
        Ok(run_search(self.fetcher.as_ref(), &SITE, self.policy, &url, item).await)
    }
}
