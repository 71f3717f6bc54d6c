// src/scrape/providers/ebay.rs
//! eBay search results (Buy It Now only).
//!
//! eBay is the only platform whose result cards show a seller feedback
//! percentage, so results from here carry `seller_rating` and are subject to
//! the per-item minimum. Only the HTML cards carry that percentage; embedded
//! JSON-LD is ignored here.

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::config::FetchSettings;
use crate::error::ExtractionFailure;
use crate::model::{ItemRequest, Platform, SearchResult};
use crate::scrape::extract::{
    containers, first_attr, first_text, has_any, parse_containers, run_search, SiteProfile,
    Strategy,
};
use crate::scrape::fetch::{FetchedPage, Fetcher, HttpFetcher};
use crate::scrape::providers::search_url;
use crate::scrape::strip_query;
use crate::scrape::types::{FilterPolicy, RawListing, SourceAdapter};

const SEARCH_BASE: &str = "https://www.ebay.com/sch/i.html?_sacat=0&LH_BIN=1&rt=1";

static CARD: Lazy<Selector> = Lazy::new(|| Selector::parse("li.s-item").unwrap());
static CARD_V2: Lazy<Selector> = Lazy::new(|| Selector::parse("li.s-card").unwrap());
static TITLE_HEADING: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".s-item__title span[role='heading']").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse(".s-item__title").unwrap());
static TITLE_V2: Lazy<Selector> = Lazy::new(|| Selector::parse(".s-card__title").unwrap());
static PRICE: Lazy<Selector> = Lazy::new(|| Selector::parse(".s-item__price").unwrap());
static PRICE_V2: Lazy<Selector> = Lazy::new(|| Selector::parse(".s-card__price").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a.s-item__link").unwrap());
static LINK_V2: Lazy<Selector> = Lazy::new(|| Selector::parse("a.su-link").unwrap());
static SELLER: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".s-item__seller-info-text").unwrap());
static SELLER_V2: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".s-card__seller-info, .su-card-container__attributes__secondary").unwrap());
static SPONSORED: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".s-item__sponsored, [data-sponsored='true']").unwrap());

const NEW_LISTING: &str = "New Listing";
const PLACEHOLDER_TITLE: &str = "Shop on eBay";

fn detect_block(page: &FetchedPage) -> Option<&'static str> {
    if page.final_url.to_ascii_lowercase().contains("captcha") {
        return Some("captcha redirect");
    }
    if page.body.contains("Pardon Our Interruption") {
        return Some("Pardon Our Interruption");
    }
    None
}

fn clean_title(raw: &str) -> String {
    raw.strip_prefix(NEW_LISTING).unwrap_or(raw).trim().to_string()
}

/// "US $120.00 to US $180.00" lists a range; the lower bound is what a buyer
/// can actually pay.
fn lower_bound(price: &str) -> String {
    match price.split_once(" to ") {
        Some((low, _)) => low.trim().to_string(),
        None => price.to_string(),
    }
}

fn parse_card(el: ElementRef<'_>) -> Result<RawListing, ExtractionFailure> {
    let title = first_text(el, &[&TITLE_HEADING, &TITLE, &TITLE_V2]).map(|t| clean_title(&t));
    if title
        .as_deref()
        .is_some_and(|t| t.eq_ignore_ascii_case(PLACEHOLDER_TITLE))
    {
        return Err(ExtractionFailure::Malformed("placeholder card".into()));
    }

    Ok(RawListing {
        title,
        price_text: first_text(el, &[&PRICE, &PRICE_V2]).map(|p| lower_bound(&p)),
        link: first_attr(el, &[&LINK, &LINK_V2], "href"),
        rating_text: first_text(el, &[&SELLER, &SELLER_V2]),
        sponsored: has_any(el, &[&SPONSORED]),
    })
}

fn html_cards(doc: &Html) -> Vec<RawListing> {
    parse_containers(Platform::Ebay, containers(doc, &[&CARD, &CARD_V2]), parse_card)
}

fn canonical_item_link(link: String) -> String {
    strip_query(&link)
}

static STRATEGIES: [Strategy; 1] = [
    Strategy {
        name: "html",
        run: html_cards,
    },
];

pub static SITE: SiteProfile = SiteProfile {
    platform: Platform::Ebay,
    origin: "https://www.ebay.com",
    detect_block,
    strategies: &STRATEGIES,
    canonicalize: canonical_item_link,
};

pub struct EbayAdapter {
    fetcher: Box<dyn Fetcher>,
    policy: FilterPolicy,
}

impl EbayAdapter {
    pub fn new(settings: FetchSettings, policy: FilterPolicy) -> Result<Self> {
        if settings.ebay_app_id.is_some() {
            tracing::info!(target: "scrape", "eBay app id configured; search still scrapes result pages");
        }
        Ok(Self::with_fetcher(Box::new(HttpFetcher::new(settings)?), policy))
    }

    pub fn with_fetcher(fetcher: Box<dyn Fetcher>, policy: FilterPolicy) -> Self {
        Self { fetcher, policy }
    }

    pub fn search_url(term: &str) -> String {
        search_url(SEARCH_BASE, "_nkw", term)
    }
}

#[async_trait]
impl SourceAdapter for EbayAdapter {
    fn platform(&self) -> Platform {
        Platform::Ebay
    }

    async fn search(&self, item: &ItemRequest) -> Result<Vec<SearchResult>> {
        let url = Self::search_url(&item.name);
        Ok(run_search(self.fetcher.as_ref(), &SITE, self.policy, &url, item).await)
    }
}
