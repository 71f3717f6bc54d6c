// src/scrape/extract.rs
//! The search flow every adapter shares: fetch, block check, ordered
//! extraction strategies, validation, filtering.

use metrics::counter;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::error::{BlockDetected, ExtractionFailure};
use crate::model::{ItemRequest, Platform, SearchResult};
use crate::relevance;
use crate::scrape::fetch::{FetchedPage, Fetcher};
use crate::scrape::types::{FilterPolicy, RawListing};
use crate::scrape::{clean_price, filter, normalize_text, parse_rating, resolve_link};

/// One way of pulling raw listings out of a parsed page.
pub struct Strategy {
    pub name: &'static str,
    pub run: fn(&Html) -> Vec<RawListing>,
}

/// Everything that differs between shops, as static data.
pub struct SiteProfile {
    pub platform: Platform,
    /// Scheme + host that `/`-rooted links are joined onto.
    pub origin: &'static str,
    /// Returns a short signature when the page is an anti-bot interstitial.
    pub detect_block: fn(&FetchedPage) -> Option<&'static str>,
    /// Tried in order; the first one yielding a complete listing wins.
    pub strategies: &'static [Strategy],
    /// Applied to resolved links so the same item keeps the same key.
    pub canonicalize: fn(String) -> String,
}

pub fn keep_link(link: String) -> String {
    link
}

/// Validate a raw listing into a [`SearchResult`]. Nothing partially filled
/// gets past this point.
pub fn finish_listing(
    raw: RawListing,
    site: &SiteProfile,
    search_term: &str,
) -> Result<SearchResult, ExtractionFailure> {
    if raw.sponsored {
        return Err(ExtractionFailure::Sponsored);
    }
    let title = raw
        .title
        .as_deref()
        .map(normalize_text)
        .filter(|t| !t.is_empty())
        .ok_or(ExtractionFailure::MissingTitle)?;
    let price = raw
        .price_text
        .as_deref()
        .and_then(clean_price)
        .ok_or(ExtractionFailure::MissingPrice)?;
    let link = raw
        .link
        .as_deref()
        .and_then(|href| resolve_link(href, site.origin))
        .map(site.canonicalize)
        .ok_or(ExtractionFailure::MissingLink)?;
    let seller_rating = raw.rating_text.as_deref().and_then(parse_rating);

    Ok(SearchResult {
        platform: site.platform,
        search_term: search_term.to_string(),
        title,
        price,
        seller_rating,
        link,
    })
}

/// Run the site's strategies against `body` and return complete, unfiltered
/// results from the first strategy that produced any. Page order is kept.
pub fn extract_results(body: &str, site: &SiteProfile, search_term: &str) -> Vec<SearchResult> {
    let doc = Html::parse_document(body);
    for strategy in site.strategies {
        let raw = (strategy.run)(&doc);
        let candidates = raw.len();
        let mut complete = Vec::with_capacity(candidates);
        for (idx, listing) in raw.into_iter().enumerate() {
            match finish_listing(listing, site, search_term) {
                Ok(r) => complete.push(r),
                Err(reason) => {
                    debug!(target: "scrape", platform = %site.platform, strategy = strategy.name, idx, %reason, "listing skipped")
                }
            }
        }
        debug!(
            target: "scrape",
            platform = %site.platform,
            strategy = strategy.name,
            candidates,
            complete = complete.len(),
            "strategy finished"
        );
        if !complete.is_empty() {
            return complete;
        }
    }
    warn!(target: "scrape", platform = %site.platform, "no strategy produced listings; page layout may have changed");
    Vec::new()
}

/// Keep results that satisfy price, rating and (when enabled) title relevance.
pub fn apply_filters(
    results: Vec<SearchResult>,
    item: &ItemRequest,
    policy: FilterPolicy,
) -> Vec<SearchResult> {
    results
        .into_iter()
        .filter(|r| {
            if !filter::passes(r, item) {
                debug!(target: "scrape", platform = %r.platform, title = %r.title, price = r.price, rating = ?r.seller_rating, "filtered out");
                return false;
            }
            if policy.min_title_relevance > 0 {
                let score = relevance::title_relevance(&item.name, &r.title);
                if score < policy.min_title_relevance {
                    debug!(target: "scrape", title = %r.title, score, "filtered out (relevance)");
                    return false;
                }
            }
            true
        })
        .collect()
}

/// The complete adapter flow for one query URL. Never fails: fetch failures
/// and block pages become an empty result.
pub async fn run_search(
    fetcher: &dyn Fetcher,
    site: &SiteProfile,
    policy: FilterPolicy,
    url: &str,
    item: &ItemRequest,
) -> Vec<SearchResult> {
    info!(
        target: "scrape",
        platform = %site.platform,
        item = %item.name,
        max_price = item.max_price,
        min_rating = item.min_seller_rating,
        "searching"
    );

    let page = match fetcher.fetch(url, &[]).await {
        Ok(p) => p,
        Err(e) => {
            warn!(target: "scrape", platform = %site.platform, error = %e, "fetch failed");
            return Vec::new();
        }
    };

    if let Some(signature) = (site.detect_block)(&page) {
        let blocked = BlockDetected {
            platform: site.platform,
            signature,
        };
        warn!(target: "scrape", url = %page.final_url, "{blocked}");
        counter!("shopper_blocked_total", "platform" => site.platform.as_str()).increment(1);
        return Vec::new();
    }

    let complete = extract_results(&page.body, site, &item.name);
    let kept = apply_filters(complete, item, policy);
    counter!("shopper_listings_kept_total", "platform" => site.platform.as_str())
        .increment(kept.len() as u64);
    info!(target: "scrape", platform = %site.platform, item = %item.name, kept = kept.len(), "search finished");
    kept
}

// --- element helpers for the HTML strategies ---

/// Text content with whitespace collapsed.
pub fn element_text(el: ElementRef<'_>) -> String {
    normalize_text(&el.text().collect::<Vec<_>>().join(" "))
}

/// First non-empty text, trying selectors in priority order.
pub fn first_text(el: ElementRef<'_>, selectors: &[&Selector]) -> Option<String> {
    selectors.iter().find_map(|s| {
        el.select(s)
            .map(element_text)
            .find(|t| !t.is_empty())
    })
}

/// First non-empty attribute value, trying selectors in priority order.
pub fn first_attr(el: ElementRef<'_>, selectors: &[&Selector], attr: &str) -> Option<String> {
    selectors.iter().find_map(|s| {
        el.select(s)
            .filter_map(|e| e.value().attr(attr))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
    })
}

pub fn has_any(el: ElementRef<'_>, selectors: &[&Selector]) -> bool {
    selectors.iter().any(|s| el.select(s).next().is_some())
}

/// Containers matched by the first selector that finds any.
pub fn containers<'a>(doc: &'a Html, selectors: &[&Selector]) -> Vec<ElementRef<'a>> {
    for s in selectors {
        let found: Vec<_> = doc.select(s).collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Parse every container; a container that fails is logged and skipped.
pub fn parse_containers(
    platform: Platform,
    found: Vec<ElementRef<'_>>,
    parse_one: fn(ElementRef<'_>) -> Result<RawListing, ExtractionFailure>,
) -> Vec<RawListing> {
    let mut out = Vec::with_capacity(found.len());
    for (idx, el) in found.into_iter().enumerate() {
        match parse_one(el) {
            Ok(raw) => out.push(raw),
            Err(reason) => debug!(target: "scrape", %platform, idx, %reason, "container skipped"),
        }
    }
    out
}
