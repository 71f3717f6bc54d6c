// src/scrape/providers/amazon.rs
//! Amazon search results. Seller ratings are not shown on result cards.

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

const SEARCH_BASE: &str = "https://www.amazon.com/s";

static RESULT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div[data-component-type='s-search-result']").unwrap());
static SPONSORED: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "span[data-component-type='s-ads-indicator-text'], .puis-sponsored-label-text, .s-sponsored-label-text",
    )
    .unwrap()
});
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h2 a span.a-text-normal").unwrap());
static TITLE_SPAN: Lazy<Selector> = Lazy::new(|| Selector::parse("h2 span").unwrap());
static TITLE_H2: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("h2 a.a-link-normal").unwrap());
static LINK_DP: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.a-link-normal[href*='/dp/']").unwrap());
static LINK_ANY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.a-link-normal.s-no-outline, h2 a").unwrap());
static PRICE_WHOLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.a-price span.a-price-whole").unwrap());
static PRICE_FRACTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.a-price span.a-price-fraction").unwrap());
static PRICE_OFFSCREEN: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.a-price > span.a-offscreen").unwrap());

fn detect_block(page: &FetchedPage) -> Option<&'static str> {
    if page.final_url.to_ascii_lowercase().contains("validatecaptcha") {
        return Some("captcha redirect");
    }
    let body = page.body.to_ascii_lowercase();
    if body.contains("captcha") {
        return Some("captcha");
    }
    if body.contains("robot check") {
        return Some("robot check");
    }
    None
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// Whole and fraction are rendered as separate spans (`1,299.` + `99`); the
/// screen-reader copy is the fallback when either is missing.
fn price_text(el: ElementRef<'_>) -> Option<String> {
    let whole = first_text(el, &[&PRICE_WHOLE]).map(|w| digits(&w));
    let fraction = first_text(el, &[&PRICE_FRACTION]).map(|f| digits(&f));
    match (whole, fraction) {
        (Some(w), Some(f)) if !w.is_empty() && !f.is_empty() => Some(format!("{w}.{f}")),
        (Some(w), _) if !w.is_empty() => Some(w),
        _ => first_text(el, &[&PRICE_OFFSCREEN]),
    }
}

fn parse_result(el: ElementRef<'_>) -> Result<RawListing, ExtractionFailure> {
    Ok(RawListing {
        title: first_text(el, &[&TITLE, &TITLE_SPAN, &TITLE_H2]),
        price_text: price_text(el),
        link: first_attr(el, &[&LINK, &LINK_DP, &LINK_ANY], "href"),
        rating_text: None,
        sponsored: has_any(el, &[&SPONSORED]),
    })
}

fn html_results(doc: &Html) -> Vec<RawListing> {
    parse_containers(Platform::Amazon, containers(doc, &[&RESULT]), parse_result)
}

static STRATEGIES: [Strategy; 2] = [
    Strategy {
        name: "json_ld",
        run: json_ld_listings,
    },
    Strategy {
        name: "html",
        run: html_results,
    },
];

pub static SITE: SiteProfile = SiteProfile {
    platform: Platform::Amazon,
    origin: "https://www.amazon.com",
    detect_block,
    strategies: &STRATEGIES,
    canonicalize: keep_link,
};

pub struct AmazonAdapter {
    fetcher: Box<dyn Fetcher>,
    policy: FilterPolicy,
}

impl AmazonAdapter {
    pub fn new(settings: FetchSettings, policy: FilterPolicy) -> Result<Self> {
        Ok(Self::with_fetcher(Box::new(HttpFetcher::new(settings)?), policy))
    }

    pub fn with_fetcher(fetcher: Box<dyn Fetcher>, policy: FilterPolicy) -> Self {
        Self { fetcher, policy }
    }

    pub fn search_url(term: &str) -> String {
        search_url(SEARCH_BASE, "k", term)
    }
}

#[async_trait]
impl SourceAdapter for AmazonAdapter {
    fn platform(&self) -> Platform {
        Platform::Amazon
    }

    async fn search(&self, item: &ItemRequest) -> Result<Vec<SearchResult>> {
        let url = Self::search_url(&item.name);
        Ok(run_search(self.fetcher.as_ref(), &SITE, self.policy, &url, item).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(html: &str) -> RawListing {
        let doc = Html::parse_document(html);
        html_results(&doc).into_iter().next().unwrap()
    }

    #[test]
    fn whole_and_fraction_are_joined() {
        let raw = first(
            r#"<div data-component-type="s-search-result"><h2><a class="a-link-normal" href="/dp/B1"><span class="a-text-normal">X</span></a></h2>
               <span class="a-price"><span class="a-offscreen">$1,299.99</span><span class="a-price-whole">1,299.</span><span class="a-price-fraction">99</span></span></div>"#,
        );
        assert_eq!(raw.price_text.as_deref(), Some("1299.99"));
    }

    #[test]
    fn offscreen_price_is_the_fallback() {
        let raw = first(
            r#"<div data-component-type="s-search-result"><h2><span>X</span></h2>
               <span class="a-price"><span class="a-offscreen">$24.50</span></span></div>"#,
        );
        assert_eq!(raw.price_text.as_deref(), Some("$24.50"));
    }

    #[test]
    fn robot_check_page_is_a_block() {
        let page = FetchedPage {
            final_url: "https://www.amazon.com/s?k=x".into(),
            status: 200,
            body: "<title>Robot Check</title>".into(),
        };
        assert_eq!(detect_block(&page), Some("robot check"));
    }
}
