// src/scrape/providers/mod.rs
pub mod amazon;
pub mod bestbuy;
pub mod ebay;
pub mod walmart;

pub use amazon::AmazonAdapter;
pub use bestbuy::BestBuyAdapter;
pub use ebay::EbayAdapter;
pub use walmart::WalmartAdapter;

/// `base` + `key=<term>` with the term form-encoded (spaces become `+`).
pub(crate) fn search_url(base: &str, key: &str, term: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(term.as_bytes()).collect();
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}{key}={encoded}")
}
