// src/scrape/structured.rs
//! Structured product data embedded in search pages.
//!
//! schema.org JSON-LD shows up as single `Product` objects, arrays of them,
//! `ItemList`s of `ListItem`s, or wrapped in `@graph`. All shapes are walked
//! and every `Product` becomes a [`RawListing`].

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::scrape::types::RawListing;

static LD_JSON: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script[type='application/ld+json']").unwrap());

const MAX_DEPTH: usize = 8;

/// Products from every JSON-LD block on the page, in document order.
pub fn json_ld_listings(doc: &Html) -> Vec<RawListing> {
    let mut out = Vec::new();
    for script in doc.select(&LD_JSON) {
        let text: String = script.text().collect();
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(v) => collect_products(&v, &mut out, 0),
            Err(e) => tracing::debug!(target: "scrape", error = %e, "skipping unparsable ld+json block"),
        }
    }
    out
}

fn collect_products(v: &Value, out: &mut Vec<RawListing>, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }
    match v {
        Value::Array(items) => {
            for it in items {
                collect_products(it, out, depth + 1);
            }
        }
        Value::Object(map) => {
            if has_type(v, "Product") {
                out.push(product_listing(v));
            } else if has_type(v, "ListItem") {
                if let Some(item) = map.get("item") {
                    collect_products(item, out, depth + 1);
                }
            } else if has_type(v, "ItemList") {
                if let Some(elems) = map.get("itemListElement") {
                    collect_products(elems, out, depth + 1);
                }
            } else if let Some(graph) = map.get("@graph") {
                collect_products(graph, out, depth + 1);
            }
        }
        _ => {}
    }
}

/// `@type` may be a string or an array of strings.
fn has_type(v: &Value, wanted: &str) -> bool {
    match v.get("@type") {
        Some(Value::String(t)) => t == wanted,
        Some(Value::Array(ts)) => ts.iter().any(|t| t.as_str() == Some(wanted)),
        _ => false,
    }
}

fn product_listing(v: &Value) -> RawListing {
    let offer = match v.get("offers") {
        Some(Value::Array(list)) => list.first(),
        other => other,
    };
    let price_text = offer.and_then(|o| {
        ["price", "lowPrice"]
            .iter()
            .find_map(|k| o.get(*k).and_then(scalar_text))
            .or_else(|| {
                o.get("priceSpecification")
                    .and_then(|p| p.get("price"))
                    .and_then(scalar_text)
            })
    });

    RawListing {
        title: v.get("name").and_then(scalar_text),
        price_text,
        link: v.get("url").and_then(scalar_text),
        rating_text: None,
        sponsored: false,
    }
}

/// Strings as-is, numbers formatted; anything else is absent.
pub fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Follow a path of object keys.
pub fn path<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().try_fold(v, |cur, k| cur.get(*k))
}
