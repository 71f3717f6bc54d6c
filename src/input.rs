// src/input.rs
//! Where the wanted items come from.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::model::ItemRequest;

/// Yields the items for one search cycle. Problems reading them are logged
/// and produce an empty list; they never stop the scheduler.
#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn read(&self) -> Vec<ItemRequest>;
}

/// A fixed list, mostly for tests and embedding.
#[async_trait]
impl ItemSource for Vec<ItemRequest> {
    async fn read(&self) -> Vec<ItemRequest> {
        self.clone()
    }
}

/// A JSON array of `{name, max_price, min_seller_rating?}` objects, re-read
/// every cycle so edits take effect without a restart.
pub struct JsonItemFile {
    path: PathBuf,
}

impl JsonItemFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ItemSource for JsonItemFile {
    async fn read(&self) -> Vec<ItemRequest> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(t) => t,
            Err(e) => {
                warn!(target: "input", path = %self.path.display(), error = %e, "item file unreadable");
                return Vec::new();
            }
        };
        let items = parse_items(&text);
        info!(target: "input", path = %self.path.display(), count = items.len(), "items loaded");
        items
    }
}

/// Parse the item file body. Records that fail validation are dropped one by
/// one; anything other than a JSON array yields nothing.
pub fn parse_items(text: &str) -> Vec<ItemRequest> {
    let records = match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(records)) => records,
        Ok(_) => {
            warn!(target: "input", "item file must contain a JSON array");
            return Vec::new();
        }
        Err(e) => {
            warn!(target: "input", error = %e, "item file is not valid JSON");
            return Vec::new();
        }
    };

    records
        .iter()
        .enumerate()
        .filter_map(|(idx, rec)| match item_from_value(rec) {
            Ok(item) => Some(item),
            Err(reason) => {
                warn!(target: "input", idx, reason, "dropping item record");
                None
            }
        })
        .collect()
}

fn number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    n.filter(|f| f.is_finite())
}

fn item_from_value(rec: &Value) -> Result<ItemRequest, &'static str> {
    let obj = rec.as_object().ok_or("not an object")?;

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or("missing name")?;

    let max_price = obj
        .get("max_price")
        .and_then(number)
        .ok_or("missing or non-numeric max_price")?;
    if max_price <= 0.0 {
        return Err("max_price must be positive");
    }

    let min_seller_rating = match obj.get("min_seller_rating") {
        None | Some(Value::Null) => 0.0,
        Some(v) => match number(v) {
            Some(r) if (0.0..=100.0).contains(&r) => r,
            _ => {
                warn!(target: "input", name, "invalid min_seller_rating, using 0");
                0.0
            }
        },
    };

    Ok(ItemRequest::new(name, max_price).with_min_seller_rating(min_seller_rating))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_and_defaults() {
        let items = parse_items(
            r#"[
                {"name": " RTX 3080 ", "max_price": "500", "min_seller_rating": 95},
                {"name": "Kettle", "max_price": 30},
                {"name": "Bad rating", "max_price": 10, "min_seller_rating": "lots"}
            ]"#,
        );
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].name, "RTX 3080");
        assert_eq!(items[0].max_price, 500.0);
        assert_eq!(items[0].min_seller_rating, 95.0);
        assert_eq!(items[1].min_seller_rating, 0.0);
        assert_eq!(items[2].min_seller_rating, 0.0);
    }

    #[test]
    fn bad_records_are_dropped_individually() {
        let items = parse_items(
            r#"[
                {"max_price": 10},
                {"name": "", "max_price": 10},
                {"name": "Zero", "max_price": 0},
                {"name": "Words", "max_price": "cheap"},
                "just a string",
                {"name": "Good", "max_price": 1.5}
            ]"#,
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Good");
    }

    #[test]
    fn non_array_documents_yield_nothing() {
        assert!(parse_items("{}").is_empty());
        assert!(parse_items("[").is_empty());
        assert!(parse_items("").is_empty());
        assert!(parse_items("[]").is_empty());
    }
}
