// src/model.rs
use serde::{Deserialize, Serialize};

/// The closed set of supported shops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "eBay")]
    Ebay,
    Amazon,
    Walmart,
    #[serde(rename = "BestBuy")]
    BestBuy,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Ebay,
        Platform::Amazon,
        Platform::Walmart,
        Platform::BestBuy,
    ];

    /// Display name, also the value persisted in the `platform` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Ebay => "eBay",
            Platform::Amazon => "Amazon",
            Platform::Walmart => "Walmart",
            Platform::BestBuy => "BestBuy",
        }
    }

    /// Name used in `[platforms] enabled`.
    pub fn config_name(self) -> &'static str {
        match self {
            Platform::Ebay => "ebay",
            Platform::Amazon => "amazon",
            Platform::Walmart => "walmart",
            Platform::BestBuy => "bestbuy",
        }
    }

    /// Case-insensitive; `best_buy` and `best-buy` are accepted as well.
    pub fn from_config_name(name: &str) -> Option<Self> {
        let n: String = name
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        Platform::ALL.into_iter().find(|p| p.config_name() == n)
    }

    /// Whether search pages expose a seller rating we can filter on.
    pub fn exposes_seller_rating(self) -> bool {
        matches!(self, Platform::Ebay)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One thing the user wants to buy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRequest {
    pub name: String,
    pub max_price: f64,
    #[serde(default)]
    pub min_seller_rating: f64,
}

impl ItemRequest {
    pub fn new(name: impl Into<String>, max_price: f64) -> Self {
        Self {
            name: name.into(),
            max_price,
            min_seller_rating: 0.0,
        }
    }

    pub fn with_min_seller_rating(mut self, rating: f64) -> Self {
        self.min_seller_rating = rating;
        self
    }
}

/// A validated listing. Only built by `scrape::extract::finish_listing`, which
/// guarantees title, price and link are all present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub platform: Platform,
    pub search_term: String,
    pub title: String,
    pub price: f64,
    pub seller_rating: Option<f64>,
    pub link: String,
}

/// A row of the `listings` table.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct StoredListing {
    pub id: i64,
    pub platform: String,
    pub search_term: String,
    pub title: String,
    pub price: f64,
    pub seller_rating: Option<f64>,
    pub link: String,
    pub found_at: chrono::NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_names_resolve_case_insensitively() {
        assert_eq!(Platform::from_config_name("EBAY"), Some(Platform::Ebay));
        assert_eq!(Platform::from_config_name(" bestbuy "), Some(Platform::BestBuy));
        assert_eq!(Platform::from_config_name("best_buy"), Some(Platform::BestBuy));
        assert_eq!(Platform::from_config_name("newegg"), None);
    }

    #[test]
    fn platform_serializes_as_display_name() {
        let s = serde_json::to_string(&Platform::Ebay).unwrap();
        assert_eq!(s, "\"eBay\"");
        assert_eq!(Platform::BestBuy.to_string(), "BestBuy");
    }

    #[test]
    fn only_ebay_exposes_ratings() {
        let rated: Vec<_> = Platform::ALL
            .into_iter()
            .filter(|p| p.exposes_seller_rating())
            .collect();
        assert_eq!(rated, vec![Platform::Ebay]);
    }
}
