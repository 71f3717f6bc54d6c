// src/scrape/filter.rs
//! Price and seller-rating predicate applied to every candidate result.

use crate::model::{ItemRequest, SearchResult};

/// `true` when `result` satisfies the user's constraints for `item`.
///
/// - price must be a positive number no higher than `max_price` (equal passes);
/// - on platforms that expose seller ratings, a positive `min_seller_rating`
///   requires a known rating at or above it.
pub fn passes(result: &SearchResult, item: &ItemRequest) -> bool {
    passes_price(result, item) && passes_rating(result, item)
}

pub fn passes_price(result: &SearchResult, item: &ItemRequest) -> bool {
    let p = result.price;
    p.is_finite() && p > 0.0 && p <= item.max_price
}

pub fn passes_rating(result: &SearchResult, item: &ItemRequest) -> bool {
    if !result.platform.exposes_seller_rating() || item.min_seller_rating <= 0.0 {
        return true;
    }
    matches!(result.seller_rating, Some(r) if r >= item.min_seller_rating)
}
