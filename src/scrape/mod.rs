// src/scrape/mod.rs
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod providers;
pub mod registry;
pub mod structured;
pub mod types;

use once_cell::sync::OnceCell;
use regex::Regex;
use url::Url;

/// Normalize scraped text: decode entities, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

/// Parse a displayed price into a positive float.
///
/// Everything except ASCII digits and `.` is dropped first, so currency marks,
/// thousands separators and markup residue are tolerated. Empty, unparsable
/// (e.g. two decimal points) or non-positive remainders yield `None`.
pub fn clean_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Some(v),
        _ => {
            tracing::debug!(target: "scrape", raw, "could not parse price");
            None
        }
    }
}

/// First money-looking amount in a noisy string, e.g. the `199.99` in
/// `"current price $199.99 $199 99"`. Feed the result to [`clean_price`].
pub fn first_amount(raw: &str) -> Option<String> {
    static RE_AMOUNT: OnceCell<Regex> = OnceCell::new();
    let re = RE_AMOUNT.get_or_init(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").unwrap());
    re.find(raw).map(|m| m.as_str().to_string())
}

/// Turn an `href` into an absolute URL.
///
/// Absolute http(s) URLs pass through, `/`-rooted paths are joined onto
/// `origin`, anything else (relative paths, `javascript:`, fragments) is
/// rejected rather than guessed.
pub fn resolve_link(href: &str, origin: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with('/') {
        let base = Url::parse(origin).ok()?;
        return base.join(href).ok().map(String::from);
    }
    match Url::parse(href) {
        Ok(u) if matches!(u.scheme(), "http" | "https") && u.host_str().is_some() => {
            Some(u.into())
        }
        _ => None,
    }
}

/// Drop query string and fragment, for shops whose item URLs carry tracking
/// parameters that change between searches.
pub fn strip_query(link: &str) -> String {
    match Url::parse(link) {
        Ok(mut u) => {
            u.set_query(None);
            u.set_fragment(None);
            u.into()
        }
        Err(_) => link.to_string(),
    }
}

/// Seller rating from text like `"techdeals (1,204) 99.5%"`. Only values
/// followed by `%` and within 0..=100 count.
pub fn parse_rating(raw: &str) -> Option<f64> {
    static RE_PCT: OnceCell<Regex> = OnceCell::new();
    let re = RE_PCT.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").unwrap());
    let caps = re.captures(raw)?;
    let v: f64 = caps.get(1)?.as_str().parse().ok()?;
    (0.0..=100.0).contains(&v).then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_decodes_and_collapses() {
        assert_eq!(
            normalize_text("  RTX&nbsp;3080 \n\t Founders &amp; Co  "),
            "RTX 3080 Founders & Co"
        );
    }

    #[test]
    fn clean_price_handles_common_noise() {
        assert_eq!(clean_price("$1,299.99"), Some(1299.99));
        assert_eq!(clean_price("  US $450.00 "), Some(450.0));
        assert_eq!(clean_price("1 299 Kč"), Some(1299.0));
        assert_eq!(clean_price("Free"), None);
        assert_eq!(clean_price(""), None);
        assert_eq!(clean_price("$0.00"), None);
        assert_eq!(clean_price("1.299.99"), None);
    }

    #[test]
    fn first_amount_takes_leading_price() {
        assert_eq!(
            first_amount("current price $1,199.99 $1,199 99").as_deref(),
            Some("1,199.99")
        );
        assert_eq!(first_amount("Now $5"), Some("5".to_string()));
        assert_eq!(first_amount("see price in cart"), None);
    }

    #[test]
    fn resolve_link_rules() {
        let origin = "https://www.walmart.com";
        assert_eq!(
            resolve_link("/ip/123", origin).as_deref(),
            Some("https://www.walmart.com/ip/123")
        );
        assert_eq!(
            resolve_link("https://www.ebay.com/itm/1", origin).as_deref(),
            Some("https://www.ebay.com/itm/1")
        );
        assert_eq!(resolve_link("ip/123", origin), None);
        assert_eq!(resolve_link("javascript:void(0)", origin), None);
        assert_eq!(resolve_link("#", origin), None);
    }

    #[test]
    fn strip_query_drops_tracking() {
        assert_eq!(
            strip_query("https://www.ebay.com/itm/123?hash=abc&_trkparms=x#top"),
            "https://www.ebay.com/itm/123"
        );
    }

    #[test]
    fn parse_rating_reads_percentage() {
        assert_eq!(parse_rating("techdeals (12,345) 99.5%"), Some(99.5));
        assert_eq!(parse_rating("100% positive"), Some(100.0));
        assert_eq!(parse_rating("techdeals (12,345)"), None);
        assert_eq!(parse_rating("250%"), None);
    }
}
