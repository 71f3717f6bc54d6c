// src/relevance.rs
//! Fuzzy title relevance: how well does a listing title cover the item name?

use strsim::normalized_levenshtein;

/// Best partial match (0–100) of `item_name` anywhere inside `title`,
/// case-insensitive. A title that literally contains the name scores 100.
pub fn title_relevance(item_name: &str, title: &str) -> u8 {
    let needle: Vec<char> = item_name.trim().to_lowercase().chars().collect();
    let hay: Vec<char> = title.trim().to_lowercase().chars().collect();
    if needle.is_empty() || hay.is_empty() {
        return 0;
    }

    let (short, long) = if needle.len() <= hay.len() {
        (&needle, &hay)
    } else {
        (&hay, &needle)
    };
    let short_s: String = short.iter().collect();

    let best = long
        .windows(short.len())
        .map(|w| normalized_levenshtein(&short_s, &w.iter().collect::<String>()))
        .fold(0.0_f64, f64::max);

    (best * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_scores_full() {
        assert_eq!(
            title_relevance("RTX 3080", "ASUS NVIDIA GeForce rtx 3080 TUF Gaming OC"),
            100
        );
    }

    #[test]
    fn unrelated_title_scores_low() {
        let s = title_relevance(
            "NVIDIA RTX 3080 refurbished",
            "Gigabyte Gaming Monitor G27Q - 27 inch 144Hz QHD",
        );
        assert!(s < 50, "score was {s}");
    }

    #[test]
    fn near_match_scores_high() {
        assert!(title_relevance("RTX 3080", "RTX3080 Founders") >= 70);
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(title_relevance("", "anything"), 0);
        assert_eq!(title_relevance("x", "  "), 0);
    }
}
