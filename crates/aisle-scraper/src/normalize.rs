//! Breadcrumb normalization.
//!
//! Raw extractor output is noisy: nav links, promo banners, the
//! retailer's own name, duplicates. Normalization enforces the
//! breadcrumb invariants — no empties, no duplicates, no retailer
//! self-name, "Home" only at the front, at most six levels — and is
//! idempotent, so re-normalizing a normalized trail is the identity.

use aisle_core::is_retailer_self_name;
use regex::Regex;
use std::sync::OnceLock;

/// Generic navigation tokens that never carry category information.
/// "Home" is special-cased: kept only as the leading element.
pub const NAV_TOKENS: &[&str] = &[
    "home",
    "homepage",
    "shop",
    "browse",
    "all",
    "categories",
    "departments",
    "groceries",
];

fn promo_regex() -> &'static Regex {
    static PROMO: OnceLock<Regex> = OnceLock::new();
    PROMO.get_or_init(|| {
        Regex::new(
            r"(?i)offer|deal|save|%\s*off|half\s*price|discount|delivery|pass\b|account|login|basket|checkout|search|menu|back\b|previous|free\s+delivery|click\s+and\s+collect|store\s+finder|my\s+\w+",
        )
        .expect("valid regex")
    })
}

/// True when `text` plausibly names a category: non-empty, 2..=100
/// chars, contains a letter, and matches none of the promo/navigation
/// patterns.
#[must_use]
pub fn is_category_like(text: &str) -> bool {
    let trimmed = text.trim();
    let len = trimmed.chars().count();
    if !(2..=100).contains(&len) {
        return false;
    }
    if !trimmed.chars().any(char::is_alphabetic) {
        return false;
    }
    !promo_regex().is_match(trimmed)
}

#[must_use]
pub fn is_nav_token(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    NAV_TOKENS.iter().any(|t| *t == lowered)
}

/// Collapse inner whitespace runs to single spaces and trim.
fn tidy(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a raw breadcrumb trail for a retailer.
pub fn normalize_breadcrumbs(raw: &[String], retailer: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    for (position, item) in raw.iter().enumerate() {
        let item = tidy(item);
        if item.is_empty() {
            continue;
        }

        let is_home = item.eq_ignore_ascii_case("home");
        if is_home {
            // "Home" is meaningful only as the trail's first element.
            if position == 0 && out.is_empty() {
                out.push("Home".to_string());
            }
            continue;
        }

        if !is_category_like(&item) {
            continue;
        }
        if is_retailer_self_name(retailer, &item) {
            continue;
        }
        if is_nav_token(&item) {
            continue;
        }
        if out.iter().any(|seen| seen.eq_ignore_ascii_case(&item)) {
            continue;
        }

        out.push(item);
    }

    out.truncate(6);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crumbs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn trims_and_collapses_whitespace() {
        let raw = crumbs(&["  Fresh   Food ", "Dairy\n& Eggs"]);
        let out = normalize_breadcrumbs(&raw, "tesco");
        assert_eq!(out, vec!["Fresh Food", "Dairy & Eggs"]);
    }

    #[test]
    fn drops_empty_and_non_category_items() {
        let raw = crumbs(&["", "  ", "Fresh Food", "£", "3 for 2 Offer"]);
        let out = normalize_breadcrumbs(&raw, "tesco");
        assert_eq!(out, vec!["Fresh Food"]);
    }

    #[test]
    fn home_survives_only_at_the_front() {
        let raw = crumbs(&["Home", "Fresh Food", "Home", "Milk"]);
        let out = normalize_breadcrumbs(&raw, "tesco");
        assert_eq!(out, vec!["Home", "Fresh Food", "Milk"]);

        let raw = crumbs(&["Fresh Food", "Home", "Milk"]);
        let out = normalize_breadcrumbs(&raw, "tesco");
        assert_eq!(out, vec!["Fresh Food", "Milk"]);
    }

    #[test]
    fn drops_retailer_self_name_anywhere() {
        let raw = crumbs(&["Tesco", "Fresh Food", "TESCO", "Milk"]);
        let out = normalize_breadcrumbs(&raw, "tesco");
        assert_eq!(out, vec!["Fresh Food", "Milk"]);
    }

    #[test]
    fn drops_alias_spellings_of_the_retailer() {
        let raw = crumbs(&["Sainsbury's", "Dairy", "Milk"]);
        let out = normalize_breadcrumbs(&raw, "sainsburys");
        assert_eq!(out, vec!["Dairy", "Milk"]);
    }

    #[test]
    fn drops_generic_navigation_tokens() {
        let raw = crumbs(&["Home", "Groceries", "Fresh Food", "Dairy", "Milk"]);
        let out = normalize_breadcrumbs(&raw, "tesco");
        assert_eq!(out, vec!["Home", "Fresh Food", "Dairy", "Milk"]);
    }

    #[test]
    fn dedupes_case_insensitively_keeping_first() {
        let raw = crumbs(&["Dairy", "Milk", "dairy", "MILK"]);
        let out = normalize_breadcrumbs(&raw, "tesco");
        assert_eq!(out, vec!["Dairy", "Milk"]);
    }

    #[test]
    fn caps_at_six_levels() {
        let raw = crumbs(&["A1", "B2 Cat", "C3 Cat", "D4 Cat", "E5 Cat", "F6 Cat", "G7 Cat"]);
        let out = normalize_breadcrumbs(&raw, "tesco");
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = crumbs(&["Home", "Groceries", "Fresh Food", "Dairy", "Milk", "Milk"]);
        let once = normalize_breadcrumbs(&raw, "tesco");
        let twice = normalize_breadcrumbs(&once, "tesco");
        assert_eq!(once, twice);
    }

    #[test]
    fn preserves_deep_non_food_trails() {
        let raw = crumbs(&["Make Up", "Eye Make Up", "Eye Shadow", "Single Eye Shadow"]);
        let out = normalize_breadcrumbs(&raw, "superdrug");
        assert_eq!(
            out,
            vec!["Make Up", "Eye Make Up", "Eye Shadow", "Single Eye Shadow"]
        );
    }

    #[test]
    fn category_likeness_rules() {
        assert!(is_category_like("Fresh Food"));
        assert!(is_category_like("Dairy & Eggs"));
        assert!(!is_category_like(""));
        assert!(!is_category_like("x"));
        assert!(!is_category_like("50% off"));
        assert!(!is_category_like("Free Delivery"));
        assert!(!is_category_like("My Account"));
        assert!(!is_category_like("Click and Collect"));
        assert!(!is_category_like("123"));
        assert!(!is_category_like(&"long ".repeat(30)));
    }
}
