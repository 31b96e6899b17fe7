//! Retailer registry: alias normalization, per-retailer profiles, and the
//! priority order the dispatcher processes store links in.
//!
//! Profiles are compile-time data. Flags capture observed site behavior
//! (bot mitigation strictness, automation breakage, whether product URLs
//! carry a usable category path) rather than anything configurable at
//! runtime.

/// Immutable per-retailer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetailerProfile {
    pub id: &'static str,
    pub display_name: &'static str,
    /// Homepage, used for seed cookies, Referer headers, and browser
    /// warm-up navigation.
    pub home_url: &'static str,
    /// Section page visited between homepage and product page during
    /// warm-up on strict sites.
    pub warmup_path: Option<&'static str>,
    /// Lower ranks are processed first.
    pub priority_rank: u32,
    pub default_delay_secs: f64,
    pub default_timeout_secs: u64,
    /// Append the headless-browser strategy after the HTTP strategies.
    pub needs_browser_fallback: bool,
    /// The external renderer, not the browser, is this host's designated
    /// fallback: the browser strategy is left out of the cascade and a
    /// blocked fetch is handled in the second phase (still in priority
    /// order).
    pub prefer_external_renderer: bool,
    /// Never spend renderer quota on this retailer.
    pub skip_external_renderer: bool,
    /// Browser automation is known to break on this site; skip the
    /// browser strategy even when the fallback flag is set.
    pub skip_browser: bool,
    /// Product URLs carry the category path, so URL-path inference is a
    /// legitimate extraction strategy.
    pub url_carries_categories: bool,
    /// Sliding-window cooling applies on top of normal spacing.
    pub strict_rate_limit: bool,
    /// Skip this retailer entirely (persistent hard blocks or dead site).
    pub problematic: bool,
}

/// Profile used for retailer ids not present in [`PROFILES`].
pub static DEFAULT_PROFILE: RetailerProfile = RetailerProfile {
    id: "unknown",
    display_name: "Unknown",
    home_url: "",
    warmup_path: None,
    priority_rank: u32::MAX,
    default_delay_secs: 2.0,
    default_timeout_secs: 15,
    needs_browser_fallback: false,
    prefer_external_renderer: false,
    skip_external_renderer: false,
    skip_browser: false,
    url_carries_categories: false,
    strict_rate_limit: false,
    problematic: false,
};

pub static PROFILES: &[RetailerProfile] = &[
    RetailerProfile {
        id: "tesco",
        display_name: "Tesco",
        home_url: "https://www.tesco.com",
        warmup_path: Some("/groceries/en-GB/shop/fresh-food"),
        priority_rank: 1,
        default_delay_secs: 2.5,
        default_timeout_secs: 20,
        needs_browser_fallback: true,
        prefer_external_renderer: false,
        skip_external_renderer: false,
        skip_browser: false,
        url_carries_categories: false,
        strict_rate_limit: false,
        problematic: false,
    },
    RetailerProfile {
        id: "sainsburys",
        display_name: "Sainsbury's",
        home_url: "https://www.sainsburys.co.uk",
        warmup_path: Some("/gol-ui/groceries"),
        priority_rank: 2,
        default_delay_secs: 2.5,
        default_timeout_secs: 20,
        needs_browser_fallback: true,
        prefer_external_renderer: false,
        skip_external_renderer: false,
        skip_browser: false,
        url_carries_categories: false,
        strict_rate_limit: false,
        problematic: false,
    },
    RetailerProfile {
        id: "asda",
        display_name: "Asda",
        home_url: "https://groceries.asda.com",
        warmup_path: None,
        priority_rank: 3,
        default_delay_secs: 3.0,
        default_timeout_secs: 20,
        needs_browser_fallback: true,
        prefer_external_renderer: true,
        skip_external_renderer: false,
        // Remote-controlled Chrome gets interstitial-looped on this site.
        skip_browser: true,
        url_carries_categories: false,
        strict_rate_limit: false,
        problematic: false,
    },
    RetailerProfile {
        id: "morrisons",
        display_name: "Morrisons",
        home_url: "https://groceries.morrisons.com",
        warmup_path: None,
        priority_rank: 4,
        default_delay_secs: 2.0,
        default_timeout_secs: 15,
        needs_browser_fallback: false,
        prefer_external_renderer: false,
        skip_external_renderer: false,
        skip_browser: false,
        url_carries_categories: false,
        strict_rate_limit: false,
        problematic: false,
    },
    RetailerProfile {
        id: "ocado",
        display_name: "Ocado",
        home_url: "https://www.ocado.com",
        warmup_path: Some("/browse"),
        priority_rank: 5,
        default_delay_secs: 4.0,
        default_timeout_secs: 25,
        needs_browser_fallback: true,
        prefer_external_renderer: false,
        skip_external_renderer: false,
        skip_browser: false,
        url_carries_categories: false,
        strict_rate_limit: true,
        problematic: false,
    },
    RetailerProfile {
        id: "waitrose",
        display_name: "Waitrose",
        home_url: "https://www.waitrose.com",
        warmup_path: Some("/ecom/shop/browse/groceries"),
        priority_rank: 6,
        default_delay_secs: 2.5,
        default_timeout_secs: 20,
        needs_browser_fallback: true,
        prefer_external_renderer: false,
        skip_external_renderer: false,
        skip_browser: false,
        url_carries_categories: false,
        strict_rate_limit: false,
        problematic: false,
    },
    RetailerProfile {
        id: "aldi",
        display_name: "Aldi",
        home_url: "https://www.aldi.co.uk",
        warmup_path: None,
        priority_rank: 7,
        default_delay_secs: 2.0,
        default_timeout_secs: 15,
        needs_browser_fallback: false,
        prefer_external_renderer: false,
        skip_external_renderer: false,
        skip_browser: false,
        url_carries_categories: false,
        strict_rate_limit: false,
        problematic: false,
    },
    RetailerProfile {
        id: "lidl",
        display_name: "Lidl",
        home_url: "https://www.lidl.co.uk",
        warmup_path: None,
        priority_rank: 8,
        default_delay_secs: 2.0,
        default_timeout_secs: 15,
        needs_browser_fallback: false,
        prefer_external_renderer: false,
        skip_external_renderer: false,
        skip_browser: false,
        url_carries_categories: false,
        strict_rate_limit: false,
        problematic: false,
    },
    RetailerProfile {
        id: "iceland",
        display_name: "Iceland",
        home_url: "https://www.iceland.co.uk",
        warmup_path: None,
        priority_rank: 9,
        default_delay_secs: 2.0,
        default_timeout_secs: 15,
        needs_browser_fallback: false,
        prefer_external_renderer: false,
        skip_external_renderer: false,
        skip_browser: false,
        url_carries_categories: false,
        strict_rate_limit: false,
        problematic: false,
    },
    RetailerProfile {
        id: "coop",
        display_name: "Co-op",
        home_url: "https://www.coop.co.uk",
        warmup_path: None,
        priority_rank: 10,
        default_delay_secs: 2.0,
        default_timeout_secs: 15,
        needs_browser_fallback: false,
        prefer_external_renderer: false,
        skip_external_renderer: false,
        skip_browser: false,
        url_carries_categories: false,
        strict_rate_limit: false,
        problematic: false,
    },
    RetailerProfile {
        id: "marksandspencer",
        display_name: "Marks & Spencer",
        home_url: "https://www.marksandspencer.com",
        warmup_path: None,
        priority_rank: 11,
        default_delay_secs: 2.0,
        default_timeout_secs: 15,
        needs_browser_fallback: false,
        prefer_external_renderer: false,
        skip_external_renderer: false,
        skip_browser: false,
        url_carries_categories: false,
        strict_rate_limit: false,
        problematic: false,
    },
    RetailerProfile {
        id: "boots",
        display_name: "Boots",
        home_url: "https://www.boots.com",
        warmup_path: None,
        priority_rank: 12,
        default_delay_secs: 2.0,
        default_timeout_secs: 15,
        needs_browser_fallback: false,
        prefer_external_renderer: false,
        skip_external_renderer: false,
        skip_browser: false,
        url_carries_categories: true,
        strict_rate_limit: false,
        problematic: false,
    },
    RetailerProfile {
        id: "superdrug",
        display_name: "Superdrug",
        home_url: "https://www.superdrug.com",
        warmup_path: None,
        priority_rank: 13,
        default_delay_secs: 2.0,
        default_timeout_secs: 15,
        needs_browser_fallback: false,
        prefer_external_renderer: false,
        skip_external_renderer: false,
        skip_browser: false,
        url_carries_categories: true,
        strict_rate_limit: false,
        problematic: false,
    },
    RetailerProfile {
        id: "savers",
        display_name: "Savers",
        home_url: "https://www.savers.co.uk",
        warmup_path: None,
        priority_rank: 14,
        default_delay_secs: 2.0,
        default_timeout_secs: 15,
        needs_browser_fallback: false,
        prefer_external_renderer: false,
        skip_external_renderer: false,
        skip_browser: false,
        url_carries_categories: true,
        strict_rate_limit: false,
        problematic: false,
    },
    RetailerProfile {
        id: "wilko",
        display_name: "Wilko",
        home_url: "https://www.wilko.com",
        warmup_path: None,
        priority_rank: 15,
        default_delay_secs: 2.0,
        default_timeout_secs: 15,
        needs_browser_fallback: false,
        prefer_external_renderer: false,
        skip_external_renderer: false,
        skip_browser: false,
        url_carries_categories: false,
        strict_rate_limit: false,
        problematic: true,
    },
    RetailerProfile {
        id: "poundland",
        display_name: "Poundland",
        home_url: "https://www.poundland.co.uk",
        warmup_path: None,
        priority_rank: 16,
        default_delay_secs: 1.5,
        default_timeout_secs: 15,
        needs_browser_fallback: false,
        prefer_external_renderer: false,
        skip_external_renderer: true,
        skip_browser: false,
        url_carries_categories: false,
        strict_rate_limit: false,
        problematic: false,
    },
    RetailerProfile {
        id: "bmstores",
        display_name: "B&M",
        home_url: "https://www.bmstores.co.uk",
        warmup_path: None,
        priority_rank: 17,
        default_delay_secs: 1.5,
        default_timeout_secs: 15,
        needs_browser_fallback: false,
        prefer_external_renderer: false,
        skip_external_renderer: false,
        skip_browser: false,
        url_carries_categories: true,
        strict_rate_limit: false,
        problematic: false,
    },
    RetailerProfile {
        id: "homebargains",
        display_name: "Home Bargains",
        home_url: "https://www.homebargains.co.uk",
        warmup_path: None,
        priority_rank: 18,
        default_delay_secs: 1.5,
        default_timeout_secs: 15,
        needs_browser_fallback: false,
        prefer_external_renderer: false,
        skip_external_renderer: false,
        skip_browser: false,
        url_carries_categories: false,
        strict_rate_limit: false,
        problematic: false,
    },
    RetailerProfile {
        id: "amazon",
        display_name: "Amazon",
        home_url: "https://www.amazon.co.uk",
        warmup_path: None,
        priority_rank: 19,
        default_delay_secs: 3.0,
        default_timeout_secs: 15,
        needs_browser_fallback: false,
        prefer_external_renderer: false,
        skip_external_renderer: true,
        skip_browser: true,
        url_carries_categories: false,
        strict_rate_limit: false,
        problematic: true,
    },
];

/// Spelling variants beyond the profile id and display name.
static ALIASES: &[(&str, &str)] = &[
    ("sainsbury", "sainsburys"),
    ("sainsburies", "sainsburys"),
    ("co op", "coop"),
    ("co-op", "coop"),
    ("cooperative", "coop"),
    ("the co-operative", "coop"),
    ("m&s", "marksandspencer"),
    ("m and s", "marksandspencer"),
    ("marks and spencer", "marksandspencer"),
    ("marks spencer", "marksandspencer"),
    ("b&m", "bmstores"),
    ("b and m", "bmstores"),
    ("bm stores", "bmstores"),
    ("home bargains", "homebargains"),
    ("amazon uk", "amazon"),
    ("amazon fresh", "amazon"),
];

/// Lowercase and drop everything but ASCII alphanumerics, so that
/// `"Sainsbury's"`, `"sainsburys"` and `"SAINSBURYS"` compare equal.
fn squeeze(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Normalize a retailer name to its canonical id.
///
/// Known names (ids, display names, and alias spellings) map through the
/// fixed table; unknown names pass through lower-cased with whitespace
/// stripped.
#[must_use]
pub fn normalize_retailer(name: &str) -> String {
    let squeezed = squeeze(name);
    if squeezed.is_empty() {
        return String::new();
    }

    for profile in PROFILES {
        if squeeze(profile.id) == squeezed || squeeze(profile.display_name) == squeezed {
            return profile.id.to_string();
        }
    }
    for (alias, id) in ALIASES {
        if squeeze(alias) == squeezed {
            return (*id).to_string();
        }
    }

    name.to_lowercase().split_whitespace().collect()
}

/// Look up the profile for a normalized retailer id. Unknown ids get
/// [`DEFAULT_PROFILE`].
#[must_use]
pub fn profile_for(id: &str) -> &'static RetailerProfile {
    PROFILES
        .iter()
        .find(|p| p.id == id)
        .unwrap_or(&DEFAULT_PROFILE)
}

/// Processing priority for a retailer id; unknown retailers sort last in
/// stable order.
#[must_use]
pub fn priority_rank(id: &str) -> u32 {
    PROFILES
        .iter()
        .find(|p| p.id == id)
        .map_or(u32::MAX, |p| p.priority_rank)
}

/// True when an item of a breadcrumb trail is just the retailer's own
/// name (id, display name, or alias spelling).
#[must_use]
pub fn is_retailer_self_name(id: &str, item: &str) -> bool {
    let squeezed = squeeze(item);
    if squeezed.is_empty() {
        return false;
    }
    // Compare against the id itself first, which also covers retailers
    // without a profile entry.
    if squeeze(id) == squeezed {
        return true;
    }
    let profile = profile_for(id);
    if squeeze(profile.id) == squeezed || squeeze(profile.display_name) == squeezed {
        return true;
    }
    ALIASES
        .iter()
        .any(|(alias, target)| *target == id && squeeze(alias) == squeezed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_known_spellings() {
        assert_eq!(normalize_retailer("sainsbury's"), "sainsburys");
        assert_eq!(normalize_retailer("Sainsburys"), "sainsburys");
        assert_eq!(normalize_retailer("SAINSBURY'S"), "sainsburys");
        assert_eq!(normalize_retailer("Marks & Spencer"), "marksandspencer");
        assert_eq!(normalize_retailer("M&S"), "marksandspencer");
        assert_eq!(normalize_retailer("Co-op"), "coop");
        assert_eq!(normalize_retailer("B&M"), "bmstores");
        assert_eq!(normalize_retailer("Home Bargains"), "homebargains");
        assert_eq!(normalize_retailer("Tesco"), "tesco");
    }

    #[test]
    fn unknown_names_pass_through_lowercased_and_stripped() {
        assert_eq!(normalize_retailer("Fresh Mart"), "freshmart");
        assert_eq!(normalize_retailer("  CornerShop  "), "cornershop");
    }

    #[test]
    fn empty_name_normalizes_to_empty() {
        assert_eq!(normalize_retailer(""), "");
        assert_eq!(normalize_retailer("  '' "), "");
    }

    #[test]
    fn profile_lookup_known_and_unknown() {
        assert_eq!(profile_for("tesco").display_name, "Tesco");
        assert!(profile_for("ocado").strict_rate_limit);
        assert_eq!(profile_for("freshmart").id, "unknown");
    }

    #[test]
    fn priority_orders_known_before_unknown() {
        assert!(priority_rank("tesco") < priority_rank("asda"));
        assert!(priority_rank("asda") < priority_rank("ocado"));
        assert_eq!(priority_rank("freshmart"), u32::MAX);
    }

    #[test]
    fn priority_ranks_are_unique() {
        let mut ranks: Vec<u32> = PROFILES.iter().map(|p| p.priority_rank).collect();
        ranks.sort_unstable();
        ranks.dedup();
        assert_eq!(ranks.len(), PROFILES.len());
    }

    #[test]
    fn problematic_set_contains_expected_retailers() {
        let problematic: Vec<&str> = PROFILES
            .iter()
            .filter(|p| p.problematic)
            .map(|p| p.id)
            .collect();
        assert_eq!(problematic, vec!["wilko", "amazon"]);
    }

    #[test]
    fn self_name_detection_covers_aliases() {
        assert!(is_retailer_self_name("sainsburys", "Sainsbury's"));
        assert!(is_retailer_self_name("marksandspencer", "M&S"));
        assert!(is_retailer_self_name("tesco", "TESCO"));
        assert!(!is_retailer_self_name("tesco", "Fresh Food"));
    }

    #[test]
    fn url_inference_is_opt_in() {
        assert!(profile_for("boots").url_carries_categories);
        assert!(profile_for("superdrug").url_carries_categories);
        assert!(!profile_for("tesco").url_carries_categories);
        assert!(!DEFAULT_PROFILE.url_carries_categories);
    }
}
