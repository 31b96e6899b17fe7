//! Breadcrumb quality scoring.
//!
//! A deliberately crude but stable 0–100 score. Its one job is to let
//! the dispatcher stop early on confident trails and keep the best
//! below-threshold candidate otherwise. Scoring is a pure function of
//! the normalized breadcrumbs and the retailer id.

use aisle_core::is_retailer_self_name;

use crate::normalize::is_nav_token;

/// Dispatcher early-stop cutoff.
pub const EARLY_STOP_SCORE: u8 = 50;

/// Tokens naming a concrete product family — the strongest content
/// signal a trail can carry.
const SPECIFIC_PRODUCT_TOKENS: &[&str] = &[
    "milk",
    "cheese",
    "butter",
    "yogurt",
    "yoghurt",
    "eggs",
    "bread",
    "rolls",
    "apples",
    "bananas",
    "chicken",
    "beef",
    "pork",
    "salmon",
    "pasta",
    "rice",
    "cereal",
    "chocolate",
    "crisps",
    "biscuits",
    "coffee",
    "tea",
    "juice",
    "wine",
    "beer",
    "shampoo",
    "toothpaste",
    "deodorant",
    "nappies",
    "dog food",
    "cat food",
];

/// Broader category families (food, household, health & beauty, drinks,
/// pets).
const FOOD_CATEGORY_TOKENS: &[&str] = &[
    "fresh",
    "dairy",
    "bakery",
    "frozen",
    "meat",
    "fish",
    "fruit",
    "vegetable",
    "veg",
    "drinks",
    "beverages",
    "snacks",
    "household",
    "health",
    "beauty",
    "baby",
    "pets",
    "pantry",
    "cupboard",
    "food",
    "laundry",
    "toiletries",
];

/// Campaign/banner phrases that mark a trail as scraped promo chrome.
const PROMO_TOKENS: &[&str] = &[
    "fill your freezer",
    "big savings",
    "organic september",
    "price promise",
    "coupons",
    "top offers",
    "wine sale",
    "half price",
    "special offers",
    "rollback",
    "clubcard price",
];

/// Adjacent (general, specific) pairs that indicate a real hierarchy.
const PROGRESSION_PAIRS: &[(&str, &str)] = &[
    ("home", "fresh"),
    ("home", "food"),
    ("food", "fresh"),
    ("fresh", "dairy"),
    ("fresh", "fruit"),
    ("fresh", "meat"),
    ("dairy", "milk"),
    ("dairy", "cheese"),
    ("bakery", "bread"),
    ("drinks", "juice"),
    ("drinks", "wine"),
    ("meat", "chicken"),
    ("frozen", "ice cream"),
    ("health", "beauty"),
    ("household", "laundry"),
    ("pets", "dog"),
];

/// Full-trail substrings that only occur in well-formed trails.
const PERFECT_PATTERNS: &[&str] = &[
    "home > fresh",
    "home > food",
    "food > dairy",
    "fresh > dairy",
    "dairy > milk",
    "bakery > bread",
];

/// Score a normalized breadcrumb trail for a retailer. An empty trail
/// scores zero.
#[must_use]
pub fn score_breadcrumbs(breadcrumbs: &[String], retailer: &str) -> u8 {
    if breadcrumbs.is_empty() {
        return 0;
    }

    let mut score: i32 = 50;
    let lowered: Vec<String> = breadcrumbs.iter().map(|c| c.to_lowercase()).collect();

    // Length band.
    let len = breadcrumbs.len();
    if (3..=6).contains(&len) {
        score += 25;
    } else if (2..=7).contains(&len) {
        score += 15;
    } else if len > 8 {
        score -= 20;
    }

    // One content award: the best signal across all items.
    let has_specific = lowered
        .iter()
        .any(|item| SPECIFIC_PRODUCT_TOKENS.iter().any(|t| item.contains(t)));
    let has_food_category = lowered
        .iter()
        .any(|item| FOOD_CATEGORY_TOKENS.iter().any(|t| item.contains(t)));
    if has_specific {
        score += 20;
    } else if has_food_category {
        score += 15;
    } else {
        score += 10;
    }

    for (position, item) in lowered.iter().enumerate() {
        if PROMO_TOKENS.iter().any(|t| item.contains(t)) {
            score -= 40;
        }
        if is_nav_token(item) {
            score -= 10;
        }
        if position > 0 && is_retailer_self_name(retailer, item) {
            score -= 15;
        }
    }

    // Depth bonuses for fully articulated trails.
    score += match len {
        4 => 10,
        5 => 20,
        6 => 15,
        _ => 0,
    };

    // Hierarchy progression: adjacent general→specific pairs.
    let mut progression = 0;
    for pair in lowered.windows(2) {
        if PROGRESSION_PAIRS
            .iter()
            .any(|(general, specific)| pair[0].contains(general) && pair[1].contains(specific))
        {
            progression += 10;
        }
    }
    score += progression.min(30);

    let joined = lowered.join(" > ");
    if PERFECT_PATTERNS.iter().any(|p| joined.contains(p)) {
        score += 25;
    }

    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crumbs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn empty_trail_scores_zero() {
        assert_eq!(score_breadcrumbs(&[], "tesco"), 0);
    }

    #[test]
    fn score_is_always_in_range() {
        let trails: Vec<Vec<String>> = vec![
            crumbs(&["Half Price", "Big Savings", "Top Offers"]),
            crumbs(&["Home", "Fresh Food", "Dairy", "Milk"]),
            crumbs(&["A", "B", "C", "D", "E", "F", "G", "H", "I"]),
            crumbs(&["Milk"]),
        ];
        for trail in &trails {
            let score = score_breadcrumbs(trail, "tesco");
            assert!(score <= 100, "trail {trail:?} scored {score}");
        }
    }

    #[test]
    fn dairy_trail_scores_high_and_early_stops() {
        let trail = crumbs(&["Home", "Fresh Food", "Dairy", "Milk"]);
        let score = score_breadcrumbs(&trail, "tesco");
        assert!(score >= 70, "expected >= 70, got {score}");
        assert!(score >= EARLY_STOP_SCORE);
    }

    #[test]
    fn cosmetics_trail_scores_exactly_ninety_five() {
        // 50 base + 25 length + 10 content + 10 depth, with no token
        // family, progression, or perfect-pattern hits.
        let trail = crumbs(&["Make Up", "Eye Make Up", "Eye Shadow", "Single Eye Shadow"]);
        assert_eq!(score_breadcrumbs(&trail, "superdrug"), 95);
    }

    #[test]
    fn promo_items_are_heavily_penalized() {
        let clean = crumbs(&["Drinks", "Wine", "Red Wine"]);
        let promo = crumbs(&["Drinks", "Wine Sale", "Red Wine"]);
        let clean_score = score_breadcrumbs(&clean, "tesco");
        let promo_score = score_breadcrumbs(&promo, "tesco");
        assert!(
            promo_score + 30 <= clean_score,
            "promo {promo_score} vs clean {clean_score}"
        );
    }

    #[test]
    fn retailer_name_after_first_position_is_penalized() {
        let with_name = crumbs(&["Fresh Food", "Tesco", "Milk"]);
        let without = crumbs(&["Fresh Food", "Dairy", "Milk"]);
        assert!(
            score_breadcrumbs(&with_name, "tesco") < score_breadcrumbs(&without, "tesco")
        );
    }

    #[test]
    fn progression_bonus_is_capped() {
        // Five chained progressions would be +50 uncapped.
        let trail = crumbs(&[
            "Home",
            "Fresh Food",
            "Dairy",
            "Milk",
            "Dairy Milk",
            "Milk Bottles",
        ]);
        let score = score_breadcrumbs(&trail, "tesco");
        assert!(score <= 100);
    }

    #[test]
    fn overlong_trails_are_penalized() {
        let nine = crumbs(&["Aa", "Bb", "Cc", "Dd", "Ee", "Ff", "Gg", "Hh", "Ii"]);
        let four = crumbs(&["Aa", "Bb", "Cc", "Dd"]);
        assert!(score_breadcrumbs(&nine, "tesco") < score_breadcrumbs(&four, "tesco"));
    }

    #[test]
    fn scoring_is_deterministic() {
        let trail = crumbs(&["Home", "Fresh Food", "Dairy", "Milk"]);
        let a = score_breadcrumbs(&trail, "tesco");
        let b = score_breadcrumbs(&trail, "tesco");
        assert_eq!(a, b);
    }
}
