//! Shared breadcrumb extraction strategies.
//!
//! Each strategy takes the parsed document and/or the raw body and
//! returns raw breadcrumb strings (normalization happens later). The
//! retailer cascades in [`super::retailers`] compose these in
//! site-specific orders; [`super::universal`] runs the full set.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;

use crate::normalize::is_category_like;

/// Keys searched when walking embedded page state.
const STATE_KEYS: &[&str] = &[
    "breadcrumbs",
    "breadcrumb",
    "categories",
    "category",
    "hierarchy",
    "categoryPath",
];

/// Default breadcrumb container selectors, broad enough for most sites.
pub const DEFAULT_DOM_SELECTORS: &[&str] = &[
    "nav[aria-label*=\"readcrumb\"] a",
    "nav[aria-label*=\"readcrumb\"] li",
    "ol.breadcrumb li a",
    ".breadcrumbs a",
    ".breadcrumb a",
    "[data-testid*=\"breadcrumb\"] a",
    "ul.breadcrumb li a",
];

/// URL slug → display category rewrites for compound categories.
const URL_SLUG_REWRITES: &[(&str, &str)] = &[
    ("cough-cold-flu", "Cough, Cold & Flu"),
    ("health-beauty", "Health & Beauty"),
    ("baby-child", "Baby & Child"),
    ("mens-toiletries", "Men's Toiletries"),
    ("womens-toiletries", "Women's Toiletries"),
    ("fragrance-aftershave", "Fragrance & Aftershave"),
    ("vitamins-supplements", "Vitamins & Supplements"),
    ("food-drink", "Food & Drink"),
    ("household-pet", "Household & Pet"),
    ("skin-care", "Skincare"),
    ("hair-care", "Haircare"),
    ("dental-care", "Dental Care"),
];

/// Path segments that structure retailer URLs but carry no category.
const URL_FILLER_SEGMENTS: &[&str] = &[
    "p", "product", "products", "prod", "item", "items", "detail", "details", "groceries",
    "shop", "c", "cp", "dp", "pd", "sku", "en-gb", "en", "gb", "uk", "www",
];

// ---------------------------------------------------------------------------
// Strategy 1: JSON-LD
// ---------------------------------------------------------------------------

fn jsonld_script_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
            .expect("valid regex")
    })
}

/// Extract a breadcrumb trail from `<script type="application/ld+json">`
/// blocks: `BreadcrumbList` items, a `Product.breadcrumb` property, or a
/// delimited `Product.category` string.
pub fn jsonld_breadcrumbs(body: &str) -> Vec<String> {
    for cap in jsonld_script_regex().captures_iter(body) {
        let Some(json_text) = cap.get(1) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(json_text.as_str()) else {
            continue;
        };

        // Accept top-level object, array, or @graph container.
        let mut candidates: Vec<serde_json::Value> = if let Some(arr) = value.as_array() {
            arr.clone()
        } else {
            vec![value]
        };
        let mut expanded = Vec::new();
        for item in &candidates {
            if let Some(graph) = item.get("@graph").and_then(serde_json::Value::as_array) {
                expanded.extend(graph.iter().cloned());
            }
        }
        candidates.extend(expanded);

        for item in &candidates {
            let crumbs = jsonld_item_breadcrumbs(item);
            if !crumbs.is_empty() {
                return crumbs;
            }
        }
    }
    Vec::new()
}

fn jsonld_item_breadcrumbs(item: &serde_json::Value) -> Vec<String> {
    if type_matches(item, "BreadcrumbList") {
        return breadcrumb_list_names(item);
    }

    if type_matches(item, "Product") {
        if let Some(breadcrumb) = item.get("breadcrumb") {
            if breadcrumb.get("itemListElement").is_some() {
                let names = breadcrumb_list_names(breadcrumb);
                if !names.is_empty() {
                    return names;
                }
            }
            if let Some(s) = breadcrumb.as_str() {
                let names = split_category_string(s);
                if !names.is_empty() {
                    return names;
                }
            }
        }
        if let Some(category) = item.get("category").and_then(|v| v.as_str()) {
            return split_category_string(category);
        }
    }

    Vec::new()
}

/// `@type` may be a plain string or an array of strings.
fn type_matches(item: &serde_json::Value, wanted: &str) -> bool {
    match item.get("@type") {
        Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case(wanted),
        Some(serde_json::Value::Array(arr)) => arr
            .iter()
            .filter_map(|v| v.as_str())
            .any(|s| s.eq_ignore_ascii_case(wanted)),
        _ => false,
    }
}

/// Collect `itemListElement[*]` names in `position` order; the name may
/// sit on the element or nested under `item`.
fn breadcrumb_list_names(list: &serde_json::Value) -> Vec<String> {
    let Some(elements) = list.get("itemListElement").and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    let mut entries: Vec<(i64, String)> = Vec::new();
    for (index, element) in elements.iter().enumerate() {
        let name = element
            .get("name")
            .and_then(|v| v.as_str())
            .or_else(|| {
                element
                    .get("item")
                    .and_then(|item| item.get("name"))
                    .and_then(|v| v.as_str())
            })
            .map(str::trim);
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            continue;
        };
        #[allow(clippy::cast_possible_wrap)]
        let position = element
            .get("position")
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(index as i64);
        entries.push((position, name.to_string()));
    }

    entries.sort_by_key(|(position, _)| *position);
    entries.into_iter().map(|(_, name)| name).collect()
}

// ---------------------------------------------------------------------------
// Strategy 2: microdata
// ---------------------------------------------------------------------------

/// `itemtype="…BreadcrumbList"` microdata names.
pub fn microdata_breadcrumbs(doc: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("[itemtype*=\"BreadcrumbList\"] [itemprop=\"name\"]")
    else {
        return Vec::new();
    };
    doc.root_element()
        .select(&selector)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Strategy 3: DOM selectors
// ---------------------------------------------------------------------------

/// First selector producing at least one category-like element wins.
/// Known navigation chrome is filtered; "Home" survives for position
/// zero handling downstream.
pub fn dom_breadcrumbs(doc: &Html, selectors: &[&str]) -> Vec<String> {
    for raw_selector in selectors {
        let Ok(selector) = Selector::parse(raw_selector) else {
            continue;
        };
        let texts: Vec<String> = doc
            .root_element()
            .select(&selector)
            .map(element_text)
            .filter(|t| is_category_like(t) || t.eq_ignore_ascii_case("home"))
            .collect();
        if !texts.is_empty() {
            return texts;
        }
    }
    Vec::new()
}

fn element_text(element: scraper::ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Strategy 4: embedded JS patterns
// ---------------------------------------------------------------------------

/// Scan script bodies for breadcrumb-shaped JSON fragments:
/// `"breadcrumbs": […]`, `"categoryPath": "A > B"`,
/// `"categoryName": "…"`, `"category": "…"`.
pub fn script_json_breadcrumbs(body: &str) -> Vec<String> {
    static ARRAY_RE: OnceLock<Regex> = OnceLock::new();
    let array_re = ARRAY_RE.get_or_init(|| {
        Regex::new(r#""breadcrumbs?"\s*:\s*\["#).expect("valid regex")
    });
    for m in array_re.find_iter(body) {
        let from_bracket = &body[m.end() - 1..];
        if let Some(array_str) = extract_balanced(from_bracket, '[', ']') {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(array_str) {
                let names = names_from_value(&value);
                if !names.is_empty() {
                    return names;
                }
            }
        }
    }

    static PATH_RE: OnceLock<Regex> = OnceLock::new();
    let path_re = PATH_RE.get_or_init(|| {
        Regex::new(r#""categoryPath"\s*:\s*"([^"]+)""#).expect("valid regex")
    });
    if let Some(cap) = path_re.captures(body) {
        let names = split_category_string(&cap[1]);
        if !names.is_empty() {
            return names;
        }
    }

    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    let name_re = NAME_RE.get_or_init(|| {
        Regex::new(r#""categoryName"\s*:\s*"([^"]+)""#).expect("valid regex")
    });
    if let Some(cap) = name_re.captures(body) {
        let name = cap[1].trim().to_string();
        if !name.is_empty() {
            return vec![name];
        }
    }

    static CATEGORY_RE: OnceLock<Regex> = OnceLock::new();
    let category_re = CATEGORY_RE.get_or_init(|| {
        Regex::new(r#""category"\s*:\s*"([^"]+)""#).expect("valid regex")
    });
    if let Some(cap) = category_re.captures(body) {
        let names = split_category_string(&cap[1]);
        if !names.is_empty() {
            return names;
        }
    }

    Vec::new()
}

// ---------------------------------------------------------------------------
// Strategy 5: window state
// ---------------------------------------------------------------------------

const STATE_MARKERS: &[&str] = &[
    "window.__INITIAL_STATE__",
    "window.__PRELOADED_STATE__",
    "__NEXT_DATA__",
];

/// Parse embedded page state and pull breadcrumbs out of it.
///
/// With `key_path` (dotted, e.g. `bop.details.data.bopData.breadcrumbs`)
/// the walk is exact; without it the state is searched recursively for
/// the usual breadcrumb/category keys.
pub fn window_state_breadcrumbs(body: &str, key_path: Option<&str>) -> Vec<String> {
    for marker in STATE_MARKERS {
        let mut search_from = 0;
        while let Some(found) = body[search_from..].find(marker) {
            let marker_at = search_from + found;
            let after = &body[marker_at + marker.len()..];
            search_from = marker_at + marker.len();

            let Some(brace_offset) = after.find('{') else {
                continue;
            };
            // State assignments put the object right after `=` (or, for
            // __NEXT_DATA__ script tags, right after the tag close).
            if after[..brace_offset].len() > 120 {
                continue;
            }
            let Some(object_str) = extract_balanced(&after[brace_offset..], '{', '}') else {
                continue;
            };
            let Ok(state) = serde_json::from_str::<serde_json::Value>(object_str) else {
                continue;
            };

            let names = match key_path {
                Some(path) => names_from_value(walk_path(&state, path).unwrap_or(&serde_json::Value::Null)),
                None => search_state(&state, 0),
            };
            if !names.is_empty() {
                return names;
            }
        }
    }
    Vec::new()
}

fn walk_path<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let mut current = value;
    for key in path.split('.') {
        current = current.get(key)?;
    }
    Some(current)
}

/// Depth-limited recursive search for breadcrumb-ish keys.
fn search_state(value: &serde_json::Value, depth: usize) -> Vec<String> {
    if depth > 8 {
        return Vec::new();
    }
    let Some(object) = value.as_object() else {
        return Vec::new();
    };

    for key in STATE_KEYS {
        if let Some(candidate) = object.get(*key) {
            let names = names_from_value(candidate);
            if names.len() > 1 || (!names.is_empty() && *key != "category") {
                return names;
            }
        }
    }

    for nested in object.values() {
        match nested {
            serde_json::Value::Object(_) => {
                let names = search_state(nested, depth + 1);
                if !names.is_empty() {
                    return names;
                }
            }
            serde_json::Value::Array(items) => {
                for item in items {
                    let names = search_state(item, depth + 1);
                    if !names.is_empty() {
                        return names;
                    }
                }
            }
            _ => {}
        }
    }

    Vec::new()
}

// ---------------------------------------------------------------------------
// Strategy 6: meta tags
// ---------------------------------------------------------------------------

/// `<meta name|property|itemprop="breadcrumb|category">` content.
pub fn meta_breadcrumbs(doc: &Html) -> Vec<String> {
    const META_SELECTORS: &[&str] = &[
        "meta[name=\"breadcrumb\"]",
        "meta[name=\"breadcrumbs\"]",
        "meta[property=\"breadcrumb\"]",
        "meta[itemprop=\"breadcrumb\"]",
        "meta[name=\"category\"]",
        "meta[property=\"category\"]",
        "meta[itemprop=\"category\"]",
    ];
    for raw_selector in META_SELECTORS {
        let Ok(selector) = Selector::parse(raw_selector) else {
            continue;
        };
        for element in doc.root_element().select(&selector) {
            if let Some(content) = element.value().attr("content") {
                let names = split_category_string(content);
                if !names.is_empty() {
                    return names;
                }
            }
        }
    }
    Vec::new()
}

// ---------------------------------------------------------------------------
// Strategy 7: title heuristic
// ---------------------------------------------------------------------------

/// For `Product | Category | Site`-shaped titles, keep the intermediate
/// segments. Needs at least three segments to tell categories apart
/// from the product and site names.
pub fn title_breadcrumbs(doc: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("title") else {
        return Vec::new();
    };
    let Some(title) = doc.root_element().select(&selector).next() else {
        return Vec::new();
    };
    let text = element_text(title);

    let separator = if text.contains('|') {
        '|'
    } else if text.contains(':') {
        ':'
    } else {
        return Vec::new();
    };

    let segments: Vec<&str> = text.split(separator).map(str::trim).collect();
    if segments.len() < 3 {
        return Vec::new();
    }

    segments[1..segments.len() - 1]
        .iter()
        .filter(|s| is_category_like(s))
        .map(|s| (*s).to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Strategy 8: URL path inference (opt-in per retailer)
// ---------------------------------------------------------------------------

/// Infer categories from the URL path. Only called for retailers whose
/// URLs actually carry their taxonomy; fabricating categories from
/// opaque paths is worse than returning nothing.
pub fn url_path_breadcrumbs(url: &str) -> Vec<String> {
    let Ok(parsed) = url::Url::parse(url) else {
        return Vec::new();
    };
    let Some(segments) = parsed.path_segments() else {
        return Vec::new();
    };

    let mut crumbs = Vec::new();
    for segment in segments {
        let segment = segment.trim().to_lowercase();
        if segment.is_empty() {
            continue;
        }
        if URL_FILLER_SEGMENTS.contains(&segment.as_str()) {
            continue;
        }
        // Product ids and slugs with embedded ids.
        if segment.chars().any(|c| c.is_ascii_digit()) {
            continue;
        }

        if let Some((_, rewrite)) = URL_SLUG_REWRITES.iter().find(|(slug, _)| *slug == segment) {
            crumbs.push((*rewrite).to_string());
        } else {
            crumbs.push(title_case_slug(&segment));
        }
    }
    crumbs
}

fn title_case_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Split a delimited category string on `>`, `/`, or `|`.
pub fn split_category_string(raw: &str) -> Vec<String> {
    let delimiter = ['>', '/', '|']
        .into_iter()
        .find(|d| raw.contains(*d));

    let parts: Vec<String> = match delimiter {
        Some(d) => raw.split(d).map(|s| s.trim().to_string()).collect(),
        None => vec![raw.trim().to_string()],
    };
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Extract a balanced `open…close` region from the start of `s`,
/// respecting string literals and escapes. Returns the shortest
/// complete prefix, or `None` if unterminated.
pub fn extract_balanced(s: &str, open: char, close: char) -> Option<&str> {
    if !s.starts_with(open) {
        return None;
    }
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
                if depth < 0 {
                    return None;
                }
            }
            // A mismatched closer of the other bracket kind inside the
            // region means malformed input.
            '}' | ']' => depth -= 1,
            '{' | '[' => depth += 1,
            _ => {}
        }
    }
    None
}

/// Turn a JSON value into breadcrumb names: arrays of strings, arrays
/// of `{name|label|title|text}` objects, or a delimited string.
pub fn names_from_value(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::String(s) => split_category_string(s),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => {
                    let t = s.trim();
                    (!t.is_empty()).then(|| t.to_string())
                }
                serde_json::Value::Object(obj) => ["name", "label", "title", "text"]
                    .iter()
                    .find_map(|key| obj.get(*key).and_then(|v| v.as_str()))
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
