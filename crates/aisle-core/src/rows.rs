//! Product rows and the tolerant store-links cell parser.
//!
//! The store-links column is free text that has been through several
//! export/import round trips: proper JSON, single-quoted dict literals,
//! doubled braces, stray wrapping quotes, and truncated fragments all
//! occur. Parsing is an ordered set of attempts with explicit
//! fallthrough; the function is total and never panics.

use std::collections::BTreeMap;

use regex::Regex;

use crate::retailers::normalize_retailer;

/// Literal written to the sink when a store link produced no breadcrumbs.
pub const FAILED_AISLE: &str = "FAILED";

/// One input row: a product code and its per-retailer product URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub product_code: String,
    /// Normalized retailer id → product URL.
    pub store_links: BTreeMap<String, String>,
}

/// One sink record, keyed by `(product_code, store)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AisleRecord {
    pub product_code: String,
    pub store: String,
    pub store_link: String,
    /// Joined breadcrumb trail, or [`FAILED_AISLE`].
    pub aisle: String,
}

/// Parse a store-links cell into `{retailer id → URL}`.
///
/// Attempts, in order: strict JSON (after brace/quote cleanup), a
/// quote-repaired dict literal, then regex recovery of
/// `'store': {'store_link': 'http…'}` fragments from truncated input.
/// Returns `None` when nothing parseable remains.
#[must_use]
pub fn parse_store_links(raw: &str) -> Option<BTreeMap<String, String>> {
    let cleaned = cleanup_cell(raw);
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&cleaned) {
        return Some(links_from_value(&value));
    }

    let repaired = python_literal_to_json(&cleaned);
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&repaired) {
        let links = links_from_value(&value);
        if !links.is_empty() {
            return Some(links);
        }
    }

    let links = recover_link_fragments(raw);
    if links.is_empty() {
        None
    } else {
        Some(links)
    }
}

/// Strip stray wrapping quotes and collapse doubled braces.
fn cleanup_cell(raw: &str) -> String {
    let mut s = raw.trim();

    // Cells exported through CSV sometimes arrive wrapped in one layer of
    // quotes that is not part of the payload.
    while s.len() >= 2 {
        let first = s.chars().next().unwrap_or_default();
        let last = s.chars().last().unwrap_or_default();
        if (first == '"' && last == '"' && !s[1..s.len() - 1].starts_with('{'))
            || (first == '\'' && last == '\'')
        {
            s = s[1..s.len() - 1].trim();
        } else if (first == '"' || first == '\'') && s[1..].starts_with('{') {
            s = s[1..].trim();
        } else if (last == '"' || last == '\'') && s[..s.len() - 1].ends_with('}') {
            s = s[..s.len() - 1].trim();
        } else {
            break;
        }
    }

    let mut out = s.to_string();
    while out.contains("{{") {
        out = out.replace("{{", "{");
    }
    while out.contains("}}") {
        out = out.replace("}}", "}");
    }
    out
}

/// Rewrite a single-quoted dict literal into JSON: single-quoted strings
/// become double-quoted (escaping embedded `"`), and the bare constants
/// `None`/`True`/`False` become their JSON spellings.
fn python_literal_to_json(s: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Outside,
        Single,
        Double,
    }

    let mut out = String::with_capacity(s.len());
    let mut state = State::Outside;
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Outside => match c {
                '\'' => {
                    state = State::Single;
                    out.push('"');
                }
                '"' => {
                    state = State::Double;
                    out.push('"');
                }
                _ => out.push(c),
            },
            State::Single => match c {
                '\\' => {
                    // `\'` unescapes to a plain apostrophe inside JSON.
                    match chars.next() {
                        Some('\'') => out.push('\''),
                        Some(other) => {
                            out.push('\\');
                            out.push(other);
                        }
                        None => out.push('\\'),
                    }
                }
                '"' => out.push_str("\\\""),
                '\'' => {
                    state = State::Outside;
                    out.push('"');
                }
                _ => out.push(c),
            },
            State::Double => match c {
                '\\' => {
                    out.push('\\');
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                '"' => {
                    state = State::Outside;
                    out.push('"');
                }
                _ => out.push(c),
            },
        }
    }

    out.replace(": None", ": null")
        .replace(": True", ": true")
        .replace(": False", ": false")
}

/// Build the retailer → URL map from a parsed JSON object. Values may be
/// plain URL strings or objects carrying a `store_link` key.
fn links_from_value(value: &serde_json::Value) -> BTreeMap<String, String> {
    let mut links = BTreeMap::new();
    let Some(object) = value.as_object() else {
        return links;
    };

    for (store, entry) in object {
        let url = entry
            .as_str()
            .or_else(|| entry.get("store_link").and_then(|v| v.as_str()));
        if let Some(url) = url {
            if url.starts_with("http://") || url.starts_with("https://") {
                links.insert(normalize_retailer(store), url.to_string());
            }
        }
    }
    links
}

/// Last resort for truncated cells: pull out the first
/// `'store': {'store_link': 'http…'}` (or flat `'store': 'http…'`)
/// fragment that survived the truncation. Anything past the first
/// fragment of a mangled cell is not worth trusting.
fn recover_link_fragments(raw: &str) -> BTreeMap<String, String> {
    let nested = Regex::new(
        r"'([^']+)'\s*:\s*\{[^{}]*?'store_link'\s*:\s*'(https?://[^']+)'",
    )
    .expect("valid regex");
    let flat = Regex::new(r"'([^']+)'\s*:\s*'(https?://[^']+)'").expect("valid regex");

    let mut links = BTreeMap::new();
    if let Some(cap) = nested.captures(raw) {
        links.insert(normalize_retailer(&cap[1]), cap[2].to_string());
        return links;
    }
    if let Some(cap) = flat.captures(raw) {
        if &cap[1] != "store_link" {
            links.insert(normalize_retailer(&cap[1]), cap[2].to_string());
        }
    }
    links
}

#[cfg(test)]
#[path = "rows_test.rs"]
mod tests;
