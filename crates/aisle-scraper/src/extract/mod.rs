//! Breadcrumb extractor registry.
//!
//! Maps a retailer id to its extraction cascade and falls back to the
//! universal extractor (every strategy in a sensible order) for
//! retailers without a tuned cascade.

mod retailers;
pub mod strategies;

use aisle_core::profile_for;
use scraper::Html;

use strategies::{
    dom_breadcrumbs, jsonld_breadcrumbs, meta_breadcrumbs, microdata_breadcrumbs,
    script_json_breadcrumbs, title_breadcrumbs, url_path_breadcrumbs, window_state_breadcrumbs,
    DEFAULT_DOM_SELECTORS,
};

/// Raw extractor output: breadcrumb strings plus the tag of the
/// strategy that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub breadcrumbs: Vec<String>,
    pub method: &'static str,
}

impl Extraction {
    #[must_use]
    pub fn new(breadcrumbs: Vec<String>, method: &'static str) -> Self {
        Extraction {
            breadcrumbs,
            method,
        }
    }

    #[must_use]
    pub fn none() -> Self {
        Extraction {
            breadcrumbs: Vec::new(),
            method: "",
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.breadcrumbs.is_empty()
    }
}

type ExtractorFn = fn(&Html, &str, &str) -> Extraction;

/// Registry of tuned cascades. Everything else goes universal.
const REGISTRY: &[(&str, ExtractorFn)] = &[
    ("tesco", retailers::tesco),
    ("sainsburys", retailers::sainsburys),
    ("asda", retailers::asda),
    ("morrisons", retailers::morrisons),
    ("ocado", retailers::ocado),
    ("waitrose", retailers::waitrose),
    ("aldi", retailers::aldi),
    ("lidl", retailers::lidl),
    ("iceland", retailers::iceland),
    ("coop", retailers::coop),
    ("marksandspencer", retailers::marksandspencer),
    ("boots", retailers::boots),
    ("superdrug", retailers::superdrug),
    ("savers", retailers::savers),
    ("poundland", retailers::poundland),
    ("bmstores", retailers::bmstores),
    ("homebargains", retailers::homebargains),
];

/// Run the extraction cascade for a retailer. The tuned cascade is
/// tried first; when it produces nothing the universal cascade runs as
/// a safety net.
#[must_use]
pub fn extract_for(retailer: &str, doc: &Html, body: &str, url: &str) -> Extraction {
    if let Some((_, extractor)) = REGISTRY.iter().find(|(id, _)| *id == retailer) {
        let extraction = extractor(doc, body, url);
        if !extraction.is_empty() {
            return extraction;
        }
    }
    universal(doc, body, url, profile_for(retailer).url_carries_categories)
}

/// The universal cascade: structured data first, then DOM, then
/// script-embedded state, then weak heuristics. URL inference runs only
/// when the retailer's URLs are known to carry categories.
#[must_use]
pub fn universal(doc: &Html, body: &str, url: &str, allow_url_inference: bool) -> Extraction {
    let crumbs = jsonld_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "jsonld");
    }

    let crumbs = microdata_breadcrumbs(doc);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "microdata");
    }

    let crumbs = dom_breadcrumbs(doc, DEFAULT_DOM_SELECTORS);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    let crumbs = script_json_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "script_json");
    }

    let crumbs = window_state_breadcrumbs(body, None);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "window_state");
    }

    let crumbs = meta_breadcrumbs(doc);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "meta");
    }

    let crumbs = title_breadcrumbs(doc);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "title");
    }

    if allow_url_inference {
        let crumbs = url_path_breadcrumbs(url);
        if !crumbs.is_empty() {
            return Extraction::new(crumbs, "url_path");
        }
    }

    Extraction::none()
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
