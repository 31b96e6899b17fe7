//! Retailer-specific extraction cascades.
//!
//! Each retailer runs a short, site-tuned cascade over the shared
//! strategies; the first strategy returning non-empty breadcrumbs wins.
//! Selector lists and state paths come from observed page structure and
//! only exist where the universal order performs worse.

use scraper::Html;

use super::strategies::{
    dom_breadcrumbs, jsonld_breadcrumbs, meta_breadcrumbs, script_json_breadcrumbs,
    title_breadcrumbs, url_path_breadcrumbs, window_state_breadcrumbs, DEFAULT_DOM_SELECTORS,
};
use super::Extraction;

pub(super) fn tesco(doc: &Html, body: &str, _url: &str) -> Extraction {
    let crumbs = jsonld_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "jsonld");
    }

    let crumbs = dom_breadcrumbs(
        doc,
        &[".breadcrumbs ol li a", "nav[aria-label=\"breadcrumbs\"] a"],
    );
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    let crumbs = script_json_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "script_json");
    }

    Extraction::none()
}

pub(super) fn sainsburys(doc: &Html, body: &str, _url: &str) -> Extraction {
    let crumbs = jsonld_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "jsonld");
    }

    let crumbs = window_state_breadcrumbs(body, None);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "window_state");
    }

    let crumbs = dom_breadcrumbs(
        doc,
        &[
            "nav.ln-c-breadcrumbs a",
            ".breadcrumb__list a",
            ".pd__breadcrumbs a",
        ],
    );
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    Extraction::none()
}

/// The breadcrumb trail arrives inside client-rendered page state at a
/// fixed path; the DOM rarely has it server-side.
pub(super) fn asda(doc: &Html, body: &str, _url: &str) -> Extraction {
    let crumbs = window_state_breadcrumbs(body, Some("bop.details.data.bopData.breadcrumbs"));
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "window_state");
    }

    let crumbs = window_state_breadcrumbs(body, None);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "window_state");
    }

    let crumbs = script_json_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "script_json");
    }

    let crumbs = dom_breadcrumbs(doc, &["div.breadcrumb a", ".asda-breadcrumb a"]);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    Extraction::none()
}

pub(super) fn morrisons(doc: &Html, body: &str, _url: &str) -> Extraction {
    let crumbs = dom_breadcrumbs(
        doc,
        &[".bob-breadcrumb a", "ul[data-test=\"breadcrumb\"] a"],
    );
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    let crumbs = jsonld_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "jsonld");
    }

    let crumbs = script_json_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "script_json");
    }

    Extraction::none()
}

pub(super) fn ocado(doc: &Html, body: &str, _url: &str) -> Extraction {
    let crumbs = jsonld_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "jsonld");
    }

    let crumbs = dom_breadcrumbs(
        doc,
        &[".bop-breadcrumbs a", "nav[aria-label=\"breadcrumb\"] li a"],
    );
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    let crumbs = script_json_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "script_json");
    }

    Extraction::none()
}

pub(super) fn waitrose(doc: &Html, body: &str, _url: &str) -> Extraction {
    let crumbs = jsonld_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "jsonld");
    }

    let crumbs = dom_breadcrumbs(doc, &["[data-testid=\"breadcrumbs\"] a"]);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    let crumbs = window_state_breadcrumbs(body, None);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "window_state");
    }

    Extraction::none()
}

pub(super) fn aldi(doc: &Html, body: &str, _url: &str) -> Extraction {
    let crumbs = dom_breadcrumbs(doc, &[".breadcrumb-list a", DEFAULT_DOM_SELECTORS[3]]);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    let crumbs = jsonld_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "jsonld");
    }

    Extraction::none()
}

pub(super) fn lidl(doc: &Html, body: &str, _url: &str) -> Extraction {
    let crumbs = jsonld_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "jsonld");
    }

    let crumbs = dom_breadcrumbs(doc, DEFAULT_DOM_SELECTORS);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    let crumbs = meta_breadcrumbs(doc);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "meta");
    }

    Extraction::none()
}

pub(super) fn iceland(doc: &Html, body: &str, _url: &str) -> Extraction {
    let crumbs = jsonld_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "jsonld");
    }

    let crumbs = dom_breadcrumbs(doc, &[".breadcrumb li a", DEFAULT_DOM_SELECTORS[0]]);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    let crumbs = script_json_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "script_json");
    }

    Extraction::none()
}

pub(super) fn coop(doc: &Html, body: &str, _url: &str) -> Extraction {
    let crumbs = jsonld_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "jsonld");
    }

    let crumbs = dom_breadcrumbs(doc, DEFAULT_DOM_SELECTORS);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    Extraction::none()
}

pub(super) fn marksandspencer(doc: &Html, body: &str, _url: &str) -> Extraction {
    let crumbs = jsonld_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "jsonld");
    }

    let crumbs = dom_breadcrumbs(doc, &["nav[aria-label=\"Breadcrumb\"] a"]);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    let crumbs = title_breadcrumbs(doc);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "title");
    }

    Extraction::none()
}

/// Health/beauty retailers carry the full taxonomy in the product URL,
/// so URL inference leads the cascade.
pub(super) fn boots(doc: &Html, body: &str, url: &str) -> Extraction {
    let crumbs = url_path_breadcrumbs(url);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "url_path");
    }

    let crumbs = jsonld_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "jsonld");
    }

    let crumbs = dom_breadcrumbs(doc, DEFAULT_DOM_SELECTORS);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    Extraction::none()
}

pub(super) fn superdrug(doc: &Html, body: &str, url: &str) -> Extraction {
    let crumbs = url_path_breadcrumbs(url);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "url_path");
    }

    let crumbs = jsonld_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "jsonld");
    }

    let crumbs = dom_breadcrumbs(doc, &[".breadcrumbs__list a", DEFAULT_DOM_SELECTORS[4]]);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    Extraction::none()
}

pub(super) fn savers(doc: &Html, _body: &str, url: &str) -> Extraction {
    let crumbs = url_path_breadcrumbs(url);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "url_path");
    }

    let crumbs = dom_breadcrumbs(doc, DEFAULT_DOM_SELECTORS);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    Extraction::none()
}

pub(super) fn poundland(doc: &Html, body: &str, _url: &str) -> Extraction {
    let crumbs = dom_breadcrumbs(doc, DEFAULT_DOM_SELECTORS);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    let crumbs = jsonld_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "jsonld");
    }

    Extraction::none()
}

pub(super) fn bmstores(doc: &Html, body: &str, url: &str) -> Extraction {
    let crumbs = dom_breadcrumbs(doc, DEFAULT_DOM_SELECTORS);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    let crumbs = jsonld_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "jsonld");
    }

    let crumbs = url_path_breadcrumbs(url);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "url_path");
    }

    Extraction::none()
}

pub(super) fn homebargains(doc: &Html, body: &str, _url: &str) -> Extraction {
    let crumbs = jsonld_breadcrumbs(body);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "jsonld");
    }

    let crumbs = dom_breadcrumbs(doc, DEFAULT_DOM_SELECTORS);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "dom");
    }

    let crumbs = title_breadcrumbs(doc);
    if !crumbs.is_empty() {
        return Extraction::new(crumbs, "title");
    }

    Extraction::none()
}
