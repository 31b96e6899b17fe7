//! Per-row orchestration.
//!
//! Phase 1 walks the row's store links in retailer priority order,
//! strictly sequentially, and stops as soon as an outcome reaches the
//! early-stop score. Phase 2 runs only when Phase 1 fell short and only
//! for the retailers this row observed blocked, spending external
//! renderer quota on them in priority order. Problematic retailers are
//! skipped without network I/O.

use std::collections::BTreeMap;
use std::sync::Arc;

use aisle_core::{priority_rank, profile_for, AisleRecord, ProductRow, FAILED_AISLE};
use scraper::Html;

use crate::block;
use crate::extract;
use crate::fetch::Fetcher;
use crate::normalize::normalize_breadcrumbs;
use crate::render::ExternalRenderer;
use crate::score::{score_breadcrumbs, EARLY_STOP_SCORE};
use crate::types::{ExtractionOutcome, FetchStatus, OutcomeStatus, RowOutcome};

pub struct Dispatcher {
    fetcher: Arc<Fetcher>,
    renderer: Option<Arc<ExternalRenderer>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(fetcher: Arc<Fetcher>, renderer: Option<Arc<ExternalRenderer>>) -> Self {
        Dispatcher { fetcher, renderer }
    }

    /// Process one product row through both phases.
    pub async fn process_row(&self, row: &ProductRow) -> RowOutcome {
        let mut outcomes: BTreeMap<String, ExtractionOutcome> = BTreeMap::new();
        let mut blocked: Vec<(String, String)> = Vec::new();
        let mut best: Option<ExtractionOutcome> = None;

        let ordered = order_by_priority(&row.store_links);

        // Phase 1: sequential, priority-ordered, early-stop at the
        // confidence threshold.
        for (retailer, url) in &ordered {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                outcomes.insert(
                    retailer.clone(),
                    ExtractionOutcome::error(retailer, url, "not an http(s) URL".to_string()),
                );
                continue;
            }

            let profile = profile_for(retailer);
            if profile.problematic {
                tracing::debug!(retailer = %retailer, "skipping problematic retailer");
                outcomes.insert(
                    retailer.clone(),
                    ExtractionOutcome::skipped(retailer, url, "problematic retailer"),
                );
                continue;
            }

            let (outcome, was_blocked) = self.annotate_one(retailer, url).await;
            if was_blocked {
                blocked.push((retailer.clone(), url.clone()));
            }

            let stop = outcome.is_success() && outcome.score >= EARLY_STOP_SCORE;
            update_best(&mut best, &outcome);
            outcomes.insert(retailer.clone(), outcome);

            if stop {
                tracing::info!(
                    product_code = %row.product_code,
                    retailer = %retailer,
                    "early stop — confident trail found"
                );
                break;
            }
        }

        // Phase 2: external renderer, only for this row's blocked hosts
        // and only when Phase 1 fell short of the threshold.
        let below_threshold = best.as_ref().map_or(true, |b| b.score < EARLY_STOP_SCORE);
        if below_threshold && !blocked.is_empty() {
            self.run_phase_two(&blocked, &mut outcomes, &mut best).await;
        }

        RowOutcome {
            product_code: row.product_code.clone(),
            per_retailer: outcomes,
            best,
        }
    }

    async fn run_phase_two(
        &self,
        blocked: &[(String, String)],
        outcomes: &mut BTreeMap<String, ExtractionOutcome>,
        best: &mut Option<ExtractionOutcome>,
    ) {
        let Some(renderer) = &self.renderer else {
            return;
        };
        if renderer.is_exhausted() {
            return;
        }

        // Blocked hosts were recorded during Phase 1's priority-ordered
        // walk, so iterating them as-is keeps priority order here too.
        for (retailer, url) in blocked {
            let profile = profile_for(retailer);
            if profile.skip_external_renderer {
                continue;
            }
            if renderer.is_exhausted() {
                break;
            }

            let outcome = self.render_one(renderer, retailer, url).await;
            let stop = outcome.is_success() && outcome.score >= EARLY_STOP_SCORE;
            update_best(best, &outcome);
            outcomes.insert(retailer.clone(), outcome);

            if stop {
                tracing::info!(retailer = %retailer, "phase 2 early stop");
                break;
            }
        }
    }

    /// Fetch, extract, normalize, and score one store link. The second
    /// element reports whether the host was observed blocked.
    async fn annotate_one(&self, retailer: &str, url: &str) -> (ExtractionOutcome, bool) {
        let result = self.fetcher.fetch(url, retailer).await;

        if let Some(body) = &result.body {
            let method = result.method.map_or("", |m| m.as_str());
            let outcome = evaluate_body(retailer, url, body, method);
            return (outcome, false);
        }

        let was_blocked = result.status == FetchStatus::Blocked;
        let profile = profile_for(retailer);

        // An unusable body can still yield a trail when the retailer's
        // URLs carry their taxonomy.
        if result.status == FetchStatus::Empty && profile.url_carries_categories {
            let raw = extract::strategies::url_path_breadcrumbs(url);
            let crumbs = normalize_breadcrumbs(&raw, retailer);
            if crumbs.is_empty() {
                return (
                    ExtractionOutcome {
                        retailer: retailer.to_string(),
                        url: url.to_string(),
                        breadcrumbs: Vec::new(),
                        method: String::new(),
                        score: 0,
                        status: OutcomeStatus::NoBreadcrumbs,
                        debug: "undersized body; url inference empty".to_string(),
                    },
                    was_blocked,
                );
            }
            let score = score_breadcrumbs(&crumbs, retailer);
            return (
                ExtractionOutcome {
                    retailer: retailer.to_string(),
                    url: url.to_string(),
                    breadcrumbs: crumbs,
                    method: "url_path".to_string(),
                    score,
                    status: OutcomeStatus::Success,
                    debug: "undersized body; inferred from url".to_string(),
                },
                was_blocked,
            );
        }

        let debug = format!(
            "fetch failed: {:?} after {}ms",
            result.status,
            result.elapsed.as_millis()
        );
        (
            ExtractionOutcome::fetch_failed(retailer, url, debug),
            was_blocked,
        )
    }

    async fn render_one(
        &self,
        renderer: &ExternalRenderer,
        retailer: &str,
        url: &str,
    ) -> ExtractionOutcome {
        match renderer.render(url).await {
            Ok(body) => {
                // Rendered bodies pass the same validity rule as Phase 1.
                let min_bytes = self.fetcher.config().min_body_bytes;
                if !block::body_is_valid(&body, min_bytes) {
                    return ExtractionOutcome::fetch_failed(
                        retailer,
                        url,
                        "renderer returned a blocked or undersized body".to_string(),
                    );
                }
                evaluate_body(retailer, url, &body, "renderer")
            }
            Err(err) => {
                ExtractionOutcome::fetch_failed(retailer, url, format!("renderer: {err}"))
            }
        }
    }

    /// Diagnostic single-URL run (the `test` CLI command).
    pub async fn annotate_url(&self, url: &str, retailer: Option<&str>) -> ExtractionOutcome {
        let retailer = match retailer {
            Some(r) => aisle_core::normalize_retailer(r),
            None => retailer_from_url(url).unwrap_or_else(|| "unknown".to_string()),
        };
        self.annotate_one(&retailer, url).await.0
    }

    /// Adapt a row's outcomes to the sink contract: exactly one record
    /// per input store link, `FAILED` where no success was produced.
    #[must_use]
    pub fn to_records(row: &ProductRow, outcome: &RowOutcome) -> Vec<AisleRecord> {
        row.store_links
            .iter()
            .map(|(retailer, url)| {
                let aisle = outcome
                    .per_retailer
                    .get(retailer)
                    .filter(|o| o.is_success())
                    .map_or_else(|| FAILED_AISLE.to_string(), ExtractionOutcome::aisle);
                AisleRecord {
                    product_code: row.product_code.clone(),
                    store: retailer.clone(),
                    store_link: url.clone(),
                    aisle,
                }
            })
            .collect()
    }
}

/// Parse, extract, normalize, and score a fetched body.
fn evaluate_body(retailer: &str, url: &str, body: &str, fetch_method: &str) -> ExtractionOutcome {
    let doc = Html::parse_document(body);
    let extraction = extract::extract_for(retailer, &doc, body, url);
    let crumbs = normalize_breadcrumbs(&extraction.breadcrumbs, retailer);

    if crumbs.is_empty() {
        return ExtractionOutcome {
            retailer: retailer.to_string(),
            url: url.to_string(),
            breadcrumbs: Vec::new(),
            method: String::new(),
            score: 0,
            status: OutcomeStatus::NoBreadcrumbs,
            debug: format!("fetched via {fetch_method}; no breadcrumbs extracted"),
        };
    }

    let score = score_breadcrumbs(&crumbs, retailer);
    tracing::debug!(
        retailer,
        url,
        method = extraction.method,
        score,
        trail = %crumbs.join(" > "),
        "extracted breadcrumbs"
    );
    ExtractionOutcome {
        retailer: retailer.to_string(),
        url: url.to_string(),
        breadcrumbs: crumbs,
        method: extraction.method.to_string(),
        score,
        status: OutcomeStatus::Success,
        debug: format!("fetched via {fetch_method}"),
    }
}

/// Order store links by retailer priority; unknown retailers keep their
/// relative (alphabetical map) order after the known ones.
fn order_by_priority(links: &BTreeMap<String, String>) -> Vec<(String, String)> {
    let mut ordered: Vec<(String, String)> = links
        .iter()
        .map(|(r, u)| (r.clone(), u.clone()))
        .collect();
    ordered.sort_by_key(|(retailer, _)| priority_rank(retailer));
    ordered
}

fn update_best(best: &mut Option<ExtractionOutcome>, candidate: &ExtractionOutcome) {
    if !candidate.is_success() {
        return;
    }
    let better = best.as_ref().map_or(true, |b| candidate.score > b.score);
    if better {
        *best = Some(candidate.clone());
    }
}

/// Guess the retailer id from a product URL's host.
#[must_use]
pub fn retailer_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    aisle_core::PROFILES
        .iter()
        .find(|p| {
            url::Url::parse(p.home_url)
                .ok()
                .and_then(|h| h.host_str().map(str::to_string))
                .is_some_and(|profile_host| {
                    let trimmed = profile_host.trim_start_matches("www.").to_string();
                    host.trim_start_matches("www.").ends_with(&trimmed)
                        || host.contains(p.id)
                })
        })
        .map(|p| p.id.to_string())
}
