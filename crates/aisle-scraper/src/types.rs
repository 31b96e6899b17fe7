//! Result types flowing between the fetcher, the extractors, and the
//! row dispatcher.

use std::collections::BTreeMap;
use std::time::Duration;

/// Which acquisition strategy produced a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    PlainHttp,
    TlsEmulation,
    Browser,
    Renderer,
    Cache,
}

impl FetchMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FetchMethod::PlainHttp => "plain_http",
            FetchMethod::TlsEmulation => "tls_emulation",
            FetchMethod::Browser => "browser",
            FetchMethod::Renderer => "renderer",
            FetchMethod::Cache => "cache",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Ok,
    Blocked,
    Empty,
    Error,
}

/// Outcome of one URL acquisition (both phases).
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub body: Option<String>,
    pub status: FetchStatus,
    pub method: Option<FetchMethod>,
    pub bytes: usize,
    pub elapsed: Duration,
}

impl FetchResult {
    #[must_use]
    pub fn ok(body: String, method: FetchMethod, elapsed: Duration) -> Self {
        let bytes = body.len();
        FetchResult {
            body: Some(body),
            status: FetchStatus::Ok,
            method: Some(method),
            bytes,
            elapsed,
        }
    }

    #[must_use]
    pub fn failed(status: FetchStatus, elapsed: Duration) -> Self {
        FetchResult {
            body: None,
            status,
            method: None,
            bytes: 0,
            elapsed,
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == FetchStatus::Ok && self.body.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    NoBreadcrumbs,
    FetchFailed,
    Skipped,
    Error,
}

impl OutcomeStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::NoBreadcrumbs => "no_breadcrumbs",
            OutcomeStatus::FetchFailed => "fetch_failed",
            OutcomeStatus::Skipped => "skipped",
            OutcomeStatus::Error => "error",
        }
    }
}

/// Per-retailer extraction outcome for one product row.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub retailer: String,
    pub url: String,
    pub breadcrumbs: Vec<String>,
    /// Short identifier of the winning strategy (`jsonld`, `dom`, …).
    pub method: String,
    pub score: u8,
    pub status: OutcomeStatus,
    pub debug: String,
}

impl ExtractionOutcome {
    #[must_use]
    pub fn skipped(retailer: &str, url: &str, reason: &str) -> Self {
        ExtractionOutcome {
            retailer: retailer.to_string(),
            url: url.to_string(),
            breadcrumbs: Vec::new(),
            method: String::new(),
            score: 0,
            status: OutcomeStatus::Skipped,
            debug: reason.to_string(),
        }
    }

    #[must_use]
    pub fn fetch_failed(retailer: &str, url: &str, debug: String) -> Self {
        ExtractionOutcome {
            retailer: retailer.to_string(),
            url: url.to_string(),
            breadcrumbs: Vec::new(),
            method: String::new(),
            score: 0,
            status: OutcomeStatus::FetchFailed,
            debug,
        }
    }

    #[must_use]
    pub fn error(retailer: &str, url: &str, debug: String) -> Self {
        ExtractionOutcome {
            retailer: retailer.to_string(),
            url: url.to_string(),
            breadcrumbs: Vec::new(),
            method: String::new(),
            score: 0,
            status: OutcomeStatus::Error,
            debug,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    /// Breadcrumbs joined for the sink, e.g. `Fresh Food > Dairy > Milk`.
    #[must_use]
    pub fn aisle(&self) -> String {
        self.breadcrumbs.join(" > ")
    }
}

/// Everything the pipeline produced for one product row.
#[derive(Debug, Clone)]
pub struct RowOutcome {
    pub product_code: String,
    pub per_retailer: BTreeMap<String, ExtractionOutcome>,
    /// Highest-scoring success, if any retailer produced one.
    pub best: Option<ExtractionOutcome>,
}
