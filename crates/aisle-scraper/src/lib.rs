//! Retailer scraping pipeline: rate-limited multi-strategy fetching,
//! per-retailer breadcrumb extraction, normalization, scoring, and the
//! row dispatcher that ties them together.

pub mod block;
pub mod browser;
pub mod cache;
pub mod dispatch;
pub mod emulate;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod limiter;
pub mod normalize;
pub mod proxy;
pub mod render;
pub mod score;
pub mod session;
pub mod types;
pub mod ua;

pub use dispatch::{retailer_from_url, Dispatcher};
pub use error::ScrapeError;
pub use extract::{extract_for, universal, Extraction};
pub use fetch::{Fetcher, FetcherConfig};
pub use normalize::{is_category_like, normalize_breadcrumbs};
pub use proxy::{ProxyLease, ProxyPool, ProxyStats};
pub use render::ExternalRenderer;
pub use score::{score_breadcrumbs, EARLY_STOP_SCORE};
pub use types::{
    ExtractionOutcome, FetchMethod, FetchResult, FetchStatus, OutcomeStatus, RowOutcome,
};
