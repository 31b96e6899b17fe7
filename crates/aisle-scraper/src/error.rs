use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("emulated client error: {0}")]
    Emulation(#[from] wreq::Error),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("blocked by {host}")]
    Blocked { host: String },

    #[error("empty or undersized body from {url} ({bytes} bytes)")]
    EmptyBody { url: String, bytes: usize },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("render API daily quota exhausted")]
    RenderQuotaExhausted,

    #[error("render API error: status {status}")]
    RenderApi { status: u16 },

    #[error("invalid product URL \"{url}\"")]
    InvalidUrl { url: String },
}

impl ScrapeError {
    /// True when the failure indicates bot mitigation rather than a
    /// transport or data problem.
    #[must_use]
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            ScrapeError::Blocked { .. }
                | ScrapeError::UnexpectedStatus {
                    status: 403 | 429 | 503,
                    ..
                }
        )
    }
}
