//! Second-phase acquisition through a paid rendering API.
//!
//! The provider takes a GET with the target URL, a JS-render toggle, a
//! premium-proxy toggle, and a wait budget, and returns the rendered
//! DOM. Requests count against a daily quota; once the provider answers
//! with a quota status (402/429) the renderer disables itself for the
//! rest of the run.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use crate::error::ScrapeError;

const DEFAULT_ENDPOINT: &str = "https://api.renderhouse.io/v1/";
const RENDER_WAIT_MS: u32 = 4000;
const RENDER_TIMEOUT: Duration = Duration::from_secs(75);

pub struct ExternalRenderer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    quota_remaining: AtomicU32,
    exhausted: AtomicBool,
}

impl ExternalRenderer {
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, daily_quota: u32) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .timeout(RENDER_TIMEOUT)
            .build()?;
        Ok(ExternalRenderer {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.to_string(),
            quota_remaining: AtomicU32::new(daily_quota),
            exhausted: AtomicBool::new(false),
        })
    }

    /// Point the renderer at a different endpoint (tests, self-hosted
    /// gateways).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn quota_remaining(&self) -> u32 {
        self.quota_remaining.load(Ordering::Relaxed)
    }

    /// Render one URL through the provider.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::RenderQuotaExhausted`] once the local budget hits
    ///   zero or the provider reports quota exhaustion; subsequent calls
    ///   fail fast without network I/O.
    /// - [`ScrapeError::RenderApi`] for other non-success statuses.
    /// - [`ScrapeError::Http`] for transport failures.
    pub async fn render(&self, url: &str) -> Result<String, ScrapeError> {
        if self.is_exhausted() {
            return Err(ScrapeError::RenderQuotaExhausted);
        }

        // Reserve one unit of quota; restore nothing on failure — a spent
        // request is spent whether or not it produced a usable body.
        let previous = self.quota_remaining.fetch_update(
            Ordering::Relaxed,
            Ordering::Relaxed,
            |q| q.checked_sub(1),
        );
        if previous.is_err() {
            self.exhausted.store(true, Ordering::Relaxed);
            return Err(ScrapeError::RenderQuotaExhausted);
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("url", url),
                ("js_render", "true"),
                ("premium_proxy", "true"),
                ("wait", &RENDER_WAIT_MS.to_string()),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 402 || status == 429 {
            self.exhausted.store(true, Ordering::Relaxed);
            tracing::warn!(status, "render API reported quota exhaustion");
            return Err(ScrapeError::RenderQuotaExhausted);
        }
        if !response.status().is_success() {
            return Err(ScrapeError::RenderApi { status });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn render_passes_parameters_and_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("js_render", "true"))
            .and(query_param("premium_proxy", "true"))
            .and(query_param("apikey", "key-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>rendered</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let renderer = ExternalRenderer::new("key-1", 10)
            .unwrap()
            .with_endpoint(&server.uri());
        let body = renderer.render("https://www.tesco.com/p/1").await.unwrap();
        assert_eq!(body, "<html>rendered</html>");
        assert_eq!(renderer.quota_remaining(), 9);
    }

    #[tokio::test]
    async fn quota_status_sets_exhausted_and_disables_renderer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let renderer = ExternalRenderer::new("key-1", 10)
            .unwrap()
            .with_endpoint(&server.uri());

        let err = renderer.render("https://www.tesco.com/p/1").await.unwrap_err();
        assert!(matches!(err, ScrapeError::RenderQuotaExhausted));
        assert!(renderer.is_exhausted());

        // Second call must fail fast without reaching the server (the
        // mock's expect(1) enforces this on drop).
        let err = renderer.render("https://www.tesco.com/p/2").await.unwrap_err();
        assert!(matches!(err, ScrapeError::RenderQuotaExhausted));
    }

    #[tokio::test]
    async fn local_quota_runs_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(2)
            .mount(&server)
            .await;

        let renderer = ExternalRenderer::new("key-1", 2)
            .unwrap()
            .with_endpoint(&server.uri());
        renderer.render("https://a.example/1").await.unwrap();
        renderer.render("https://a.example/2").await.unwrap();
        let err = renderer.render("https://a.example/3").await.unwrap_err();
        assert!(matches!(err, ScrapeError::RenderQuotaExhausted));
        assert!(renderer.is_exhausted());
    }

    #[tokio::test]
    async fn non_quota_error_is_typed_and_does_not_exhaust() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let renderer = ExternalRenderer::new("key-1", 10)
            .unwrap()
            .with_endpoint(&server.uri());
        let err = renderer.render("https://a.example/1").await.unwrap_err();
        assert!(matches!(err, ScrapeError::RenderApi { status: 500 }));
        assert!(!renderer.is_exhausted());
    }
}
