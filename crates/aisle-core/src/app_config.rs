use std::path::PathBuf;

/// Upstream proxy credentials (host/port/user/pass, Bright Data style).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl ProxyCredentials {
    /// Proxy URL in the form `http://host:port`. Credentials are handed
    /// to the HTTP client separately.
    #[must_use]
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Assembled Postgres URL. `None` when running preview-only without
    /// database credentials in the environment.
    pub database_url: Option<String>,
    /// Skip all database writes when set (`PREVIEW_ONLY`).
    pub preview_only: bool,
    /// Path of the CSV preview file written after a run.
    pub preview_path: PathBuf,
    pub log_level: String,
    /// Primary upstream proxy, if configured.
    pub proxy: Option<ProxyCredentials>,
    /// Additional proxies from `AISLE_EXTRA_PROXIES`.
    pub extra_proxies: Vec<ProxyCredentials>,
    /// API key for the external rendering service. `None` disables the
    /// second acquisition phase entirely.
    pub render_api_key: Option<String>,
    /// Daily request budget for the rendering service.
    pub render_daily_quota: u32,
    /// Run the fallback browser with a visible window (diagnostic aid
    /// for the strictest retailer).
    pub ocado_headful: bool,
    pub max_concurrent_rows: usize,
    pub request_timeout_secs: u64,
    pub min_body_bytes: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("preview_only", &self.preview_only)
            .field("preview_path", &self.preview_path)
            .field("log_level", &self.log_level)
            .field("proxy", &self.proxy.as_ref().map(|p| p.server_url()))
            .field("extra_proxies", &self.extra_proxies.len())
            .field(
                "render_api_key",
                &self.render_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("render_daily_quota", &self.render_daily_quota)
            .field("ocado_headful", &self.ocado_headful)
            .field("max_concurrent_rows", &self.max_concurrent_rows)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("min_body_bytes", &self.min_body_bytes)
            .finish()
    }
}
