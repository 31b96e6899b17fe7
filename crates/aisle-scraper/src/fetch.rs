//! Two-phase page acquisition, Phase 1: rate-limited strategy cascade.
//!
//! Per URL the fetcher waits out the retailer's rate limit, then runs
//! the ordered strategies: plain HTTP → TLS emulation, plus the browser
//! for flagged retailers. Hard hosts get their warm-up navigation
//! inside the TLS-emulation and browser strategies (driven by the
//! profile's `warmup_path`). The first strategy returning a valid,
//! non-blocked body wins and is cached; exhausting every strategy
//! writes a negative cache entry. Phase 2 (the external renderer) is
//! driven by the dispatcher, not here.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use aisle_core::{profile_for, RetailerProfile};

use crate::block;
use crate::browser;
use crate::cache::ResponseCache;
use crate::emulate;
use crate::error::ScrapeError;
use crate::limiter::RateLimiter;
use crate::proxy::ProxyPool;
use crate::session::SessionPool;
use crate::types::{FetchMethod, FetchResult, FetchStatus};

/// Backoff schedule for transport-level micro-retries inside the plain
/// HTTP strategy.
const MICRO_RETRY_BACKOFF_MS: [u64; 3] = [0, 300, 900];

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub min_body_bytes: usize,
    /// Larger floor for browser captures on strict retailers, guarding
    /// against interstitial-only DOMs.
    pub browser_min_body_bytes: usize,
    pub max_attempts: u32,
    pub inter_strategy_delay: Duration,
    pub request_timeout: Duration,
    pub browser_headful: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        FetcherConfig {
            min_body_bytes: 500,
            browser_min_body_bytes: 30_000,
            max_attempts: 2,
            inter_strategy_delay: Duration::from_millis(1500),
            request_timeout: Duration::from_secs(15),
            browser_headful: false,
        }
    }
}

/// Owns every piece of shared fetch state: sessions, rate limiter,
/// proxy stats, the response cache, and the set of retailers observed
/// blocked during the run.
pub struct Fetcher {
    config: FetcherConfig,
    sessions: SessionPool,
    limiter: RateLimiter,
    proxies: ProxyPool,
    cache: ResponseCache,
    blocked: Mutex<HashSet<String>>,
}

impl Fetcher {
    #[must_use]
    pub fn new(config: FetcherConfig, proxies: ProxyPool) -> Self {
        let sessions = SessionPool::new(config.request_timeout);
        Fetcher {
            config,
            sessions,
            limiter: RateLimiter::new(),
            proxies,
            cache: ResponseCache::new(),
            blocked: Mutex::new(HashSet::new()),
        }
    }

    /// Acquire the body of `url` for `retailer`.
    ///
    /// Never returns an error: every failure mode collapses into the
    /// returned [`FetchResult`] so no exception crosses the row boundary.
    pub async fn fetch(&self, url: &str, retailer: &str) -> FetchResult {
        let started = Instant::now();
        let profile = profile_for(retailer);

        if let Some(cached) = self.cache.get(url) {
            return match cached {
                Some(body) => {
                    tracing::debug!(url, retailer, "response cache hit");
                    FetchResult::ok(body, FetchMethod::Cache, started.elapsed())
                }
                None => {
                    tracing::debug!(url, retailer, "negative cache hit");
                    FetchResult::failed(FetchStatus::Error, started.elapsed())
                }
            };
        }

        self.limiter.wait(retailer, profile).await;

        let strategies = self.strategy_order(profile);
        let mut saw_block = false;
        let mut saw_undersized = false;

        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.config.inter_strategy_delay).await;
            }

            for &strategy in &strategies {
                let outcome = self.run_strategy(strategy, url, profile).await;
                match outcome {
                    Ok(body) => {
                        if block::body_shows_block(&body) {
                            tracing::warn!(
                                url,
                                retailer,
                                method = strategy.as_str(),
                                "block indicator in response body"
                            );
                            saw_block = true;
                            self.note_blocked(retailer);
                            continue;
                        }
                        let min_bytes = self.min_bytes_for(strategy, profile);
                        if body.len() < min_bytes {
                            tracing::debug!(
                                url,
                                retailer,
                                method = strategy.as_str(),
                                bytes = body.len(),
                                "body below minimum size"
                            );
                            saw_undersized = true;
                            continue;
                        }
                        self.cache.insert(url, Some(body.clone()));
                        tracing::info!(
                            url,
                            retailer,
                            method = strategy.as_str(),
                            bytes = body.len(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "fetched"
                        );
                        return FetchResult::ok(body, strategy, started.elapsed());
                    }
                    Err(err) => {
                        if err.is_block() {
                            saw_block = true;
                            self.note_blocked(retailer);
                            tracing::warn!(url, retailer, method = strategy.as_str(), error = %err, "blocked");
                        } else {
                            tracing::debug!(url, retailer, method = strategy.as_str(), error = %err, "strategy failed");
                        }
                    }
                }
            }
        }

        self.cache.insert(url, None);
        let status = if saw_block {
            FetchStatus::Blocked
        } else if saw_undersized {
            FetchStatus::Empty
        } else {
            FetchStatus::Error
        };
        FetchResult::failed(status, started.elapsed())
    }

    /// Strategy cascade for a retailer: plain HTTP, then TLS emulation,
    /// then the browser for flagged hosts. The browser is left out when
    /// automation is known to break on the site or when the external
    /// renderer is the host's designated fallback. Hard-host handling
    /// (homepage → section warm-up) lives inside the TLS-emulation and
    /// browser strategies themselves, keyed off the profile's
    /// `warmup_path`.
    fn strategy_order(&self, profile: &RetailerProfile) -> Vec<FetchMethod> {
        let mut order = vec![FetchMethod::PlainHttp, FetchMethod::TlsEmulation];
        if profile.needs_browser_fallback
            && !profile.skip_browser
            && !profile.prefer_external_renderer
        {
            order.push(FetchMethod::Browser);
        }
        order
    }

    fn min_bytes_for(&self, strategy: FetchMethod, profile: &RetailerProfile) -> usize {
        if strategy == FetchMethod::Browser && profile.needs_browser_fallback {
            self.config.browser_min_body_bytes
        } else {
            self.config.min_body_bytes
        }
    }

    async fn run_strategy(
        &self,
        strategy: FetchMethod,
        url: &str,
        profile: &RetailerProfile,
    ) -> Result<String, ScrapeError> {
        let timeout = Duration::from_secs(profile.default_timeout_secs)
            .max(self.config.request_timeout);
        match strategy {
            FetchMethod::PlainHttp => self.plain_http(url, profile, timeout).await,
            FetchMethod::TlsEmulation => emulate::fetch_emulated(url, profile, timeout).await,
            FetchMethod::Browser => {
                browser::fetch_with_browser(url, profile, self.config.browser_headful).await
            }
            FetchMethod::Renderer | FetchMethod::Cache => Err(ScrapeError::InvalidUrl {
                url: url.to_string(),
            }),
        }
    }

    /// Plain HTTP through the retailer's session. Connect/timeout
    /// failures get up to three attempts with backoff and a fresh
    /// session (new UA); the proxy is dropped once it becomes suspect.
    async fn plain_http(
        &self,
        url: &str,
        profile: &RetailerProfile,
        timeout: Duration,
    ) -> Result<String, ScrapeError> {
        let mut proxy_suspect = false;
        let mut last_err: Option<ScrapeError> = None;

        for (retry, &backoff_ms) in MICRO_RETRY_BACKOFF_MS.iter().enumerate() {
            if backoff_ms > 0 {
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
            if retry > 0 {
                self.sessions.rotate(profile.id);
            }

            let lease = if proxy_suspect {
                None
            } else {
                self.proxies.acquire()
            };
            let session = self
                .sessions
                .checkout(profile, lease.as_ref().map(|l| &l.endpoint))?;

            match session.client.get(url).timeout(timeout).send().await {
                Ok(response) => {
                    if let Some(lease) = &lease {
                        self.proxies.report_success(lease);
                    }
                    let status = response.status().as_u16();
                    if !response.status().is_success() {
                        return Err(ScrapeError::UnexpectedStatus {
                            status,
                            url: url.to_string(),
                        });
                    }
                    return Ok(response.text().await?);
                }
                Err(err) => {
                    if let Some(lease) = &lease {
                        self.proxies.report_failure(lease, &err.to_string());
                        proxy_suspect = true;
                    }
                    let transient = err.is_connect() || err.is_timeout();
                    last_err = Some(err.into());
                    if !transient {
                        break;
                    }
                }
            }
        }

        Err(last_err.unwrap_or(ScrapeError::InvalidUrl {
            url: url.to_string(),
        }))
    }

    fn note_blocked(&self, retailer: &str) {
        self.blocked
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(retailer.to_string());
    }

    /// Retailers observed blocked at any point in the run (process-wide
    /// diagnostic; the dispatcher keeps its own per-row snapshot).
    #[must_use]
    pub fn blocked_hosts(&self) -> HashSet<String> {
        self.blocked
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn was_blocked(&self, retailer: &str) -> bool {
        self.blocked
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(retailer)
    }

    #[must_use]
    pub fn proxy_stats(&self) -> Vec<crate::proxy::ProxyStats> {
        self.proxies.stats()
    }

    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    #[must_use]
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }
}
