//! Persistent per-retailer HTTP sessions.
//!
//! Each retailer gets a `reqwest::Client` with a cookie jar seeded from
//! random bytes, retailer-aware default headers, and a random UA. A
//! session is replaced after `refresh_interval` checkouts, or when the
//! selected proxy changes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aisle_core::{ProxyCredentials, RetailerProfile};
use rand::Rng;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::ScrapeError;
use crate::ua;

const DEFAULT_REFRESH_INTERVAL: u32 = 10;

#[derive(Debug)]
struct SessionEntry {
    client: reqwest::Client,
    user_agent: String,
    proxy_server: Option<String>,
    requests: u32,
}

/// A checked-out session. Cloning the inner client is cheap (`Arc`).
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub client: reqwest::Client,
    pub user_agent: String,
}

#[derive(Debug)]
pub struct SessionPool {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    refresh_interval: u32,
    timeout: Duration,
}

impl SessionPool {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        SessionPool {
            sessions: Mutex::new(HashMap::new()),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            timeout,
        }
    }

    /// Check out the session for a retailer, building or rotating it as
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying client cannot be
    /// constructed.
    pub fn checkout(
        &self,
        profile: &RetailerProfile,
        proxy: Option<&ProxyCredentials>,
    ) -> Result<SessionHandle, ScrapeError> {
        let proxy_server = proxy.map(ProxyCredentials::server_url);
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let reusable = sessions.get(profile.id).is_some_and(|entry| {
            entry.requests < self.refresh_interval && entry.proxy_server == proxy_server
        });

        if !reusable {
            let user_agent = ua::pick().to_string();
            let client = build_session_client(profile, &user_agent, proxy, self.timeout)?;
            sessions.insert(
                profile.id.to_string(),
                SessionEntry {
                    client,
                    user_agent,
                    proxy_server: proxy_server.clone(),
                    requests: 0,
                },
            );
        }

        let entry = sessions
            .get_mut(profile.id)
            .expect("session inserted above");
        entry.requests += 1;
        Ok(SessionHandle {
            client: entry.client.clone(),
            user_agent: entry.user_agent.clone(),
        })
    }

    /// Drop a retailer's session so the next checkout builds a fresh one
    /// (new UA, new cookies). Used after transport errors.
    pub fn rotate(&self, retailer: &str) {
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(retailer);
    }

    /// Number of checkouts on the current session, for diagnostics.
    #[must_use]
    pub fn session_requests(&self, retailer: &str) -> Option<u32> {
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(retailer)
            .map(|e| e.requests)
    }
}

fn build_session_client(
    profile: &RetailerProfile,
    user_agent: &str,
    proxy: Option<&ProxyCredentials>,
    timeout: Duration,
) -> Result<reqwest::Client, ScrapeError> {
    let jar = Arc::new(Jar::default());
    seed_cookies(&jar, profile);

    let mut builder = reqwest::Client::builder()
        .cookie_provider(Arc::clone(&jar))
        .default_headers(default_headers(profile, user_agent))
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10));

    if let Some(proxy) = proxy {
        builder = builder.proxy(
            reqwest::Proxy::all(proxy.server_url())?
                .basic_auth(&proxy.username, &proxy.password),
        );
    }

    Ok(builder.build()?)
}

/// Pre-populate the jar with plausible first-visit cookies so the first
/// product-page request does not look like a cold client.
fn seed_cookies(jar: &Jar, profile: &RetailerProfile) {
    if profile.home_url.is_empty() {
        return;
    }
    let Ok(home) = url::Url::parse(profile.home_url) else {
        return;
    };
    let Some(host) = home.host_str() else {
        return;
    };
    let domain = host.strip_prefix("www.").unwrap_or(host);

    let mut rng = rand::thread_rng();
    let session_id: u128 = rng.gen();
    let device_id: u64 = rng.gen();

    jar.add_cookie_str(
        &format!("sid={session_id:032x}; Domain=.{domain}; Path=/"),
        &home,
    );
    jar.add_cookie_str(
        &format!("device_id={device_id:016x}; Domain=.{domain}; Path=/"),
        &home,
    );
}

fn default_headers(profile: &RetailerProfile, user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let mut put = |name: &'static str, value: String| {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            headers.insert(name, value);
        }
    };

    put(
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
            .to_string(),
    );
    put("accept-language", "en-GB,en;q=0.9".to_string());
    put("upgrade-insecure-requests", "1".to_string());
    put("sec-fetch-dest", "document".to_string());
    put("sec-fetch-mode", "navigate".to_string());
    put("sec-fetch-site", "same-origin".to_string());
    put("sec-fetch-user", "?1".to_string());

    if !profile.home_url.is_empty() {
        put("referer", profile.home_url.to_string());
        put("origin", profile.home_url.to_string());
    }

    if let Some(major) = ua::chrome_major(user_agent) {
        put(
            "sec-ch-ua",
            format!(
                "\"Chromium\";v=\"{major}\", \"Not(A:Brand\";v=\"99\", \"Google Chrome\";v=\"{major}\""
            ),
        );
        put("sec-ch-ua-mobile", "?0".to_string());
        put("sec-ch-ua-platform", "\"Windows\"".to_string());
    }

    headers
}
