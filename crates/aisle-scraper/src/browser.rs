//! Headless-browser acquisition strategy.
//!
//! Launches a fresh Chrome per invocation (crash isolation — a wedged
//! browser from one fetch must not leak into the next), optionally
//! warms up through homepage and section pages, waits for the document
//! to settle plus a randomized human-ish pause, and captures the DOM.
//! The sync `headless_chrome` API runs on the blocking pool.

use std::time::Duration;

use aisle_core::RetailerProfile;
use headless_chrome::{Browser, LaunchOptions};
use rand::Rng;

use crate::error::ScrapeError;
use crate::ua;

const BROWSER_DEADLINE: Duration = Duration::from_secs(45);

/// Fetch `url` with a headless browser and return the settled DOM.
///
/// # Errors
///
/// Returns [`ScrapeError::Browser`] for launch/navigation failures or
/// when the deadline expires.
pub async fn fetch_with_browser(
    url: &str,
    profile: &RetailerProfile,
    headful: bool,
) -> Result<String, ScrapeError> {
    let url = url.to_string();
    let home_url = profile.home_url.to_string();
    let warmup_path = profile.warmup_path.map(str::to_string);

    let task = tokio::task::spawn_blocking(move || -> Result<String, String> {
        let browser = Browser::new(LaunchOptions {
            headless: !headful,
            ..Default::default()
        })
        .map_err(|e| e.to_string())?;

        let tab = browser.new_tab().map_err(|e| e.to_string())?;
        tab.set_user_agent(ua::pick_chrome_like(), Some("en-GB,en;q=0.9"), None)
            .map_err(|e| e.to_string())?;

        // Strict sites interstitial direct product hits; walk in through
        // the homepage and a section page first.
        if let Some(section) = warmup_path {
            if !home_url.is_empty() {
                let _ = tab
                    .navigate_to(&home_url)
                    .and_then(|t| t.wait_until_navigated());
                pause_between(600, 1500);
                let section_url = format!("{}{}", home_url.trim_end_matches('/'), section);
                let _ = tab
                    .navigate_to(&section_url)
                    .and_then(|t| t.wait_until_navigated());
                pause_between(600, 1500);
            }
        }

        tab.navigate_to(&url).map_err(|e| e.to_string())?;
        tab.wait_until_navigated().map_err(|e| e.to_string())?;

        // The DOM keeps assembling after document-ready on these sites.
        let settle_secs = rand::thread_rng().gen_range(3.0..12.0);
        std::thread::sleep(Duration::from_secs_f64(settle_secs));

        tab.get_content().map_err(|e| e.to_string())
    });

    match tokio::time::timeout(BROWSER_DEADLINE, task).await {
        Ok(Ok(Ok(body))) => Ok(body),
        Ok(Ok(Err(message))) => Err(ScrapeError::Browser(message)),
        Ok(Err(join_err)) => Err(ScrapeError::Browser(join_err.to_string())),
        Err(_) => Err(ScrapeError::Browser(format!(
            "deadline of {}s expired",
            BROWSER_DEADLINE.as_secs()
        ))),
    }
}

fn pause_between(min_ms: u64, max_ms: u64) {
    let ms = rand::thread_rng().gen_range(min_ms..max_ms);
    std::thread::sleep(Duration::from_millis(ms));
}
