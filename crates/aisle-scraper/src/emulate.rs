//! TLS-fingerprint-emulating HTTP strategy.
//!
//! Some anti-bot stacks fingerprint the TLS handshake and block generic
//! Rust clients while letting browser fingerprints through. `wreq` with
//! a browser emulation profile presents a consistent handshake, header
//! order, and UA. For retailers with a warm-up path the strategy visits
//! homepage → section → product so the product request arrives with
//! plausible history cookies.

use std::time::Duration;

use aisle_core::RetailerProfile;
use rand::seq::SliceRandom;
use rand::Rng;
use wreq_util::Emulation;

use crate::error::ScrapeError;

const EMULATIONS: &[Emulation] = &[
    Emulation::Chrome133,
    Emulation::Chrome132,
    Emulation::Firefox136,
];

/// Fetch `url` with a browser-emulating client.
///
/// # Errors
///
/// Returns [`ScrapeError::Emulation`] on transport failure and
/// [`ScrapeError::UnexpectedStatus`] for non-2xx answers.
pub async fn fetch_emulated(
    url: &str,
    profile: &RetailerProfile,
    timeout: Duration,
) -> Result<String, ScrapeError> {
    let emulation = {
        let mut rng = rand::thread_rng();
        EMULATIONS
            .choose(&mut rng)
            .copied()
            .unwrap_or(Emulation::Chrome133)
    };

    let client = wreq::Client::builder()
        .emulation(emulation)
        .timeout(timeout)
        .build()?;

    if let Some(section) = profile.warmup_path {
        warm_up(&client, profile.home_url, section).await;
    }

    let response = client.get(url).send().await?;
    let status = response.status().as_u16();
    if !response.status().is_success() {
        return Err(ScrapeError::UnexpectedStatus {
            status,
            url: url.to_string(),
        });
    }

    Ok(response.text().await?)
}

/// Best-effort homepage → section navigation before the product page.
/// Warm-up failures are not fatal; the product request decides.
async fn warm_up(client: &wreq::Client, home_url: &str, section: &str) {
    if home_url.is_empty() {
        return;
    }

    if let Err(err) = client.get(home_url).send().await {
        tracing::debug!(home_url, error = %err, "warm-up homepage visit failed");
        return;
    }

    let pause_ms = rand::thread_rng().gen_range(300..900);
    tokio::time::sleep(Duration::from_millis(pause_ms)).await;

    let section_url = format!("{}{}", home_url.trim_end_matches('/'), section);
    if let Err(err) = client.get(&section_url).send().await {
        tracing::debug!(section_url, error = %err, "warm-up section visit failed");
    }
}
