//! Per-retailer request spacing.
//!
//! Every outbound request waits until at least `delay × jitter` has
//! passed since the previous request to the same retailer, where jitter
//! is drawn from `Uniform(0.5, 2.5)`. A small fraction of requests get
//! an extra multi-second "reading pause". Retailers flagged
//! `strict_rate_limit` also get sliding-window cooling: too many
//! requests inside a ten-minute window forces a long pause and resets
//! the window.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use aisle_core::RetailerProfile;
use rand::Rng;

const READING_PAUSE_CHANCE: f64 = 0.08;
const STRICT_WINDOW_LEN: usize = 8;
const STRICT_WINDOW_SPAN: Duration = Duration::from_secs(600);

#[derive(Debug, Default)]
pub struct RateLimiter {
    /// Retailer id → the instant its next request slot becomes free.
    next_slot: Mutex<HashMap<String, Instant>>,
    /// Request timestamps for strict retailers.
    strict_windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until a request to `profile`'s host is allowed. Reserves the
    /// next slot before sleeping, so concurrent callers queue instead of
    /// stampeding.
    pub async fn wait(&self, retailer: &str, profile: &RetailerProfile) {
        let mut pause = Duration::ZERO;

        let spacing = {
            let mut rng = rand::thread_rng();
            let jitter: f64 = rng.gen_range(0.5..2.5);
            let mut spacing = Duration::from_secs_f64(profile.default_delay_secs * jitter);
            if rng.gen_bool(READING_PAUSE_CHANCE) {
                spacing += Duration::from_secs_f64(rng.gen_range(2.0..5.0));
            }
            spacing
        };

        {
            let now = Instant::now();
            let mut slots = self
                .next_slot
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let slot = slots.entry(retailer.to_string()).or_insert(now);
            if *slot > now {
                pause = *slot - now;
            }
            *slot = now.max(*slot) + spacing;
        }

        if profile.strict_rate_limit {
            pause += self.strict_cooling(retailer);
        }

        if pause > Duration::ZERO {
            tracing::debug!(retailer, pause_ms = pause.as_millis() as u64, "rate-limit wait");
            tokio::time::sleep(pause).await;
        }
    }

    /// Sliding-window cooling for heavily monitored hosts. Returns the
    /// extra pause to apply, if the window is full.
    fn strict_cooling(&self, retailer: &str) -> Duration {
        let mut windows = self
            .strict_windows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let window = windows.entry(retailer.to_string()).or_default();

        let now = Instant::now();
        while window
            .front()
            .is_some_and(|&t| now.duration_since(t) > STRICT_WINDOW_SPAN)
        {
            window.pop_front();
        }
        window.push_back(now);

        if window.len() >= STRICT_WINDOW_LEN {
            window.clear();
            let secs = rand::thread_rng().gen_range(10.0..20.0);
            tracing::info!(retailer, pause_secs = secs as u64, "strict-host cooling pause");
            Duration::from_secs_f64(secs)
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aisle_core::{profile_for, DEFAULT_PROFILE};

    fn quick_profile() -> RetailerProfile {
        let mut p = DEFAULT_PROFILE.clone();
        p.default_delay_secs = 0.05;
        p
    }

    #[tokio::test]
    async fn first_request_passes_immediately() {
        let limiter = RateLimiter::new();
        let profile = quick_profile();
        let start = Instant::now();
        limiter.wait("freshmart", &profile).await;
        // Jitter caps the first-spacing at 2.5 × 50 ms, and the first call
        // should not wait even that long.
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn second_request_waits_for_spacing() {
        let limiter = RateLimiter::new();
        let profile = quick_profile();
        limiter.wait("freshmart", &profile).await;
        let start = Instant::now();
        limiter.wait("freshmart", &profile).await;
        // At minimum 0.5 × 50 ms of spacing applies (ignoring the rare
        // reading pause, which only makes this longer).
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn different_retailers_do_not_interfere() {
        let limiter = RateLimiter::new();
        let profile = quick_profile();
        limiter.wait("freshmart", &profile).await;
        let start = Instant::now();
        limiter.wait("cornershop", &profile).await;
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[test]
    fn strict_window_fills_then_forces_pause() {
        let limiter = RateLimiter::new();
        for _ in 0..(STRICT_WINDOW_LEN - 1) {
            assert_eq!(limiter.strict_cooling("ocado"), Duration::ZERO);
        }
        let pause = limiter.strict_cooling("ocado");
        assert!(pause >= Duration::from_secs(10) && pause <= Duration::from_secs(20));
        // Window was reset by the pause.
        assert_eq!(limiter.strict_cooling("ocado"), Duration::ZERO);
    }

    #[test]
    fn strict_flag_is_wired_to_the_strict_retailer() {
        assert!(profile_for("ocado").strict_rate_limit);
        assert!(!profile_for("tesco").strict_rate_limit);
    }
}
