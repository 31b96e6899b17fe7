//! User-agent pool.
//!
//! A curated list of current desktop and mobile browser UAs. Selection
//! is uniform random and stateless; callers that go on to synthesize
//! `sec-ch-ua` client hints should use [`pick_chrome_like`] so the hints
//! stay consistent with the UA string.

use rand::seq::SliceRandom;
use rand::Rng;

pub const DESKTOP_UAS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:135.0) Gecko/20100101 Firefox/135.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:134.0) Gecko/20100101 Firefox/134.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.2 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36 Edg/133.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

pub const MOBILE_UAS: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 18_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.2 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 14; SM-S921B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Mobile Safari/537.36",
];

/// Pick one UA from the combined desktop/mobile pool.
#[must_use]
pub fn pick() -> &'static str {
    let mut rng = rand::thread_rng();
    // Desktop-weighted: mobile UAs draw attention on grocery sites that
    // would redirect to an app banner.
    if rng.gen_bool(0.85) {
        DESKTOP_UAS.choose(&mut rng).copied().unwrap_or(DESKTOP_UAS[0])
    } else {
        MOBILE_UAS.choose(&mut rng).copied().unwrap_or(MOBILE_UAS[0])
    }
}

/// Pick a Chrome-family UA for flows that synthesize Chrome client hints
/// or sit next to the headless browser.
#[must_use]
pub fn pick_chrome_like() -> &'static str {
    let mut rng = rand::thread_rng();
    let chrome: Vec<&'static str> = DESKTOP_UAS
        .iter()
        .copied()
        .filter(|ua| ua.contains("Chrome/"))
        .collect();
    chrome.choose(&mut rng).copied().unwrap_or(DESKTOP_UAS[0])
}

/// Extract the Chrome major version from a UA string, for `sec-ch-ua`.
#[must_use]
pub fn chrome_major(ua: &str) -> Option<&str> {
    let start = ua.find("Chrome/")? + "Chrome/".len();
    let rest = &ua[start..];
    let end = rest.find('.')?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_returns_a_known_ua() {
        for _ in 0..50 {
            let ua = pick();
            assert!(
                DESKTOP_UAS.contains(&ua) || MOBILE_UAS.contains(&ua),
                "unexpected UA: {ua}"
            );
        }
    }

    #[test]
    fn chrome_like_always_contains_chrome() {
        for _ in 0..50 {
            assert!(pick_chrome_like().contains("Chrome/"));
        }
    }

    #[test]
    fn chrome_major_extraction() {
        assert_eq!(
            chrome_major(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36"
            ),
            Some("132")
        );
        assert_eq!(
            chrome_major("Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:135.0) Gecko/20100101 Firefox/135.0"),
            None
        );
    }
}
