//! Bot-mitigation detection: known block-page phrases and status codes,
//! plus the body-validity rule shared by both acquisition phases.

/// Phrases that on their own mark a response body as a block/challenge
/// page. Matched case-insensitively against the head of the body. The
/// Cloudflare entry is the full interstitial title: a bare "cloudflare"
/// mention would flag every CDN-fronted retailer page.
pub const BLOCK_INDICATORS: &[&str] = &[
    "access denied",
    "attention required! | cloudflare",
    "/cdn-cgi/challenge-platform/",
    "captcha",
    "pardon the interruption",
    "pardon our interruption",
    "request blocked",
    "are you a robot",
    "verify you are human",
    "unusual traffic",
    "incapsula",
];

/// How much of the body is scanned for block indicators. Challenge pages
/// declare themselves early; scanning further produces false positives
/// from article text.
const SCAN_WINDOW: usize = 2048;

/// True for the statuses bot mitigation answers with.
#[must_use]
pub fn blocked_status(status: u16) -> bool {
    matches!(status, 403 | 429 | 503)
}

/// True when the head of `body` contains a known block indicator.
#[must_use]
pub fn body_shows_block(body: &str) -> bool {
    let limit = body.len().min(SCAN_WINDOW);
    let end = (0..=limit)
        .rev()
        .find(|&i| body.is_char_boundary(i))
        .unwrap_or(0);
    let head = body[..end].to_lowercase();

    if BLOCK_INDICATORS.iter().any(|m| head.contains(m)) {
        return true;
    }

    // "just a moment" shows up in harmless page copy; it only signals a
    // challenge next to a cookie gate or a challenge token.
    let has_just_a_moment = head.contains("just a moment");
    let has_cookie_gate = head.contains("please enable cookies");
    let has_cf_chl = head.contains("cf-chl-");
    has_just_a_moment && (has_cookie_gate || has_cf_chl)
}

/// A body is usable when it is long enough and not a block page.
#[must_use]
pub fn body_is_valid(body: &str, min_bytes: usize) -> bool {
    body.len() >= min_bytes && !body_shows_block(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_block_phrases_case_insensitively() {
        assert!(body_shows_block("<html>Access Denied</html>"));
        assert!(body_shows_block("<html><title>Pardon Our Interruption</title>"));
        assert!(body_shows_block("<title>Attention Required! | Cloudflare</title>"));
        assert!(!body_shows_block("<html><h1>Whole Milk 2L</h1></html>"));
    }

    #[test]
    fn cloudflare_mention_alone_is_not_a_block() {
        assert!(!body_shows_block(
            "<html><footer>Performance and security by Cloudflare</footer></html>"
        ));
    }

    #[test]
    fn just_a_moment_requires_a_challenge_companion() {
        assert!(!body_shows_block("<p>Just a moment while we load your basket.</p>"));
        assert!(body_shows_block(
            "<title>Just a moment...</title><p>Please enable cookies and reload.</p>"
        ));
        assert!(body_shows_block(
            "<title>Just a moment...</title><script src=\"/x/cf-chl-bypass.js\"></script>"
        ));
    }

    #[test]
    fn indicator_outside_scan_window_is_ignored() {
        let mut body = "x".repeat(SCAN_WINDOW + 10);
        body.push_str("captcha");
        assert!(!body_shows_block(&body));
    }

    #[test]
    fn blocked_statuses() {
        for status in [403, 429, 503] {
            assert!(blocked_status(status));
        }
        for status in [200, 301, 404, 500] {
            assert!(!blocked_status(status));
        }
    }

    #[test]
    fn validity_requires_size_and_clean_head() {
        let good = format!("<html>{}</html>", "p".repeat(600));
        assert!(body_is_valid(&good, 500));
        assert!(!body_is_valid("<html>tiny</html>", 500));
        let blocked = format!("<html>access denied{}</html>", "p".repeat(600));
        assert!(!body_is_valid(&blocked, 500));
    }

    #[test]
    fn scan_window_respects_multibyte_boundaries() {
        let mut body = "é".repeat(SCAN_WINDOW);
        body.push_str("captcha");
        // Must not panic on a non-ASCII boundary.
        let _ = body_shows_block(&body);
    }
}
