//! CAPTCHA Controller (§4.7): `Clear -> Paused -> (Resolved | TimedOut)`.
//! The only component allowed to write the session's `captcha_detected`
//! flag once a challenge is confirmed; the browser is never closed while
//! paused.

use std::time::Duration;

use cdp_surface::{BrowserSurface, PageHandle};
use tokio::time::{sleep, Instant};

pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_MAX_WAIT_SECS: u64 = 300;
const CONFIRMATION_DELAY_SECS: u64 = 2;

/// URL fragments that still read as "on a challenge page" even once the
/// selector/phrase probe goes quiet — covers interstitials that linger
/// after the widget itself has been removed from the DOM.
const BLOCKED_URL_FRAGMENTS: &[&str] = &["/sorry/", "captcha", "challenge", "verify"];

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CaptchaState {
    Clear,
    Paused,
    Resolved,
    TimedOut,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum WaitOutcome {
    Resolved,
    TimedOut,
}

pub struct CaptchaController {
    check_interval: Duration,
    max_wait: Duration,
}

impl Default for CaptchaController {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
            max_wait: Duration::from_secs(DEFAULT_MAX_WAIT_SECS),
        }
    }
}

impl CaptchaController {
    pub fn new(check_interval: Duration, max_wait: Duration) -> Self {
        Self { check_interval, max_wait }
    }

    /// Fixed multi-paragraph notification shown when a task enters
    /// `Paused`. Content (remediation options, security reminder) is
    /// policy, not a default — keep stable for downstream consumers that
    /// match on it.
    pub fn notification_message(&self, captcha_url: &str) -> String {
        format!(
            "A verification challenge was detected at:\n{captcha_url}\n\n\
             The browser session has been kept open so a human can complete it. You have three options:\n\
             1. Open the browser window yourself and solve the challenge, then wait — the task will resume \
             automatically once the page clears.\n\
             2. Wait for the challenge to clear on its own, if the site uses a timed interstitial.\n\
             3. Cancel the task if you do not want to complete the challenge.\n\n\
             For your security, never share account credentials or one-time codes with anyone claiming to \
             assist with this challenge on your behalf."
        )
    }

    /// Polls the page until the challenge clears or `max_wait` elapses.
    /// Never closes the browser and never returns early on an internal
    /// error — those are logged and polling continues.
    pub async fn wait_for_resolution(&self, surface: &dyn BrowserSurface, page: &PageHandle) -> WaitOutcome {
        let deadline = Instant::now() + self.max_wait;

        loop {
            if Instant::now() >= deadline {
                tracing::warn!("captcha wait exceeded max_wait_seconds, timing out");
                return WaitOutcome::TimedOut;
            }

            sleep(self.check_interval).await;

            let current_url = match surface.current_url(page).await {
                Ok(url) => url,
                Err(err) => {
                    tracing::debug!(%err, "failed to read url while polling for captcha resolution");
                    continue;
                }
            };

            let has_challenge = challenge_detector::has_challenge(surface, page).await;
            let resolved = !has_challenge && !url_contains_any(&current_url, BLOCKED_URL_FRAGMENTS);
            if !resolved {
                continue;
            }

            // confirmation vote: a single clear read can be a flicker
            // mid-navigation, so re-check once more after a short delay.
            sleep(Duration::from_secs(CONFIRMATION_DELAY_SECS)).await;
            let _ = surface.title(page).await;
            let still_has_challenge = challenge_detector::has_challenge(surface, page).await;
            let confirm_url = surface.current_url(page).await.unwrap_or(current_url);
            if !still_has_challenge && !url_contains_any(&confirm_url, BLOCKED_URL_FRAGMENTS) {
                return WaitOutcome::Resolved;
            }
        }
    }
}

fn url_contains_any(url: &str, fragments: &[&str]) -> bool {
    let lower = url.to_ascii_lowercase();
    fragments.iter().any(|f| lower.contains(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_contains_any_matches_blocked_fragment() {
        assert!(url_contains_any("https://example.com/sorry/index", BLOCKED_URL_FRAGMENTS));
        assert!(url_contains_any("https://example.com/challenge?x=1", BLOCKED_URL_FRAGMENTS));
        assert!(!url_contains_any("https://example.com/results", BLOCKED_URL_FRAGMENTS));
    }

    #[test]
    fn notification_message_contains_url_and_security_reminder() {
        let controller = CaptchaController::default();
        let message = controller.notification_message("https://duckduckgo.com/sorry/");
        assert!(message.contains("https://duckduckgo.com/sorry/"));
        assert!(message.to_ascii_lowercase().contains("credentials"));
    }

    #[test]
    fn default_intervals_match_spec() {
        let controller = CaptchaController::default();
        assert_eq!(controller.check_interval, Duration::from_secs(3));
        assert_eq!(controller.max_wait, Duration::from_secs(300));
    }
}
