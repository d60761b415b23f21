//! Small cross-cutting helpers shared by the dispatch paths: waiting for
//! a page to settle after an interactive action, and the ordered
//! in-site search field selector list.

use std::time::Duration;

use cdp_surface::{BrowserSurface, ElementHandle, PageHandle, SurfaceError};

pub const IN_SITE_SEARCH_FIELD_SELECTORS: &[&str] = &[
    "input[type=search]",
    "#searchInput",
    "input[name=q]",
    "input[name=search]",
    "[role=search] input",
];

pub const DEFAULT_ENGINE_SEARCH_FIELD_SELECTORS: &[&str] = &["#searchbox_input", "input[name=q]", "input[type=text]"];

/// Tries each selector in order, returning the first element that becomes
/// ready within `timeout`/`retries`. Mirrors the "ordered selector list"
/// language used throughout §4.8.
pub async fn find_first(
    surface: &dyn BrowserSurface,
    page: &PageHandle,
    selectors: &[&str],
    timeout: Duration,
    retries: u32,
) -> Result<ElementHandle, SurfaceError> {
    let mut last_err = None;
    for selector in selectors {
        match surface.find(page, selector, timeout, retries).await {
            Ok(element) => return Ok(element),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        SurfaceError::new(cdp_surface::SurfaceErrorKind::ElementNotFound).with_hint("no selector in list matched")
    }))
}

/// Polls `document.readyState` until it reports `complete` or `timeout`
/// elapses. Non-fatal on expiry: callers proceed regardless, since the
/// spec treats a stalled network-idle wait as a logged, non-blocking
/// condition.
pub async fn wait_for_settle(surface: &dyn BrowserSurface, page: &PageHandle, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if tokio::time::Instant::now() >= deadline {
            tracing::debug!("page settle wait timed out, continuing anyway");
            return;
        }
        match surface.eval(page, "document.readyState").await {
            Ok(value) if value.as_str() == Some("complete") => return,
            _ => tokio::time::sleep(Duration::from_millis(250)).await,
        }
    }
}
