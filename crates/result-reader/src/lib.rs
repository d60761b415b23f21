//! Result Reader (§4.4): parses a currently-loaded search-engine results
//! page into ranked `ResultEntry` values. Selectors are tried in a fixed
//! order; the first selector that matches anything is used exclusively —
//! engines are never mixed within one read.

use cdp_surface::{BrowserSurface, PageHandle, SurfaceError};
use once_cell::sync::Lazy;
use serde::Deserialize;
use taskbrowser_core_types::ResultEntry;

const DEFAULT_MAX_RESULTS: usize = 5;
const SNIPPET_MAX_CHARS: usize = 200;
const TITLE_MIN_CHARS: usize = 3;
const FALLBACK_TEXT_MIN_CHARS: usize = 10;

/// One result-element selector per supported engine, tried in order.
static RESULT_SELECTORS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "div.result__body",  // DuckDuckGo HTML surface
        "div.g",             // Google
        "li.b_algo",         // Bing
    ]
});

/// Snippet text is pulled from the first of these found inside (or next
/// to) the matched element.
const SNIPPET_SELECTOR: &str = ".VwiC3b, .b_caption p, .result__snippet, .s";

/// Hrefs containing these fragments are chrome, not results, and are
/// excluded from the last-resort sweep.
static DENYLISTED_HREF_FRAGMENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "/preferences",
        "/settings",
        "/advanced_search",
        "accounts.google.com",
        "support.google.com",
        "duckduckgo.com/about",
        "duckduckgo.com/settings",
        "go.microsoft.com",
    ]
});

#[derive(Debug, Default, Deserialize)]
struct RawEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    href: Option<String>,
    #[serde(default)]
    snippet: String,
}

/// Reads the currently loaded page into up to `max_results` normalised
/// entries. `max_results` of `0` is coerced to the default of 5.
pub async fn read(
    surface: &dyn BrowserSurface,
    page: &PageHandle,
    max_results: Option<usize>,
) -> Result<Vec<ResultEntry>, SurfaceError> {
    let max_results = max_results.filter(|n| *n > 0).unwrap_or(DEFAULT_MAX_RESULTS);
    let current_url = surface.current_url(page).await.unwrap_or_default();
    let origin = origin_of(&current_url);
    let is_duckduckgo = current_url.contains("duckduckgo.com");

    let raw = read_raw(surface, page).await?;
    let entries = normalise(raw, &origin, is_duckduckgo, max_results);
    Ok(entries)
}

fn normalise(raw: Vec<RawEntry>, origin: &str, is_duckduckgo: bool, max_results: usize) -> Vec<ResultEntry> {
    let mut out = Vec::with_capacity(max_results);
    for entry in raw {
        let title = entry.title.trim().to_string();
        if title.chars().count() < TITLE_MIN_CHARS {
            continue;
        }
        let Some(href) = entry.href else { continue };
        let Some(url) = normalise_url(&href, origin, is_duckduckgo) else {
            continue;
        };
        let snippet = truncate_chars(entry.snippet.trim(), SNIPPET_MAX_CHARS);
        out.push(ResultEntry {
            rank: (out.len() + 1) as u32,
            title,
            url,
            snippet,
        });
        if out.len() >= max_results {
            break;
        }
    }
    out
}

/// DuckDuckGo wraps outbound links in a redirect with the real target in
/// `uddg`; everything else is plain protocol/root-relative resolution.
fn normalise_url(href: &str, origin: &str, is_duckduckgo: bool) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    if is_duckduckgo && href.contains("uddg=") {
        if let Some(target) = extract_uddg(href) {
            return normalise_url(&target, origin, false);
        }
    }

    if let Some(rest) = href.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    if href.starts_with('/') {
        if origin.is_empty() {
            return None;
        }
        return Some(format!("{origin}{href}"));
    }
    if href.starts_with("http") {
        return Some(href.to_string());
    }
    None
}

fn extract_uddg(href: &str) -> Option<String> {
    let query = href.split('?').nth(1)?;
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=')?;
        if key == "uddg" {
            return percent_decode(value);
        }
    }
    None
}

fn percent_decode(value: &str) -> Option<String> {
    let mut out = String::with_capacity(value.len());
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok()?;
                let byte = u8::from_str_radix(hex, 16).ok()?;
                out.push(byte as char);
                i += 3;
            }
            b'+' => {
                out.push(' ');
                i += 1;
            }
            b => {
                out.push(b as char);
                i += 1;
            }
        }
    }
    Some(out)
}

fn origin_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .map(|u| format!("{}://{}", u.scheme(), u.host_str().unwrap_or_default()))
        .unwrap_or_default()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

async fn read_raw(surface: &dyn BrowserSurface, page: &PageHandle) -> Result<Vec<RawEntry>, SurfaceError> {
    let selectors_js = serde_json::to_string(&*RESULT_SELECTORS).unwrap_or_else(|_| "[]".into());
    let denylist_js = serde_json::to_string(&*DENYLISTED_HREF_FRAGMENTS).unwrap_or_else(|_| "[]".into());
    let script = format!(
        r#"(() => {{
            const selectors = {selectors_js};
            const denylist = {denylist_js};
            const snippetSel = '{SNIPPET_SELECTOR}';
            const textOf = (el) => (el && el.innerText ? el.innerText.trim() : '');

            const resolveHref = (el, container) => {{
                if (el.tagName === 'A' && el.href) return el.href;
                const descendant = el.querySelector && el.querySelector('a[href]');
                if (descendant && descendant.href) return descendant.href;
                const ancestor = el.closest && el.closest('a[href]');
                if (ancestor && ancestor.href) return ancestor.href;
                const inContainer = container && container.querySelector && container.querySelector('a[href]');
                if (inContainer && inContainer.href) return inContainer.href;
                return null;
            }};

            const snippetFor = (container) => {{
                if (!container || !container.querySelector) return '';
                const el = container.querySelector(snippetSel);
                return textOf(el);
            }};

            const collect = (nodes) => Array.from(nodes).map((el) => {{
                const container = el.closest ? (el.closest('div.result, div.g, li.b_algo') || el) : el;
                const titleEl = el.querySelector ? (el.querySelector('h2, h3, a') || el) : el;
                return {{
                    title: textOf(titleEl),
                    href: resolveHref(el, container),
                    snippet: snippetFor(container),
                }};
            }});

            for (const sel of selectors) {{
                const nodes = document.querySelectorAll(sel);
                if (nodes.length > 0) return collect(nodes);
            }}

            const anchors = Array.from(document.querySelectorAll('a[href]')).filter((a) => {{
                const text = textOf(a);
                if (text.length < {FALLBACK_TEXT_MIN_CHARS}) return false;
                return !denylist.some((frag) => a.href.includes(frag));
            }});
            return anchors.map((a) => ({{ title: textOf(a), href: a.href, snippet: '' }}));
        }})()"#
    );

    let value = surface.eval(page, &script).await?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_protocol_relative_url() {
        assert_eq!(
            normalise_url("//example.com/a", "https://duckduckgo.com", false),
            Some("https://example.com/a".to_string())
        );
    }

    #[test]
    fn normalises_root_relative_url() {
        assert_eq!(
            normalise_url("/path", "https://duckduckgo.com", false),
            Some("https://duckduckgo.com/path".to_string())
        );
    }

    #[test]
    fn discards_non_http_url() {
        assert_eq!(normalise_url("javascript:void(0)", "https://duckduckgo.com", false), None);
    }

    #[test]
    fn unwraps_duckduckgo_redirect() {
        let href = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage&rut=abc";
        assert_eq!(
            normalise_url(href, "https://duckduckgo.com", true),
            Some("https://example.com/page".to_string())
        );
    }

    #[test]
    fn truncates_snippet_at_200_chars() {
        let long = "a".repeat(250);
        assert_eq!(truncate_chars(&long, SNIPPET_MAX_CHARS).chars().count(), 200);
    }

    #[test]
    fn normalise_drops_short_titles() {
        let raw = vec![RawEntry {
            title: "ab".to_string(),
            href: Some("https://example.com".to_string()),
            snippet: String::new(),
        }];
        assert!(normalise(raw, "https://duckduckgo.com", false, 5).is_empty());
    }

    #[test]
    fn normalise_assigns_sequential_rank() {
        let raw = vec![
            RawEntry {
                title: "First result".to_string(),
                href: Some("https://a.example".to_string()),
                snippet: String::new(),
            },
            RawEntry {
                title: "Second result".to_string(),
                href: Some("https://b.example".to_string()),
                snippet: String::new(),
            },
        ];
        let entries = normalise(raw, "https://duckduckgo.com", false, 5);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[1].rank, 2);
    }
}
