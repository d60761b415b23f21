//! Challenge Detector (§4.2): a pure predicate over the currently loaded
//! page. Never throws — any internal failure (a dead tab, a malformed
//! evaluate result) reads as "no challenge" rather than propagating.

use cdp_surface::{BrowserSurface, PageHandle};
use once_cell::sync::Lazy;
use regex::RegexBuilder;
use serde::Deserialize;

/// Selectors probed in order; the first match wins. Kept as CSS strings so
/// the check runs inside the page via a single `querySelector` round trip
/// per selector, matched against JS visibility.
static CHALLENGE_SELECTORS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "iframe[src*='recaptcha']",
        "iframe[title*='recaptcha']",
        "div.g-recaptcha",
        "#g-recaptcha",
        "iframe[src*='hcaptcha']",
        "div.h-captcha",
        "iframe[src*='challenges.cloudflare.com']",
        "#cf-turnstile",
        "div.cf-turnstile",
        "[id*='captcha' i]",
        "[class*='captcha' i]",
        "[name*='captcha' i]",
    ]
});

static CHALLENGE_PHRASES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "verify you're a human",
        "verify you are a human",
        "prove you're human",
        "prove you are human",
        "i'm not a robot",
        "i am not a robot",
        "please verify you are a human",
        "complete the security check",
        "checking your browser before accessing",
        "unusual traffic from your computer",
        "enter the characters you see",
        "additional verification required",
    ]
});

/// Keywords for the content-keyword probe. A keyword alone is not enough
/// (too many false positives from incidental mentions); it must also show
/// up in a structural attribute, per §4.2's co-occurrence rule.
static CONTENT_KEYWORDS: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["captcha", "recaptcha", "hcaptcha", "turnstile"]);

#[derive(Debug, Default, Deserialize)]
struct ProbeSnapshot {
    #[serde(default)]
    selector_hit: bool,
    #[serde(default)]
    title: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    html: String,
}

/// Does the current page contain a CAPTCHA/anti-automation challenge?
/// Evaluates the three signals from §4.2 in order and returns `true` on
/// the first match. Swallows every internal error.
pub async fn has_challenge(surface: &dyn BrowserSurface, page: &PageHandle) -> bool {
    match probe(surface, page).await {
        Ok(snapshot) => evaluate_snapshot(&snapshot),
        Err(err) => {
            tracing::debug!(%err, "challenge probe failed, assuming clear");
            false
        }
    }
}

fn evaluate_snapshot(snapshot: &ProbeSnapshot) -> bool {
    if snapshot.selector_hit {
        return true;
    }
    let title_lower = snapshot.title.to_ascii_lowercase();
    let text_lower = snapshot.text.to_ascii_lowercase();
    if CHALLENGE_PHRASES
        .iter()
        .any(|phrase| text_lower.contains(phrase) || title_lower.contains(phrase))
    {
        return true;
    }
    content_keyword_hit(&snapshot.html, &text_lower)
}

/// A keyword must appear AND co-occur in a structural attribute
/// (`class="..keyword.."`, `id="..keyword.."`, `data-keyword`,
/// `src="..keyword.."`) so a page that merely *talks about* CAPTCHAs in
/// prose doesn't trip the detector.
fn content_keyword_hit(html: &str, text_lower: &str) -> bool {
    let html_lower = html.to_ascii_lowercase();
    let haystack = format!("{html_lower} {text_lower}");
    CONTENT_KEYWORDS.iter().any(|keyword| {
        if !haystack.contains(keyword) {
            return false;
        }
        structural_pattern(keyword).is_match(&html_lower)
    })
}

fn structural_pattern(keyword: &str) -> regex::Regex {
    let escaped = regex::escape(keyword);
    let pattern = format!(
        r#"(class|id)\s*=\s*"[^"]*{escaped}[^"]*"|data-[a-z-]*{escaped}[a-z-]*|src\s*=\s*"[^"]*{escaped}[^"]*""#
    );
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|_| regex::Regex::new("$^").expect("empty-never-matching pattern"))
}

async fn probe(
    surface: &dyn BrowserSurface,
    page: &PageHandle,
) -> Result<ProbeSnapshot, cdp_surface::SurfaceError> {
    let selectors_js = serde_json::to_string(&*CHALLENGE_SELECTORS).unwrap_or_else(|_| "[]".into());
    let script = format!(
        "(() => {{\
            const selectors = {selectors_js};\
            const visible = (el) => {{\
                if (!el) return false;\
                const style = window.getComputedStyle(el);\
                if (style.display === 'none' || style.visibility === 'hidden') return false;\
                const rect = el.getBoundingClientRect();\
                return rect.width > 0 && rect.height > 0;\
            }};\
            let hit = false;\
            for (const sel of selectors) {{\
                try {{\
                    const el = document.querySelector(sel);\
                    if (visible(el)) {{ hit = true; break; }}\
                }} catch (e) {{ /* invalid selector on this page, skip */ }}\
            }}\
            return {{\
                selector_hit: hit,\
                title: document.title || '',\
                text: (document.body && document.body.innerText) ? document.body.innerText.slice(0, 20000) : '',\
                html: document.documentElement ? document.documentElement.outerHTML.slice(0, 20000) : '',\
            }};\
        }})()"
    );

    let value = surface.eval(page, &script).await?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(title: &str, text: &str, html: &str) -> ProbeSnapshot {
        ProbeSnapshot {
            selector_hit: false,
            title: title.to_string(),
            text: text.to_string(),
            html: html.to_string(),
        }
    }

    #[test]
    fn selector_hit_short_circuits() {
        let mut snap = snapshot("", "", "");
        snap.selector_hit = true;
        assert!(evaluate_snapshot(&snap));
    }

    #[test]
    fn detects_phrase_in_text() {
        let snap = snapshot("", "please verify you are a human before continuing", "");
        assert!(evaluate_snapshot(&snap));
    }

    #[test]
    fn detects_keyword_with_structural_cooccurrence() {
        let snap = snapshot(
            "",
            "extra text",
            "<div class=\"captcha-box\">solve this</div>",
        );
        assert!(evaluate_snapshot(&snap));
    }

    #[test]
    fn ignores_keyword_without_structural_cooccurrence() {
        let snap = snapshot(
            "",
            "this article explains what a captcha is and how it works",
            "<p>this article explains what a captcha is and how it works</p>",
        );
        assert!(!evaluate_snapshot(&snap));
    }

    #[test]
    fn clean_page_is_clear() {
        let snap = snapshot("Example Domain", "this is an example page", "<p>hello</p>");
        assert!(!evaluate_snapshot(&snap));
    }
}
