//! Content Extractor: reads the currently loaded page into a typed
//! `PageReport`. All the length windows below (20-500, 50-500, 300 chars,
//! ...) are fixed policy, not tunable defaults — changing them changes
//! observable behaviour and must be deliberate.

use cdp_surface::{BrowserSurface, PageHandle, SurfaceError};
use reasoning_oracle::ReasoningOracle;
use serde::Deserialize;
use taskbrowser_core_types::page_report::InfoboxRow;
use taskbrowser_core_types::{Headings, PageReport};

const ARTICLE_PARAGRAPH_MIN: usize = 20;
const ARTICLE_PARAGRAPH_MAX: usize = 500;
const ARTICLE_PARAGRAPH_CAP: usize = 10;
const KEY_POINTS_CAP: usize = 5;
const WIKI_PARAGRAPH_MIN: usize = 50;
const WIKI_PARAGRAPH_MAX: usize = 500;
const WIKI_PARAGRAPH_CAP: usize = 5;
const SUMMARY_INPUT_CHARS: usize = 1000;
const SUMMARY_OUTPUT_CHARS: usize = 300;
const ISSUE_KEYWORDS: &[&str] = &["error", "404", "not found", "page not found", "access denied"];

#[derive(Debug, Default, Deserialize)]
struct RawPage {
    #[serde(default)]
    title: String,
    #[serde(default)]
    meta_description: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    body_text: String,
    #[serde(default)]
    h1: Vec<String>,
    #[serde(default)]
    h2: Vec<String>,
    #[serde(default)]
    h3: Vec<String>,
    #[serde(default)]
    article_paragraphs: Vec<String>,
    #[serde(default)]
    publication_date: Option<String>,
    #[serde(default)]
    author: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WikiExtras {
    #[serde(default)]
    infobox: Vec<InfoboxPair>,
    #[serde(default)]
    table_of_contents: Vec<String>,
    #[serde(default)]
    paragraphs: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct InfoboxPair {
    #[serde(default)]
    label: String,
    #[serde(default)]
    value: String,
}

/// Extracts a `PageReport` from the currently loaded page. `oracle`, when
/// present, is consulted for the optional 2-3 sentence `summary`; any
/// oracle failure simply leaves `summary` unset.
pub async fn extract(
    surface: &dyn BrowserSurface,
    page: &PageHandle,
    oracle: Option<&dyn ReasoningOracle>,
) -> Result<PageReport, SurfaceError> {
    let url = surface.current_url(page).await.unwrap_or_default();
    let raw = extract_raw(surface, page).await?;

    let article_paragraphs: Vec<String> = raw
        .article_paragraphs
        .iter()
        .filter(|p| within(p, ARTICLE_PARAGRAPH_MIN, ARTICLE_PARAGRAPH_MAX))
        .take(ARTICLE_PARAGRAPH_CAP)
        .cloned()
        .collect();
    let key_points: Vec<String> = article_paragraphs.iter().take(KEY_POINTS_CAP).cloned().collect();

    let issues = detect_issues(&raw.body_text);

    let mut report = PageReport {
        title: raw.title.clone(),
        url: url.clone(),
        content_preview: preview(&raw.content, 1000),
        meta_description: raw.meta_description,
        headings: Headings {
            h1: raw.h1.into_iter().take(5).collect(),
            h2: raw.h2.into_iter().take(10).collect(),
            h3: raw.h3.into_iter().take(10).collect(),
        },
        publication_date: non_empty(raw.publication_date),
        author: non_empty(raw.author),
        key_points,
        summary: None,
        infobox: None,
        table_of_contents: None,
        key_paragraphs: None,
        issues,
        content_length: raw.content.chars().count(),
    };

    if is_wikipedia(&url) {
        if let Ok(extras) = extract_wikipedia(surface, page).await {
            if !extras.infobox.is_empty() {
                report.infobox = Some(
                    extras
                        .infobox
                        .into_iter()
                        .map(|row| InfoboxRow {
                            label: row.label,
                            value: row.value,
                        })
                        .collect(),
                );
            }
            if !extras.table_of_contents.is_empty() {
                report.table_of_contents = Some(extras.table_of_contents);
            }
            let key_paragraphs: Vec<String> = extras
                .paragraphs
                .into_iter()
                .filter(|p| within(p, WIKI_PARAGRAPH_MIN, WIKI_PARAGRAPH_MAX))
                .take(WIKI_PARAGRAPH_CAP)
                .collect();
            if !key_paragraphs.is_empty() {
                report.key_paragraphs = Some(key_paragraphs);
            }
        }
    }

    if let Some(oracle) = oracle {
        let prompt = format!(
            "Summarise the following page in 2-3 sentences.\nTitle: {}\nContent: {}",
            report.title,
            preview(&raw.content, SUMMARY_INPUT_CHARS)
        );
        if let Ok(text) = oracle.generate_text(&prompt).await {
            report.summary = Some(preview(&text, SUMMARY_OUTPUT_CHARS));
        }
    }

    Ok(report)
}

fn within(text: &str, min: usize, max: usize) -> bool {
    let len = text.trim().chars().count();
    len >= min && len <= max
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_wikipedia(url: &str) -> bool {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .map(|host| host.ends_with("wikipedia.org"))
        .unwrap_or(false)
}

fn detect_issues(body_text: &str) -> Vec<String> {
    let lower = body_text.to_ascii_lowercase();
    ISSUE_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(*kw))
        .map(|kw| format!("page text mentions '{kw}'"))
        .collect()
}

async fn extract_raw(surface: &dyn BrowserSurface, page: &PageHandle) -> Result<RawPage, SurfaceError> {
    const SCRIPT: &str = r#"(() => {
        const textOf = (el) => (el && el.textContent ? el.textContent.trim() : '');
        const container = document.querySelector('main, article, .content, .post, .article, [role=main]');
        const content = container ? (container.innerText || '') : (document.body ? document.body.innerText : '');
        const headingTexts = (sel) => Array.from(document.querySelectorAll(sel))
            .map((el) => textOf(el))
            .filter((t) => t.length > 0);
        const metaDesc = (() => {
            const byName = document.querySelector('meta[name="description"]');
            if (byName && byName.content) return byName.content;
            const og = document.querySelector('meta[property="og:description"]');
            return og && og.content ? og.content : '';
        })();
        const articleParagraphs = Array.from(
            document.querySelectorAll('main p, article p, .content p, .post p, .article p, [role=main] p')
        ).map((el) => textOf(el)).filter((t) => t.length > 0);
        const pubDate = (() => {
            const timeEl = document.querySelector('time[datetime]');
            if (timeEl) return timeEl.getAttribute('datetime');
            const dateEl = document.querySelector('[class*="date" i], [class*="published" i]');
            if (dateEl) return textOf(dateEl);
            const meta = document.querySelector('meta[property="article:published_time"]');
            return meta && meta.content ? meta.content : null;
        })();
        const author = (() => {
            const relEl = document.querySelector('[rel="author"]');
            if (relEl) return textOf(relEl);
            const classEl = document.querySelector('[class*="author" i]');
            if (classEl) return textOf(classEl);
            const itemprop = document.querySelector('[itemprop="author"]');
            if (itemprop) return textOf(itemprop);
            const meta = document.querySelector('meta[name="author"]');
            return meta && meta.content ? meta.content : null;
        })();
        return {
            title: document.title || '',
            meta_description: metaDesc,
            content: content || '',
            body_text: document.body ? document.body.innerText : '',
            h1: headingTexts('h1'),
            h2: headingTexts('h2'),
            h3: headingTexts('h3'),
            article_paragraphs: articleParagraphs,
            publication_date: pubDate,
            author: author,
        };
    })()"#;

    let value = surface.eval(page, SCRIPT).await?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

async fn extract_wikipedia(surface: &dyn BrowserSurface, page: &PageHandle) -> Result<WikiExtras, SurfaceError> {
    const SCRIPT: &str = r#"(() => {
        const infobox = [];
        document.querySelectorAll('.infobox tr').forEach((row) => {
            const th = row.querySelector('th');
            const td = row.querySelector('td');
            if (th && td) {
                infobox.push({ label: th.innerText.trim(), value: td.innerText.trim() });
            }
        });
        const toc = Array.from(document.querySelectorAll('#toc a'))
            .map((a) => a.innerText.trim())
            .filter((t) => t.length > 0);
        const paragraphs = Array.from(document.querySelectorAll('#mw-content-text p'))
            .map((p) => p.innerText.trim())
            .filter((t) => t.length > 0);
        return { infobox, table_of_contents: toc, paragraphs };
    })()"#;

    let value = surface.eval(page, SCRIPT).await?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_respects_bounds() {
        assert!(within(&"a".repeat(20), 20, 500));
        assert!(within(&"a".repeat(500), 20, 500));
        assert!(!within(&"a".repeat(19), 20, 500));
        assert!(!within(&"a".repeat(501), 20, 500));
    }

    #[test]
    fn detects_issue_keywords() {
        let issues = detect_issues("Sorry, page not found on this server");
        assert!(!issues.is_empty());
    }

    #[test]
    fn recognises_wikipedia_hosts() {
        assert!(is_wikipedia("https://en.wikipedia.org/wiki/Rust"));
        assert!(!is_wikipedia("https://example.com"));
    }
}
