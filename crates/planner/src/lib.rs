//! Planner (§4.5): raw Query in, typed Action Plan out. Tries the
//! reasoning oracle first and always has a fully deterministic path that
//! needs no oracle at all.

use once_cell::sync::Lazy;
use regex::Regex;
use reasoning_oracle::ReasoningOracle;
use serde_json::Value;
use taskbrowser_core_types::{ActionKind, ActionPlan, Query};

/// Common misspellings of site names seen in the wild. Correction runs
/// before anything else touches the query text.
static TYPO_TABLE: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("wikipida", "wikipedia"),
        ("wikipedai", "wikipedia"),
        ("linkdin", "linkedin"),
        ("linkedn", "linkedin"),
        ("youtub", "youtube"),
        ("gmial", "gmail"),
        ("facebok", "facebook"),
        ("amazom", "amazon"),
    ]
});

/// Site name -> canonical URL. A query mentioning one of these keys near a
/// navigation keyword (or as a standalone token) is an `OpenUrl` plan.
static DOMAIN_MAP: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("wikipedia", "https://www.wikipedia.org"),
        ("linkedin", "https://www.linkedin.com"),
        ("github", "https://github.com"),
        ("youtube", "https://www.youtube.com"),
        ("twitter", "https://twitter.com"),
        ("amazon", "https://www.amazon.com"),
        ("gmail", "https://mail.google.com"),
        ("facebook", "https://www.facebook.com"),
    ]
});

const NAV_KEYWORDS: &[&str] = &[
    "visit",
    "open",
    "go to",
    "navigate to",
    "check",
    "read",
    "on",
    "from",
];

/// Hosts that belong to a search engine other than the single allowed one.
/// An oracle-sourced `OpenUrl` targeting one of these is coerced to
/// `SearchDefault`, per the "never target a disallowed engine" policy.
const DISALLOWED_ENGINE_HOSTS: &[&str] = &["google.", "bing.", "yahoo.", "baidu."];

pub const DEFAULT_ENGINE: &str = "duckduckgo";
pub const ALLOWED_ENGINES: &[&str] = &["duckduckgo"];

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(https?://\S+)|(\bwww\.[a-z0-9.-]+\.[a-z]{2,}\S*)").expect("valid url pattern"));

const ORACLE_SYSTEM_INSTRUCTION: &str = "You are a browser task planner. Given a user query, choose exactly one \
action: open_url (navigate directly to a known site), search_default (run a web search), read_page (extract the \
currently loaded page), or fix_issue (diagnose a stuck page). Respond with {action, target, reason, \
expected_outcome}. Only open_url may target a URL outside the default search engine; never target a search \
engine other than duckduckgo.";

/// Builds an `ActionPlan` for `query`. Always succeeds: every coercion
/// path produces a structurally valid plan.
pub async fn plan(query: &Query, oracle: Option<&dyn ReasoningOracle>) -> ActionPlan {
    let corrected = correct_typos(query.as_str());

    if let Some(oracle) = oracle {
        if let Some(plan) = try_oracle_plan(oracle, &corrected).await {
            return plan;
        }
    }

    deterministic_plan(&corrected)
}

fn correct_typos(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, word) in split_preserving_spaces(text).into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let lower = word.to_ascii_lowercase();
        match TYPO_TABLE.iter().find(|(typo, _)| *typo == lower) {
            Some((_, fix)) => out.push_str(fix),
            None => out.push_str(&word),
        }
    }
    out
}

fn split_preserving_spaces(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

async fn try_oracle_plan(oracle: &dyn ReasoningOracle, query_text: &str) -> Option<ActionPlan> {
    let schema = serde_json::json!({
        "type": "object",
        "properties": {
            "action": {"type": "string", "enum": ["open_url", "search_default", "read_page", "fix_issue"]},
            "target": {"type": "string"},
            "reason": {"type": "string"},
            "expected_outcome": {"type": "string"},
        },
        "required": ["action", "target", "reason", "expected_outcome"],
    });

    let value = oracle
        .generate_structured(ORACLE_SYSTEM_INSTRUCTION, query_text, &schema)
        .await
        .ok()?;

    Some(coerce_oracle_response(&value, query_text))
}

fn coerce_oracle_response(value: &Value, original_query: &str) -> ActionPlan {
    let action = value
        .get("action")
        .and_then(Value::as_str)
        .and_then(ActionKind::parse)
        .unwrap_or(ActionKind::SearchDefault);

    let raw_target = value.get("target").and_then(Value::as_str).unwrap_or("");
    let mut target = if raw_target.trim().is_empty() {
        original_query.to_string()
    } else {
        raw_target.to_string()
    };

    let mut kind = action;
    if matches!(kind, ActionKind::OpenUrl) {
        if !target.contains("://") {
            target = format!("https://{target}");
        }
        if targets_disallowed_engine(&target) {
            tracing::debug!(%target, "oracle targeted a disallowed engine, coercing to search_default");
            kind = ActionKind::SearchDefault;
            target = original_query.to_string();
        }
    }

    let reason = value
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or("oracle-selected action")
        .to_string();
    let expected_outcome = value
        .get("expected_outcome")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    build_plan(kind, target, reason, expected_outcome, original_query)
}

fn targets_disallowed_engine(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    DISALLOWED_ENGINE_HOSTS.iter().any(|host| lower.contains(host))
}

/// The oracle-free path: domain map, then a bare URL pattern, then a
/// default search. Never fails.
fn deterministic_plan(query_text: &str) -> ActionPlan {
    let lower = query_text.to_ascii_lowercase();

    if let Some((_, url)) = DOMAIN_MAP.iter().find(|(site, _)| domain_matches(&lower, site)) {
        return build_plan(
            ActionKind::OpenUrl,
            url.to_string(),
            format!("query mentions '{}'", url),
            "land on the site's home page".to_string(),
            query_text,
        );
    }

    if let Some(found) = URL_PATTERN.find(query_text) {
        let mut target = found.as_str().to_string();
        if !target.contains("://") {
            target = format!("https://{target}");
        }
        return build_plan(
            ActionKind::OpenUrl,
            target,
            "query contains an explicit URL".to_string(),
            "land on the referenced page".to_string(),
            query_text,
        );
    }

    build_plan(
        ActionKind::SearchDefault,
        query_text.to_string(),
        "no known site or URL in the query".to_string(),
        format!("find results for '{query_text}' via {DEFAULT_ENGINE}"),
        query_text,
    )
}

/// True if `site` occurs in `lower_query` as a standalone word, or
/// immediately beside one of the navigation keywords.
fn domain_matches(lower_query: &str, site: &str) -> bool {
    if !contains_word(lower_query, site) {
        return false;
    }
    if NAV_KEYWORDS.iter().any(|kw| lower_query.contains(&format!("{kw} {site}")) || lower_query.contains(&format!("{site} {kw}"))) {
        return true;
    }
    // standalone token is itself sufficient per §4.5.
    true
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.split(|c: char| !c.is_alphanumeric()).any(|token| token == word)
}

fn build_plan(
    kind: ActionKind,
    target: String,
    reason: String,
    expected_outcome: String,
    fallback_query: &str,
) -> ActionPlan {
    ActionPlan::new(kind, target, reason, expected_outcome).unwrap_or_else(|_| {
        ActionPlan::new(
            ActionKind::SearchDefault,
            fallback_query.to_string(),
            "plan failed validation, falling back to search".to_string(),
            String::new(),
        )
        .expect("search_default plan with non-empty query is always valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deterministic_plan_opens_domain_mapped_site() {
        let query = Query::new("Go to LinkedIn");
        let plan = plan(&query, None).await;
        assert_eq!(plan.kind, ActionKind::OpenUrl);
        assert_eq!(plan.target, "https://www.linkedin.com");
    }

    #[tokio::test]
    async fn typo_correction_runs_before_domain_matching() {
        let query = Query::new("vist wikipida and find about Alan Turing");
        let plan = plan(&query, None).await;
        assert_eq!(plan.kind, ActionKind::OpenUrl);
        assert_eq!(plan.target, "https://www.wikipedia.org");
    }

    #[tokio::test]
    async fn bare_url_is_opened_with_scheme_prepended() {
        let query = Query::new("check out www.example.com for details");
        let plan = plan(&query, None).await;
        assert_eq!(plan.kind, ActionKind::OpenUrl);
        assert!(plan.target.starts_with("https://"));
    }

    #[tokio::test]
    async fn unmatched_query_falls_back_to_search_default() {
        let query = Query::new("latest AI news");
        let plan = plan(&query, None).await;
        assert_eq!(plan.kind, ActionKind::SearchDefault);
        assert_eq!(plan.target, "latest AI news");
    }

    #[test]
    fn disallowed_engine_host_is_detected() {
        assert!(targets_disallowed_engine("https://www.google.com/search?q=x"));
        assert!(!targets_disallowed_engine("https://duckduckgo.com/?q=x"));
    }

    #[test]
    fn oracle_response_with_empty_target_uses_original_query() {
        let value = serde_json::json!({
            "action": "search_default",
            "target": "",
            "reason": "",
            "expected_outcome": "",
        });
        let p = coerce_oracle_response(&value, "latest AI news");
        assert_eq!(p.target, "latest AI news");
    }

    #[test]
    fn oracle_response_targeting_google_is_coerced_to_search_default() {
        let value = serde_json::json!({
            "action": "open_url",
            "target": "https://www.google.com/search?q=rust",
            "reason": "",
            "expected_outcome": "",
        });
        let p = coerce_oracle_response(&value, "rust lang");
        assert_eq!(p.kind, ActionKind::SearchDefault);
        assert_eq!(p.target, "rust lang");
    }
}
