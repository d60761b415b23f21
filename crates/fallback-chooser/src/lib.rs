//! Fallback Chooser (§4.6): given a blocked Query, returns an ordered
//! list of remediation attempts. Enforces the "don't fan out unbidden"
//! policy — a `SiteScoped` strategy is only ever emitted for a site the
//! user actually named.

use reasoning_oracle::ReasoningOracle;
use serde_json::Value;
use taskbrowser_core_types::FallbackStrategy;

pub const DEFAULT_ENGINE: &str = "duckduckgo";
pub const ALLOWED_ENGINES: &[&str] = &["duckduckgo"];

/// Sites the Chooser is willing to scope a retry to, when named in the
/// query. Kept local to this crate rather than shared with `planner`,
/// since the two lists serve different decisions (navigation target vs.
/// fallback scoping) and drifting independently is acceptable.
const SITE_NAMES: &[&str] = &[
    "wikipedia",
    "github",
    "linkedin",
    "youtube",
    "twitter",
    "amazon",
    "reddit",
    "stackoverflow",
];

const ORACLE_SYSTEM_INSTRUCTION: &str = "The primary search attempt was blocked. Propose an ordered list of \
fallback strategies as a JSON array of {type, engine?, site?, query}. type is one of search_engine, site_search, \
cache. engine must be duckduckgo. site_search requires a non-empty site that the user actually named.";

/// Chooses fallback strategies for `query_text`, which failed or was
/// blocked by a challenge.
pub async fn choose(query_text: &str, oracle: Option<&dyn ReasoningOracle>) -> Vec<FallbackStrategy> {
    if let Some(oracle) = oracle {
        if let Some(strategies) = try_oracle_strategies(oracle, query_text).await {
            if !strategies.is_empty() {
                return strategies;
            }
        }
    }

    deterministic_strategies(query_text)
}

async fn try_oracle_strategies(oracle: &dyn ReasoningOracle, query_text: &str) -> Option<Vec<FallbackStrategy>> {
    let schema = serde_json::json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "type": {"type": "string", "enum": ["search_engine", "site_search", "cache"]},
                "engine": {"type": "string"},
                "site": {"type": "string"},
                "query": {"type": "string"},
            },
            "required": ["type"],
        },
    });

    let value = oracle
        .generate_structured(ORACLE_SYSTEM_INSTRUCTION, query_text, &schema)
        .await
        .ok()?;

    let items = value.as_array()?;
    let strategies = items
        .iter()
        .filter_map(|item| validate_oracle_entry(item, query_text))
        .collect::<Vec<_>>();
    Some(strategies)
}

fn validate_oracle_entry(item: &Value, original_query: &str) -> Option<FallbackStrategy> {
    let kind = item.get("type").and_then(Value::as_str)?;
    let query_field = item
        .get("query")
        .and_then(Value::as_str)
        .filter(|q| !q.trim().is_empty())
        .unwrap_or(original_query)
        .to_string();

    match kind {
        "search_engine" => {
            let engine = item
                .get("engine")
                .and_then(Value::as_str)
                .filter(|e| ALLOWED_ENGINES.contains(e))
                .unwrap_or(DEFAULT_ENGINE)
                .to_string();
            Some(FallbackStrategy::AltSearchEngine { engine })
        }
        "site_search" => {
            let site = item.get("site").and_then(Value::as_str)?.trim();
            if site.is_empty() {
                return None;
            }
            Some(FallbackStrategy::SiteScoped {
                site: site.to_string(),
                query: query_field,
            })
        }
        "cache" => Some(FallbackStrategy::CacheLookup { query: query_field }),
        _ => None,
    }
}

/// Oracle-free path: a retry on the default engine, plus one
/// `SiteScoped` entry per site actually named in the query.
fn deterministic_strategies(query_text: &str) -> Vec<FallbackStrategy> {
    let lower = query_text.to_ascii_lowercase();
    let mut strategies = vec![FallbackStrategy::AltSearchEngine {
        engine: DEFAULT_ENGINE.to_string(),
    }];

    for site in SITE_NAMES {
        if contains_word(&lower, site) {
            strategies.push(FallbackStrategy::SiteScoped {
                site: site.to_string(),
                query: query_text.to_string(),
            });
        }
    }

    strategies
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.split(|c: char| !c.is_alphanumeric()).any(|token| token == word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deterministic_path_always_retries_default_engine() {
        let strategies = choose("latest AI news", None).await;
        assert!(matches!(strategies[0], FallbackStrategy::AltSearchEngine { ref engine } if engine == DEFAULT_ENGINE));
    }

    #[tokio::test]
    async fn deterministic_path_does_not_fan_out_unbidden() {
        let strategies = choose("latest AI news", None).await;
        assert_eq!(strategies.len(), 1);
    }

    #[tokio::test]
    async fn deterministic_path_scopes_to_named_site() {
        let strategies = choose("search wikipedia for rust programming", None).await;
        assert!(strategies
            .iter()
            .any(|s| matches!(s, FallbackStrategy::SiteScoped { site, .. } if site == "wikipedia")));
    }

    #[test]
    fn oracle_entry_with_disallowed_engine_is_coerced() {
        let item = serde_json::json!({"type": "search_engine", "engine": "bing", "query": "q"});
        let strategy = validate_oracle_entry(&item, "q").unwrap();
        assert!(matches!(strategy, FallbackStrategy::AltSearchEngine { engine } if engine == DEFAULT_ENGINE));
    }

    #[test]
    fn oracle_site_search_without_site_is_dropped() {
        let item = serde_json::json!({"type": "site_search", "query": "q"});
        assert!(validate_oracle_entry(&item, "q").is_none());
    }
}
