//! Residual-term extraction for in-site search (§4.8): the query minus
//! site names, command words, and trivial connectors, with single-letter
//! tokens stripped. Below the 3-character gate, the landing page already
//! extracted stands in for an in-site search attempt.

const SITE_NAMES: &[&str] = &[
    "wikipedia",
    "github",
    "linkedin",
    "youtube",
    "twitter",
    "amazon",
    "gmail",
    "facebook",
];

const COMMAND_WORDS: &[&str] = &[
    "visit", "open", "go", "navigate", "to", "check", "read", "on", "from", "find", "search", "look", "for",
    "about", "information",
];

const CONNECTORS: &[&str] = &["and", "the", "a", "an", "of", "in", "at", "it", "is", "are", "this", "that"];

pub const MIN_RESIDUAL_CHARS: usize = 3;

pub const SEARCH_INTENT_KEYWORDS: &[&str] = &["find", "search", "look for", "about", "information"];

/// True if `query_lower` mentions one of the known sites.
pub fn mentions_known_site(query_lower: &str) -> bool {
    SITE_NAMES.iter().any(|site| contains_word(query_lower, site))
}

pub fn has_search_intent(query_lower: &str) -> bool {
    SEARCH_INTENT_KEYWORDS.iter().any(|kw| query_lower.contains(kw))
}

/// Strips site names, command words, connectors, and single-letter
/// tokens from `query_lower`, returning the remaining terms joined by a
/// single space.
pub fn residual_terms(query_lower: &str) -> String {
    query_lower
        .split_whitespace()
        .filter(|token| {
            let cleaned: String = token.chars().filter(|c| c.is_alphanumeric()).collect();
            if cleaned.chars().count() <= 1 {
                return false;
            }
            !SITE_NAMES.contains(&cleaned.as_str())
                && !COMMAND_WORDS.contains(&cleaned.as_str())
                && !CONNECTORS.contains(&cleaned.as_str())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.split(|c: char| !c.is_alphanumeric()).any(|token| token == word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_residual_terms_from_wikipedia_query() {
        let residual = residual_terms("visit wikipedia and find about alan turing");
        assert_eq!(residual, "alan turing");
    }

    #[test]
    fn short_residual_falls_below_gate() {
        let residual = residual_terms("go to wikipedia");
        assert!(residual.chars().count() <= MIN_RESIDUAL_CHARS);
    }

    #[test]
    fn detects_site_mention() {
        assert!(mentions_known_site("tell me about linkedin profiles"));
        assert!(!mentions_known_site("latest ai news"));
    }
}
