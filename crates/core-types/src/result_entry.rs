/// One row of a search-engine results page, normalised. Invariant: `url`
/// is absolute and redirect wrappers have already been resolved.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ResultEntry {
    pub rank: u32,
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl ResultEntry {
    pub fn is_normalised(&self) -> bool {
        self.url.starts_with("http")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_and_https_urls_are_normalised() {
        let entry = ResultEntry {
            rank: 1,
            title: "t".into(),
            url: "https://example.com".into(),
            snippet: "s".into(),
        };
        assert!(entry.is_normalised());
    }

    #[test]
    fn non_http_url_is_not_normalised() {
        let entry = ResultEntry {
            rank: 1,
            title: "t".into(),
            url: "javascript:void(0)".into(),
            snippet: "s".into(),
        };
        assert!(!entry.is_normalised());
    }
}
