use serde_json::{Map, Value};

use crate::{ALL_FALLBACKS_BLOCKED, CAPTCHA_DETECTED};

/// The payload every `TaskResult` carries. `title` and `url` are always
/// present (possibly empty strings); anything engine- or action-specific
/// (snippet, detailed_results, infobox, captcha_urls, ...) lives in
/// `extras` so the wire shape never grows a new top-level variant per
/// feature (see DESIGN.md's note on the source's free-form result maps).
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TaskResultData {
    pub title: String,
    pub url: String,
    #[cfg_attr(feature = "serde-full", serde(flatten))]
    pub extras: Map<String, Value>,
}

impl TaskResultData {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            extras: Map::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn get_extra(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }
}

/// `{success, message, data, error}` from §3. `error` carries the load
/// bearing sentinels `CAPTCHA_DETECTED` and `ALL_FALLBACKS_BLOCKED`; every
/// other value is a free-form description.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct TaskResult {
    pub success: bool,
    pub message: String,
    pub data: TaskResultData,
    pub error: Option<String>,
}

impl TaskResult {
    pub fn success(message: impl Into<String>, data: TaskResultData) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            error: None,
        }
    }

    pub fn failure(
        message: impl Into<String>,
        data: TaskResultData,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            data,
            error: Some(error.into()),
        }
    }

    /// Constructs a failing result carrying the reserved CAPTCHA sentinel.
    /// The only correct way to raise `CAPTCHA_DETECTED`; never format the
    /// string literal elsewhere.
    pub fn captcha_detected(message: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self::failure(
            message,
            TaskResultData::new("", url.clone()).with_extra("captcha_url", url),
            CAPTCHA_DETECTED,
        )
    }

    pub fn all_fallbacks_blocked(captcha_urls: Vec<String>) -> Self {
        let dedup: Vec<Value> = {
            let mut seen = std::collections::HashSet::new();
            captcha_urls
                .into_iter()
                .filter(|u| seen.insert(u.clone()))
                .map(Value::String)
                .collect()
        };
        Self::failure(
            "All fallback strategies were blocked",
            TaskResultData::empty().with_extra("captcha_urls", Value::Array(dedup)),
            ALL_FALLBACKS_BLOCKED,
        )
    }

    pub fn is_captcha(&self) -> bool {
        self.error.as_deref() == Some(CAPTCHA_DETECTED)
    }

    pub fn is_all_fallbacks_blocked(&self) -> bool {
        self.error.as_deref() == Some(ALL_FALLBACKS_BLOCKED)
    }
}
