use thiserror::Error;

/// The four shapes of intent the Planner can emit.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActionKind {
    OpenUrl,
    SearchDefault,
    ReadPage,
    FixIssue,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::OpenUrl => "open_url",
            ActionKind::SearchDefault => "search_default",
            ActionKind::ReadPage => "read_page",
            ActionKind::FixIssue => "fix_issue",
        }
    }

    /// Parses the action kind from an oracle response. Any value outside
    /// the closed set is the caller's cue to coerce to `SearchDefault`
    /// rather than fail the plan (see `Planner`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open_url" | "openurl" | "open" => Some(ActionKind::OpenUrl),
            "search_default" | "searchdefault" | "search" => Some(ActionKind::SearchDefault),
            "read_page" | "readpage" | "read" => Some(ActionKind::ReadPage),
            "fix_issue" | "fixissue" | "fix" => Some(ActionKind::FixIssue),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum PlanError {
    #[error("action plan target must not be empty")]
    EmptyTarget,
    #[error("open_url target '{0}' has no URL scheme")]
    MissingScheme(String),
}

/// A typed intent derived from a `Query`. `reason` and `expected_outcome`
/// are opaque audit strings, never parsed by downstream components.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActionPlan {
    pub kind: ActionKind,
    pub target: String,
    pub reason: String,
    pub expected_outcome: String,
}

impl ActionPlan {
    pub fn new(
        kind: ActionKind,
        target: impl Into<String>,
        reason: impl Into<String>,
        expected_outcome: impl Into<String>,
    ) -> Result<Self, PlanError> {
        let plan = Self {
            kind,
            target: target.into(),
            reason: reason.into(),
            expected_outcome: expected_outcome.into(),
        };
        plan.validate()?;
        Ok(plan)
    }

    /// `target` is never empty, and an `OpenUrl` target carries a URL
    /// scheme after normalisation.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.target.trim().is_empty() {
            return Err(PlanError::EmptyTarget);
        }
        if matches!(self.kind, ActionKind::OpenUrl) && !has_url_scheme(&self.target) {
            return Err(PlanError::MissingScheme(self.target.clone()));
        }
        Ok(())
    }
}

fn has_url_scheme(target: &str) -> bool {
    target.contains("://")
}
