/// Raw user text plus the optional identifiers the request carried.
///
/// This is the Planner's sole input besides the identifiers, and the value
/// the Orchestrator threads through to the Fallback Chooser and the final
/// `TaskOutcome`.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Query {
    pub text: String,
    pub agent_id: Option<String>,
    pub user_id: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            agent_id: None,
            user_id: None,
        }
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    /// Lowercase view used by the deterministic rule passes. Kept as a
    /// method (not cached) since queries are short and parsed once per task.
    pub fn lower(&self) -> String {
        self.text.to_ascii_lowercase()
    }
}
