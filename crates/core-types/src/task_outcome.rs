use crate::StepRecord;

/// The externally observable response object (§3, §6). Downstream
/// consumers rely on `steps[i].result.data.{title,url}` always being
/// present and `steps[i].result.error` always being nullable-or-string;
/// both invariants are enforced at construction in `TaskResultData`/
/// `TaskResult`, not re-checked here.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct TaskOutcome {
    pub agent_id: String,
    pub overall_success: bool,
    pub query: String,
    pub steps: Vec<StepRecord>,
}

impl TaskOutcome {
    /// Applies the overall-success rule from §4.8: the last step must have
    /// succeeded and must not still be sitting on an unresolved CAPTCHA.
    pub fn from_steps(agent_id: impl Into<String>, query: impl Into<String>, steps: Vec<StepRecord>) -> Self {
        let overall_success = steps
            .last()
            .map(|last| last.success && !last.result.is_captcha())
            .unwrap_or(false);
        Self {
            agent_id: agent_id.into(),
            overall_success,
            query: query.into(),
            steps,
        }
    }
}
