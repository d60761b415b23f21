use crate::TaskResult;

/// One append-only entry in a task's audit trace. Duplicates of the same
/// logical step are permitted: retries are recorded, never overwritten.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct StepRecord {
    pub step: String,
    pub success: bool,
    pub result: TaskResult,
}

impl StepRecord {
    pub fn new(step: impl Into<String>, result: TaskResult) -> Self {
        Self {
            step: step.into(),
            success: result.success,
            result,
        }
    }
}
