//! `FixIssue` dispatch (§4.8): ask the oracle for a remediation
//! narrative, or hand back a static manual-intervention record when no
//! oracle is configured.

use reasoning_oracle::ReasoningOracle;
use taskbrowser_core_types::{Query, TaskResult, TaskResultData};

use crate::session::AgentSession;

const MANUAL_INTERVENTION_MESSAGE: &str =
    "Automatic remediation is unavailable without a reasoning oracle; manual intervention is required.";

pub async fn dispatch(session: &mut AgentSession, query: &Query) {
    let current_url = session
        .surface
        .current_url(&session.active_page)
        .await
        .unwrap_or_default();

    let result = match session.oracle.as_deref() {
        Some(oracle) => {
            let prompt = format!(
                "The task hit an issue while working on '{}'. Current page: {}. Describe a concrete remediation.",
                query.as_str(),
                current_url
            );
            match oracle.generate_text(&prompt).await {
                Ok(narrative) => TaskResult::success(narrative, TaskResultData::new("", current_url)),
                Err(_) => TaskResult::success(
                    MANUAL_INTERVENTION_MESSAGE,
                    TaskResultData::new("", current_url),
                ),
            }
        }
        None => TaskResult::success(MANUAL_INTERVENTION_MESSAGE, TaskResultData::new("", current_url)),
    };

    session.record_step("fix_issue", result);
}
