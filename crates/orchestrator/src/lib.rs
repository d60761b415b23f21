//! Orchestrator (§4.8): top-level `run()` loop. Plans once, dispatches on
//! the plan kind, and always returns a `TaskOutcome` — even a browser
//! launch failure becomes a single synthetic failing step rather than an
//! error that escapes this crate.

mod captcha;
mod convert;
mod fix_issue;
mod open_url;
mod read_page;
mod residual;
mod search_default;
mod session;
mod util;

pub use session::AgentSession;

use std::sync::Arc;

use reasoning_oracle::ReasoningOracle;
use taskbrowser_core_types::{ActionKind, Query, StepRecord, TaskId, TaskOutcome, TaskResult, TaskResultData};

/// Runs one task end to end: plan, dispatch, cleanup, outcome.
pub async fn run(query: Query, oracle: Option<Arc<dyn ReasoningOracle>>) -> TaskOutcome {
    let agent_id = query.agent_id.clone().unwrap_or_else(|| TaskId::new().to_string());

    let mut session = match AgentSession::new(agent_id.clone(), oracle.clone()).await {
        Ok(session) => session,
        Err(err) => {
            let step = StepRecord::new(
                "session_init",
                TaskResult::failure("failed to launch browser session", TaskResultData::empty(), err.to_string()),
            );
            return TaskOutcome::from_steps(agent_id, query.text.clone(), vec![step]);
        }
    };

    let plan = planner::plan(&query, oracle.as_deref()).await;
    session.record_step(
        "plan",
        TaskResult::success(
            plan.reason.clone(),
            TaskResultData::new("", plan.target.clone())
                .with_extra("kind", plan.kind.as_str())
                .with_extra("expected_outcome", plan.expected_outcome.clone()),
        ),
    );

    match plan.kind {
        ActionKind::OpenUrl => open_url::dispatch(&mut session, &plan.target, &query).await,
        ActionKind::SearchDefault => search_default::dispatch(&mut session, &query).await,
        ActionKind::ReadPage => read_page::dispatch(&mut session).await,
        ActionKind::FixIssue => fix_issue::dispatch(&mut session, &query).await,
    }

    // §5 resource policy: force_close is false exactly while a challenge
    // is unresolved, so the browser survives for a human to finish it.
    let force_close = !session.captcha_detected();
    session.cleanup(force_close).await;

    TaskOutcome::from_steps(agent_id, query.text.clone(), session.into_steps())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskbrowser_core_types::{FallbackStrategy, PageReport, ResultEntry};

    #[test]
    fn overall_success_rule_matches_spec_invariant_3() {
        let ok = StepRecord::new("x", TaskResult::success("done", TaskResultData::empty()));
        let outcome = TaskOutcome::from_steps("agent", "q", vec![ok]);
        assert!(outcome.overall_success);

        let captcha_ending = StepRecord::new("x", TaskResult::captcha_detected("stuck", "https://example.com"));
        let outcome = TaskOutcome::from_steps("agent", "q", vec![captcha_ending]);
        assert!(!outcome.overall_success);
    }

    #[test]
    fn result_entry_urls_are_http() {
        let entry = ResultEntry {
            rank: 1,
            title: "t".into(),
            url: "https://example.com".into(),
            snippet: "s".into(),
        };
        assert!(entry.is_normalised());
    }

    #[test]
    fn fallback_policy_never_emits_disallowed_engine() {
        let strategy = FallbackStrategy::AltSearchEngine {
            engine: fallback_chooser::DEFAULT_ENGINE.to_string(),
        };
        assert!(matches!(strategy, FallbackStrategy::AltSearchEngine { engine } if fallback_chooser::ALLOWED_ENGINES.contains(&engine.as_str())));
    }

    #[test]
    fn page_report_round_trips_through_json() {
        let report = PageReport::default();
        let value = serde_json::to_value(&report).unwrap();
        let back: PageReport = serde_json::from_value(value).unwrap();
        assert_eq!(report, back);
    }
}
