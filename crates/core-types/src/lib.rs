//! Shared data model for the browser task orchestrator.
//!
//! Every type here is a plain value: no browser handles, no I/O. The
//! handles that make up an `AgentSession` live in `orchestrator`, which is
//! the only crate allowed to own them.

pub mod action_plan;
pub mod fallback;
pub mod ids;
pub mod page_report;
pub mod query;
pub mod result_entry;
pub mod step_record;
pub mod task_outcome;
pub mod task_result;

pub use action_plan::{ActionKind, ActionPlan, PlanError};
pub use fallback::FallbackStrategy;
pub use ids::TaskId;
pub use page_report::{Headings, PageReport};
pub use query::Query;
pub use result_entry::ResultEntry;
pub use step_record::StepRecord;
pub use task_outcome::TaskOutcome;
pub use task_result::{TaskResult, TaskResultData};

/// Sentinel placed in `TaskResult.error` when a primitive's navigation or
/// interaction landed on a CAPTCHA/anti-automation challenge. Load-bearing:
/// it is the only signal that routes control into the CAPTCHA controller.
pub const CAPTCHA_DETECTED: &str = "CAPTCHA_DETECTED";

/// Sentinel placed in `TaskResult.error` once every fallback strategy for a
/// blocked search has also been blocked. Terminal: the orchestrator stops.
pub const ALL_FALLBACKS_BLOCKED: &str = "ALL_FALLBACKS_BLOCKED";
