//! `ReadPage` dispatch (§4.8): extract the already-loaded page; route
//! through the CAPTCHA Controller and retry once if a challenge shows up.

use captcha_controller::WaitOutcome;
use taskbrowser_core_types::{TaskResult, TaskResultData};

use crate::session::AgentSession;
use crate::{captcha, convert};

pub async fn dispatch(session: &mut AgentSession) {
    if challenge_detector::has_challenge(session.surface.as_ref(), &session.active_page).await {
        captcha::enter_paused(session, "read_page").await;
        if matches!(captcha::wait_for_clearance(session).await, WaitOutcome::Resolved) {
            record_extraction(session).await;
        }
        return;
    }

    record_extraction(session).await;
}

async fn record_extraction(session: &mut AgentSession) {
    let result = match content_extractor::extract(session.surface.as_ref(), &session.active_page, session.oracle.as_deref()).await
    {
        Ok(report) => convert::page_report_to_task_result(&report),
        Err(err) => TaskResult::failure("page extraction failed", TaskResultData::empty(), err.to_string()),
    };
    session.record_step("read_page", result);
}
