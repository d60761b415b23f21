//! Glue between the orchestrator's step trace and the CAPTCHA Controller
//! state machine: recording the `Paused` entry and the eventual
//! `Resolved`/`TimedOut` step.

use captcha_controller::{CaptchaController, WaitOutcome};
use taskbrowser_core_types::{TaskResult, TaskResultData};

use crate::session::AgentSession;

pub async fn enter_paused(session: &mut AgentSession, step_label: &str) -> String {
    let captcha_url = session
        .surface
        .current_url(&session.active_page)
        .await
        .unwrap_or_default();
    session.set_captcha_detected(true);
    let controller = CaptchaController::default();
    let message = controller.notification_message(&captcha_url);
    session.record_step(step_label, TaskResult::captcha_detected(message, captcha_url.clone()));
    captcha_url
}

/// Polls until the challenge clears or times out, recording the
/// resulting step either way.
pub async fn wait_for_clearance(session: &mut AgentSession) -> WaitOutcome {
    let controller = CaptchaController::default();
    let outcome = controller
        .wait_for_resolution(session.surface.as_ref(), &session.active_page)
        .await;
    match outcome {
        WaitOutcome::Resolved => {
            session.set_captcha_detected(false);
            session.record_step(
                "captcha_resolved",
                TaskResult::success("challenge cleared", TaskResultData::empty()),
            );
        }
        WaitOutcome::TimedOut => {
            session.record_step(
                "captcha_timeout",
                TaskResult::failure(
                    "CAPTCHA wait exceeded max_wait_seconds",
                    TaskResultData::empty(),
                    "CAPTCHA_TIMEOUT",
                ),
            );
        }
    }
    outcome
}
