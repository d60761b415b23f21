use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use taskbrowser_core_types::Query;
use tracing::{info, instrument, warn};

use super::ServeState;

pub(crate) fn router() -> Router<ServeState> {
    Router::new().route("/v1/tasks", post(create_task_handler))
}

/// Mirrors §6's request contract exactly: `query` required and non-empty,
/// `agent_id`/`user_id` optional.
#[derive(Debug, Deserialize)]
struct TaskRequest {
    query: String,
    agent_id: Option<String>,
    user_id: Option<String>,
}

#[instrument(skip(state, request), fields(agent_id = request.agent_id.as_deref()))]
async fn create_task_handler(State(state): State<ServeState>, Json(request): Json<TaskRequest>) -> impl IntoResponse {
    if request.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "data": null,
                "error": "query must not be empty",
            })),
        )
            .into_response();
    }

    let caller_supplied_agent_id = request.agent_id.is_some();

    let mut query = Query::new(request.query);
    if let Some(agent_id) = request.agent_id {
        query = query.with_agent_id(agent_id);
    }
    if let Some(user_id) = request.user_id {
        query = query.with_user_id(user_id);
    }

    // §5: a dedicated browser per session is a real resource; bound how
    // many run concurrently rather than letting requests queue unbounded
    // inside the orchestrator.
    let _permit = match state.session_slots.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(err) => {
            warn!(%err, "session slot semaphore closed");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "data": null,
                    "error": "no browser session slots available",
                })),
            )
                .into_response();
        }
    };

    let outcome = orchestrator::run(query, state.oracle.clone()).await;

    if let Some(record_id) = state.workstream_store.record(&outcome, caller_supplied_agent_id) {
        info!(record_id, "persisted workstream record");
    }

    let success = outcome.overall_success;
    let last_error = outcome.steps.last().and_then(|step| step.result.error.clone());

    (
        StatusCode::OK,
        Json(json!({
            "success": success,
            "data": outcome,
            "error": last_error,
        })),
    )
        .into_response()
}
