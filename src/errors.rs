//! Error handling module
//!
//! Every error that can reach the HTTP boundary. Per §7, the outer request
//! handler is the only layer allowed to emit non-200 responses, and only
//! for malformed input or unrecoverable configuration errors — everything
//! else is caught at the Orchestrator boundary and turned into a failing
//! `TaskOutcome` instead of an `AppError`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Io(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "success": false,
            "data": null,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
