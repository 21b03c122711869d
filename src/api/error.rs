use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Request-level failures surfaced at the HTTP boundary.
///
/// Every variant maps to a stable `{ "error": ..., "details"? }` JSON body so
/// the front-end renders one generic failure message, while tests can still
/// assert on the specific kind.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Source file missing: {0}")]
    SourceMissing(String),

    #[error("Media ingestion failed: {0}")]
    Ingestion(String),

    #[error("Media processing did not finish within {}s", .0.as_secs())]
    ProcessingTimeout(Duration),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Missing or malformed JSON input is a validation failure like any other:
/// same 400 status, same `{ "error": ... }` shape.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::SourceMissing(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Ingestion(detail) => {
                tracing::error!("Ingestion error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Media ingestion failed".to_string(),
                    Some(detail),
                )
            }
            AppError::ProcessingTimeout(timeout) => (
                StatusCode::GATEWAY_TIMEOUT,
                format!(
                    "Media processing did not finish within {}s",
                    timeout.as_secs()
                ),
                None,
            ),
            AppError::Generation(detail) => {
                tracing::error!("Generation error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Generation failed".to_string(),
                    Some(detail),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
            AppError::Anyhow(e) => {
                tracing::error!("Anyhow error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
        };

        let body = match details {
            Some(details) => Json(json!({ "error": message, "details": details })),
            None => Json(json!({ "error": message })),
        };

        (status, body).into_response()
    }
}
