use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Rejected locally, before any store call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("please enter a name for the API key")]
    EmptyName,
}

/// Any failure from the record store: transport, rejection, or a response
/// that does not match the record schema.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed store response: {0}")]
    Malformed(String),

    #[error("no record with id {0}")]
    NotFound(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("clipboard is not supported on this host")]
    Unsupported,

    #[error("clipboard is unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard write was denied: {0}")]
    Denied(String),
}

/// Outcome of a failed dashboard operation. Every variant is surfaced to the
/// viewer as an error notification; none of them is fatal.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error("unknown API key: {0}")]
    UnknownKey(String),

    #[error("no rename in progress")]
    NotEditing,
}

/// Errors returned by the HTTP surface itself. Operation failures travel in
/// the dashboard view's notification instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("key not found")]
    KeyNotFound,

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::KeyNotFound => (
                StatusCode::NOT_FOUND,
                "invalid_request_error",
                "key_not_found",
                "no API key with that id".to_string(),
            ),
            AppError::BadRequest(reason) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "bad_request",
                reason.clone(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
