//! Error types for the HTTP layer.
//!
//! [`ApiError`] unifies all failure modes into a single enum that converts
//! into an Axum response via [`IntoResponse`]. Every error body has the
//! shape `{ "error": <message>, "status": <code> }`.

use agenda_core::SchedulerError;
use agenda_db::DbError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur while serving a request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A path, query or body value was malformed or failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request conflicts with current state (e.g. a dependency cycle).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The system of record failed.
    #[error("database error: {0}")]
    Database(#[from] DbError),

    /// The feature needs a backend this process was started without.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::UnknownEvent(id) => Self::NotFound(format!("event {id}")),
            SchedulerError::Dependency { .. } | SchedulerError::Ordering(_) => {
                Self::Conflict(err.to_string())
            }
            SchedulerError::Source(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::Database(e) => {
                tracing::error!(error = %e, "Database failure");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("database error: {e}"))
            }
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
