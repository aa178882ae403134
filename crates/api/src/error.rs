use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use intake_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `intake_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An external collaborator (upload provider) refused or failed.
    #[error("Upstream service error: {0}")]
    Upstream(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Body text of every 500.
const INTERNAL_MESSAGE: &str = "An internal error occurred";

type ErrorParts = (StatusCode, &'static str, String);

/// The sanitized 500. The cause is logged by the caller, never returned.
fn internal() -> ErrorParts {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details = None;

        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::InvalidSubmission(err) => {
                    details = Some(json!(err.violations));
                    (
                        StatusCode::BAD_REQUEST,
                        "VALIDATION_ERROR",
                        "Invalid submission data".to_string(),
                    )
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "Upstream service error");
                internal()
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, axum::Json(body)).into_response()
    }
}

/// How a database failure should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorClass {
    NotFound,
    /// Unique, foreign-key, or check constraint violated.
    Constraint,
    /// Connectivity fault; the operation is safe to retry.
    Transient,
    Other,
}

/// PostgreSQL SQLSTATE codes treated as constraint violations.
const CONSTRAINT_CODES: [&str; 3] = ["23505", "23503", "23514"];

/// Sort a sqlx error into a [`DbErrorClass`].
pub fn db_error_class(err: &sqlx::Error) -> DbErrorClass {
    match err {
        sqlx::Error::RowNotFound => DbErrorClass::NotFound,
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) if CONSTRAINT_CODES.contains(&code.as_ref()) => DbErrorClass::Constraint,
            _ => DbErrorClass::Other,
        },
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => DbErrorClass::Transient,
        _ => DbErrorClass::Other,
    }
}

/// `RowNotFound` is a 404. Anything else is a sanitized 500 with the class
/// in the log.
fn classify_sqlx_error(err: &sqlx::Error) -> ErrorParts {
    match db_error_class(err) {
        DbErrorClass::NotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        DbErrorClass::Constraint => {
            tracing::error!(error = %err, "Database constraint violation");
            internal()
        }
        DbErrorClass::Transient => {
            tracing::error!(error = %err, retryable = true, "Database unavailable");
            internal()
        }
        DbErrorClass::Other => {
            tracing::error!(error = %err, "Database error");
            internal()
        }
    }
}
