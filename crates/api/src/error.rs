use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use pictor_core::error::SubmitError;
use pictor_orchestrator::FallbackError;

/// Application-level error type for HTTP handlers.
///
/// Wraps the orchestrator's domain errors and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON
/// error responses of the shape `{ "error": ..., "code": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A categorized submission error from the orchestrator.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// A fallback-flow error from the orchestrator.
    #[error(transparent)]
    Fallback(#[from] FallbackError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or malformed caller identity.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            // --- Submission error categories ---
            AppError::Submit(submit) => match submit {
                SubmitError::ModelNotFound(_) => (
                    StatusCode::BAD_REQUEST,
                    "MODEL_NOT_FOUND",
                    "Model not found".to_string(),
                    None,
                ),
                SubmitError::InvalidCost { .. } => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_COST",
                    "Invalid cost".to_string(),
                    None,
                ),
                SubmitError::InsufficientCredits { .. } => (
                    StatusCode::PAYMENT_REQUIRED,
                    "NOT_ENOUGH_CREDITS",
                    "Insufficient credits".to_string(),
                    None,
                ),
                SubmitError::RateLimitExceeded { .. } => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "RATE_LIMIT_EXCEEDED",
                    "Rate limit exceeded".to_string(),
                    None,
                ),
                SubmitError::InvalidParams {
                    message,
                    model,
                    platform,
                } => {
                    // Provider context travels with structured
                    // validation errors so clients can display it.
                    let details = platform.as_ref().map(|p| {
                        json!({
                            "platform": p.as_str(),
                            "model": model,
                            "message": message,
                        })
                    });
                    (
                        StatusCode::BAD_REQUEST,
                        "INVALID_PARAMS",
                        "Invalid params".to_string(),
                        details,
                    )
                }
                SubmitError::SubmissionFailed(msg) => (
                    StatusCode::BAD_GATEWAY,
                    "SUBMISSION_FAILED",
                    msg.clone(),
                    None,
                ),
            },

            // --- Fallback-flow errors ---
            AppError::Fallback(fallback) => match fallback {
                FallbackError::ModelNotFound(_) => (
                    StatusCode::BAD_REQUEST,
                    "MODEL_NOT_FOUND",
                    "Fallback model config not found".to_string(),
                    None,
                ),
                FallbackError::InvalidParams(msg) => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_PARAMS",
                    msg.clone(),
                    None,
                ),
                FallbackError::SubmitFailed(msg) => (
                    StatusCode::BAD_GATEWAY,
                    "SUBMISSION_FAILED",
                    msg.clone(),
                    None,
                ),
                FallbackError::RewriteFailed => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Failed to update task record".to_string(),
                    None,
                ),
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone(), None)
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
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
