//! Tests for `AppError` → HTTP response mapping.
//!
//! These tests verify that each error category produces the correct
//! HTTP status code, error code, and message. They do NOT need an HTTP
//! server -- they call `IntoResponse` directly on `AppError` values.

use axum::response::IntoResponse;
use http_body_util::BodyExt;

use pictor_api::error::AppError;
use pictor_core::error::SubmitError;
use pictor_core::types::Platform;
use pictor_orchestrator::FallbackError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (axum::http::StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: ModelNotFound maps to 400 with MODEL_NOT_FOUND code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn model_not_found_returns_400() {
    let err = AppError::Submit(SubmitError::ModelNotFound(42));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "MODEL_NOT_FOUND");
    assert_eq!(json["error"], "Model not found");
}

// ---------------------------------------------------------------------------
// Test: InsufficientCredits maps to 402 with NOT_ENOUGH_CREDITS code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn insufficient_credits_returns_402() {
    let err = AppError::Submit(SubmitError::InsufficientCredits { required: 120.0 });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json["code"], "NOT_ENOUGH_CREDITS");
}

// ---------------------------------------------------------------------------
// Test: RateLimitExceeded maps to 429
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rate_limit_returns_429() {
    let err = AppError::Submit(SubmitError::RateLimitExceeded { category: "video" });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["code"], "RATE_LIMIT_EXCEEDED");
}

// ---------------------------------------------------------------------------
// Test: InvalidParams with provider context carries details
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_params_with_provider_context_includes_details() {
    let err = AppError::Submit(SubmitError::InvalidParams {
        message: "duration must be 5 or 9".into(),
        model: Some("luma/ray-flash-2-720p".into()),
        platform: Some(Platform::Replicate),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_PARAMS");
    assert_eq!(json["details"]["platform"], "replicate");
    assert_eq!(json["details"]["model"], "luma/ray-flash-2-720p");
    assert_eq!(json["details"]["message"], "duration must be 5 or 9");
}

// ---------------------------------------------------------------------------
// Test: InvalidParams without context omits details
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_params_without_context_has_no_details() {
    let err = AppError::Submit(SubmitError::invalid_params("prompt is required"));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert!(json.get("details").is_none());
}

// ---------------------------------------------------------------------------
// Test: SubmissionFailed maps to 502
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submission_failed_returns_502() {
    let err = AppError::Submit(SubmitError::SubmissionFailed("Failed to submit task".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "SUBMISSION_FAILED");
}

// ---------------------------------------------------------------------------
// Test: fallback rewrite failure sanitizes to a 500
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fallback_rewrite_failure_returns_500() {
    let err = AppError::Fallback(FallbackError::RewriteFailed);

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
}

// ---------------------------------------------------------------------------
// Test: Unauthorized maps to 401
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_returns_401() {
    let err = AppError::Unauthorized("missing x-user-id header".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

// ---------------------------------------------------------------------------
// Test: InternalError sanitizes its message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("secret database credentials leaked".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");

    // The response body must NOT contain the original error details.
    let body_text = json.to_string();
    assert!(
        !body_text.contains("secret"),
        "Internal error response must not leak sensitive details"
    );
    assert_eq!(json["error"], "An internal error occurred");
}
