//! Handlers for generation submission and fallback.
//!
//! Caller identity arrives as the `x-user-id` header, set by the
//! upstream auth proxy; this service never validates credentials
//! itself.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pictor_core::types::{ModelId, UserId};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Header carrying the authenticated caller id.
const USER_ID_HEADER: &str = "x-user-id";

/// Extract and parse the caller id from request headers.
fn require_user_id(headers: &HeaderMap) -> Result<UserId, AppError> {
    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing x-user-id header".into()))?;
    raw.parse()
        .map_err(|_| AppError::Unauthorized("malformed x-user-id header".into()))
}

// ---------------------------------------------------------------------------
// POST /api/v1/generation/submit
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub task_ids: Vec<String>,
}

/// Submit a generation batch.
///
/// The body is the raw request params; `target_model` selects the
/// catalog entry and the rest is passed to the model's parser.
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(params): Json<Value>,
) -> AppResult<Json<SubmitResponse>> {
    let user_id = require_user_id(&headers)?;

    let target_model: ModelId = params["target_model"]
        .as_i64()
        .ok_or_else(|| AppError::BadRequest("target_model is required".into()))?
        as ModelId;

    let receipt = state
        .orchestrator
        .submit(user_id, target_model, params)
        .await?;

    Ok(Json(SubmitResponse {
        task_ids: receipt.task_ids,
    }))
}

// ---------------------------------------------------------------------------
// POST /api/v1/generation/fallback
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct FallbackRequest {
    pub original_task_id: String,
    pub original_payload: Value,
    pub fallback_model_id: ModelId,
    #[serde(default)]
    pub params_override: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct FallbackResponse {
    pub new_task_id: String,
}

/// Re-route an existing task to a fallback model, rewriting the
/// original record in place.
pub async fn create_fallback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<FallbackRequest>,
) -> AppResult<Json<FallbackResponse>> {
    // Identity is required even though the row is keyed by task id;
    // unauthenticated internal calls are not allowed through this
    // surface.
    require_user_id(&headers)?;

    let new_task_id = state
        .orchestrator
        .create_fallback_task(
            &request.original_task_id,
            request.original_payload,
            request.fallback_model_id,
            request.params_override,
        )
        .await?;

    Ok(Json(FallbackResponse { new_task_id }))
}
