//! Fallback substitution flow.
//!
//! Re-routes an existing task to a replacement model: re-parse, re-
//! dispatch, then rewrite the original row in place. This is the one
//! path where a row's `task_id` changes without the row becoming a
//! different entity; the `previous_task_id` chain is the audit trail.
//! No new placeholder is created and no budget is re-checked -- the
//! original task already paid.

use serde_json::Value;

use pictor_core::types::ModelId;
use pictor_db::models::generation_task::FallbackRewrite;

use crate::submit::Orchestrator;

#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
    #[error("Fallback model config not found: {0}")]
    ModelNotFound(ModelId),

    #[error("Failed to parse fallback params: {0}")]
    InvalidParams(String),

    #[error("Failed to submit fallback task: {0}")]
    SubmitFailed(String),

    /// The original row could not be rewritten. The dispatched
    /// provider job is logged for manual reconciliation.
    #[error("Failed to update task record")]
    RewriteFailed,
}

impl Orchestrator {
    /// Replace an existing task's model/provider in place.
    ///
    /// On success returns the new provider task id now carried by the
    /// original row. Any failure leaves the original row untouched.
    pub async fn create_fallback_task(
        &self,
        original_task_id: &str,
        original_payload: Value,
        fallback_model_id: ModelId,
        params_override: Option<Value>,
    ) -> Result<String, FallbackError> {
        let spec = self
            .catalog()
            .get(fallback_model_id)
            .ok_or(FallbackError::ModelNotFound(fallback_model_id))?;

        // Merge the stored payload with the override, retargeting it
        // at the fallback model so later replays start from there.
        let mut payload = match original_payload {
            Value::Object(map) => Value::Object(map),
            other => {
                return Err(FallbackError::InvalidParams(format!(
                    "original payload must be an object, got {other}"
                )))
            }
        };
        payload["target_model"] = Value::from(fallback_model_id);
        if let Some(Value::Object(overrides)) = params_override {
            for (key, value) in overrides {
                payload[&key] = value;
            }
        }

        let input = (spec.parse)(&payload).map_err(|e| FallbackError::InvalidParams(e.message))?;

        let adapter = self
            .registry()
            .adapter_for(spec.platform)
            .ok_or_else(|| {
                FallbackError::SubmitFailed(format!(
                    "no adapter configured for platform {}",
                    spec.platform
                ))
            })?;

        let new_task_id = adapter
            .submit(spec.name, &input, self.callback_url())
            .await
            .map_err(|e| {
                tracing::error!(
                    original_task_id,
                    fallback_model_id,
                    error = %e,
                    "Failed to submit fallback task",
                );
                FallbackError::SubmitFailed(e.to_string())
            })?;

        tracing::info!(
            original_task_id,
            new_task_id = %new_task_id,
            fallback_model_id,
            platform = %spec.platform,
            "Rewriting original task record for fallback",
        );

        let rewrite = FallbackRewrite {
            task_id: new_task_id.clone(),
            model_id: fallback_model_id,
            model_name: spec.name.to_owned(),
            platform: spec.platform.as_str().to_owned(),
            payload,
        };

        let matched = self
            .store()
            .apply_fallback(original_task_id, &rewrite)
            .await
            .map_err(|e| {
                tracing::error!(original_task_id, error = %e, "Failed to update original task record");
                FallbackError::RewriteFailed
            })?;

        if matched == 0 {
            tracing::error!(
                original_task_id,
                new_task_id = %new_task_id,
                "Original task record not found; provider job left for manual reconciliation",
            );
            return Err(FallbackError::RewriteFailed);
        }

        Ok(new_task_id)
    }
}
