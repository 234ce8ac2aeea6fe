//! Caller-facing error taxonomy for the submission orchestrator.
//!
//! Configuration and validation variants are detected before any side
//! effect; policy denials occur before any write; `SubmissionFailed`
//! is only surfaced after the protocol has already compensated for any
//! partial state, so callers never have cleanup to do.

use crate::types::{ModelId, Platform};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The requested model id has no catalog entry.
    #[error("Model not found: {0}")]
    ModelNotFound(ModelId),

    /// The model's cost function produced a non-finite or negative value.
    #[error("Model {model_id} produced an invalid cost")]
    InvalidCost { model_id: ModelId },

    /// The caller's available budget cannot cover the batch plus their
    /// in-flight reservations.
    #[error("Insufficient credits: {required} required")]
    InsufficientCredits { required: f64 },

    /// The caller exceeded the per-category quota, or the quota could
    /// not be evaluated (which is treated as a denial, not fail-open).
    #[error("Rate limit exceeded for {category} generation")]
    RateLimitExceeded { category: &'static str },

    /// The model's parser rejected the request params. Platform and
    /// model context are attached when the provider surfaces structured
    /// validation errors.
    #[error("Invalid params: {message}")]
    InvalidParams {
        message: String,
        model: Option<String>,
        platform: Option<Platform>,
    },

    /// Every attempt in the batch aborted; all partial state was
    /// already compensated away.
    #[error("Failed to submit task: {0}")]
    SubmissionFailed(String),
}

impl SubmitError {
    /// Build an `InvalidParams` without provider context.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
            model: None,
            platform: None,
        }
    }
}
