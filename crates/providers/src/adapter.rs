//! The uniform provider adapter contract.

use async_trait::async_trait;
use serde_json::Value;

use pictor_core::types::Platform;

/// Errors from a provider adapter, normalized across providers.
///
/// Timeouts, non-2xx responses, and malformed success payloads all end
/// up here; the submission protocol treats every variant identically
/// (no provider job exists, nothing to clean up on the provider side).
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response that does not carry a usable job id.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// The provider accepted the request but refused the job.
    #[error("Provider rejected the job: {0}")]
    Rejected(String),
}

/// A single external compute provider.
///
/// `submit` must create exactly one provider job on success and none
/// on failure. `cancel` is best-effort: adapters for providers without
/// a cancellation API keep the default no-op, which logs and returns.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    /// Submit a job, attaching `callback_url` for asynchronous
    /// completion reporting. Returns the provider-issued task id.
    async fn submit(
        &self,
        job_name: &str,
        input: &Value,
        callback_url: &str,
    ) -> Result<String, AdapterError>;

    /// Whether this adapter's [`cancel`](Self::cancel) actually reaches
    /// the provider.
    fn supports_cancel(&self) -> bool {
        false
    }

    /// Best-effort cancellation of a previously submitted job.
    async fn cancel(&self, task_id: &str) {
        tracing::warn!(
            platform = %self.platform(),
            task_id,
            "No cancel API for this platform, leaving provider job in place",
        );
    }
}

/// Ensure the response has a success status code. Returns the response
/// unchanged on success, or an [`AdapterError::Api`] containing the
/// status and body text on failure.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, AdapterError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(AdapterError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Parse a success response body as JSON.
pub(crate) async fn parse_json(response: reqwest::Response) -> Result<Value, AdapterError> {
    let response = ensure_success(response).await?;
    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| AdapterError::MalformedResponse(format!("invalid JSON body: {e}")))
}
