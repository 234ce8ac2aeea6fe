//! Adapter for Replicate predictions.
//!
//! The catalog model name may encode a version after `:`
//! (`owner/model:version`); the version half is passed separately.
//! Replicate is the one platform with a cancellation API, so this is
//! the only adapter overriding [`ProviderAdapter::cancel`].

use async_trait::async_trait;
use serde_json::{json, Value};

use pictor_core::types::Platform;

use crate::adapter::{parse_json, AdapterError, ProviderAdapter};

const DEFAULT_BASE_URL: &str = "https://api.replicate.com";

pub struct ReplicateAdapter {
    client: reqwest::Client,
    api_token: String,
    base_url: String,
}

impl ReplicateAdapter {
    pub fn new(client: reqwest::Client, api_token: String) -> Self {
        Self {
            client,
            api_token,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the API endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_token)
    }
}

#[async_trait]
impl ProviderAdapter for ReplicateAdapter {
    fn platform(&self) -> Platform {
        Platform::Replicate
    }

    async fn submit(
        &self,
        job_name: &str,
        input: &Value,
        callback_url: &str,
    ) -> Result<String, AdapterError> {
        let (model, version) = match job_name.split_once(':') {
            Some((model, version)) => (model, Some(version)),
            None => (job_name, None),
        };

        let mut body = json!({
            "model": model,
            "input": input,
            "webhook": callback_url,
            "webhook_events_filter": ["completed"],
        });
        if let Some(version) = version {
            body["version"] = Value::String(version.to_owned());
        }

        let response = self
            .client
            .post(format!("{}/v1/predictions", self.base_url))
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;

        let body = parse_json(response).await?;

        body["id"]
            .as_str()
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| AdapterError::MalformedResponse("missing prediction id".into()))
    }

    fn supports_cancel(&self) -> bool {
        true
    }

    async fn cancel(&self, task_id: &str) {
        let url = format!("{}/v1/predictions/{}/cancel", self.base_url, task_id);
        match self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                tracing::info!(task_id, "Cancelled replicate prediction");
            }
            Ok(response) => {
                tracing::warn!(
                    task_id,
                    status = response.status().as_u16(),
                    "Failed to cancel replicate prediction",
                );
            }
            Err(e) => {
                tracing::warn!(task_id, error = %e, "Failed to cancel replicate prediction");
            }
        }
    }
}
