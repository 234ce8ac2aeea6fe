//! Adapter for the fal serverless queue.
//!
//! Jobs are enqueued with `POST /{model}` against the queue endpoint;
//! the webhook is attached as the `fal_webhook` query parameter. A
//! submission only counts as accepted when the response reports
//! `IN_QUEUE`.

use async_trait::async_trait;
use serde_json::Value;

use pictor_core::types::Platform;

use crate::adapter::{parse_json, AdapterError, ProviderAdapter};

/// Default queue endpoint.
const DEFAULT_BASE_URL: &str = "https://queue.fal.run";

pub struct FalAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl FalAdapter {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the queue endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl ProviderAdapter for FalAdapter {
    fn platform(&self) -> Platform {
        Platform::Fal
    }

    async fn submit(
        &self,
        job_name: &str,
        input: &Value,
        callback_url: &str,
    ) -> Result<String, AdapterError> {
        let url = format!("{}/{}", self.base_url, job_name);

        let response = self
            .client
            .post(&url)
            .query(&[("fal_webhook", callback_url)])
            .header("Authorization", format!("Key {}", self.api_key))
            .json(input)
            .send()
            .await?;

        let body = parse_json(response).await?;

        let status = body["status"].as_str().unwrap_or_default();
        if status != "IN_QUEUE" {
            return Err(AdapterError::Rejected(format!(
                "queue status is {status:?}, expected IN_QUEUE"
            )));
        }

        body["request_id"]
            .as_str()
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| AdapterError::MalformedResponse("missing request_id".into()))
    }
}
