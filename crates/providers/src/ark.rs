//! Adapter for the Ark content generation API.

use async_trait::async_trait;
use serde_json::{json, Value};

use pictor_core::types::Platform;

use crate::adapter::{parse_json, AdapterError, ProviderAdapter};

const DEFAULT_BASE_URL: &str = "https://ark.cn-beijing.volces.com/api/v3";

pub struct ArkAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ArkAdapter {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the API endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl ProviderAdapter for ArkAdapter {
    fn platform(&self) -> Platform {
        Platform::Ark
    }

    async fn submit(
        &self,
        job_name: &str,
        input: &Value,
        callback_url: &str,
    ) -> Result<String, AdapterError> {
        let url = format!("{}/contents/generations/tasks", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": job_name,
                "content": input,
                "callback_url": callback_url,
            }))
            .send()
            .await?;

        let body = parse_json(response).await?;

        body["id"]
            .as_str()
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| AdapterError::MalformedResponse("missing task id".into()))
    }
}
