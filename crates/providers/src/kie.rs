//! Adapter for the KIE jobs API.
//!
//! KIE reports application-level failures inside a 200 response, so a
//! successful HTTP exchange still requires `code == 200` and a task id
//! in the body before the job counts as created.

use async_trait::async_trait;
use serde_json::{json, Value};

use pictor_core::types::Platform;

use crate::adapter::{parse_json, AdapterError, ProviderAdapter};

const DEFAULT_BASE_URL: &str = "https://api.kie.ai";

pub struct KieAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl KieAdapter {
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
impl ProviderAdapter for KieAdapter {
    fn platform(&self) -> Platform {
        Platform::Kie
    }

    async fn submit(
        &self,
        job_name: &str,
        input: &Value,
        callback_url: &str,
    ) -> Result<String, AdapterError> {
        let url = format!("{}/api/v1/jobs/createTask", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": job_name,
                "callBackUrl": callback_url,
                "input": input,
            }))
            .send()
            .await?;

        let body = parse_json(response).await?;

        if body["code"].as_i64() != Some(200) {
            let message = body["message"].as_str().unwrap_or("unknown error");
            return Err(AdapterError::Rejected(format!(
                "code {}: {message}",
                body["code"]
            )));
        }

        body["data"]["taskId"]
            .as_str()
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| AdapterError::MalformedResponse("missing data.taskId".into()))
    }
}
