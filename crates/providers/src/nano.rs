//! The in-process provider.
//!
//! Unlike the network-bound adapters, nano jobs run inside this
//! process: `submit` mints its own task id, detaches a tokio task that
//! performs the generation call, and returns immediately. The detached
//! task reports completion by POSTing to the callback URL itself, so
//! from the submission protocol's point of view this adapter is
//! indistinguishable from a remote queue.

use async_trait::async_trait;
use serde_json::{json, Value};

use pictor_core::types::Platform;

use crate::adapter::{AdapterError, ProviderAdapter};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upstream model invoked for nano jobs.
const GENERATION_MODEL: &str = "gemini-2.5-flash-image";

pub struct NanoAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl NanoAdapter {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the upstream endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl ProviderAdapter for NanoAdapter {
    fn platform(&self) -> Platform {
        Platform::Nano
    }

    async fn submit(
        &self,
        _job_name: &str,
        input: &Value,
        callback_url: &str,
    ) -> Result<String, AdapterError> {
        let task_id = uuid::Uuid::new_v4().to_string();

        let worker = NanoJob {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            task_id: task_id.clone(),
            input: input.clone(),
            callback_url: callback_url.to_owned(),
        };

        // Detach the actual generation; completion is reported through
        // the callback like any other provider.
        tokio::spawn(worker.run());

        Ok(task_id)
    }
}

/// One detached nano generation.
struct NanoJob {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    task_id: String,
    input: Value,
    callback_url: String,
}

impl NanoJob {
    async fn run(self) {
        let result = self.generate().await;

        let callback_body = match &result {
            Ok(output) => json!({
                "task_id": self.task_id,
                "status": "succeeded",
                "output": output,
            }),
            Err(e) => {
                tracing::error!(task_id = %self.task_id, error = %e, "Nano generation failed");
                json!({
                    "task_id": self.task_id,
                    "status": "failed",
                    "error": e.to_string(),
                })
            }
        };

        if let Err(e) = self
            .client
            .post(&self.callback_url)
            .json(&callback_body)
            .send()
            .await
        {
            tracing::error!(
                task_id = %self.task_id,
                error = %e,
                "Failed to deliver nano completion callback",
            );
        }
    }

    async fn generate(&self) -> Result<Value, AdapterError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, GENERATION_MODEL
        );

        let mut parts = vec![json!({
            "text": self.input["prompt"].as_str().unwrap_or_default(),
        })];
        if let Some(init) = self.input["init_images"].as_array() {
            for image in init {
                parts.push(json!({ "image_url": image }));
            }
        }

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "contents": [{ "parts": parts }] }))
            .send()
            .await?;

        crate::adapter::parse_json(response).await
    }
}
