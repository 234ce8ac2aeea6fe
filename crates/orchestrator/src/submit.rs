//! The orchestrator façade: one logical request in, N concurrent
//! protocol attempts out.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;

use pictor_core::catalog::{ModelCatalog, ModelSpec};
use pictor_core::error::SubmitError;
use pictor_core::retry::RetryPolicy;
use pictor_core::types::{ModelId, Platform, TaskType, UserId};
use pictor_db::models::generation_task::PlaceholderTask;
use pictor_db::store::{CreditLedger, TaskStore};
use pictor_providers::ProviderRegistry;

use crate::guard;
use crate::normalize;
use crate::protocol::{self, AttemptContext, AttemptError};

/// Successful submission: the reconciled provider task ids, one per
/// attempt that reached the terminal success state.
#[derive(Debug)]
pub struct SubmitReceipt {
    pub task_ids: Vec<String>,
}

/// Generation task submission orchestrator.
///
/// All collaborators are injected: the model catalog, the provider
/// registry, the durable task store, and the credit ledger. The
/// orchestrator itself holds no mutable state and is shared behind an
/// `Arc` by the API layer.
pub struct Orchestrator {
    catalog: Arc<ModelCatalog>,
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn TaskStore>,
    ledger: Arc<dyn CreditLedger>,
    callback_url: String,
    retry: RetryPolicy,
}

impl Orchestrator {
    pub fn new(
        catalog: Arc<ModelCatalog>,
        registry: Arc<ProviderRegistry>,
        store: Arc<dyn TaskStore>,
        ledger: Arc<dyn CreditLedger>,
        callback_url: String,
    ) -> Self {
        Self {
            catalog,
            registry,
            store,
            ledger,
            callback_url,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the reconciliation retry schedule (used by tests).
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub(crate) fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub(crate) fn store(&self) -> &dyn TaskStore {
        self.store.as_ref()
    }

    pub(crate) fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub(crate) fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Submit one logical generation request.
    ///
    /// Expands into `num_images` independent attempts, all checked
    /// once upfront against the caller's budget and category quota.
    /// Succeeds when at least one attempt reconciles; every attempt
    /// always runs to completion so partial successes are all
    /// reported.
    pub async fn submit(
        &self,
        user_id: UserId,
        target_model: ModelId,
        params: Value,
    ) -> Result<SubmitReceipt, SubmitError> {
        // Policy substitution: text-only models with reference media
        // are swapped for their image-conditioned sibling.
        let target_model = normalize::resolve_target_model(target_model, &params);
        let spec = self
            .catalog
            .get(target_model)
            .ok_or(SubmitError::ModelNotFound(target_model))?;

        let cost = guard::resolve_cost(target_model, spec, &params)?;
        let attempt_count = normalize::attempt_count(&params);

        // Soft reservation: in-flight cost plus this batch must fit
        // within the ledger balance.
        let reserved = guard::reserved_in_flight(self.store.as_ref(), user_id).await;
        let required = cost * f64::from(attempt_count) + reserved;
        guard::check_budget(self.ledger.as_ref(), user_id, required).await?;

        if spec.task_type == TaskType::Video {
            guard::check_category_quota(self.store.as_ref(), user_id, spec.task_type).await?;
        }

        // Params are parsed once for the whole batch; the per-attempt
        // upgrade hook operates on this parsed input.
        let input = (spec.parse)(&params).map_err(|e| invalid_params(spec, e.message))?;

        let payload = normalize::redact_payload(&params);
        let tool = params["tool"].as_str().map(str::to_owned);

        tracing::info!(
            %user_id,
            model_id = target_model,
            model = spec.name,
            platform = %spec.platform,
            attempt_count,
            cost,
            "Submitting generation batch",
        );

        let attempts = (0..attempt_count).map(|_| {
            self.run_single_attempt(user_id, target_model, spec, &input, &payload, tool.clone(), cost)
        });
        let results = join_all(attempts).await;

        let mut task_ids = Vec::new();
        let mut rate_limited = false;
        for result in results {
            match result {
                Ok(task_id) => task_ids.push(task_id),
                Err(AttemptError::RateLimited) => rate_limited = true,
                Err(AttemptError::Failed(_)) => {}
            }
        }

        if !task_ids.is_empty() {
            return Ok(SubmitReceipt { task_ids });
        }

        // All attempts aborted. A rate-limit abort takes priority in
        // the reported category.
        if rate_limited {
            return Err(SubmitError::RateLimitExceeded {
                category: spec.task_type.as_str(),
            });
        }
        Err(SubmitError::SubmissionFailed("Failed to submit task".into()))
    }

    /// One attempt: apply the upgrade hook, pick the adapter, and run
    /// the submission protocol.
    async fn run_single_attempt(
        &self,
        user_id: UserId,
        target_model: ModelId,
        spec: &ModelSpec,
        input: &Value,
        payload: &Value,
        tool: Option<String>,
        cost: f64,
    ) -> Result<String, AttemptError> {
        let upgraded = spec.upgrade_by_input.and_then(|hook| hook(input));
        let (model_id, effective) = match upgraded {
            Some(id) => match self.catalog.get(id) {
                Some(upgraded_spec) => (id, upgraded_spec),
                None => {
                    tracing::error!(
                        model_id = id,
                        "Upgrade hook produced an unknown model, keeping original",
                    );
                    (target_model, spec)
                }
            },
            None => (target_model, spec),
        };

        let Some(adapter) = self.registry.adapter_for(effective.platform) else {
            tracing::error!(
                platform = %effective.platform,
                "No adapter configured for platform",
            );
            return Err(AttemptError::Failed("Failed to submit task".into()));
        };

        let fields = PlaceholderTask {
            task_id: String::new(), // minted by the protocol
            user_id,
            model_id,
            model_name: effective.name.to_owned(),
            platform: effective.platform.as_str().to_owned(),
            task_type: effective.task_type.as_str().to_owned(),
            cost,
            payload: payload.clone(),
            tool,
        };

        let ctx = AttemptContext {
            store: self.store.as_ref(),
            adapter,
            callback_url: &self.callback_url,
            retry: self.retry,
        };
        protocol::run_attempt(&ctx, fields, input).await
    }
}

/// Attach provider context to a parse failure when the platform
/// surfaces structured validation errors.
fn invalid_params(spec: &ModelSpec, message: String) -> SubmitError {
    if spec.platform == Platform::Replicate {
        return SubmitError::InvalidParams {
            message,
            model: Some(spec.name.to_owned()),
            platform: Some(spec.platform),
        };
    }
    SubmitError::invalid_params(message)
}
