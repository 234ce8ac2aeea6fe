//! The create→dispatch→reconcile protocol for a single attempt.
//!
//! Ordering is the load-bearing invariant: the durable placeholder row
//! is created strictly before the provider call, and every failure
//! after that point compensates (delete the row, and on reconciliation
//! exhaustion also best-effort cancel the provider job) so that no
//! partial state ever survives an aborted attempt.

use std::sync::Arc;

use serde_json::Value;

use pictor_core::retry::RetryPolicy;
use pictor_db::models::generation_task::PlaceholderTask;
use pictor_db::store::{CreateOutcome, TaskStore};
use pictor_providers::ProviderAdapter;

/// Prefix for locally generated placeholder task ids.
const PLACEHOLDER_PREFIX: &str = "temp";

/// Failure mode of a single submission attempt.
///
/// Rate-limit aborts are kept distinct so the aggregate error for an
/// all-failed batch can prioritise them.
#[derive(Debug)]
pub enum AttemptError {
    /// The store refused the placeholder create under its server-side
    /// rate limit. No row and no provider job exist.
    RateLimited,
    /// Any other abort. Compensation already ran; no partial state
    /// remains.
    Failed(String),
}

/// Shared collaborators for one attempt.
pub struct AttemptContext<'a> {
    pub store: &'a dyn TaskStore,
    pub adapter: Arc<dyn ProviderAdapter>,
    pub callback_url: &'a str,
    pub retry: RetryPolicy,
}

/// Mint a placeholder id for a new attempt.
fn placeholder_id() -> String {
    format!("{PLACEHOLDER_PREFIX}-{}", uuid::Uuid::new_v4())
}

/// Run one attempt through the full protocol.
///
/// On success the returned id is the provider-issued task id, already
/// reconciled onto the durable row.
pub async fn run_attempt(
    ctx: &AttemptContext<'_>,
    mut fields: PlaceholderTask,
    input: &Value,
) -> Result<String, AttemptError> {
    fields.task_id = placeholder_id();

    // Step 1: durable row first. If this fails the provider is never
    // called.
    match ctx.store.create_placeholder(&fields).await {
        Ok(CreateOutcome::Created(_)) => {}
        Ok(CreateOutcome::RateLimited) => {
            tracing::warn!(
                user_id = %fields.user_id,
                task_type = %fields.task_type,
                "Placeholder create refused by server-side rate limit",
            );
            return Err(AttemptError::RateLimited);
        }
        Err(e) => {
            tracing::error!(
                user_id = %fields.user_id,
                error = %e,
                "Placeholder write failed before any provider call",
            );
            return Err(AttemptError::Failed("Failed to submit task".into()));
        }
    }

    // Step 2: dispatch to the provider.
    let provider_task_id = match ctx
        .adapter
        .submit(&fields.model_name, input, ctx.callback_url)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(
                platform = %ctx.adapter.platform(),
                model = %fields.model_name,
                error = %e,
                "Provider dispatch failed, deleting placeholder",
            );
            delete_placeholder(ctx.store, &fields.task_id).await;
            return Err(AttemptError::Failed(e.to_string()));
        }
    };

    // Step 3: reconcile the placeholder id with the provider-issued id.
    // The freshly created row may not be visible to the update path
    // yet, so zero-rows-matched is retried on a linear backoff.
    let mut reconciled = false;
    for attempt in 1..=ctx.retry.max_attempts {
        match ctx
            .store
            .update_task_id(&fields.task_id, &provider_task_id)
            .await
        {
            Ok(matched) if matched > 0 => {
                tracing::info!(
                    task_id = %provider_task_id,
                    platform = %ctx.adapter.platform(),
                    attempt,
                    "Task submitted and reconciled",
                );
                reconciled = true;
                break;
            }
            Ok(_) => {
                tracing::warn!(
                    placeholder = %fields.task_id,
                    attempt,
                    "No row matched placeholder id during reconciliation",
                );
            }
            Err(e) => {
                tracing::warn!(
                    placeholder = %fields.task_id,
                    attempt,
                    error = %e,
                    "Reconciliation update failed",
                );
            }
        }
        if ctx.retry.has_next(attempt) {
            tokio::time::sleep(ctx.retry.delay_after(attempt)).await;
        }
    }

    if reconciled {
        return Ok(provider_task_id);
    }

    // Exhausted: a live provider job with no reconciled row would be an
    // orphan, so cancel it (best-effort) and drop the placeholder.
    tracing::error!(
        placeholder = %fields.task_id,
        provider_task_id = %provider_task_id,
        "Reconciliation exhausted, compensating",
    );
    ctx.adapter.cancel(&provider_task_id).await;
    delete_placeholder(ctx.store, &fields.task_id).await;
    Err(AttemptError::Failed("Failed to submit task".into()))
}

/// Compensating delete. Its own failure is logged, never surfaced --
/// the attempt's error is already decided.
async fn delete_placeholder(store: &dyn TaskStore, task_id: &str) {
    if let Err(e) = store.delete_by_task_id(task_id).await {
        tracing::error!(
            task_id,
            error = %e,
            "Failed to delete placeholder during compensation",
        );
    }
}
