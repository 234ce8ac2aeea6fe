//! Storage traits consumed by the submission orchestrator.
//!
//! The protocol is written against [`TaskStore`] and [`CreditLedger`]
//! rather than concrete repositories so its state-machine tests can
//! substitute in-memory fakes, the same way the model catalog is
//! injected rather than ambient.

use async_trait::async_trait;

use pictor_core::types::UserId;

use crate::models::generation_task::{FallbackRewrite, GenerationTask, PlaceholderTask};
use crate::repositories::GenerationTaskRepo;
use crate::DbPool;

/// Outcome of the atomic placeholder create.
///
/// Rate limiting is a distinct tagged outcome, not inferred from an
/// absent row or absent error.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(GenerationTask),
    RateLimited,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store could not be reached or refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Ledger error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Durable task store operations used by the submission protocol and
/// the fallback flow.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Atomically insert a placeholder row, or report the server-side
    /// rate limit as [`CreateOutcome::RateLimited`].
    async fn create_placeholder(&self, fields: &PlaceholderTask)
        -> Result<CreateOutcome, StoreError>;

    /// Rewrite `old_task_id` to `new_task_id`, returning how many rows
    /// matched (zero means the row is not yet visible; callers retry).
    async fn update_task_id(&self, old_task_id: &str, new_task_id: &str)
        -> Result<u64, StoreError>;

    /// Remove a row by task id. Compensating action; idempotent.
    async fn delete_by_task_id(&self, task_id: &str) -> Result<(), StoreError>;

    /// Costs of the user's Pending/Processing rows (soft reservation).
    async fn in_flight_costs(&self, user_id: UserId) -> Result<Vec<f64>, StoreError>;

    /// Per-category creation quota. Callers treat errors as denial.
    async fn category_quota_allows(&self, user_id: UserId, task_type: &str)
        -> Result<bool, StoreError>;

    /// In-place fallback rewrite; returns rows matched (zero = original
    /// row gone, nothing changed).
    async fn apply_fallback(
        &self,
        original_task_id: &str,
        rewrite: &FallbackRewrite,
    ) -> Result<u64, StoreError>;
}

/// The caller's credit budget, owned by an external ledger.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Whether the user can afford `amount` credits right now.
    async fn can_consume(&self, user_id: UserId, amount: f64) -> Result<bool, LedgerError>;
}

// ---------------------------------------------------------------------------
// Postgres implementations
// ---------------------------------------------------------------------------

/// [`TaskStore`] backed by the `generation_tasks` table.
#[derive(Clone)]
pub struct PgTaskStore {
    pool: DbPool,
}

impl PgTaskStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn create_placeholder(
        &self,
        fields: &PlaceholderTask,
    ) -> Result<CreateOutcome, StoreError> {
        match GenerationTaskRepo::create_placeholder(&self.pool, fields).await? {
            Some(task) => Ok(CreateOutcome::Created(task)),
            None => Ok(CreateOutcome::RateLimited),
        }
    }

    async fn update_task_id(
        &self,
        old_task_id: &str,
        new_task_id: &str,
    ) -> Result<u64, StoreError> {
        Ok(GenerationTaskRepo::update_task_id(&self.pool, old_task_id, new_task_id).await?)
    }

    async fn delete_by_task_id(&self, task_id: &str) -> Result<(), StoreError> {
        Ok(GenerationTaskRepo::delete_by_task_id(&self.pool, task_id).await?)
    }

    async fn in_flight_costs(&self, user_id: UserId) -> Result<Vec<f64>, StoreError> {
        Ok(GenerationTaskRepo::in_flight_costs(&self.pool, user_id).await?)
    }

    async fn category_quota_allows(
        &self,
        user_id: UserId,
        task_type: &str,
    ) -> Result<bool, StoreError> {
        Ok(GenerationTaskRepo::check_generation_limit(&self.pool, user_id, task_type).await?)
    }

    async fn apply_fallback(
        &self,
        original_task_id: &str,
        rewrite: &FallbackRewrite,
    ) -> Result<u64, StoreError> {
        Ok(GenerationTaskRepo::apply_fallback(&self.pool, original_task_id, rewrite).await?)
    }
}

/// [`CreditLedger`] backed by the `user_credits` table.
///
/// A user with no credit row has a zero balance and can consume
/// nothing.
#[derive(Clone)]
pub struct PgCreditLedger {
    pool: DbPool,
}

impl PgCreditLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreditLedger for PgCreditLedger {
    async fn can_consume(&self, user_id: UserId, amount: f64) -> Result<bool, LedgerError> {
        let balance = sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE( \
                 (SELECT balance FROM user_credits WHERE user_id = $1), 0.0)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(balance >= amount)
    }
}
