//! Repository for the `generation_tasks` table.
//!
//! Placeholder creation goes through the `create_generation_task`
//! Postgres function, which atomically inserts the row and enforces
//! the server-side per-user creation limit: an empty result with no
//! error means "rate limited", never "silently dropped".

use sqlx::PgPool;

use pictor_core::types::UserId;

use crate::models::generation_task::{FallbackRewrite, GenerationTask, PlaceholderTask};
use crate::models::status::{GenerationStatus, IN_FLIGHT_STATUSES};

/// Column list for `generation_tasks` queries.
const COLUMNS: &str = "\
    id, task_id, previous_task_id, user_id, model_id, model_name, \
    platform, task_type, cost, payload, tool, status_id, \
    created_at, updated_at";

/// Provides CRUD operations for generation task rows.
pub struct GenerationTaskRepo;

impl GenerationTaskRepo {
    /// Atomically create a placeholder row.
    ///
    /// Returns `None` when the server-side rate limit refused the
    /// insert (the function returns no row without raising), `Some`
    /// with the created row otherwise.
    pub async fn create_placeholder(
        pool: &PgPool,
        fields: &PlaceholderTask,
    ) -> Result<Option<GenerationTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM create_generation_task($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        );
        sqlx::query_as::<_, GenerationTask>(&query)
            .bind(fields.user_id)
            .bind(&fields.task_id)
            .bind(fields.cost)
            .bind(&fields.model_name)
            .bind(&fields.platform)
            .bind(&fields.task_type)
            .bind(fields.model_id)
            .bind(&fields.payload)
            .bind(&fields.tool)
            .fetch_optional(pool)
            .await
    }

    /// Rewrite a placeholder task id with the provider-issued id.
    ///
    /// Returns the number of rows matched so the caller can detect the
    /// not-yet-visible case and retry; zero matches is not an error at
    /// this layer.
    pub async fn update_task_id(
        pool: &PgPool,
        old_task_id: &str,
        new_task_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generation_tasks SET task_id = $2, updated_at = NOW() WHERE task_id = $1",
        )
        .bind(old_task_id)
        .bind(new_task_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete a row by task id (compensating action; idempotent).
    pub async fn delete_by_task_id(pool: &PgPool, task_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM generation_tasks WHERE task_id = $1")
            .bind(task_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Costs of the user's unfinished (Pending/Processing) tasks.
    pub async fn in_flight_costs(pool: &PgPool, user_id: UserId) -> Result<Vec<f64>, sqlx::Error> {
        sqlx::query_scalar::<_, f64>(
            "SELECT cost FROM generation_tasks \
             WHERE user_id = $1 AND status_id = ANY($2)",
        )
        .bind(user_id)
        .bind(&IN_FLIGHT_STATUSES[..])
        .fetch_all(pool)
        .await
    }

    /// Evaluate the per-category creation quota for a user.
    pub async fn check_generation_limit(
        pool: &PgPool,
        user_id: UserId,
        task_type: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT allowed FROM check_generation_limit($1, $2)")
            .bind(user_id)
            .bind(task_type)
            .fetch_one(pool)
            .await
    }

    /// Rewrite a row in place for the fallback flow, preserving lineage
    /// by moving the current `task_id` into `previous_task_id`.
    ///
    /// Returns the number of rows matched; zero means the original task
    /// no longer exists and nothing was changed.
    pub async fn apply_fallback(
        pool: &PgPool,
        original_task_id: &str,
        rewrite: &FallbackRewrite,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generation_tasks \
             SET previous_task_id = task_id, \
                 task_id = $2, \
                 model_id = $3, \
                 model_name = $4, \
                 platform = $5, \
                 payload = $6, \
                 status_id = $7, \
                 updated_at = NOW() \
             WHERE task_id = $1",
        )
        .bind(original_task_id)
        .bind(&rewrite.task_id)
        .bind(rewrite.model_id)
        .bind(&rewrite.model_name)
        .bind(&rewrite.platform)
        .bind(&rewrite.payload)
        .bind(GenerationStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
