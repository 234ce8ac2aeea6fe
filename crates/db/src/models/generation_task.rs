//! Row model and DTOs for the `generation_tasks` table.
//!
//! Purpose-built insert/rewrite structs are kept separate from the row
//! model so the repository signatures stay narrow.

use serde::Serialize;
use serde_json::Value;

use pictor_core::types::{DbId, ModelId, Timestamp, UserId};

use crate::models::status::StatusId;

/// One durable generation task row.
///
/// `task_id` starts life as a locally generated placeholder and is
/// rewritten to the provider-issued id during reconciliation;
/// `previous_task_id` is only ever set by the fallback flow.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GenerationTask {
    pub id: DbId,
    pub task_id: String,
    pub previous_task_id: Option<String>,
    pub user_id: UserId,
    pub model_id: ModelId,
    pub model_name: String,
    pub platform: String,
    pub task_type: String,
    /// Credits charged, fixed at creation.
    pub cost: f64,
    /// Media-redacted copy of the original request, kept for replay.
    pub payload: Value,
    pub tool: Option<String>,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO for a placeholder row (protocol step 1).
#[derive(Debug, Clone)]
pub struct PlaceholderTask {
    pub task_id: String,
    pub user_id: UserId,
    pub model_id: ModelId,
    pub model_name: String,
    pub platform: String,
    pub task_type: String,
    pub cost: f64,
    pub payload: Value,
    pub tool: Option<String>,
}

/// In-place rewrite applied by the fallback substitution flow.
///
/// The row keeps its primary key; only the provider identity moves.
#[derive(Debug, Clone)]
pub struct FallbackRewrite {
    pub task_id: String,
    pub model_id: ModelId,
    pub model_name: String,
    pub platform: String,
    pub payload: Value,
}
