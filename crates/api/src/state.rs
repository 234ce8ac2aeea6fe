use std::sync::Arc;

use crate::config::ServerConfig;
use pictor_orchestrator::Orchestrator;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: pictor_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The generation submission orchestrator.
    pub orchestrator: Arc<Orchestrator>,
}
