//! Route registration.

use axum::Router;

use crate::state::AppState;

pub mod generation;
pub mod health;

/// All `/api/v1` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/generation", generation::router())
}
