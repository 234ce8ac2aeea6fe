//! Route definitions for generation task submission.
//!
//! ```text
//! POST /submit      submit a generation batch
//! POST /fallback    re-route an existing task to a fallback model
//! ```
//!
//! The webhook that providers call back into is handled by the
//! callback service, not this server.

use axum::routing::post;
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit", post(generation::submit))
        .route("/fallback", post(generation::create_fallback))
}
