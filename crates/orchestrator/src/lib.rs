//! Generation task submission orchestrator.
//!
//! Accepts one logical generation request, reserves the caller's
//! budget, and runs N independent create→dispatch→reconcile attempts
//! against the provider adapters, guaranteeing that no provider job is
//! ever created without a durable local record and that no local
//! record outlives a provider job that was never created. Also hosts
//! the fallback substitution flow that re-routes an existing task to a
//! replacement model while preserving lineage.

pub mod fallback;
pub mod guard;
pub mod normalize;
pub mod protocol;
pub mod submit;

pub use fallback::FallbackError;
pub use submit::{Orchestrator, SubmitReceipt};
