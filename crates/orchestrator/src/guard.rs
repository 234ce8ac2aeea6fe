//! Cost resolution, soft budget reservation, and category quota.
//!
//! Budget checking is read-then-decide: the sum of a user's in-flight
//! task costs approximates their committed spend, but nothing locks
//! the check-then-submit window, so two concurrent requests from the
//! same user can jointly pass a check that neither would pass alone.
//! This gap is accepted by design; closing it would need a serialized
//! check-and-reserve in the store.

use serde_json::Value;

use pictor_core::catalog::ModelSpec;
use pictor_core::error::SubmitError;
use pictor_core::types::{ModelId, TaskType, UserId};
use pictor_db::store::{CreditLedger, TaskStore};

/// Resolve the credit cost of one attempt.
///
/// A cost function that produces NaN, an infinity, or a negative value
/// fails the whole request before any side effect.
pub fn resolve_cost(model_id: ModelId, spec: &ModelSpec, params: &Value) -> Result<f64, SubmitError> {
    let cost = (spec.cost)(params);
    if !cost.is_finite() || cost < 0.0 {
        tracing::error!(model_id, cost, "Model cost function produced an invalid value");
        return Err(SubmitError::InvalidCost { model_id });
    }
    Ok(cost)
}

/// Sum of the user's in-flight (Pending/Processing) task costs.
///
/// A store failure degrades to a reservation of zero rather than
/// failing the request; the budget check still runs against the
/// ledger balance.
pub async fn reserved_in_flight(store: &dyn TaskStore, user_id: UserId) -> f64 {
    match store.in_flight_costs(user_id).await {
        Ok(costs) => costs.iter().sum(),
        Err(e) => {
            tracing::warn!(%user_id, error = %e, "Failed to read in-flight costs for soft reservation");
            0.0
        }
    }
}

/// Deny unless the ledger confirms the user can cover `required`
/// credits. Ledger failures deny.
pub async fn check_budget(
    ledger: &dyn CreditLedger,
    user_id: UserId,
    required: f64,
) -> Result<(), SubmitError> {
    let enough = match ledger.can_consume(user_id, required).await {
        Ok(enough) => enough,
        Err(e) => {
            tracing::warn!(%user_id, required, error = %e, "Budget check failed, denying");
            false
        }
    };
    if !enough {
        return Err(SubmitError::InsufficientCredits { required });
    }
    Ok(())
}

/// Deny when the per-category quota is exhausted, or when the quota
/// cannot be evaluated at all -- never fail open.
pub async fn check_category_quota(
    store: &dyn TaskStore,
    user_id: UserId,
    task_type: TaskType,
) -> Result<(), SubmitError> {
    let allowed = match store.category_quota_allows(user_id, task_type.as_str()).await {
        Ok(allowed) => allowed,
        Err(e) => {
            tracing::error!(%user_id, %task_type, error = %e, "Failed to evaluate category quota, denying");
            false
        }
    };
    if !allowed {
        return Err(SubmitError::RateLimitExceeded {
            category: task_type.as_str(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pictor_core::catalog::{ModelSpec, ParseError};
    use pictor_core::types::Platform;
    use serde_json::json;

    fn spec_with_cost(cost: fn(&Value) -> f64) -> ModelSpec {
        ModelSpec {
            name: "test/model",
            platform: Platform::Fal,
            task_type: TaskType::Image,
            cost,
            parse: |p| Ok::<Value, ParseError>(p.clone()),
            upgrade_by_input: None,
        }
    }

    #[test]
    fn finite_cost_resolves() {
        let spec = spec_with_cost(|_| 25.0);
        assert_eq!(resolve_cost(1, &spec, &json!({})).unwrap(), 25.0);
    }

    #[test]
    fn nan_cost_rejected() {
        let spec = spec_with_cost(|_| f64::NAN);
        assert!(matches!(
            resolve_cost(1, &spec, &json!({})),
            Err(SubmitError::InvalidCost { model_id: 1 })
        ));
    }

    #[test]
    fn infinite_cost_rejected() {
        let spec = spec_with_cost(|_| f64::INFINITY);
        assert!(resolve_cost(1, &spec, &json!({})).is_err());
    }

    #[test]
    fn negative_cost_rejected() {
        let spec = spec_with_cost(|_| -5.0);
        assert!(resolve_cost(1, &spec, &json!({})).is_err());
    }
}
