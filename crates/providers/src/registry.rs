//! Platform → adapter registry.

use std::collections::HashMap;
use std::sync::Arc;

use pictor_core::types::Platform;

use crate::adapter::ProviderAdapter;

/// Immutable mapping from [`Platform`] to its adapter, built once at
/// startup. Dispatch selects an adapter here instead of branching on
/// platform names.
#[derive(Default)]
pub struct ProviderRegistry {
    adapters: HashMap<Platform, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own platform key.
    pub fn register(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(adapter.platform(), adapter);
        self
    }

    /// Adapter for a platform, if one is configured.
    pub fn adapter_for(&self, platform: Platform) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&platform).cloned()
    }

    pub fn platforms(&self) -> impl Iterator<Item = Platform> + '_ {
        self.adapters.keys().copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterError;
    use async_trait::async_trait;
    use serde_json::Value;

    struct StubAdapter(Platform);

    #[async_trait]
    impl ProviderAdapter for StubAdapter {
        fn platform(&self) -> Platform {
            self.0
        }

        async fn submit(
            &self,
            _job_name: &str,
            _input: &Value,
            _callback_url: &str,
        ) -> Result<String, AdapterError> {
            Ok("stub-id".into())
        }
    }

    #[test]
    fn registry_keys_by_adapter_platform() {
        let registry = ProviderRegistry::new()
            .register(Arc::new(StubAdapter(Platform::Fal)))
            .register(Arc::new(StubAdapter(Platform::Kie)));

        assert!(registry.adapter_for(Platform::Fal).is_some());
        assert!(registry.adapter_for(Platform::Kie).is_some());
        assert!(registry.adapter_for(Platform::Replicate).is_none());
    }

    #[tokio::test]
    async fn default_cancel_is_a_no_op() {
        let adapter = StubAdapter(Platform::Fal);
        assert!(!adapter.supports_cancel());
        // Must not panic or block.
        adapter.cancel("some-task").await;
    }
}
