// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of provider adapters available to the orchestrator.
//!
//! Built once at startup and shared read-only afterwards. Lookups by an id
//! that was never registered return `None`; callers treat that as a
//! recoverable condition.

use std::collections::HashMap;
use std::sync::Arc;

use larder_core::traits::ProviderAdapter;
use tracing::debug;

/// Provider adapters keyed by provider id.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registers an adapter under its configured id, replacing any adapter
    /// already registered under that id.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        let id = adapter.config().id.clone();
        debug!(provider = %id, "registering provider adapter");
        self.providers.insert(id, adapter);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.providers.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Returns the number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use larder_core::error::LarderError;
    use larder_core::traits::{ChunkStream, PluginAdapter};
    use larder_core::types::{AdapterType, GenerateOptions, HealthStatus, ProviderConfig};

    struct StubProvider {
        config: ProviderConfig,
    }

    impl StubProvider {
        fn new(id: &str, model: &str) -> Arc<dyn ProviderAdapter> {
            Arc::new(Self {
                config: ProviderConfig {
                    id: id.to_string(),
                    name: id.to_string(),
                    default_model: model.to_string(),
                },
            })
        }
    }

    #[async_trait]
    impl PluginAdapter for StubProvider {
        fn name(&self) -> &str {
            &self.config.name
        }

        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }

        fn adapter_type(&self) -> AdapterType {
            AdapterType::Provider
        }

        async fn health_check(&self) -> Result<HealthStatus, LarderError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[async_trait]
    impl ProviderAdapter for StubProvider {
        fn config(&self) -> &ProviderConfig {
            &self.config
        }

        async fn generate_recipe(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _credential: &str,
            _options: GenerateOptions,
        ) -> Result<ChunkStream, LarderError> {
            Err(LarderError::Internal("stub".into()))
        }
    }

    #[test]
    fn register_and_get_roundtrip() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.is_empty());
        registry.register(StubProvider::new("groq", "llama"));
        registry.register(StubProvider::new("anthropic", "claude"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ids(), vec!["anthropic", "groq"]);
        assert_eq!(registry.get("groq").unwrap().config().default_model, "llama");
        assert!(registry.get("nope").is_none());
        assert!(!registry.contains("nope"));
    }

    #[test]
    fn re_registering_replaces() {
        let mut registry = ProviderRegistry::default();
        registry.register(StubProvider::new("groq", "old"));
        registry.register(StubProvider::new("groq", "new"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("groq").unwrap().config().default_model, "new");
    }
}
