// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end orchestrator testing.
//!
//! `TestHarness` assembles a [`GenerationOrchestrator`] over mock providers,
//! a mock guardrail and a throwaway store (in memory, or SQLite in a temp
//! directory). Retry delays default to short fixed values so tests can run
//! on a paused clock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use larder_agent::{GenerationOrchestrator, OrchestratorSettings};
use larder_core::LarderError;
use larder_core::traits::{Guardrail, StorageBackend};
use larder_plugin::ProviderRegistry;
use larder_resilience::{ErrorClassifier, RetryPolicy};
use larder_storage::{PersistenceStore, SqliteBackend};

use crate::mock_guardrail::MockGuardrail;
use crate::mock_provider::{MockProvider, MockReply};

/// Id of the provider every harness registers.
pub const MOCK_PROVIDER_ID: &str = "mock";

/// Key stored for the mock provider unless disabled.
pub const MOCK_API_KEY: &str = "mock-key";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<MockReply>,
    extra_providers: Vec<Arc<MockProvider>>,
    guardrail: Option<Arc<dyn Guardrail>>,
    store_credential: bool,
    fallback_credentials: HashMap<String, String>,
    max_auto_retries: u32,
    policy: RetryPolicy,
    free_tier: Vec<String>,
    sqlite: bool,
    backend: Option<Arc<dyn StorageBackend>>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            extra_providers: Vec::new(),
            guardrail: None,
            store_credential: true,
            fallback_credentials: HashMap::new(),
            max_auto_retries: 3,
            policy: RetryPolicy {
                network_delay: Duration::from_secs(5),
                rate_limit_default: Duration::from_secs(20),
                backoff_base: Duration::from_secs(2),
                backoff_max: Duration::from_secs(30),
                max_retry_after: Duration::from_secs(300),
            },
            free_tier: vec!["groq".to_string(), "gemini".to_string()],
            sqlite: false,
            backend: None,
        }
    }

    /// Set mock provider replies.
    pub fn with_replies(mut self, replies: Vec<MockReply>) -> Self {
        self.replies = replies;
        self
    }

    /// Register another provider next to the default mock.
    pub fn with_provider(mut self, provider: Arc<MockProvider>) -> Self {
        self.extra_providers.push(provider);
        self
    }

    pub fn with_guardrail(mut self, guardrail: Arc<dyn Guardrail>) -> Self {
        self.guardrail = Some(guardrail);
        self
    }

    /// Do not store an API key for the mock provider.
    pub fn without_credential(mut self) -> Self {
        self.store_credential = false;
        self
    }

    pub fn with_fallback_credential(mut self, provider: &str, key: &str) -> Self {
        self.fallback_credentials
            .insert(provider.to_string(), key.to_string());
        self
    }

    pub fn with_max_auto_retries(mut self, max: u32) -> Self {
        self.max_auto_retries = max;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Back the store with SQLite in a temp directory.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    /// Back the store with a caller-supplied medium.
    pub fn with_backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Build the test harness.
    pub async fn build(self) -> Result<TestHarness, LarderError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| LarderError::Storage { source: e.into() })?;
        let store = if let Some(backend) = self.backend {
            PersistenceStore::new(backend)
        } else if self.sqlite {
            let backend = SqliteBackend::open(temp_dir.path().join("larder.db")).await?;
            PersistenceStore::new(Arc::new(backend))
        } else {
            PersistenceStore::in_memory()
        };
        if self.store_credential {
            store.set_credential(MOCK_PROVIDER_ID, MOCK_API_KEY).await;
        }

        let provider = Arc::new(MockProvider::with_replies(MOCK_PROVIDER_ID, self.replies));
        let mut registry = ProviderRegistry::new();
        registry.register(provider.clone());
        for extra in &self.extra_providers {
            registry.register(extra.clone());
        }

        let mock_guardrail = Arc::new(MockGuardrail::accepting());
        let guardrail = self
            .guardrail
            .unwrap_or_else(|| mock_guardrail.clone() as Arc<dyn Guardrail>);

        let orchestrator = GenerationOrchestrator::new(
            guardrail,
            Arc::new(registry),
            store.clone(),
            ErrorClassifier::new(self.policy, self.free_tier),
            OrchestratorSettings {
                max_auto_retries: self.max_auto_retries,
                fallback_credentials: self.fallback_credentials,
            },
        );

        Ok(TestHarness {
            orchestrator,
            provider,
            guardrail: mock_guardrail,
            store,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    pub orchestrator: GenerationOrchestrator,
    /// The default mock provider, registered as [`MOCK_PROVIDER_ID`].
    pub provider: Arc<MockProvider>,
    /// The default guardrail. Unused when a custom one was supplied.
    pub guardrail: Arc<MockGuardrail>,
    pub store: PersistenceStore,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness whose provider answers with `replies`.
    pub async fn with_replies(replies: Vec<MockReply>) -> Result<Self, LarderError> {
        Self::builder().with_replies(replies).build().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder_agent::{GenerationRequest, RequestStatus};

    #[tokio::test]
    async fn harness_round_trip() {
        let harness = TestHarness::with_replies(vec![MockReply::text("hello")])
            .await
            .unwrap();
        let report = harness
            .orchestrator
            .generate(GenerationRequest::recipe(MOCK_PROVIDER_ID, "hi"))
            .await;
        assert!(matches!(report.status, RequestStatus::Completed { .. }));
        assert_eq!(harness.provider.call_count(), 1);
        assert_eq!(harness.guardrail.seen(), vec!["hi"]);
    }

    #[tokio::test]
    async fn sqlite_harness_persists_chat() {
        let harness = TestHarness::builder().with_sqlite().build().await.unwrap();
        harness
            .orchestrator
            .generate(GenerationRequest::recipe(MOCK_PROVIDER_ID, "hi"))
            .await;
        assert_eq!(harness.store.chat_history().await.len(), 2);
    }
}
