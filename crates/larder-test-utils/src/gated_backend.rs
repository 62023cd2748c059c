// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage medium that can hold a write open.
//!
//! `GatedBackend` parks the first write to one chosen key until the test
//! releases it, so a test can act while the orchestrator is in the middle
//! of persisting.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use larder_core::LarderError;
use larder_core::traits::{PluginAdapter, StorageBackend};
use larder_core::types::{AdapterType, HealthStatus};
use larder_storage::{MemoryBackend, StoreKey};

pub struct GatedBackend {
    inner: MemoryBackend,
    key: StoreKey,
    armed: AtomicBool,
    reached: Notify,
    released: Notify,
}

impl GatedBackend {
    /// Holds the first write to `key`.
    pub fn new(key: StoreKey) -> Self {
        Self {
            inner: MemoryBackend::new(),
            key,
            armed: AtomicBool::new(true),
            reached: Notify::new(),
            released: Notify::new(),
        }
    }

    /// Resolves once the held write has started.
    pub async fn reached(&self) {
        self.reached.notified().await;
    }

    /// Lets the held write finish.
    pub fn release(&self) {
        self.released.notify_one();
    }
}

#[async_trait]
impl PluginAdapter for GatedBackend {
    fn name(&self) -> &str {
        "gated-memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LarderError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl StorageBackend for GatedBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, LarderError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), LarderError> {
        if key == self.key.as_str() && self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.released.notified().await;
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), LarderError> {
        self.inner.remove(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn holds_only_the_first_write_to_its_key() {
        let backend = Arc::new(GatedBackend::new(StoreKey::ChatHistory));
        backend.set("larder.pantry", "[]").await.unwrap();

        let writer = tokio::spawn({
            let backend = backend.clone();
            async move { backend.set("larder.chat-history", "[1]").await }
        });
        backend.reached().await;
        assert_eq!(backend.get("larder.chat-history").await.unwrap(), None);

        backend.release();
        writer.await.unwrap().unwrap();
        assert_eq!(
            backend.get("larder.chat-history").await.unwrap().as_deref(),
            Some("[1]")
        );

        backend.set("larder.chat-history", "[2]").await.unwrap();
        assert_eq!(
            backend.get("larder.chat-history").await.unwrap().as_deref(),
            Some("[2]")
        );
    }
}
