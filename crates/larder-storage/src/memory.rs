// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local medium. Nothing survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use larder_core::error::LarderError;
use larder_core::traits::{PluginAdapter, StorageBackend};
use larder_core::types::{AdapterType, HealthStatus};
use tokio::sync::Mutex;

/// A `HashMap` behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PluginAdapter for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
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
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, LarderError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), LarderError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), LarderError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
