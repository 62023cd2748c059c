// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all adapters implement.

use async_trait::async_trait;

use crate::error::LarderError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all Larder adapters.
///
/// Provides identity and a health check. Lifecycle is owned by whoever
/// built the adapter; there is no shutdown hook.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the kind of adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, LarderError>;
}
