// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value medium behind the persistence store.

use async_trait::async_trait;

use crate::error::LarderError;
use crate::traits::adapter::PluginAdapter;

/// A string-keyed, string-valued medium.
///
/// Implementations serialize access internally; last write wins.
#[async_trait]
pub trait StorageBackend: PluginAdapter {
    async fn get(&self, key: &str) -> Result<Option<String>, LarderError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), LarderError>;

    async fn remove(&self, key: &str) -> Result<(), LarderError>;
}
