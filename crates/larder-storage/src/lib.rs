// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence for Larder.
//!
//! [`PersistenceStore`] is the typed, dedup-aware front over a
//! [`StorageBackend`](larder_core::StorageBackend) medium: SQLite for real
//! sessions, a `HashMap` for tests and throwaway runs.

pub mod keys;
pub mod memory;
pub mod policy;
pub mod sqlite;
pub mod store;

use std::sync::Arc;

use larder_config::model::{StorageConfig, StorageKind};
use larder_core::LarderError;

pub use keys::StoreKey;
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
pub use store::PersistenceStore;

/// Opens the medium named by the configuration and wraps it in a store.
pub async fn open_store(config: &StorageConfig) -> Result<PersistenceStore, LarderError> {
    match config.backend {
        StorageKind::Sqlite => {
            let backend = SqliteBackend::open(&config.database_path).await?;
            Ok(PersistenceStore::new(Arc::new(backend)))
        }
        StorageKind::Memory => Ok(PersistenceStore::in_memory()),
    }
}
