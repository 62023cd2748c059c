// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite medium: a single `kv` table behind `tokio-rusqlite`.

use std::path::Path;

use async_trait::async_trait;
use larder_core::error::LarderError;
use larder_core::traits::{PluginAdapter, StorageBackend};
use larder_core::types::{AdapterType, HealthStatus};
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;
use tracing::debug;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

fn storage_err(e: tokio_rusqlite::Error) -> LarderError {
    LarderError::Storage {
        source: Box::new(e),
    }
}

/// Key-value medium persisted to a SQLite file.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Opens (or creates) the database at `path`, creating parent directories.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LarderError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LarderError::Storage {
                    source: Box::new(e),
                })?;
        }
        let conn = Connection::open(path).await.map_err(|e| storage_err(e.into()))?;
        debug!(path = %path.display(), "opened sqlite store");
        Self::init(conn, true).await
    }

    /// Opens a private in-memory database.
    pub async fn open_in_memory() -> Result<Self, LarderError> {
        let conn = Connection::open_in_memory().await.map_err(|e| storage_err(e.into()))?;
        Self::init(conn, false).await
    }

    async fn init(conn: Connection, wal: bool) -> Result<Self, LarderError> {
        conn.call(move |conn| {
            if wal {
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get::<_, String>(0)
                })?;
            }
            conn.execute(SCHEMA, [])?;
            Ok(())
        })
        .await
        .map_err(storage_err)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl PluginAdapter for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LarderError> {
        let result = self
            .conn
            .call(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .await;
        Ok(match result {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, LarderError> {
        let key = key.to_string();
        self.conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT value FROM kv WHERE key = ?1",
                    rusqlite::params![key],
                    |row| row.get::<_, String>(0),
                )
                .optional()
            })
            .await
            .map_err(storage_err)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), LarderError> {
        let key = key.to_string();
        let value = value.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    rusqlite::params![key, value, now],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    async fn remove(&self, key: &str) -> Result<(), LarderError> {
        let key = key.to_string();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("larder.db");

        let backend = SqliteBackend::open(&path).await.unwrap();
        backend.set("larder.profile", "{\"name\":\"Ana\"}").await.unwrap();
        backend.set("larder.profile", "{\"name\":\"Bea\"}").await.unwrap();
        drop(backend);

        let reopened = SqliteBackend::open(&path).await.unwrap();
        assert_eq!(
            reopened.get("larder.profile").await.unwrap().as_deref(),
            Some("{\"name\":\"Bea\"}")
        );
    }

    #[tokio::test]
    async fn remove_deletes_row() {
        let backend = SqliteBackend::open_in_memory().await.unwrap();
        backend.set("k", "v").await.unwrap();
        backend.remove("k").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None);
        // Removing a missing key is fine.
        backend.remove("k").await.unwrap();
    }

    #[tokio::test]
    async fn health_check_reports_healthy() {
        let backend = SqliteBackend::open_in_memory().await.unwrap();
        assert_eq!(backend.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
