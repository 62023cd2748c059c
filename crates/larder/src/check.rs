// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `larder config check` command implementation.
//!
//! Runs quick checks over configuration, storage and provider setup and
//! prints one line per check.

use std::io::IsTerminal;
use std::path::Path;

use larder_config::model::{LarderConfig, StorageConfig, StorageKind};
use larder_core::LarderError;
use larder_core::traits::PluginAdapter;
use larder_core::types::HealthStatus;
use larder_storage::{PersistenceStore, SqliteBackend};

use crate::app::build_registry;
use crate::commands::{KeySource, key_source};

/// Status of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            name,
            status,
            message: message.into(),
        }
    }
}

/// Runs every check. Returns false when any check failed.
pub async fn run_check(config: &LarderConfig, store: &PersistenceStore) -> Result<bool, LarderError> {
    let use_color = std::io::stdout().is_terminal();
    let results = vec![
        check_config(),
        check_config_files(),
        check_storage(&config.storage).await,
        check_providers(config),
        check_default_key(config, store).await,
    ];

    println!();
    println!("  larder config check");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", format_result(result, use_color));
    }
    println!();

    let issues = results.iter().filter(|r| r.status != CheckStatus::Pass).count();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        let word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {word} found.");
    }
    println!();

    Ok(results.iter().all(|r| r.status != CheckStatus::Fail))
}

fn format_result(result: &CheckResult, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!("    {symbol} {:<20} {message}", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!("    {tag} {:<20} {}", result.name, result.message)
    }
}

fn check_config() -> CheckResult {
    match larder_config::load_and_validate() {
        Ok(_) => CheckResult::new("Configuration", CheckStatus::Pass, "valid"),
        Err(errors) => {
            larder_config::render_errors(&errors);
            CheckResult::new(
                "Configuration",
                CheckStatus::Fail,
                format!("{} error(s)", errors.len()),
            )
        }
    }
}

fn check_config_files() -> CheckResult {
    let found: Vec<String> = larder_config::loader::config_file_paths()
        .into_iter()
        .filter(|p| p.exists())
        .map(|p| p.display().to_string())
        .collect();
    if found.is_empty() {
        CheckResult::new("Config files", CheckStatus::Pass, "none, using defaults")
    } else {
        CheckResult::new("Config files", CheckStatus::Pass, found.join(", "))
    }
}

async fn check_storage(storage: &StorageConfig) -> CheckResult {
    if storage.backend == StorageKind::Memory {
        return CheckResult::new(
            "Storage",
            CheckStatus::Warn,
            "memory backend, nothing is kept after exit",
        );
    }
    let path = &storage.database_path;
    if !Path::new(path).exists() {
        return CheckResult::new(
            "Storage",
            CheckStatus::Warn,
            format!("not found: {path} (will be created on first run)"),
        );
    }
    let backend = match SqliteBackend::open(path).await {
        Ok(backend) => backend,
        Err(e) => return CheckResult::new("Storage", CheckStatus::Fail, e.to_string()),
    };
    match backend.health_check().await {
        Ok(HealthStatus::Healthy) => CheckResult::new("Storage", CheckStatus::Pass, path.clone()),
        Ok(HealthStatus::Degraded(reason)) => CheckResult::new("Storage", CheckStatus::Warn, reason),
        Ok(HealthStatus::Unhealthy(reason)) => CheckResult::new("Storage", CheckStatus::Fail, reason),
        Err(e) => CheckResult::new("Storage", CheckStatus::Fail, e.to_string()),
    }
}

fn check_providers(config: &LarderConfig) -> CheckResult {
    match build_registry(config) {
        Ok(registry) => CheckResult::new(
            "Providers",
            CheckStatus::Pass,
            format!("{} registered", registry.len()),
        ),
        Err(e) => CheckResult::new("Providers", CheckStatus::Fail, e.to_string()),
    }
}

async fn check_default_key(config: &LarderConfig, store: &PersistenceStore) -> CheckResult {
    let provider = &config.app.default_provider;
    match key_source(store, config, provider).await {
        KeySource::Missing => CheckResult::new(
            "Default provider",
            CheckStatus::Warn,
            format!("no key for {provider}, run `larder key set {provider} <key>`"),
        ),
        source => CheckResult::new("Default provider", CheckStatus::Pass, format!("{provider} ({source})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_storage_is_a_warning() {
        let storage = StorageConfig {
            backend: StorageKind::Memory,
            database_path: String::new(),
        };
        assert_eq!(check_storage(&storage).await.status, CheckStatus::Warn);
    }

    #[tokio::test]
    async fn existing_database_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("larder.db").to_string_lossy().into_owned();
        SqliteBackend::open(&path).await.unwrap();

        let storage = StorageConfig {
            backend: StorageKind::Sqlite,
            database_path: path,
        };
        let result = check_storage(&storage).await;
        assert_eq!(result.status, CheckStatus::Pass, "{}", result.message);
    }

    #[tokio::test]
    async fn missing_database_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            backend: StorageKind::Sqlite,
            database_path: dir.path().join("absent.db").to_string_lossy().into_owned(),
        };
        let result = check_storage(&storage).await;
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.contains("will be created"));
    }

    #[tokio::test]
    async fn stored_key_satisfies_the_default_provider() {
        let config = LarderConfig::default();
        let store = PersistenceStore::in_memory();
        store.set_credential("groq", "gsk-123").await;
        let result = check_default_key(&config, &store).await;
        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(result.message, "groq (key stored)");
    }

    #[test]
    fn plain_output_uses_tags() {
        let result = CheckResult::new("Storage", CheckStatus::Fail, "locked");
        assert_eq!(
            format_result(&result, false),
            "    [FAIL] Storage              locked"
        );
    }
}
