// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Larder.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;
use std::time::Duration;

use larder_core::types::Locale;
use serde::{Deserialize, Serialize};

/// Provider ids that ship with Larder and need no `base_url`.
pub const BUILTIN_PROVIDER_IDS: &[&str] =
    &["anthropic", "openai", "groq", "openrouter", "gemini", "mistral"];

/// Top-level Larder configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LarderConfig {
    /// Application identity and defaults.
    #[serde(default)]
    pub app: AppConfig,

    /// Generation pipeline tuning (retries, prompt limits).
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Persistence medium settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Per-provider overrides keyed by provider id.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderSettings>,
}

/// Application identity and defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Display name of the application.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prompt language used until the user stores a preference.
    #[serde(default)]
    pub locale: Locale,

    /// Provider id used when a command does not name one.
    #[serde(default = "default_provider")]
    pub default_provider: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
            locale: Locale::default(),
            default_provider: default_provider(),
        }
    }
}

fn default_app_name() -> String {
    "larder".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_provider() -> String {
    "groq".to_string()
}

/// Generation pipeline tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Consecutive automatic retries before giving up. 0 disables auto-retry.
    #[serde(default = "default_max_auto_retries")]
    pub max_auto_retries: u32,

    /// Countdown before retrying after a network failure.
    #[serde(default = "default_network_retry_secs")]
    pub network_retry_secs: u64,

    /// Countdown after a 429 when the provider did not say how long to wait.
    #[serde(default = "default_rate_limit_retry_secs")]
    pub rate_limit_retry_secs: u64,

    /// First backoff step after a provider-side (5xx) failure.
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,

    /// Upper bound for provider-side backoff.
    #[serde(default = "default_backoff_max_secs")]
    pub backoff_max_secs: u64,

    /// Longest wait accepted from a provider's rate-limit hint.
    #[serde(default = "default_max_retry_after_secs")]
    pub max_retry_after_secs: u64,

    /// Servings asked for when a recipe request does not say.
    #[serde(default = "default_servings")]
    pub default_servings: u32,

    /// Number of ideas requested per batch.
    #[serde(default = "default_ideas_count")]
    pub ideas_count: u32,

    /// Longest user input accepted by the guardrail, in characters.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_auto_retries: default_max_auto_retries(),
            network_retry_secs: default_network_retry_secs(),
            rate_limit_retry_secs: default_rate_limit_retry_secs(),
            backoff_base_secs: default_backoff_base_secs(),
            backoff_max_secs: default_backoff_max_secs(),
            max_retry_after_secs: default_max_retry_after_secs(),
            default_servings: default_servings(),
            ideas_count: default_ideas_count(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

impl GenerationConfig {
    /// `network_retry_secs` as a [`Duration`].
    pub fn network_retry_delay(&self) -> Duration {
        Duration::from_secs(self.network_retry_secs)
    }

    pub fn rate_limit_retry_delay(&self) -> Duration {
        Duration::from_secs(self.rate_limit_retry_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs(self.backoff_base_secs)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_secs(self.backoff_max_secs)
    }

    pub fn max_retry_after(&self) -> Duration {
        Duration::from_secs(self.max_retry_after_secs)
    }
}

fn default_max_auto_retries() -> u32 {
    3
}

fn default_network_retry_secs() -> u64 {
    5
}

fn default_rate_limit_retry_secs() -> u64 {
    20
}

fn default_backoff_base_secs() -> u64 {
    2
}

fn default_backoff_max_secs() -> u64 {
    30
}

fn default_max_retry_after_secs() -> u64 {
    300
}

fn default_servings() -> u32 {
    2
}

fn default_ideas_count() -> u32 {
    6
}

fn default_max_input_chars() -> usize {
    2000
}

/// Which medium backs the persistence store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// A single SQLite file at `database_path`.
    #[default]
    Sqlite,
    /// Nothing survives the process.
    Memory,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// `sqlite` (default) or `memory`.
    #[serde(default)]
    pub backend: StorageKind,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageKind::default(),
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("larder").join("larder.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("larder.db"))
        .to_string_lossy()
        .into_owned()
}

/// Overrides for a single provider.
///
/// A provider id that is not built in is treated as a custom
/// OpenAI-compatible endpoint and must set `base_url` and `model`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    /// Fallback API key, used when none is stored for the provider.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat-completions endpoint. Required for custom providers,
    /// overrides the built-in URL otherwise.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Model used when a request does not name one.
    #[serde(default)]
    pub model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        let config = LarderConfig::default();
        assert_eq!(config.app.default_provider, "groq");
        assert_eq!(config.generation.max_auto_retries, 3);
        assert_eq!(config.storage.backend, StorageKind::Sqlite);
        assert!(config.providers.is_empty());
        assert!(BUILTIN_PROVIDER_IDS.contains(&config.app.default_provider.as_str()));
    }

    #[test]
    fn provider_table_deserializes() {
        let toml_str = r#"
[providers.groq]
api_key = "gsk-123"
model = "llama-3.3-70b-versatile"

[providers.local]
base_url = "http://localhost:11434/v1"
"#;
        let config: LarderConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers["groq"].api_key.as_deref(), Some("gsk-123"));
        assert_eq!(
            config.providers["local"].base_url.as_deref(),
            Some("http://localhost:11434/v1")
        );
    }

    #[test]
    fn provider_settings_deny_unknown_fields() {
        let toml_str = r#"
[providers.groq]
apikey = "x"
"#;
        assert!(toml::from_str::<LarderConfig>(toml_str).is_err());
    }

    #[test]
    fn storage_kind_parses_lowercase() {
        let config: LarderConfig = toml::from_str("[storage]\nbackend = \"memory\"\n").unwrap();
        assert_eq!(config.storage.backend, StorageKind::Memory);
    }
}
