// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: provider ids that
//! resolve, URL shapes, and sane retry bounds.

use crate::diagnostic::{ConfigError, suggest_key};
use crate::model::{BUILTIN_PROVIDER_IDS, LarderConfig, StorageKind};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every error instead of failing fast.
pub fn validate_config(config: &LarderConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "app.log_level `{}` must be one of {}",
                config.app.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let default_provider = config.app.default_provider.trim();
    if default_provider.is_empty() {
        errors.push(ConfigError::Validation {
            message: "app.default_provider must not be empty".to_string(),
        });
    } else if !is_known_provider(config, default_provider) {
        let mut known: Vec<&str> = BUILTIN_PROVIDER_IDS.to_vec();
        known.extend(config.providers.keys().map(String::as_str));
        errors.push(ConfigError::UnknownProvider {
            id: default_provider.to_string(),
            suggestion: suggest_key(default_provider, &known),
            known: known.join(", "),
        });
    }

    for (id, settings) in &config.providers {
        let builtin = BUILTIN_PROVIDER_IDS.contains(&id.as_str());
        match settings.base_url.as_deref() {
            None if !builtin => errors.push(ConfigError::Validation {
                message: format!(
                    "providers.{id}.base_url is required for a custom provider"
                ),
            }),
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                errors.push(ConfigError::Validation {
                    message: format!(
                        "providers.{id}.base_url `{url}` must start with http:// or https://"
                    ),
                })
            }
            _ => {}
        }
        if !builtin && settings.model.as_deref().is_none_or(|m| m.trim().is_empty()) {
            errors.push(ConfigError::Validation {
                message: format!("providers.{id}.model is required for a custom provider"),
            });
        }
        if settings.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            errors.push(ConfigError::Validation {
                message: format!("providers.{id}.api_key must not be empty when set"),
            });
        }
    }

    let generation = &config.generation;
    if generation.backoff_base_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "generation.backoff_base_secs must be at least 1".to_string(),
        });
    }
    if generation.backoff_base_secs > generation.backoff_max_secs {
        errors.push(ConfigError::Validation {
            message: format!(
                "generation.backoff_base_secs ({}) must not exceed generation.backoff_max_secs ({})",
                generation.backoff_base_secs, generation.backoff_max_secs
            ),
        });
    }
    if !(1..=3600).contains(&generation.max_retry_after_secs) {
        errors.push(ConfigError::Validation {
            message: format!(
                "generation.max_retry_after_secs must be between 1 and 3600, got {}",
                generation.max_retry_after_secs
            ),
        });
    }
    if !(1..=50).contains(&generation.default_servings) {
        errors.push(ConfigError::Validation {
            message: format!(
                "generation.default_servings must be between 1 and 50, got {}",
                generation.default_servings
            ),
        });
    }
    if !(1..=20).contains(&generation.ideas_count) {
        errors.push(ConfigError::Validation {
            message: format!(
                "generation.ideas_count must be between 1 and 20, got {}",
                generation.ideas_count
            ),
        });
    }
    if generation.max_input_chars < 50 {
        errors.push(ConfigError::Validation {
            message: format!(
                "generation.max_input_chars must be at least 50, got {}",
                generation.max_input_chars
            ),
        });
    }

    if config.storage.backend == StorageKind::Sqlite
        && config.storage.database_path.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_known_provider(config: &LarderConfig, id: &str) -> bool {
    BUILTIN_PROVIDER_IDS.contains(&id) || config.providers.contains_key(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProviderSettings;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&LarderConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = LarderConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))
        ));
    }

    #[test]
    fn empty_database_path_is_fine_in_memory() {
        let mut config = LarderConfig::default();
        config.storage.backend = StorageKind::Memory;
        config.storage.database_path = "".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn misspelled_default_provider_gets_suggestion() {
        let mut config = LarderConfig::default();
        config.app.default_provider = "opnai".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigError::UnknownProvider { suggestion: Some(s), .. } if s == "openai"
        )));
    }

    #[test]
    fn custom_provider_requires_base_url() {
        let mut config = LarderConfig::default();
        config
            .providers
            .insert("local".to_string(), ProviderSettings::default());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("providers.local.base_url"))
        ));
    }

    #[test]
    fn custom_provider_can_be_default() {
        let mut config = LarderConfig::default();
        config.providers.insert(
            "local".to_string(),
            ProviderSettings {
                base_url: Some("http://localhost:11434/v1".to_string()),
                model: Some("llama3.2".to_string()),
                ..Default::default()
            },
        );
        config.app.default_provider = "local".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn custom_provider_requires_model() {
        let mut config = LarderConfig::default();
        config.providers.insert(
            "local".to_string(),
            ProviderSettings {
                base_url: Some("http://localhost:11434/v1".to_string()),
                ..Default::default()
            },
        );
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("providers.local.model"))
        ));
    }

    #[test]
    fn backoff_bounds_are_checked() {
        let mut config = LarderConfig::default();
        config.generation.backoff_base_secs = 60;
        config.generation.backoff_max_secs = 10;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("backoff_base_secs"))
        ));
    }

    #[test]
    fn retry_after_ceiling_is_bounded() {
        let mut config = LarderConfig::default();
        config.generation.max_retry_after_secs = 0;
        assert!(validate_config(&config).is_err());
        config.generation.max_retry_after_secs = 86_400;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("max_retry_after_secs"))
        ));
        config.generation.max_retry_after_secs = 120;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = LarderConfig::default();
        config.app.log_level = "loud".to_string();
        config.generation.ideas_count = 0;
        config.generation.default_servings = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
