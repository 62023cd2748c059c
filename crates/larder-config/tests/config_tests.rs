// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Larder configuration system.

use larder_config::diagnostic::ConfigError;
use larder_config::model::{LarderConfig, StorageKind};
use larder_config::{load_and_validate_str, load_config_from_str};
use larder_core::types::Locale;

#[test]
fn full_toml_deserializes_into_larder_config() {
    let toml = r#"
[app]
log_level = "debug"
locale = "es"
default_provider = "anthropic"

[generation]
max_auto_retries = 5
network_retry_secs = 3
rate_limit_retry_secs = 45
backoff_base_secs = 1
backoff_max_secs = 16
default_servings = 4
ideas_count = 8
max_input_chars = 500

[storage]
backend = "sqlite"
database_path = "/tmp/larder-test.db"

[providers.anthropic]
api_key = "sk-ant-123"
model = "claude-sonnet-4-20250514"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.app.log_level, "debug");
    assert_eq!(config.app.locale, Locale::Es);
    assert_eq!(config.app.default_provider, "anthropic");
    assert_eq!(config.generation.max_auto_retries, 5);
    assert_eq!(config.generation.rate_limit_retry_secs, 45);
    assert_eq!(config.generation.backoff_max_secs, 16);
    assert_eq!(config.generation.default_servings, 4);
    assert_eq!(config.generation.ideas_count, 8);
    assert_eq!(config.generation.max_input_chars, 500);
    assert_eq!(config.storage.backend, StorageKind::Sqlite);
    assert_eq!(config.storage.database_path, "/tmp/larder-test.db");
    assert_eq!(
        config.providers["anthropic"].api_key.as_deref(),
        Some("sk-ant-123")
    );
}

#[test]
fn unknown_field_in_generation_produces_error() {
    let toml = r#"
[generation]
max_retries = 2
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("max_retries"),
        "error should mention unknown field, got: {err_str}"
    );
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.app.name, "larder");
    assert_eq!(config.app.log_level, "info");
    assert_eq!(config.app.locale, Locale::En);
    assert_eq!(config.generation.network_retry_secs, 5);
    assert_eq!(config.generation.rate_limit_retry_secs, 20);
    assert_eq!(config.generation.backoff_base_secs, 2);
    assert_eq!(config.generation.backoff_max_secs, 30);
    assert!(config.providers.is_empty());
}

#[test]
fn dotted_override_sets_provider_key() {
    use figment::{Figment, providers::Serialized};

    let config: LarderConfig = Figment::new()
        .merge(Serialized::defaults(LarderConfig::default()))
        .merge(("providers.groq.api_key", "gsk-from-env"))
        .extract()
        .expect("should set api_key via dot notation");

    assert_eq!(
        config.providers["groq"].api_key.as_deref(),
        Some("gsk-from-env")
    );
}

#[test]
fn dotted_override_beats_toml() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: LarderConfig = Figment::new()
        .merge(Serialized::defaults(LarderConfig::default()))
        .merge(Toml::string("[app]\ndefault_provider = \"openai\"\n"))
        .merge(("app.default_provider", "mistral"))
        .extract()
        .expect("should merge override");

    assert_eq!(config.app.default_provider, "mistral");
}

#[test]
fn missing_config_files_silently_skipped() {
    let config = larder_config::load_config_from_path(std::path::Path::new(
        "/nonexistent/path/larder.toml",
    ))
    .expect("missing file should be silently skipped");
    assert_eq!(config.app.name, "larder");
}

#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[logging]
level = "debug"
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("logging"),
        "error should mention unknown field, got: {err_str}"
    );
}

#[test]
fn diagnostic_error_includes_unknown_key_and_suggestion() {
    let toml = r#"
[app]
locle = "en"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "locle"
                && suggestion.as_deref() == Some("locale")
                && valid_keys.contains("default_provider")
        })
    });
    assert!(has_unknown_key, "expected UnknownKey for 'locle', got: {errors:?}");
}

#[test]
fn invalid_locale_is_rejected() {
    let toml = r#"
[app]
locale = "fr"
"#;

    let errors = load_and_validate_str(toml).expect_err("unsupported locale should fail");
    assert!(!errors.is_empty());
}

#[test]
fn invalid_type_message_names_key() {
    let toml = r#"
[generation]
max_auto_retries = "lots"
"#;

    let err = load_config_from_str(toml).expect_err("should reject invalid type");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("invalid type") || err_str.contains("max_auto_retries"),
        "error should mention type mismatch, got: {err_str}"
    );
}

#[test]
fn unknown_default_provider_is_reported_with_suggestion() {
    let toml = r#"
[app]
default_provider = "mistrall"
"#;

    let errors = load_and_validate_str(toml).expect_err("unknown provider should fail");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownProvider { id, suggestion: Some(s), .. }
            if id == "mistrall" && s == "mistral"
    )));
}

#[test]
fn config_error_renders_with_miette() {
    use miette::GraphicalReportHandler;

    let error = ConfigError::UnknownKey {
        key: "locle".to_string(),
        suggestion: Some("locale".to_string()),
        valid_keys: "name, log_level, locale, default_provider".to_string(),
        span: None,
        src: None,
    };

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("locle"), "rendered report should mention the key");
}

#[test]
fn load_and_validate_custom_provider() {
    let toml = r#"
[app]
default_provider = "homelab"

[providers.homelab]
base_url = "http://192.168.1.20:8080/v1"
model = "qwen2.5"
"#;

    let config = load_and_validate_str(toml).expect("custom provider should validate");
    assert_eq!(config.app.default_provider, "homelab");
    assert_eq!(config.providers["homelab"].model.as_deref(), Some("qwen2.5"));
}
