// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup wiring shared by every command.
//!
//! Builds the provider registry from the built-in catalog plus
//! `[providers.*]` overrides, opens the configured store and assembles the
//! generation orchestrator.

use std::collections::HashMap;
use std::sync::Arc;

use larder_agent::{GenerationOrchestrator, OrchestratorSettings, retry_policy};
use larder_anthropic::AnthropicProvider;
use larder_config::model::LarderConfig;
use larder_core::LarderError;
use larder_core::traits::ProviderAdapter;
use larder_core::types::{Locale, Preferences, ProviderConfig};
use larder_injection::PatternGuardrail;
use larder_openai::OpenAiCompatibleProvider;
use larder_plugin::{ProviderRegistry, WireProtocol, builtin_catalog, catalog_entry, free_tier_ids};
use larder_resilience::ErrorClassifier;
use larder_storage::{PersistenceStore, StoreKey};
use tracing::{debug, info};

/// Everything a command needs.
pub struct App {
    pub config: LarderConfig,
    pub orchestrator: GenerationOrchestrator,
}

impl App {
    pub async fn open(config: LarderConfig) -> Result<Self, LarderError> {
        let store = larder_storage::open_store(&config.storage).await?;
        seed_preferences(&store, &config).await;

        let registry = build_registry(&config)?;
        let mut settings = OrchestratorSettings::from_config(&config);
        for (provider, key) in env_credentials(|name| std::env::var(name).ok()) {
            settings.fallback_credentials.entry(provider).or_insert(key);
        }

        let classifier = ErrorClassifier::new(retry_policy(&config.generation), free_tier_ids());
        let guardrail = Arc::new(PatternGuardrail::new(config.generation.max_input_chars));
        let orchestrator = GenerationOrchestrator::new(
            guardrail,
            Arc::new(registry),
            store,
            classifier,
            settings,
        );
        info!(
            providers = orchestrator.registry().len(),
            backend = ?config.storage.backend,
            "larder ready"
        );
        Ok(Self {
            config,
            orchestrator,
        })
    }

    pub fn store(&self) -> &PersistenceStore {
        self.orchestrator.store()
    }

    pub async fn locale(&self) -> Locale {
        self.store().preferences().await.locale
    }

    /// Provider for a command: the explicit flag, then the one used last,
    /// then `app.default_provider`.
    pub async fn provider(&self, explicit: Option<&str>) -> String {
        if let Some(id) = explicit.map(str::trim).filter(|id| !id.is_empty()) {
            return id.to_string();
        }
        match self.store().last_provider().await {
            Some(id) if self.orchestrator.registry().contains(&id) => id,
            _ => self.config.app.default_provider.clone(),
        }
    }
}

/// Writes preferences derived from the config when none are stored yet.
async fn seed_preferences(store: &PersistenceStore, config: &LarderConfig) {
    if store.get::<Preferences>(StoreKey::Preferences).await.is_some() {
        return;
    }
    let preferences = Preferences {
        locale: config.app.locale,
        default_servings: config.generation.default_servings,
        ..Default::default()
    };
    store.set_preferences(&preferences).await;
    debug!(locale = %preferences.locale, "seeded preferences from config");
}

/// One adapter per built-in provider, then one per custom endpoint.
pub fn build_registry(config: &LarderConfig) -> Result<ProviderRegistry, LarderError> {
    let mut registry = ProviderRegistry::new();

    for entry in builtin_catalog() {
        let settings = config.providers.get(entry.id);
        let base_url = settings
            .and_then(|s| s.base_url.as_deref())
            .unwrap_or(entry.base_url);
        let model = settings
            .and_then(|s| s.model.clone())
            .unwrap_or_else(|| entry.default_model.to_string());
        let provider_config = ProviderConfig {
            id: entry.id.to_string(),
            name: entry.name.to_string(),
            default_model: model,
        };
        registry.register(adapter(provider_config, entry.wire, base_url)?);
    }

    for (id, settings) in &config.providers {
        if catalog_entry(id).is_some() {
            continue;
        }
        let base_url = settings.base_url.as_deref().ok_or_else(|| {
            LarderError::Config(format!("providers.{id}.base_url is required for a custom provider"))
        })?;
        let model = settings.model.clone().ok_or_else(|| {
            LarderError::Config(format!("providers.{id}.model is required for a custom provider"))
        })?;
        let provider_config = ProviderConfig {
            id: id.clone(),
            name: id.clone(),
            default_model: model,
        };
        registry.register(adapter(provider_config, WireProtocol::OpenAiCompatible, base_url)?);
    }

    Ok(registry)
}

fn adapter(
    config: ProviderConfig,
    wire: WireProtocol,
    base_url: &str,
) -> Result<Arc<dyn ProviderAdapter>, LarderError> {
    Ok(match wire {
        WireProtocol::Anthropic => Arc::new(AnthropicProvider::new(config, base_url)?),
        WireProtocol::OpenAiCompatible => {
            Arc::new(OpenAiCompatibleProvider::new(config, base_url)?)
        }
    })
}

/// API keys found in the catalog's conventional environment variables.
pub fn env_credentials(lookup: impl Fn(&str) -> Option<String>) -> HashMap<String, String> {
    builtin_catalog()
        .into_iter()
        .filter_map(|entry| {
            let key = lookup(entry.api_key_env)?;
            let key = key.trim();
            (!key.is_empty()).then(|| (entry.id.to_string(), key.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder_config::model::{ProviderSettings, StorageKind};

    fn memory_config() -> LarderConfig {
        let mut config = LarderConfig::default();
        config.storage.backend = StorageKind::Memory;
        config
    }

    #[test]
    fn registry_covers_the_catalog() {
        let registry = build_registry(&LarderConfig::default()).unwrap();
        assert_eq!(registry.len(), builtin_catalog().len());
        for entry in builtin_catalog() {
            let provider = registry.get(entry.id).unwrap();
            assert_eq!(provider.config().default_model, entry.default_model);
        }
    }

    #[test]
    fn overrides_and_custom_endpoints_are_registered() {
        let mut config = LarderConfig::default();
        config.providers.insert(
            "groq".into(),
            ProviderSettings {
                model: Some("llama-3.1-8b-instant".into()),
                ..Default::default()
            },
        );
        config.providers.insert(
            "homelab".into(),
            ProviderSettings {
                base_url: Some("http://127.0.0.1:8080/v1".into()),
                model: Some("qwen2.5".into()),
                ..Default::default()
            },
        );
        let registry = build_registry(&config).unwrap();
        assert_eq!(
            registry.get("groq").unwrap().config().default_model,
            "llama-3.1-8b-instant"
        );
        let custom = registry.get("homelab").unwrap();
        assert_eq!(custom.config().name, "homelab");
        assert_eq!(custom.config().default_model, "qwen2.5");
    }

    #[test]
    fn custom_endpoint_without_base_url_is_a_config_error() {
        let mut config = LarderConfig::default();
        config.providers.insert(
            "homelab".into(),
            ProviderSettings {
                model: Some("qwen2.5".into()),
                ..Default::default()
            },
        );
        let err = build_registry(&config).err().unwrap();
        assert!(matches!(err, LarderError::Config(message) if message.contains("homelab")));
    }

    #[test]
    fn env_credentials_use_catalog_variables() {
        let found = env_credentials(|name| match name {
            "GROQ_API_KEY" => Some(" gsk-123 ".to_string()),
            "OPENAI_API_KEY" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(found.len(), 1);
        assert_eq!(found["groq"], "gsk-123");
    }

    #[tokio::test]
    async fn open_seeds_preferences_from_config() {
        let mut config = memory_config();
        config.app.locale = Locale::Es;
        config.generation.default_servings = 5;
        let app = App::open(config).await.unwrap();
        let preferences = app.store().preferences().await;
        assert_eq!(preferences.locale, Locale::Es);
        assert_eq!(preferences.default_servings, 5);
    }

    #[tokio::test]
    async fn stored_preferences_win_over_config() {
        let app = App::open(memory_config()).await.unwrap();
        let store = app.store().clone();
        store
            .set_preferences(&Preferences {
                locale: Locale::Es,
                ..Default::default()
            })
            .await;

        seed_preferences(&store, &app.config).await;
        assert_eq!(store.preferences().await.locale, Locale::Es);
    }

    #[tokio::test]
    async fn provider_falls_back_to_last_used_then_default() {
        let app = App::open(memory_config()).await.unwrap();
        assert_eq!(app.provider(None).await, "groq");
        assert_eq!(app.provider(Some("openai")).await, "openai");

        app.store().set_last_provider("gemini").await;
        assert_eq!(app.provider(None).await, "gemini");
        assert_eq!(app.provider(Some("  ")).await, "gemini");

        app.store().set_last_provider("retired").await;
        assert_eq!(app.provider(None).await, "groq");
    }
}
