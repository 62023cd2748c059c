// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in provider catalog.
//!
//! Static metadata for the text-generation services Larder can talk to out of
//! the box. No network calls are made.

use serde::Serialize;

/// Request/response dialect spoken by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WireProtocol {
    /// Anthropic Messages API.
    Anthropic,
    /// OpenAI chat-completions API, or a compatible endpoint.
    OpenAiCompatible,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub default_model: &'static str,
    pub base_url: &'static str,
    /// Environment variable conventionally holding the API key.
    pub api_key_env: &'static str,
    /// Whether the service offers a no-cost tier usable for recipes.
    pub free_tier: bool,
    pub wire: WireProtocol,
}

/// Returns all built-in providers.
pub fn builtin_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            id: "anthropic",
            name: "Anthropic",
            default_model: "claude-3-5-haiku-latest",
            base_url: "https://api.anthropic.com",
            api_key_env: "ANTHROPIC_API_KEY",
            free_tier: false,
            wire: WireProtocol::Anthropic,
        },
        CatalogEntry {
            id: "openai",
            name: "OpenAI",
            default_model: "gpt-4o-mini",
            base_url: "https://api.openai.com/v1",
            api_key_env: "OPENAI_API_KEY",
            free_tier: false,
            wire: WireProtocol::OpenAiCompatible,
        },
        CatalogEntry {
            id: "groq",
            name: "Groq",
            default_model: "llama-3.3-70b-versatile",
            base_url: "https://api.groq.com/openai/v1",
            api_key_env: "GROQ_API_KEY",
            free_tier: true,
            wire: WireProtocol::OpenAiCompatible,
        },
        CatalogEntry {
            id: "openrouter",
            name: "OpenRouter",
            default_model: "meta-llama/llama-3.3-70b-instruct:free",
            base_url: "https://openrouter.ai/api/v1",
            api_key_env: "OPENROUTER_API_KEY",
            free_tier: true,
            wire: WireProtocol::OpenAiCompatible,
        },
        CatalogEntry {
            id: "gemini",
            name: "Google Gemini",
            default_model: "gemini-2.0-flash",
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai",
            api_key_env: "GEMINI_API_KEY",
            free_tier: true,
            wire: WireProtocol::OpenAiCompatible,
        },
        CatalogEntry {
            id: "mistral",
            name: "Mistral",
            default_model: "mistral-small-latest",
            base_url: "https://api.mistral.ai/v1",
            api_key_env: "MISTRAL_API_KEY",
            free_tier: true,
            wire: WireProtocol::OpenAiCompatible,
        },
    ]
}

/// Looks up a built-in provider by id.
pub fn catalog_entry(id: &str) -> Option<CatalogEntry> {
    builtin_catalog().into_iter().find(|e| e.id == id)
}

/// Ids of built-in providers with a free tier, in catalog order.
pub fn free_tier_ids() -> Vec<String> {
    builtin_catalog()
        .into_iter()
        .filter(|e| e.free_tier)
        .map(|e| e.id.to_string())
        .collect()
}

/// Filters the catalog by id or display name (case-insensitive). An empty
/// query returns everything.
pub fn search_catalog(query: &str) -> Vec<CatalogEntry> {
    let query = query.trim().to_lowercase();
    builtin_catalog()
        .into_iter()
        .filter(|e| query.is_empty() || e.id.contains(&query) || e.name.to_lowercase().contains(&query))
        .collect()
}
