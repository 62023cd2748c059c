// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the generation pipeline, the persistence store,
//! and the adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Guardrail,
    Storage,
}

/// Normalizes a title or ingredient name into a comparison key.
///
/// Lowercases, trims, and collapses internal whitespace runs to one space.
pub fn normalize_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// --- Chat ---

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of a generation exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a message with a fresh id and the current timestamp.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

// --- Recipes ---

/// A single ingredient line of a structured recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub name: String,
    /// Free-text quantity as written, e.g. "1 1/2 cups".
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub allergen: bool,
}

/// The structured content of a recipe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeBody {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub servings: Option<u32>,
    #[serde(default)]
    pub prep_minutes: Option<u32>,
    #[serde(default)]
    pub cook_minutes: Option<u32>,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// A generated recipe kept in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub body: RecipeBody,
    /// Provider id that generated the recipe.
    pub provider: String,
    #[serde(default)]
    pub linked_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- Ideas ---

/// Meal slot a recipe idea is meant for.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MealType {
    Breakfast,
    Lunch,
    #[default]
    Dinner,
    Snack,
    Dessert,
}

/// Main protein of a recipe idea. `None` is the sentinel for "no main protein
/// or not reported".
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProteinType {
    Chicken,
    Beef,
    Pork,
    Fish,
    Seafood,
    Tofu,
    Legumes,
    Eggs,
    Dairy,
    #[default]
    None,
}

/// A lightweight recipe suggestion that precedes full recipe generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIdea {
    pub id: String,
    pub title: String,
    pub description: String,
    pub meal_type: MealType,
    #[serde(default)]
    pub protein_type: ProteinType,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub vibes: Vec<String>,
    pub servings: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_used: bool,
    #[serde(default)]
    pub linked_recipe_id: Option<String>,
}

// --- Shopping ---

/// One merged line of a shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedIngredient {
    /// Display name as first seen.
    pub name: String,
    /// Normalized comparison key.
    pub key: String,
    pub total_amount: f64,
    pub unit: String,
    /// Titles of the recipes this line came from.
    pub sources: Vec<String>,
    pub allergen: bool,
    pub is_consolidated: bool,
}

/// An item the user already has at home.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PantryItem {
    pub name: String,
    #[serde(default)]
    pub amount: Option<String>,
    pub added_at: DateTime<Utc>,
}

// --- Profile and preferences ---

/// Interface language for prompts.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Locale {
    #[default]
    En,
    Es,
}

/// Self-reported cooking experience.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

/// What the user told us about themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub name: Option<String>,
    pub dietary_restrictions: Vec<String>,
    pub allergies: Vec<String>,
    pub cuisines: Vec<String>,
    pub skill_level: SkillLevel,
    pub household_size: u32,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: None,
            dietary_restrictions: Vec::new(),
            allergies: Vec::new(),
            cuisines: Vec::new(),
            skill_level: SkillLevel::default(),
            household_size: 2,
        }
    }
}

/// App-level preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub locale: Locale,
    pub default_servings: u32,
    /// Preference tags matched against idea vibes when filtering.
    pub tags: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            default_servings: 2,
            tags: Vec::new(),
        }
    }
}

// --- Provider types ---

/// Identity of a provider adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Registry id, e.g. "groq".
    pub id: String,
    /// Human-readable name, e.g. "Groq".
    pub name: String,
    pub default_model: String,
}

/// Per-call overrides for a generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub model: Option<String>,
}

/// One incremental unit of generated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    pub content: String,
    /// True on the final chunk; consumers stop reading once seen.
    pub done: bool,
}

impl StreamChunk {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            done: false,
        }
    }

    pub fn done() -> Self {
        Self {
            content: String::new(),
            done: true,
        }
    }
}

/// Outcome of guardrail input validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    /// Cleaned input to send to the provider in place of the raw text.
    pub sanitized_input: Option<String>,
    /// Why the input was rejected.
    pub reason: Option<String>,
}

impl ValidationResult {
    pub fn accept(sanitized: impl Into<String>) -> Self {
        Self {
            valid: true,
            sanitized_input: Some(sanitized.into()),
            reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            sanitized_input: None,
            reason: Some(reason.into()),
        }
    }
}
