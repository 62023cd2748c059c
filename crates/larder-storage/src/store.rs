// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed persistence store over a key-value medium.
//!
//! Every operation is infallible from the caller's point of view: medium
//! errors and corrupt documents are logged and swallowed, reads fall back to
//! defaults. A detached store (no medium) turns every operation into a no-op.

use std::collections::BTreeMap;
use std::sync::Arc;

use larder_core::traits::StorageBackend;
use larder_core::types::{
    ChatMessage, ConsolidatedIngredient, PantryItem, Preferences, Recipe, RecipeIdea, UserProfile,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::keys::StoreKey;
use crate::memory::MemoryBackend;
use crate::policy::{
    self, CHAT_HISTORY_CAP, RECIPE_HISTORY_CAP, RECIPE_IDEAS_CAP,
};

/// Session-scoped store for everything Larder remembers.
#[derive(Clone)]
pub struct PersistenceStore {
    backend: Option<Arc<dyn StorageBackend>>,
}

impl std::fmt::Debug for PersistenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceStore")
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .finish()
    }
}

impl PersistenceStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// A store with no medium. Reads return defaults, writes do nothing.
    pub fn detached() -> Self {
        Self { backend: None }
    }

    /// A store over a fresh [`MemoryBackend`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn is_attached(&self) -> bool {
        self.backend.is_some()
    }

    // --- Raw typed access ---

    /// Reads and decodes `key`. Missing, unreadable, or corrupt values are `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: StoreKey) -> Option<T> {
        let backend = self.backend.as_ref()?;
        let raw = match backend.get(key.as_str()).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %key, error = %e, "storage read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "discarding corrupt stored value");
                None
            }
        }
    }

    /// Encodes and writes `value` under `key`.
    pub async fn set<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to encode value for storage");
                return;
            }
        };
        if let Err(e) = backend.set(key.as_str(), &raw).await {
            warn!(key = %key, error = %e, "storage write failed");
        }
    }

    pub async fn remove(&self, key: StoreKey) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        if let Err(e) = backend.remove(key.as_str()).await {
            warn!(key = %key, error = %e, "storage remove failed");
        }
    }

    async fn get_list<T: DeserializeOwned>(&self, key: StoreKey) -> Vec<T> {
        self.get(key).await.unwrap_or_default()
    }

    // --- Profile, preferences, credentials ---

    pub async fn profile(&self) -> UserProfile {
        self.get(StoreKey::Profile).await.unwrap_or_default()
    }

    pub async fn set_profile(&self, profile: &UserProfile) {
        self.set(StoreKey::Profile, profile).await;
    }

    pub async fn preferences(&self) -> Preferences {
        self.get(StoreKey::Preferences).await.unwrap_or_default()
    }

    pub async fn set_preferences(&self, preferences: &Preferences) {
        self.set(StoreKey::Preferences, preferences).await;
    }

    /// Stored API keys by provider id.
    pub async fn credentials(&self) -> BTreeMap<String, String> {
        self.get(StoreKey::Credentials).await.unwrap_or_default()
    }

    /// Stored API key for `provider`, ignoring blank entries.
    pub async fn credential(&self, provider: &str) -> Option<String> {
        self.credentials()
            .await
            .remove(provider)
            .filter(|key| !key.trim().is_empty())
    }

    pub async fn set_credential(&self, provider: &str, api_key: &str) {
        let mut credentials = self.credentials().await;
        credentials.insert(provider.to_string(), api_key.trim().to_string());
        self.set(StoreKey::Credentials, &credentials).await;
    }

    pub async fn remove_credential(&self, provider: &str) {
        let mut credentials = self.credentials().await;
        if credentials.remove(provider).is_some() {
            self.set(StoreKey::Credentials, &credentials).await;
        }
    }

    pub async fn last_provider(&self) -> Option<String> {
        self.get(StoreKey::LastProvider).await
    }

    pub async fn set_last_provider(&self, provider: &str) {
        self.set(StoreKey::LastProvider, provider).await;
    }

    // --- Chat history ---

    /// Oldest first.
    pub async fn chat_history(&self) -> Vec<ChatMessage> {
        self.get_list(StoreKey::ChatHistory).await
    }

    /// Appends messages, skipping ids already stored and evicting the oldest
    /// beyond the cap. Returns how many were appended.
    pub async fn append_chat_messages(&self, messages: &[ChatMessage]) -> usize {
        let mut history = self.chat_history().await;
        let added = policy::append_chat(&mut history, messages, CHAT_HISTORY_CAP);
        if added > 0 {
            self.set(StoreKey::ChatHistory, &history).await;
        }
        debug!(added, total = history.len(), "chat history updated");
        added
    }

    pub async fn clear_chat_history(&self) {
        self.remove(StoreKey::ChatHistory).await;
    }

    // --- Recipe history ---

    /// Newest first.
    pub async fn recipe_history(&self) -> Vec<Recipe> {
        self.get_list(StoreKey::RecipeHistory).await
    }

    /// Adds a recipe unless one with the same normalized title exists.
    pub async fn add_recipe(&self, recipe: Recipe) -> bool {
        let mut history = self.recipe_history().await;
        let title = recipe.title.clone();
        let added = policy::prepend_recipe(&mut history, recipe, RECIPE_HISTORY_CAP);
        if added {
            self.set(StoreKey::RecipeHistory, &history).await;
        } else {
            debug!(title = %title, "recipe already in history");
        }
        added
    }

    pub async fn clear_recipe_history(&self) {
        self.remove(StoreKey::RecipeHistory).await;
    }

    // --- Recipe ideas ---

    /// Newest batch first.
    pub async fn recipe_ideas(&self) -> Vec<RecipeIdea> {
        self.get_list(StoreKey::RecipeIdeas).await
    }

    /// Stores a batch of ideas ahead of older ones, dropping duplicates.
    /// Returns how many ideas from the batch were kept.
    pub async fn add_recipe_ideas(&self, batch: Vec<RecipeIdea>) -> usize {
        if batch.is_empty() {
            return 0;
        }
        let mut ideas = self.recipe_ideas().await;
        let added = policy::merge_ideas(&mut ideas, batch, RECIPE_IDEAS_CAP);
        if added > 0 {
            self.set(StoreKey::RecipeIdeas, &ideas).await;
        }
        added
    }

    /// Flags an idea as used, optionally linking the recipe made from it.
    pub async fn mark_idea_used(&self, idea_id: &str, recipe_id: Option<&str>) -> bool {
        let mut ideas = self.recipe_ideas().await;
        let Some(idea) = ideas.iter_mut().find(|i| i.id == idea_id) else {
            return false;
        };
        idea.is_used = true;
        if let Some(recipe_id) = recipe_id {
            idea.linked_recipe_id = Some(recipe_id.to_string());
        }
        self.set(StoreKey::RecipeIdeas, &ideas).await;
        true
    }

    pub async fn clear_recipe_ideas(&self) {
        self.remove(StoreKey::RecipeIdeas).await;
    }

    // --- Pantry and shopping list ---

    pub async fn pantry(&self) -> Vec<PantryItem> {
        self.get_list(StoreKey::Pantry).await
    }

    pub async fn add_pantry_item(&self, item: PantryItem) {
        let mut items = self.pantry().await;
        policy::upsert_pantry(&mut items, item);
        self.set(StoreKey::Pantry, &items).await;
    }

    pub async fn clear_pantry(&self) {
        self.remove(StoreKey::Pantry).await;
    }

    pub async fn shopping_list(&self) -> Vec<ConsolidatedIngredient> {
        self.get_list(StoreKey::ShoppingList).await
    }

    pub async fn set_shopping_list(&self, items: &[ConsolidatedIngredient]) {
        self.set(StoreKey::ShoppingList, items).await;
    }

    pub async fn clear_shopping_list(&self) {
        self.remove(StoreKey::ShoppingList).await;
    }

    /// Removes every key in the schema.
    pub async fn clear_all(&self) {
        for key in StoreKey::ALL {
            self.remove(key).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use larder_core::LarderError;
    use larder_core::traits::PluginAdapter;
    use larder_core::types::{AdapterType, HealthStatus, RecipeBody, Role};
    use tracing_test::traced_test;

    struct BrokenBackend;

    #[async_trait]
    impl PluginAdapter for BrokenBackend {
        fn name(&self) -> &str {
            "broken"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Storage
        }
        async fn health_check(&self) -> Result<HealthStatus, LarderError> {
            Ok(HealthStatus::Unhealthy("always broken".into()))
        }
    }

    #[async_trait]
    impl StorageBackend for BrokenBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>, LarderError> {
            Err(LarderError::Internal("disk on fire".into()))
        }
        async fn set(&self, _key: &str, _value: &str) -> Result<(), LarderError> {
            Err(LarderError::Internal("disk on fire".into()))
        }
        async fn remove(&self, _key: &str) -> Result<(), LarderError> {
            Err(LarderError::Internal("disk on fire".into()))
        }
    }

    fn recipe(title: &str) -> Recipe {
        Recipe {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            body: RecipeBody::default(),
            provider: "mock".to_string(),
            linked_message_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn detached_store_is_a_noop() {
        let store = PersistenceStore::detached();
        store.set_last_provider("groq").await;
        store
            .append_chat_messages(&[ChatMessage::new(Role::User, "hi")])
            .await;
        assert!(store.chat_history().await.is_empty());
        assert_eq!(store.last_provider().await, None);
        assert_eq!(store.profile().await, UserProfile::default());
    }

    #[tokio::test]
    #[traced_test]
    async fn medium_failures_are_swallowed_and_logged() {
        let store = PersistenceStore::new(Arc::new(BrokenBackend));
        store.set_credential("groq", "gsk").await;
        assert_eq!(store.credential("groq").await, None);
        assert!(store.recipe_history().await.is_empty());
        store.clear_all().await;
        assert!(logs_contain("storage write failed"));
        assert!(logs_contain("storage read failed"));
    }

    #[tokio::test]
    #[traced_test]
    async fn corrupt_json_reads_as_default() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set(StoreKey::RecipeHistory.as_str(), "{not json")
            .await
            .unwrap();
        let store = PersistenceStore::new(backend);
        assert!(store.recipe_history().await.is_empty());
        assert!(logs_contain("discarding corrupt stored value"));
    }

    #[tokio::test]
    async fn chat_append_dedups_by_id() {
        let store = PersistenceStore::in_memory();
        let message = ChatMessage::new(Role::Assistant, "Here is a recipe");
        store.append_chat_messages(&[message.clone()]).await;
        store.append_chat_messages(&[message.clone()]).await;
        let history = store.chat_history().await;
        assert_eq!(history, vec![message]);
    }

    #[tokio::test]
    async fn recipe_history_dedups_by_title() {
        let store = PersistenceStore::in_memory();
        assert!(store.add_recipe(recipe("Pasta al Limone")).await);
        assert!(!store.add_recipe(recipe("pasta  al limone")).await);
        assert_eq!(store.recipe_history().await.len(), 1);
    }

    #[tokio::test]
    async fn credentials_round_trip_and_blank_is_missing() {
        let store = PersistenceStore::in_memory();
        store.set_credential("openai", " sk-123 ").await;
        store.set_credential("groq", "   ").await;
        assert_eq!(store.credential("openai").await.as_deref(), Some("sk-123"));
        assert_eq!(store.credential("groq").await, None);
        store.remove_credential("openai").await;
        assert_eq!(store.credential("openai").await, None);
    }

    #[tokio::test]
    async fn mark_idea_used_links_recipe() {
        let store = PersistenceStore::in_memory();
        let idea = RecipeIdea {
            id: "idea-1".into(),
            title: "Miso Soup".into(),
            description: "Warm and quick".into(),
            meal_type: Default::default(),
            protein_type: Default::default(),
            ingredients: vec![],
            vibes: vec![],
            servings: 2,
            created_at: Utc::now(),
            is_used: false,
            linked_recipe_id: None,
        };
        assert_eq!(store.add_recipe_ideas(vec![idea]).await, 1);
        assert!(store.mark_idea_used("idea-1", Some("recipe-9")).await);
        assert!(!store.mark_idea_used("missing", None).await);
        let stored = &store.recipe_ideas().await[0];
        assert!(stored.is_used);
        assert_eq!(stored.linked_recipe_id.as_deref(), Some("recipe-9"));
    }

    #[tokio::test]
    async fn clear_all_empties_every_key() {
        let store = PersistenceStore::in_memory();
        store.set_last_provider("groq").await;
        store.add_recipe(recipe("Soup")).await;
        store
            .add_pantry_item(PantryItem {
                name: "Rice".into(),
                amount: None,
                added_at: Utc::now(),
            })
            .await;
        store.clear_all().await;
        assert_eq!(store.last_provider().await, None);
        assert!(store.recipe_history().await.is_empty());
        assert!(store.pantry().await.is_empty());
    }
}
