// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Commands that read or edit stored data without calling a provider.

use chrono::Utc;
use clap::Args;
use colored::Colorize;
use larder_core::LarderError;
use larder_core::types::{
    ConsolidatedIngredient, Locale, MealType, PantryItem, Preferences, ProteinType, Recipe,
    Role, SkillLevel, UserProfile, normalize_key,
};
use larder_config::model::LarderConfig;
use larder_plugin::search_catalog;
use larder_recipes::{IdeaFilter, consolidate_into, entries_from_recipe, without_pantry_items};
use larder_storage::PersistenceStore;
use tracing::info;

use crate::app::{App, env_credentials};
use crate::render::{idea_line, recipe_line, recipe_text, shopping_line};

// --- Ideas ---

#[derive(Args, Debug, Default)]
pub struct IdeaListArgs {
    #[arg(long)]
    pub meal: Option<MealType>,

    #[arg(long)]
    pub protein: Option<ProteinType>,

    /// Only ideas already turned into recipes.
    #[arg(long, conflicts_with = "unused")]
    pub used: bool,

    /// Only ideas not cooked yet.
    #[arg(long)]
    pub unused: bool,

    /// Keep ideas with any of these vibes. Repeatable.
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Also match the tags saved in preferences.
    #[arg(long)]
    pub preferred: bool,
}

impl IdeaListArgs {
    pub fn filter(&self, preferences: &Preferences) -> IdeaFilter {
        let mut tags = self.tags.clone();
        if self.preferred {
            tags.extend(preferences.tags.iter().cloned());
        }
        IdeaFilter {
            meal_type: self.meal,
            protein_type: self.protein,
            used: match (self.used, self.unused) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            tags,
        }
    }
}

pub async fn list_ideas(app: &App, args: &IdeaListArgs) -> Result<(), LarderError> {
    let preferences = app.store().preferences().await;
    let ideas = app.orchestrator.filter_ideas(&args.filter(&preferences)).await;
    if ideas.is_empty() {
        println!("No ideas yet. Ask for some with `larder ideas new`.");
        return Ok(());
    }
    for idea in &ideas {
        println!("{}", idea_line(idea));
    }
    Ok(())
}

// --- History ---

pub async fn show_history(app: &App, id: Option<&str>, chat: bool) -> Result<(), LarderError> {
    if chat {
        for message in app.orchestrator.chat_history().await {
            let who = match message.role {
                Role::User => "you".cyan(),
                Role::Assistant => "larder".green(),
            };
            println!("{} {}\n{}\n", who, message.timestamp.format("%Y-%m-%d %H:%M"), message.content);
        }
        return Ok(());
    }

    let recipes = app.orchestrator.recipe_history().await;
    match id {
        Some(selector) => {
            let recipe = select_recipes(&recipes, &[selector.to_string()])?
                .into_iter()
                .next()
                .ok_or_else(|| LarderError::Parse(format!("no recipe matches `{selector}`")))?;
            print!("{}", recipe_text(recipe));
        }
        None if recipes.is_empty() => println!("No recipes yet. Try `larder generate`."),
        None => {
            for recipe in &recipes {
                println!("{}", recipe_line(recipe));
            }
        }
    }
    Ok(())
}

pub async fn clear_history(app: &App, ideas: bool) -> Result<(), LarderError> {
    app.orchestrator.clear_history().await;
    if ideas {
        app.store().clear_recipe_ideas().await;
    }
    info!(ideas, "history cleared");
    println!("History cleared.");
    Ok(())
}

/// Recipes matching each selector, by id prefix or title, in selector order.
pub fn select_recipes<'a>(recipes: &'a [Recipe], selectors: &[String]) -> Result<Vec<&'a Recipe>, LarderError> {
    let mut selected: Vec<&Recipe> = Vec::new();
    for selector in selectors {
        let selector = selector.trim();
        let key = normalize_key(selector);
        let found = recipes
            .iter()
            .find(|r| !selector.is_empty() && r.id.starts_with(selector))
            .or_else(|| recipes.iter().find(|r| !key.is_empty() && normalize_key(&r.title) == key))
            .ok_or_else(|| LarderError::Parse(format!("no recipe matches `{selector}`")))?;
        if !selected.iter().any(|r| r.id == found.id) {
            selected.push(found);
        }
    }
    Ok(selected)
}

// --- Shopping list ---

/// Merges the ingredients of `recipes` into `list`, skipping what the
/// pantry covers unless `include_pantry` is set.
pub fn extend_shopping_list(
    list: &mut Vec<ConsolidatedIngredient>,
    recipes: &[&Recipe],
    pantry: &[PantryItem],
    include_pantry: bool,
) {
    let mut entries: Vec<_> = recipes.iter().flat_map(|r| entries_from_recipe(r)).collect();
    if !include_pantry {
        entries = without_pantry_items(entries, pantry);
    }
    consolidate_into(list, &entries);
}

pub async fn add_to_shopping_list(
    app: &App,
    selectors: &[String],
    include_pantry: bool,
) -> Result<(), LarderError> {
    let store = app.store();
    let recipes = store.recipe_history().await;
    let chosen = if selectors.is_empty() {
        recipes.first().into_iter().collect()
    } else {
        select_recipes(&recipes, selectors)?
    };
    if chosen.is_empty() {
        return Err(LarderError::Parse("no recipes in history to shop for".to_string()));
    }

    let mut list = store.shopping_list().await;
    let before = list.len();
    extend_shopping_list(&mut list, &chosen, &store.pantry().await, include_pantry);
    store.set_shopping_list(&list).await;

    for recipe in &chosen {
        println!("{} {}", "added".green(), recipe.title);
    }
    println!("{} items ({} new)", list.len(), list.len() - before);
    Ok(())
}

pub async fn show_shopping_list(app: &App) -> Result<(), LarderError> {
    let list = app.store().shopping_list().await;
    if list.is_empty() {
        println!("Shopping list is empty.");
    }
    for item in &list {
        println!("{}", shopping_line(item));
    }
    Ok(())
}

pub async fn clear_shopping_list(app: &App) -> Result<(), LarderError> {
    app.store().clear_shopping_list().await;
    println!("Shopping list cleared.");
    Ok(())
}

// --- Pantry ---

pub async fn add_pantry_items(app: &App, names: &[String], amount: Option<&str>) -> Result<(), LarderError> {
    let names: Vec<&str> = names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()).collect();
    if names.is_empty() {
        return Err(LarderError::Parse("name at least one pantry item".to_string()));
    }
    for name in names {
        app.store()
            .add_pantry_item(PantryItem {
                name: name.to_string(),
                amount: amount.map(str::to_string),
                added_at: Utc::now(),
            })
            .await;
        println!("{} {name}", "stocked".green());
    }
    Ok(())
}

pub async fn list_pantry(app: &App) -> Result<(), LarderError> {
    let pantry = app.store().pantry().await;
    if pantry.is_empty() {
        println!("Pantry is empty.");
    }
    for item in &pantry {
        match &item.amount {
            Some(amount) => println!("- {} ({amount})", item.name),
            None => println!("- {}", item.name),
        }
    }
    Ok(())
}

pub async fn clear_pantry(app: &App) -> Result<(), LarderError> {
    app.store().clear_pantry().await;
    println!("Pantry cleared.");
    Ok(())
}

// --- Keys ---

pub async fn set_key(app: &App, provider: &str, key: &str) -> Result<(), LarderError> {
    if !app.orchestrator.registry().contains(provider) {
        return Err(LarderError::AdapterNotFound {
            adapter_type: "provider".to_string(),
            name: provider.to_string(),
        });
    }
    let key = key.trim();
    if key.is_empty() {
        return Err(LarderError::Parse("API key must not be empty".to_string()));
    }
    app.store().set_credential(provider, key).await;
    info!(provider, "credential stored");
    println!("Stored key for {provider}.");
    Ok(())
}

pub async fn remove_key(app: &App, provider: &str) -> Result<(), LarderError> {
    app.store().remove_credential(provider).await;
    println!("Removed key for {provider}.");
    Ok(())
}

// --- Profile ---

#[derive(Args, Debug, Default)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,

    /// Replaces the allergy list. Repeatable.
    #[arg(long = "allergy")]
    pub allergies: Vec<String>,

    /// Replaces the dietary restrictions. Repeatable.
    #[arg(long = "diet")]
    pub dietary_restrictions: Vec<String>,

    /// Replaces the favourite cuisines. Repeatable.
    #[arg(long = "cuisine")]
    pub cuisines: Vec<String>,

    #[arg(long)]
    pub skill: Option<SkillLevel>,

    #[arg(long)]
    pub household: Option<u32>,

    #[arg(long)]
    pub locale: Option<Locale>,

    #[arg(long)]
    pub servings: Option<u32>,

    /// Replaces the preference tags used by `ideas list --preferred`.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

impl ProfileArgs {
    /// Applies the flags that were given; everything else is kept.
    pub fn apply(&self, profile: &mut UserProfile, preferences: &mut Preferences) {
        if let Some(name) = &self.name {
            let name = name.trim();
            profile.name = (!name.is_empty()).then(|| name.to_string());
        }
        replace_if_given(&mut profile.allergies, &self.allergies);
        replace_if_given(&mut profile.dietary_restrictions, &self.dietary_restrictions);
        replace_if_given(&mut profile.cuisines, &self.cuisines);
        if let Some(skill) = self.skill {
            profile.skill_level = skill;
        }
        if let Some(household) = self.household {
            profile.household_size = household;
        }
        if let Some(locale) = self.locale {
            preferences.locale = locale;
        }
        if let Some(servings) = self.servings {
            preferences.default_servings = servings;
        }
        replace_if_given(&mut preferences.tags, &self.tags);
    }
}

fn replace_if_given(target: &mut Vec<String>, given: &[String]) {
    if !given.is_empty() {
        *target = given
            .iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
    }
}

pub async fn show_profile(app: &App) -> Result<(), LarderError> {
    let profile = app.store().profile().await;
    let preferences = app.store().preferences().await;
    let list = |items: &[String]| {
        if items.is_empty() {
            "-".to_string()
        } else {
            items.join(", ")
        }
    };
    println!("name:         {}", profile.name.as_deref().unwrap_or("-"));
    println!("allergies:    {}", list(&profile.allergies));
    println!("diet:         {}", list(&profile.dietary_restrictions));
    println!("cuisines:     {}", list(&profile.cuisines));
    println!("skill:        {}", profile.skill_level);
    println!("household:    {}", profile.household_size);
    println!("locale:       {}", preferences.locale);
    println!("servings:     {}", preferences.default_servings);
    println!("tags:         {}", list(&preferences.tags));
    Ok(())
}

pub async fn set_profile(app: &App, args: &ProfileArgs) -> Result<(), LarderError> {
    let store = app.store();
    let mut profile = store.profile().await;
    let mut preferences = store.preferences().await;
    args.apply(&mut profile, &mut preferences);
    store.set_profile(&profile).await;
    store.set_preferences(&preferences).await;
    show_profile(app).await
}

// --- Providers ---

/// Where a provider's key would come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Stored,
    Config,
    Environment,
    Missing,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Stored => "key stored",
            Self::Config => "key in config",
            Self::Environment => "key in env",
            Self::Missing => "no key",
        })
    }
}

pub async fn key_source(store: &PersistenceStore, config: &LarderConfig, provider: &str) -> KeySource {
    if store.credential(provider).await.is_some_and(|k| !k.trim().is_empty()) {
        return KeySource::Stored;
    }
    let configured = config
        .providers
        .get(provider)
        .and_then(|s| s.api_key.as_deref())
        .is_some_and(|k| !k.trim().is_empty());
    if configured {
        return KeySource::Config;
    }
    if env_credentials(|name| std::env::var(name).ok()).contains_key(provider) {
        return KeySource::Environment;
    }
    KeySource::Missing
}

pub async fn list_providers(app: &App, query: Option<&str>) -> Result<(), LarderError> {
    let registry = app.orchestrator.registry();
    let last = app.store().last_provider().await;
    let query = query.unwrap_or_default();

    for entry in search_catalog(query) {
        let Some(adapter) = registry.get(entry.id) else {
            continue;
        };
        let source = key_source(app.store(), &app.config, entry.id).await;
        let marker = if last.as_deref() == Some(entry.id) { "*" } else { " " };
        let free = if entry.free_tier { " free tier".green().to_string() } else { String::new() };
        let key = match source {
            KeySource::Missing => source.to_string().yellow().to_string(),
            _ => source.to_string().dimmed().to_string(),
        };
        println!(
            "{marker} {:<12} {:<16} {:<40} {key}{free}",
            entry.id,
            entry.name,
            adapter.config().default_model
        );
    }

    let query = query.trim().to_lowercase();
    for id in registry.ids() {
        if larder_plugin::catalog_entry(&id).is_some() || !id.contains(&query) {
            continue;
        }
        let Some(adapter) = registry.get(&id) else {
            continue;
        };
        let marker = if last.as_deref() == Some(id.as_str()) { "*" } else { " " };
        println!(
            "{marker} {:<12} {:<16} {:<40} {}",
            id,
            "custom",
            adapter.config().default_model,
            key_source(app.store(), &app.config, &id).await.to_string().dimmed()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder_config::model::StorageKind;
    use larder_core::types::{RecipeBody, RecipeIngredient};

    fn recipe(id: &str, title: &str, ingredients: &[(&str, &str)]) -> Recipe {
        Recipe {
            id: id.into(),
            title: title.into(),
            body: RecipeBody {
                ingredients: ingredients
                    .iter()
                    .map(|(amount, name)| RecipeIngredient {
                        name: name.to_string(),
                        amount: amount.to_string(),
                        allergen: false,
                    })
                    .collect(),
                ..Default::default()
            },
            provider: "groq".into(),
            linked_message_id: None,
            created_at: Utc::now(),
        }
    }

    async fn memory_app() -> App {
        let mut config = LarderConfig::default();
        config.storage.backend = StorageKind::Memory;
        App::open(config).await.unwrap()
    }

    #[test]
    fn list_args_build_the_filter() {
        let args = IdeaListArgs {
            meal: Some(MealType::Lunch),
            unused: true,
            tags: vec!["quick".into()],
            preferred: true,
            ..Default::default()
        };
        let preferences = Preferences {
            tags: vec!["cozy".into()],
            ..Default::default()
        };
        let filter = args.filter(&preferences);
        assert_eq!(filter.meal_type, Some(MealType::Lunch));
        assert_eq!(filter.protein_type, None);
        assert_eq!(filter.used, Some(false));
        assert_eq!(filter.tags, vec!["quick", "cozy"]);
    }

    #[test]
    fn recipes_are_selected_by_prefix_or_title() {
        let recipes = vec![
            recipe("aaa111", "Salsa", &[]),
            recipe("bbb222", "Tomato Soup", &[]),
        ];
        let selected = select_recipes(&recipes, &["bbb".into(), " tomato soup ".into(), "Salsa".into()]).unwrap();
        let titles: Vec<_> = selected.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Tomato Soup", "Salsa"]);
        assert!(select_recipes(&recipes, &["nothing".into()]).is_err());
    }

    #[test]
    fn shopping_list_consolidates_across_recipes_and_skips_pantry() {
        let salsa = recipe("a", "Salsa", &[("500g", "Tomato"), ("1", "Onion")]);
        let soup = recipe("b", "Soup", &[("1/2 kg", "tomato"), ("1 l", "Stock")]);
        let pantry = vec![PantryItem {
            name: "onion".into(),
            amount: None,
            added_at: Utc::now(),
        }];

        let mut list = Vec::new();
        extend_shopping_list(&mut list, &[&salsa], &pantry, false);
        extend_shopping_list(&mut list, &[&soup], &pantry, false);

        let names: Vec<_> = list.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Tomato", "Stock"]);
        assert_eq!(shopping_line(&list[0]), "[ ] 1 kg Tomato  (Salsa, Soup)");

        let mut with_pantry = Vec::new();
        extend_shopping_list(&mut with_pantry, &[&salsa], &pantry, true);
        assert_eq!(with_pantry.len(), 2);
    }

    #[test]
    fn profile_flags_only_touch_what_was_given() {
        let mut profile = UserProfile {
            allergies: vec!["peanuts".into()],
            cuisines: vec!["thai".into()],
            ..Default::default()
        };
        let mut preferences = Preferences::default();
        let args = ProfileArgs {
            name: Some(" Sam ".into()),
            allergies: vec!["shellfish".into(), " ".into()],
            household: Some(4),
            locale: Some(Locale::Es),
            ..Default::default()
        };
        args.apply(&mut profile, &mut preferences);
        assert_eq!(profile.name.as_deref(), Some("Sam"));
        assert_eq!(profile.allergies, vec!["shellfish"]);
        assert_eq!(profile.cuisines, vec!["thai"]);
        assert_eq!(profile.household_size, 4);
        assert_eq!(preferences.locale, Locale::Es);
        assert_eq!(preferences.default_servings, 2);
    }

    #[tokio::test]
    async fn keys_are_only_stored_for_known_providers() {
        let app = memory_app().await;
        set_key(&app, "groq", " gsk-123 ").await.unwrap();
        assert_eq!(app.store().credential("groq").await.as_deref(), Some("gsk-123"));
        assert_eq!(key_source(app.store(), &app.config, "groq").await, KeySource::Stored);

        let err = set_key(&app, "nope", "key").await.unwrap_err();
        assert!(matches!(err, LarderError::AdapterNotFound { .. }));
        assert!(set_key(&app, "groq", "  ").await.is_err());

        remove_key(&app, "groq").await.unwrap();
        assert!(app.store().credential("groq").await.is_none());
    }

    #[tokio::test]
    async fn pantry_items_dedup_by_name() {
        let app = memory_app().await;
        add_pantry_items(&app, &["Rice".into(), "rice ".into(), "Beans".into()], None)
            .await
            .unwrap();
        let names: Vec<_> = app.store().pantry().await.into_iter().map(|p| p.name).collect();
        assert_eq!(names.len(), 2);
        assert!(add_pantry_items(&app, &[" ".into()], None).await.is_err());

        clear_pantry(&app).await.unwrap();
        assert!(app.store().pantry().await.is_empty());
    }

    #[tokio::test]
    async fn shopping_add_defaults_to_the_newest_recipe() {
        let app = memory_app().await;
        assert!(add_to_shopping_list(&app, &[], false).await.is_err());

        app.store().add_recipe(recipe("a", "Salsa", &[("500g", "Tomato")])).await;
        app.store().add_recipe(recipe("b", "Soup", &[("1 l", "Stock")])).await;
        add_to_shopping_list(&app, &[], false).await.unwrap();

        let list = app.store().shopping_list().await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Stock");
    }
}
