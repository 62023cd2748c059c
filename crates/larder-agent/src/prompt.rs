// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User prompt assembly from ingredients, servings and free-text notes.
//!
//! The system prompt (persona, profile, output layout) comes from the
//! guardrail; these helpers only build the user turn.

use larder_core::types::{Locale, RecipeIdea};
use larder_recipes::IdeaContext;

/// Prompt for one recipe from the ingredients at hand.
pub fn recipe_prompt(
    ingredients: &[String],
    servings: u32,
    notes: Option<&str>,
    locale: Locale,
) -> String {
    let list = join_list(ingredients);
    let mut prompt = match (locale, list.is_empty()) {
        (Locale::En, false) => format!("Make a recipe for {servings} using: {list}."),
        (Locale::En, true) => format!("Suggest a recipe for {servings}."),
        (Locale::Es, false) => format!("Haz una receta para {servings} usando: {list}."),
        (Locale::Es, true) => format!("Sugiere una receta para {servings}."),
    };
    push_notes(&mut prompt, notes);
    prompt
}

/// Prompt for a batch of `count` ideas.
pub fn ideas_prompt(
    context: &IdeaContext,
    count: u32,
    notes: Option<&str>,
    locale: Locale,
) -> String {
    let list = join_list(&context.ingredients);
    let vibes = join_list(&context.vibes);
    let meal = context.meal_type;
    let servings = context.servings;

    let mut prompt = match locale {
        Locale::En => format!("Suggest {count} {meal} ideas for {servings}."),
        Locale::Es => format!("Sugiere {count} ideas de {meal} para {servings}."),
    };
    if !list.is_empty() {
        prompt.push_str(match locale {
            Locale::En => " Ingredients available: ",
            Locale::Es => " Ingredientes disponibles: ",
        });
        prompt.push_str(&list);
        prompt.push('.');
    }
    if !vibes.is_empty() {
        prompt.push_str(match locale {
            Locale::En => " Mood: ",
            Locale::Es => " Estilo: ",
        });
        prompt.push_str(&vibes);
        prompt.push('.');
    }
    push_notes(&mut prompt, notes);
    prompt
}

/// Prompt that expands a stored idea into a full recipe.
pub fn idea_recipe_prompt(idea: &RecipeIdea, locale: Locale) -> String {
    let mut prompt = match locale {
        Locale::En => format!(
            "Write the full recipe for \"{}\" ({}) for {}.",
            idea.title, idea.description, idea.servings
        ),
        Locale::Es => format!(
            "Escribe la receta completa de \"{}\" ({}) para {}.",
            idea.title, idea.description, idea.servings
        ),
    };
    let list = join_list(&idea.ingredients);
    if !list.is_empty() {
        prompt.push_str(match locale {
            Locale::En => " Prefer these ingredients: ",
            Locale::Es => " Usa preferentemente: ",
        });
        prompt.push_str(&list);
        prompt.push('.');
    }
    prompt
}

fn join_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_notes(prompt: &mut String, notes: Option<&str>) {
    if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
        prompt.push(' ');
        prompt.push_str(notes);
    }
}
