// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dedup and size-cap rules for the persisted collections.
//!
//! Pure functions over in-memory vectors; the store loads, applies one of
//! these, and writes the result back.

use std::collections::HashSet;

use larder_core::types::{ChatMessage, PantryItem, Recipe, RecipeIdea, normalize_key};

pub const CHAT_HISTORY_CAP: usize = 20;
pub const RECIPE_HISTORY_CAP: usize = 50;
pub const RECIPE_IDEAS_CAP: usize = 200;

/// Appends messages whose id is not present yet, then evicts the oldest
/// entries beyond `cap`. Returns how many messages were appended.
pub fn append_chat(history: &mut Vec<ChatMessage>, incoming: &[ChatMessage], cap: usize) -> usize {
    let mut added = 0;
    for message in incoming {
        if history.iter().any(|m| m.id == message.id) {
            continue;
        }
        history.push(message.clone());
        added += 1;
    }
    if history.len() > cap {
        let excess = history.len() - cap;
        history.drain(..excess);
    }
    added
}

/// Puts `recipe` at the front unless a recipe with the same normalized
/// title exists. History is newest first, so truncation evicts the oldest.
pub fn prepend_recipe(history: &mut Vec<Recipe>, recipe: Recipe, cap: usize) -> bool {
    let key = normalize_key(&recipe.title);
    if history.iter().any(|r| normalize_key(&r.title) == key) {
        return false;
    }
    history.insert(0, recipe);
    history.truncate(cap);
    true
}

/// Places the new batch ahead of the existing ideas, dropping any idea whose
/// normalized title is already present (in storage or earlier in the batch).
/// Returns the number of ideas from the batch that survived.
pub fn merge_ideas(existing: &mut Vec<RecipeIdea>, batch: Vec<RecipeIdea>, cap: usize) -> usize {
    let mut seen: HashSet<String> = existing.iter().map(|i| normalize_key(&i.title)).collect();
    let fresh: Vec<RecipeIdea> = batch
        .into_iter()
        .filter(|idea| seen.insert(normalize_key(&idea.title)))
        .collect();
    let accepted = fresh.len().min(cap);

    let mut merged = fresh;
    merged.append(existing);
    merged.truncate(cap);
    *existing = merged;
    accepted
}

/// Adds a pantry item, or updates the amount of the item with the same
/// normalized name.
pub fn upsert_pantry(items: &mut Vec<PantryItem>, item: PantryItem) {
    let key = normalize_key(&item.name);
    match items.iter_mut().find(|i| normalize_key(&i.name) == key) {
        Some(existing) => existing.amount = item.amount,
        None => items.push(item),
    }
}
