// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingredient consolidation for shopping lists.
//!
//! Lines naming the same ingredient (case and whitespace insensitive) merge
//! into one entry. Quantities are summed only when their units agree.

use larder_core::types::{ConsolidatedIngredient, PantryItem, Recipe, normalize_key};

use crate::amount::{Amount, format_amount, parse_amount};

/// One ingredient line to consolidate.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientEntry {
    pub name: String,
    /// Free-text quantity, e.g. "1/2 kg".
    pub amount: String,
    /// Title of the recipe the line came from.
    pub source: String,
    pub allergen: bool,
}

impl IngredientEntry {
    pub fn new(name: impl Into<String>, amount: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: amount.into(),
            source: source.into(),
            allergen: false,
        }
    }
}

/// Ingredient lines of a stored recipe, tagged with its title.
pub fn entries_from_recipe(recipe: &Recipe) -> Vec<IngredientEntry> {
    recipe
        .body
        .ingredients
        .iter()
        .map(|ingredient| IngredientEntry {
            name: ingredient.name.clone(),
            amount: ingredient.amount.clone(),
            source: recipe.title.clone(),
            allergen: ingredient.allergen,
        })
        .collect()
}

/// Consolidates `items` into a fresh list, in first-seen order.
pub fn consolidate(items: &[IngredientEntry]) -> Vec<ConsolidatedIngredient> {
    let mut consolidated = Vec::new();
    consolidate_into(&mut consolidated, items);
    consolidated
}

/// Merges `items` into an existing consolidated list.
///
/// Consolidating `[a, b]` and then `[c]` gives the same list as
/// consolidating `[a, b, c]` at once.
pub fn consolidate_into(list: &mut Vec<ConsolidatedIngredient>, items: &[IngredientEntry]) {
    for item in items {
        let key = normalize_key(&item.name);
        if key.is_empty() {
            continue;
        }
        let amount = parse_amount(&item.amount);
        match list.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => merge_entry(entry, amount, item),
            None => list.push(ConsolidatedIngredient {
                name: item.name.trim().to_string(),
                key,
                total_amount: amount.value,
                unit: amount.unit,
                sources: if item.source.is_empty() {
                    Vec::new()
                } else {
                    vec![item.source.clone()]
                },
                allergen: item.allergen,
                is_consolidated: false,
            }),
        }
    }
}

fn merge_entry(entry: &mut ConsolidatedIngredient, amount: Amount, item: &IngredientEntry) {
    if entry.unit == amount.unit || amount.unit.is_empty() {
        entry.total_amount += amount.value;
    } else if entry.unit.is_empty() {
        entry.total_amount += amount.value;
        entry.unit = amount.unit;
    }
    // Incompatible units keep the first total; provenance still merges.
    if !item.source.is_empty() && !entry.sources.contains(&item.source) {
        entry.sources.push(item.source.clone());
    }
    entry.allergen |= item.allergen;
    entry.is_consolidated = true;
}

/// Display form of a consolidated quantity.
pub fn render_amount(entry: &ConsolidatedIngredient) -> String {
    format_amount(entry.total_amount, &entry.unit)
}

/// Drops entries the pantry already covers.
pub fn without_pantry_items(
    items: Vec<IngredientEntry>,
    pantry: &[PantryItem],
) -> Vec<IngredientEntry> {
    let stocked: Vec<String> = pantry.iter().map(|p| normalize_key(&p.name)).collect();
    items
        .into_iter()
        .filter(|item| !stocked.contains(&normalize_key(&item.name)))
        .collect()
}
