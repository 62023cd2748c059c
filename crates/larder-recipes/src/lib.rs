// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-processing of generated text: recipe-ideas parsing and filtering,
//! structured recipe extraction, and ingredient consolidation for shopping
//! lists.

pub mod amount;
pub mod consolidate;
pub mod ideas;
pub mod structured;

pub use amount::{Amount, format_amount, parse_amount};
pub use consolidate::{
    IngredientEntry, consolidate, consolidate_into, entries_from_recipe, render_amount,
    without_pantry_items,
};
pub use ideas::{IdeaContext, IdeaFilter, filter_ideas, parse_ideas};
pub use structured::{ParsedRecipe, parse_recipe_markdown};
