// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text rendering for terminal output.
//!
//! Everything here returns strings so commands decide where they go and
//! whether they get colored.

use std::time::Duration;

use larder_core::types::{ConsolidatedIngredient, Locale, Recipe, RecipeIdea};
use larder_recipes::render_amount;
use larder_resilience::{ApiError, PrimaryAction};

/// Tracks how much of a growing stream has been written out.
#[derive(Debug, Default)]
pub struct StreamPrinter {
    printed: usize,
}

impl StreamPrinter {
    /// The part of `content` not printed yet. A shorter or diverging
    /// `content` means a new attempt started, so printing restarts.
    pub fn delta<'a>(&mut self, content: &'a str) -> &'a str {
        if content.len() < self.printed || !content.is_char_boundary(self.printed) {
            self.printed = 0;
        }
        let delta = &content[self.printed..];
        self.printed = content.len();
        delta
    }

    pub fn reset(&mut self) {
        self.printed = 0;
    }

    pub fn has_printed(&self) -> bool {
        self.printed > 0
    }
}

/// Title, message, numbered steps and hints for a classified error.
pub fn error_lines(error: &ApiError, locale: Locale) -> Vec<String> {
    let mut lines = vec![
        format!("{} {}", error.icon, error.title(locale)),
        error.message(locale).to_string(),
    ];
    for (index, step) in error.step_texts(locale).iter().enumerate() {
        lines.push(format!("  {}. {step}", index + 1));
    }
    if !error.free_alternatives.is_empty() {
        lines.push(format!(
            "Free providers to try: {}",
            error.free_alternatives.join(", ")
        ));
    }
    if let Some(action) = &error.primary_action {
        lines.push(action_hint(action));
    }
    lines
}

fn action_hint(action: &PrimaryAction) -> String {
    match action {
        PrimaryAction::SwitchProvider(id) => format!("Run again with --provider {id}"),
        PrimaryAction::Navigate(_) => "Run `larder providers` to see what is available".to_string(),
        PrimaryAction::ShowApiKeyForm => "Store a key with `larder key set <provider> <key>`".to_string(),
    }
}

pub fn countdown_line(remaining: Duration) -> String {
    let secs = remaining.as_secs_f64().ceil() as u64;
    format!("Retrying in {secs}s (Ctrl+C to cancel)")
}

/// Progress text for a response that is not shown as it streams.
pub fn progress_line(tokens: usize, chars: usize) -> String {
    format!("receiving ideas: {tokens} chunks, {chars} characters")
}

/// Short form of a stored id for listings.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn idea_line(idea: &RecipeIdea) -> String {
    let used = if idea.is_used { " (used)" } else { "" };
    format!(
        "{}  {} [{}, {}]{used}\n          {}",
        short_id(&idea.id),
        idea.title,
        idea.meal_type,
        idea.protein_type,
        idea.description
    )
}

pub fn recipe_line(recipe: &Recipe) -> String {
    format!(
        "{}  {} ({}, {})",
        short_id(&recipe.id),
        recipe.title,
        recipe.provider,
        recipe.created_at.format("%Y-%m-%d")
    )
}

/// Full recipe as it would appear in a cookbook.
pub fn recipe_text(recipe: &Recipe) -> String {
    let mut out = format!("# {}\n", recipe.title);
    let body = &recipe.body;
    if let Some(summary) = &body.summary {
        out.push_str(&format!("\n{summary}\n"));
    }
    let mut facts = Vec::new();
    if let Some(servings) = body.servings {
        facts.push(format!("serves {servings}"));
    }
    if let Some(prep) = body.prep_minutes {
        facts.push(format!("prep {prep} min"));
    }
    if let Some(cook) = body.cook_minutes {
        facts.push(format!("cook {cook} min"));
    }
    if !facts.is_empty() {
        out.push_str(&format!("\n{}\n", facts.join(" · ")));
    }
    if !body.ingredients.is_empty() {
        out.push_str("\n## Ingredients\n");
        for ingredient in &body.ingredients {
            let marker = if ingredient.allergen { " ⚠" } else { "" };
            if ingredient.amount.is_empty() {
                out.push_str(&format!("- {}{marker}\n", ingredient.name));
            } else {
                out.push_str(&format!("- {} {}{marker}\n", ingredient.amount, ingredient.name));
            }
        }
    }
    if !body.steps.is_empty() {
        out.push_str("\n## Steps\n");
        for (index, step) in body.steps.iter().enumerate() {
            out.push_str(&format!("{}. {step}\n", index + 1));
        }
    }
    out
}

pub fn shopping_line(item: &ConsolidatedIngredient) -> String {
    let amount = if item.total_amount == 0.0 && item.unit.is_empty() {
        String::new()
    } else {
        render_amount(item)
    };
    let mut line = if amount.is_empty() {
        format!("[ ] {}", item.name)
    } else {
        format!("[ ] {} {}", amount, item.name)
    };
    if item.allergen {
        line.push_str(" ⚠");
    }
    if !item.sources.is_empty() {
        line.push_str(&format!("  ({})", item.sources.join(", ")));
    }
    line
}
