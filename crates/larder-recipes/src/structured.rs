// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parser for the markdown recipe layout the recipe system prompt asks for:
//!
//! ```text
//! # Title
//! Short summary.
//! **Servings:** 4
//! **Prep time:** 15 minutes
//! ## Ingredients
//! - 200 g spaghetti
//! ## Instructions
//! 1. Boil the pasta.
//! ```
//!
//! Spanish headings and labels are accepted as well.

use std::sync::LazyLock;

use chrono::Utc;
use larder_core::types::{Recipe, RecipeBody, RecipeIngredient};
use regex::Regex;

use crate::amount::lookup_unit;

const INGREDIENT_HEADINGS: &[&str] = &["ingredients", "ingredientes"];
const STEP_HEADINGS: &[&str] = &[
    "instructions",
    "steps",
    "method",
    "directions",
    "preparación",
    "preparacion",
    "instrucciones",
    "pasos",
];
const SERVINGS_LABELS: &[&str] = &["servings", "serves", "porciones", "raciones"];
const PREP_LABELS: &[&str] = &["prep time", "preparation time", "tiempo de preparación", "tiempo de preparacion"];
const COOK_LABELS: &[&str] = &["cook time", "cooking time", "tiempo de cocción", "tiempo de coccion"];

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+[.)]|[-*•+])\s+").unwrap());

static ALLERGEN_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(\s*(?:allergen|al[ée]rgeno)\s*\)|⚠\x{FE0F}?").unwrap());

static NUMBER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+(?:[.,]\d+)?|\d+/\d+|\d*[½¼¾⅓⅔⅛])$").unwrap()
});

static NUMBER_WITH_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:[.,]\d+)?)([^\d\s.,/]+)\.?$").unwrap());

static DURATION_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(h\b|hrs?\b|hours?\b|horas?\b)?").unwrap()
});

/// Recipe fields recovered from generated markdown.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecipe {
    pub title: String,
    pub body: RecipeBody,
}

impl ParsedRecipe {
    /// Whether the recipe is complete enough to keep in history.
    pub fn qualifies(&self) -> bool {
        !self.title.is_empty() && !self.body.ingredients.is_empty() && !self.body.steps.is_empty()
    }

    pub fn into_recipe(self, provider: &str, linked_message_id: Option<String>) -> Recipe {
        Recipe {
            id: uuid::Uuid::new_v4().to_string(),
            title: self.title,
            body: self.body,
            provider: provider.to_string(),
            linked_message_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Ingredients,
    Steps,
    Other,
}

/// Parses generated recipe markdown. Returns `None` when no title is found.
///
/// Ingredient lines mentioning one of `allergies`, or carrying an explicit
/// allergen marker, are flagged.
pub fn parse_recipe_markdown(text: &str, allergies: &[String]) -> Option<ParsedRecipe> {
    let allergies: Vec<String> = allergies
        .iter()
        .map(|a| a.trim().to_lowercase())
        .filter(|a| !a.is_empty())
        .collect();

    let mut title: Option<String> = None;
    let mut body = RecipeBody::default();
    let mut summary: Vec<String> = Vec::new();
    let mut section = Section::Preamble;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(heading) = heading_text(line) {
            match section_for(&heading) {
                Some(next) => section = next,
                None if title.is_none() => title = Some(heading),
                None => section = Section::Other,
            }
            continue;
        }

        if let Some(next) = bare_section_label(line) {
            section = next;
            continue;
        }

        match section {
            Section::Ingredients => {
                if let Some(ingredient) = parse_ingredient_line(line, &allergies) {
                    body.ingredients.push(ingredient);
                }
            }
            Section::Steps => {
                let step = LIST_MARKER.replace(line, "").trim().to_string();
                if !step.is_empty() {
                    body.steps.push(step);
                }
            }
            Section::Preamble | Section::Other => {
                if apply_metadata(line, &mut body) {
                    continue;
                }
                if section == Section::Preamble && title.is_some() {
                    summary.push(strip_emphasis(line));
                }
            }
        }
    }

    if !summary.is_empty() {
        body.summary = Some(summary.join(" "));
    }
    let title = title.filter(|t| !t.is_empty())?;
    Some(ParsedRecipe { title, body })
}

/// Text of a `#`-style heading, without markers or emphasis.
fn heading_text(line: &str) -> Option<String> {
    let rest = line.strip_prefix('#')?;
    let text = rest.trim_start_matches('#').trim();
    Some(strip_emphasis(text).trim_end_matches(':').trim().to_string())
}

fn section_for(heading: &str) -> Option<Section> {
    let lower = heading.to_lowercase();
    if INGREDIENT_HEADINGS.contains(&lower.as_str()) {
        Some(Section::Ingredients)
    } else if STEP_HEADINGS.contains(&lower.as_str()) {
        Some(Section::Steps)
    } else {
        None
    }
}

/// Section labels written as a plain line, e.g. `**Ingredients:**`.
fn bare_section_label(line: &str) -> Option<Section> {
    let cleaned = strip_emphasis(line);
    let label = cleaned.strip_suffix(':').unwrap_or(&cleaned).trim();
    section_for(label)
}

fn strip_emphasis(text: &str) -> String {
    text.replace("**", "").replace("__", "").trim().to_string()
}

/// Reads a `Label: value` metadata line into `body`. Returns whether the
/// line was metadata.
fn apply_metadata(line: &str, body: &mut RecipeBody) -> bool {
    let cleaned = strip_emphasis(LIST_MARKER.replace(line, "").as_ref());
    let Some((label, value)) = cleaned.split_once(':') else {
        return false;
    };
    let label = label.trim().to_lowercase();
    let value = value.trim();

    if SERVINGS_LABELS.contains(&label.as_str()) {
        body.servings = first_number(value);
        true
    } else if PREP_LABELS.contains(&label.as_str()) {
        body.prep_minutes = minutes(value);
        true
    } else if COOK_LABELS.contains(&label.as_str()) {
        body.cook_minutes = minutes(value);
        true
    } else {
        false
    }
}

fn first_number(text: &str) -> Option<u32> {
    DURATION_PART
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// "1 hour 30 minutes" is 90; a bare number counts as minutes.
fn minutes(text: &str) -> Option<u32> {
    let mut total = None;
    for caps in DURATION_PART.captures_iter(text) {
        let Some(value) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };
        let factor = if caps.get(2).is_some() { 60 } else { 1 };
        total = Some(total.unwrap_or(0) + value * factor);
    }
    total
}

fn parse_ingredient_line(line: &str, allergies: &[String]) -> Option<RecipeIngredient> {
    let text = LIST_MARKER.replace(line, "");
    let lower = text.to_lowercase();

    let allergen =
        ALLERGEN_MARKER.is_match(&text) || allergies.iter().any(|a| lower.contains(a.as_str()));
    let text = strip_emphasis(&ALLERGEN_MARKER.replace_all(&text, ""));
    if text.is_empty() {
        return None;
    }
    let (amount, name) = split_ingredient(&text);
    Some(RecipeIngredient {
        name,
        amount,
        allergen,
    })
}

/// Splits "200 g spaghetti" into ("200 g", "spaghetti"). Lines without a
/// leading quantity may carry it after a comma ("Salt, to taste").
pub fn split_ingredient(text: &str) -> (String, String) {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut taken = 0;

    while taken < tokens.len() && NUMBER_TOKEN.is_match(tokens[taken]) {
        taken += 1;
    }

    if taken == 0 {
        let glued_unit = tokens
            .first()
            .and_then(|t| NUMBER_WITH_UNIT.captures(t))
            .and_then(|caps| caps.get(2))
            .is_some_and(|unit| lookup_unit(unit.as_str()).is_some());
        if glued_unit {
            taken = 1;
        }
    } else if tokens.get(taken).is_some_and(|t| lookup_unit(t).is_some()) {
        taken += 1;
    }

    if taken == 0 {
        return match text.split_once(',') {
            Some((name, amount)) if !amount.trim().is_empty() => {
                (amount.trim().to_string(), name.trim().to_string())
            }
            _ => (String::new(), text.trim().to_string()),
        };
    }

    let amount = tokens[..taken].join(" ");
    let mut rest = &tokens[taken..];
    if rest.len() > 1 && matches!(rest[0].to_lowercase().as_str(), "of" | "de") {
        rest = &rest[1..];
    }
    let name = rest.join(" ");
    if name.is_empty() {
        (String::new(), amount)
    } else {
        (amount, name)
    }
}
