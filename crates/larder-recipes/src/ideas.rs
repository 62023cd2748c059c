// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recipe-ideas responses: parsing the model's JSON array and filtering
//! stored ideas.

use std::str::FromStr;

use chrono::Utc;
use larder_core::types::{MealType, ProteinType, RecipeIdea};
use serde_json::Value;
use tracing::{debug, warn};

/// Request context merged into every parsed idea.
#[derive(Debug, Clone, Default)]
pub struct IdeaContext {
    pub meal_type: MealType,
    pub vibes: Vec<String>,
    pub ingredients: Vec<String>,
    pub servings: u32,
}

/// Parses an ideas response into recipe ideas.
///
/// Never fails: anything that is not a JSON array yields an empty list.
/// Elements without a non-empty `title` and `description` are skipped.
pub fn parse_ideas(response: &str, context: &IdeaContext) -> Vec<RecipeIdea> {
    let stripped = strip_code_fence(response);
    let Some(array_text) = find_top_level_array(stripped) else {
        debug!("no JSON array in ideas response");
        return Vec::new();
    };

    let elements = match serde_json::from_str::<Value>(array_text) {
        Ok(Value::Array(elements)) => elements,
        Ok(_) => return Vec::new(),
        Err(e) => {
            warn!("failed to parse ideas response: {e}");
            debug!("raw response: {response}");
            return Vec::new();
        }
    };

    elements
        .iter()
        .filter_map(|element| idea_from_value(element, context))
        .collect()
}

fn idea_from_value(value: &Value, context: &IdeaContext) -> Option<RecipeIdea> {
    let title = non_empty_str(value.get("title"))?;
    let description = non_empty_str(value.get("description"))?;

    let meal_type = value
        .get("mealType")
        .and_then(Value::as_str)
        .and_then(|s| MealType::from_str(s.trim()).ok())
        .unwrap_or(context.meal_type);
    let protein_type = value
        .get("proteinType")
        .and_then(Value::as_str)
        .and_then(|s| ProteinType::from_str(s.trim()).ok())
        .unwrap_or_default();

    Some(RecipeIdea {
        id: uuid::Uuid::new_v4().to_string(),
        title,
        description,
        meal_type,
        protein_type,
        ingredients: context.ingredients.clone(),
        vibes: context.vibes.clone(),
        servings: context.servings,
        created_at: Utc::now(),
        is_used: false,
        linked_recipe_id: None,
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    let text = value?.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Removes a leading ```lang line and a trailing ``` marker.
fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest,
        };
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Returns the first balanced `[...]` in `text`, skipping brackets that
/// appear inside JSON strings.
fn find_top_level_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Criteria for listing stored ideas. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct IdeaFilter {
    pub meal_type: Option<MealType>,
    pub protein_type: Option<ProteinType>,
    pub used: Option<bool>,
    /// Matches when any tag equals one of the idea's vibes.
    pub tags: Vec<String>,
}

impl IdeaFilter {
    pub fn matches(&self, idea: &RecipeIdea) -> bool {
        if self.meal_type.is_some_and(|m| m != idea.meal_type) {
            return false;
        }
        if self.protein_type.is_some_and(|p| p != idea.protein_type) {
            return false;
        }
        if self.used.is_some_and(|u| u != idea.is_used) {
            return false;
        }
        self.tags.is_empty()
            || self.tags.iter().any(|tag| {
                idea.vibes
                    .iter()
                    .any(|vibe| vibe.trim().eq_ignore_ascii_case(tag.trim()))
            })
    }
}

/// Ideas matching `filter`, in stored order.
pub fn filter_ideas<'a>(ideas: &'a [RecipeIdea], filter: &IdeaFilter) -> Vec<&'a RecipeIdea> {
    ideas.iter().filter(|idea| filter.matches(idea)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> IdeaContext {
        IdeaContext {
            meal_type: MealType::Lunch,
            vibes: vec!["cozy".into()],
            ingredients: vec!["rice".into()],
            servings: 4,
        }
    }

    #[test]
    fn fenced_single_idea_uses_defaults() {
        let response = "```json\n[{\"title\":\"Soup\",\"description\":\"Quick soup\"}]\n```";
        let ideas = parse_ideas(response, &IdeaContext::default());
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].title, "Soup");
        assert_eq!(ideas[0].protein_type, ProteinType::None);
        assert_eq!(ideas[0].meal_type, MealType::Dinner);
        assert!(!ideas[0].is_used);
    }

    #[test]
    fn non_json_text_yields_nothing() {
        assert!(parse_ideas("Sorry, I cannot help with that.", &context()).is_empty());
        assert!(parse_ideas("", &context()).is_empty());
    }

    #[test]
    fn non_array_root_yields_nothing() {
        assert!(parse_ideas("{\"title\":\"Soup\"}", &context()).is_empty());
    }

    #[test]
    fn broken_array_yields_nothing() {
        assert!(parse_ideas("[{\"title\": \"Soup\",]", &context()).is_empty());
        assert!(parse_ideas("[{\"title\": \"Soup\"", &context()).is_empty());
    }

    #[test]
    fn prose_around_the_array_is_ignored() {
        let response = "Here you go:\n[{\"title\":\"Tacos [spicy]\",\"description\":\"With \\\"salsa\\\"\"}]\nEnjoy! [1]";
        let ideas = parse_ideas(response, &context());
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].title, "Tacos [spicy]");
        assert_eq!(ideas[0].description, "With \"salsa\"");
    }

    #[test]
    fn element_fields_override_and_context_merges() {
        let response = r#"[
            {"title":"Omelette","description":"Fluffy","mealType":"Breakfast","proteinType":"eggs"},
            {"title":"Stew","description":"Slow","mealType":"brunch","proteinType":"unicorn"}
        ]"#;
        let ideas = parse_ideas(response, &context());
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[0].meal_type, MealType::Breakfast);
        assert_eq!(ideas[0].protein_type, ProteinType::Eggs);
        assert_eq!(ideas[1].meal_type, MealType::Lunch);
        assert_eq!(ideas[1].protein_type, ProteinType::None);
        assert_eq!(ideas[1].servings, 4);
        assert_eq!(ideas[1].vibes, vec!["cozy"]);
        assert_eq!(ideas[1].ingredients, vec!["rice"]);
        assert_ne!(ideas[0].id, ideas[1].id);
    }

    #[test]
    fn invalid_elements_are_skipped() {
        let response = r#"[
            {"title":"","description":"empty title"},
            {"title":"No description"},
            {"title":42,"description":"numeric title"},
            "just a string",
            {"title":"Salad","description":"Crunchy"}
        ]"#;
        let ideas = parse_ideas(response, &context());
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].title, "Salad");
    }

    fn idea(title: &str, meal: MealType, protein: ProteinType, used: bool, vibes: &[&str]) -> RecipeIdea {
        RecipeIdea {
            id: title.to_string(),
            title: title.to_string(),
            description: String::new(),
            meal_type: meal,
            protein_type: protein,
            ingredients: vec![],
            vibes: vibes.iter().map(|v| v.to_string()).collect(),
            servings: 2,
            created_at: Utc::now(),
            is_used: used,
            linked_recipe_id: None,
        }
    }

    #[test]
    fn filter_combines_criteria() {
        let ideas = vec![
            idea("a", MealType::Dinner, ProteinType::Fish, false, &["Quick"]),
            idea("b", MealType::Dinner, ProteinType::Beef, false, &["hearty"]),
            idea("c", MealType::Lunch, ProteinType::Fish, true, &["quick"]),
        ];

        let all = filter_ideas(&ideas, &IdeaFilter::default());
        assert_eq!(all.len(), 3);

        let dinner_fish = IdeaFilter {
            meal_type: Some(MealType::Dinner),
            protein_type: Some(ProteinType::Fish),
            ..Default::default()
        };
        let ids: Vec<_> = filter_ideas(&ideas, &dinner_fish).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);

        let quick_unused = IdeaFilter {
            used: Some(false),
            tags: vec!["QUICK".into(), "vegan".into()],
            ..Default::default()
        };
        let ids: Vec<_> = filter_ideas(&ideas, &quick_unused).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }
}
