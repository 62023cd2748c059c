// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation requests as captured at call time.
//!
//! A request is stored verbatim as the last request so that retries reissue
//! exactly what the user asked for.

use larder_recipes::IdeaContext;

/// What kind of output a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Flavor {
    /// A single free-form recipe, streamed incrementally.
    Recipe,
    /// A batch of recipe ideas as a JSON array, buffered until complete.
    Ideas,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub flavor: Flavor,
    /// Provider registry id.
    pub provider: String,
    /// Model override; the provider's default when unset.
    pub model: Option<String>,
    /// User prompt as typed, before sanitizing.
    pub prompt: String,
    /// Defaults merged into parsed ideas.
    pub idea_context: IdeaContext,
    /// Idea this recipe is generated from; marked used on success.
    pub from_idea: Option<String>,
}

impl GenerationRequest {
    pub fn recipe(provider: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            flavor: Flavor::Recipe,
            provider: provider.into(),
            model: None,
            prompt: prompt.into(),
            idea_context: IdeaContext::default(),
            from_idea: None,
        }
    }

    pub fn ideas(
        provider: impl Into<String>,
        prompt: impl Into<String>,
        context: IdeaContext,
    ) -> Self {
        Self {
            flavor: Flavor::Ideas,
            provider: provider.into(),
            model: None,
            prompt: prompt.into(),
            idea_context: context,
            from_idea: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Links the generated recipe back to the idea it expands.
    pub fn from_idea(mut self, idea_id: impl Into<String>) -> Self {
        self.from_idea = Some(idea_id.into());
        self
    }
}
