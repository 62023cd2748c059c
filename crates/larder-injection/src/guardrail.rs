// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The default [`Guardrail`] implementation.

use async_trait::async_trait;
use larder_core::error::LarderError;
use larder_core::traits::{Guardrail, PluginAdapter};
use larder_core::types::{AdapterType, HealthStatus, Locale, UserProfile, ValidationResult};
use tracing::{debug, warn};

use crate::patterns::detect;
use crate::prompts::{ideas_system_prompt, recipe_system_prompt};
use crate::sanitize::{DEFAULT_MAX_INPUT_CHARS, sanitize};

/// Reason reported for input that is empty after sanitizing.
pub const EMPTY_INPUT: &str = "empty_input";

/// Regex-based guardrail with localized system prompts.
#[derive(Debug, Clone)]
pub struct PatternGuardrail {
    max_input_chars: usize,
}

impl PatternGuardrail {
    pub fn new(max_input_chars: usize) -> Self {
        Self { max_input_chars }
    }

    pub fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }
}

impl Default for PatternGuardrail {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INPUT_CHARS)
    }
}

#[async_trait]
impl PluginAdapter for PatternGuardrail {
    fn name(&self) -> &str {
        "pattern-guardrail"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Guardrail
    }

    async fn health_check(&self) -> Result<HealthStatus, LarderError> {
        Ok(HealthStatus::Healthy)
    }
}

impl Guardrail for PatternGuardrail {
    fn validate_input(&self, text: &str) -> ValidationResult {
        let sanitized = sanitize(text, self.max_input_chars);
        if sanitized.is_empty() {
            debug!("rejecting empty prompt");
            return ValidationResult::reject(EMPTY_INPUT);
        }
        if let Some(category) = detect(&sanitized) {
            warn!(category, "prompt rejected by guardrail");
            return ValidationResult::reject(category);
        }
        ValidationResult::accept(sanitized)
    }

    fn system_prompt(&self, profile: &UserProfile, locale: Locale) -> String {
        recipe_system_prompt(profile, locale)
    }

    fn ideas_system_prompt(&self, profile: &UserProfile, locale: Locale) -> String {
        ideas_system_prompt(profile, locale)
    }
}
