// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Guardrail trait: input validation and system-prompt construction.

use crate::traits::adapter::PluginAdapter;
use crate::types::{Locale, UserProfile, ValidationResult};

/// Validates user input before it reaches a provider and builds the system
/// prompts that frame every request.
pub trait Guardrail: PluginAdapter {
    /// Sanitizes the input, or rejects it as unsafe.
    fn validate_input(&self, text: &str) -> ValidationResult;

    /// System prompt for free-form recipe generation.
    fn system_prompt(&self, profile: &UserProfile, locale: Locale) -> String;

    /// System prompt for recipe-ideas generation.
    fn ideas_system_prompt(&self, profile: &UserProfile, locale: Locale) -> String;
}
