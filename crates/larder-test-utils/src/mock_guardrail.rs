// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Guardrail with a fixed verdict.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use larder_core::LarderError;
use larder_core::traits::{Guardrail, PluginAdapter};
use larder_core::types::{
    AdapterType, HealthStatus, Locale, UserProfile, ValidationResult,
};

pub const MOCK_SYSTEM_PROMPT: &str = "mock recipe system prompt";
pub const MOCK_IDEAS_PROMPT: &str = "mock ideas system prompt";

/// Accepts every input unchanged, or rejects every input with one reason.
pub struct MockGuardrail {
    rejection: Option<String>,
    seen: Mutex<Vec<String>>,
}

impl MockGuardrail {
    pub fn accepting() -> Self {
        Self {
            rejection: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            rejection: Some(reason.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Inputs passed to `validate_input`, oldest first.
    pub fn seen(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PluginAdapter for MockGuardrail {
    fn name(&self) -> &str {
        "mock-guardrail"
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

impl Guardrail for MockGuardrail {
    fn validate_input(&self, text: &str) -> ValidationResult {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
        match &self.rejection {
            Some(reason) => ValidationResult::reject(reason.clone()),
            None => ValidationResult::accept(text),
        }
    }

    fn system_prompt(&self, _profile: &UserProfile, _locale: Locale) -> String {
        MOCK_SYSTEM_PROMPT.to_string()
    }

    fn ideas_system_prompt(&self, _profile: &UserProfile, _locale: Locale) -> String {
        MOCK_IDEAS_PROMPT.to_string()
    }
}
