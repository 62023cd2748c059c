// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Larder.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Larder adapter traits and core operations.
#[derive(Debug, Error)]
pub enum LarderError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The request never reached a provider, or the connection broke mid-stream.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A provider answered with a non-success HTTP status.
    #[error("{provider} returned HTTP {status}")]
    ProviderStatus {
        provider: String,
        status: u16,
        body: Option<String>,
        retry_after: Option<Duration>,
    },

    /// A provider answered, but the payload could not be understood.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Requested adapter was not found in the registry.
    #[error("adapter not found: {adapter_type}/{name}")]
    AdapterNotFound { adapter_type: String, name: String },

    /// The guardrail refused the user's input.
    #[error("input rejected: {reason}")]
    PromptRejected { reason: String },

    /// No API key is configured for the selected provider.
    #[error("no credential configured for provider {provider}")]
    MissingCredential { provider: String },

    /// Structured output could not be extracted from generated text.
    #[error("parse error: {0}")]
    Parse(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LarderError {
    /// Returns the HTTP status for provider status errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ProviderStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
