// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps every [`LarderError`] onto a user-facing [`ApiError`].

use std::sync::LazyLock;
use std::time::Duration;

use larder_core::error::LarderError;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::api_error::{ApiError, ErrorCode, PrimaryAction};

/// Settings page shown when the selected provider does not exist.
pub const PROVIDER_SETTINGS_PATH: &str = "/settings/providers";

/// Longest delay accepted from a provider hint.
pub const MAX_RETRY_HINT: Duration = Duration::from_secs(60 * 60);

static TRY_AGAIN_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)try again in\s+(\d+(?:\.\d+)?)\s*(ms|milliseconds?|s|secs?|seconds?)?\b").unwrap()
});

/// Delays used for automatic retries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Fixed delay after a transport failure.
    pub network_delay: Duration,
    /// Delay after a 429 without a usable hint.
    pub rate_limit_default: Duration,
    /// First 5xx backoff step, doubled per attempt.
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    /// Ceiling for a provider-supplied 429 delay.
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            network_delay: Duration::from_secs(5),
            rate_limit_default: Duration::from_secs(20),
            backoff_base: Duration::from_secs(2),
            backoff_max: Duration::from_secs(30),
            max_retry_after: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// `base * 2^attempt`, capped at `backoff_max`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.backoff_base
            .checked_mul(factor)
            .unwrap_or(self.backoff_max)
            .min(self.backoff_max)
    }
}

/// Facts about the failing request the error itself may not carry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyContext<'a> {
    pub provider: Option<&'a str>,
    /// Consecutive automatic retries already made for this request.
    pub attempt: u32,
}

/// Classifies failures into user-facing errors.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    policy: RetryPolicy,
    free_tier: Vec<String>,
}

impl ErrorClassifier {
    /// `free_tier` lists provider ids, in preference order, that can be
    /// suggested as alternatives.
    pub fn new(policy: RetryPolicy, free_tier: Vec<String>) -> Self {
        Self { policy, free_tier }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Free-tier providers other than `failing`.
    pub fn alternatives(&self, failing: Option<&str>) -> Vec<String> {
        self.free_tier
            .iter()
            .filter(|id| Some(id.as_str()) != failing)
            .cloned()
            .collect()
    }

    pub fn classify(&self, error: &LarderError, context: &ClassifyContext<'_>) -> ApiError {
        let failing = context.provider.or(match error {
            LarderError::ProviderStatus { provider, .. } => Some(provider.as_str()),
            LarderError::MissingCredential { provider } => Some(provider.as_str()),
            _ => None,
        });
        let alternatives = self.alternatives(failing);
        let switch = alternatives
            .first()
            .map(|id| PrimaryAction::SwitchProvider(id.clone()));

        let classified = match error {
            LarderError::Transport { .. } => {
                ApiError::new(ErrorCode::NetworkError).with_retry(self.policy.network_delay)
            }
            LarderError::ProviderStatus { status: 401 | 403, .. }
            | LarderError::MissingCredential { .. } => {
                ApiError::new(ErrorCode::InvalidApiKey).with_action(PrimaryAction::ShowApiKeyForm)
            }
            LarderError::ProviderStatus {
                status: 429,
                body,
                retry_after,
                ..
            } => {
                let delay = retry_after_hint(*retry_after, body.as_deref())
                    .map(|hint| hint.min(self.policy.max_retry_after))
                    .unwrap_or(self.policy.rate_limit_default);
                let error = ApiError::new(ErrorCode::RateLimited).with_retry(delay);
                match switch {
                    Some(action) => error.with_action(action),
                    None => error,
                }
            }
            LarderError::ProviderStatus { status: 500..=599, .. } => {
                let error = ApiError::new(ErrorCode::ProviderError)
                    .with_retry(self.policy.backoff(context.attempt));
                match switch {
                    Some(action) => error.with_action(action),
                    None => error,
                }
            }
            LarderError::AdapterNotFound { .. } => ApiError::new(ErrorCode::ProviderNotFound)
                .with_action(PrimaryAction::Navigate(PROVIDER_SETTINGS_PATH.to_string())),
            LarderError::PromptRejected { .. } => ApiError::new(ErrorCode::PromptInjection),
            _ => ApiError::new(ErrorCode::UnknownError),
        };

        debug!(code = %classified.code, error = %error, "classified failure");
        classified.with_alternatives(alternatives)
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), Vec::new())
    }
}

/// Extracts a retry delay from a `Retry-After` value or a 429 body.
///
/// The body may carry a numeric `retry_after`/`retryAfter` field (top level
/// or under `error`), or a phrase like "Please try again in 7.5s". Hints are
/// capped at [`MAX_RETRY_HINT`].
pub fn retry_after_hint(retry_after: Option<Duration>, body: Option<&str>) -> Option<Duration> {
    raw_hint(retry_after, body).map(|delay| delay.min(MAX_RETRY_HINT))
}

fn raw_hint(retry_after: Option<Duration>, body: Option<&str>) -> Option<Duration> {
    if let Some(delay) = retry_after.filter(|d| !d.is_zero()) {
        return Some(delay);
    }
    let body = body?;

    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let field = [&json, &json["error"]].into_iter().find_map(|obj| {
            ["retry_after", "retryAfter"]
                .iter()
                .find_map(|key| seconds_value(&obj[*key]))
        });
        if field.is_some() {
            return field;
        }
    }

    let caps = TRY_AGAIN_IN.captures(body)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let millis = caps
        .get(2)
        .is_some_and(|unit| unit.as_str().to_lowercase().starts_with('m'));
    let seconds = if millis { value / 1000.0 } else { value };
    positive_duration(seconds)
}

fn seconds_value(value: &Value) -> Option<Duration> {
    let seconds = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('s').parse().ok()?,
        _ => return None,
    };
    positive_duration(seconds)
}

fn positive_duration(seconds: f64) -> Option<Duration> {
    if seconds > 0.0 {
        Duration::try_from_secs_f64(seconds).ok()
    } else {
        None
    }
}
