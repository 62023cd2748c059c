// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observable state of the generation pipeline.

use std::time::Duration;

use larder_resilience::ApiError;
use serde::Serialize;

/// Where the current attempt is in its lifecycle.
///
/// Within one attempt the status only moves forward:
/// Idle -> Validating -> Connecting -> Streaming -> Completed, with Error
/// reachable from any in-flight state and cancellation returning to Idle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RequestStatus {
    #[default]
    Idle,
    Validating,
    Connecting,
    Streaming {
        /// Chunks observed so far.
        tokens: usize,
        /// Characters received so far.
        chars: usize,
        /// Accumulated text. Stays empty for ideas requests.
        content: String,
    },
    Completed {
        duration: Duration,
        content: String,
    },
    Error {
        error: ApiError,
    },
}

impl RequestStatus {
    /// True while an attempt is running.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::Validating | Self::Connecting | Self::Streaming { .. }
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Error { .. })
    }

    /// The classified error, if this is the Error state.
    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }

    /// Short state name for logs and progress lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Connecting => "connecting",
            Self::Streaming { .. } => "streaming",
            Self::Completed { .. } => "completed",
            Self::Error { .. } => "error",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
