// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API request types and SSE event types.

use serde::{Deserialize, Serialize};

// --- Request types ---

/// A request to the Anthropic Messages API.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    /// Model identifier (e.g., "claude-3-5-haiku-latest").
    pub model: String,

    /// Conversation messages.
    pub messages: Vec<ApiMessage>,

    /// System prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Whether to stream the response.
    pub stream: bool,
}

/// A single message in the Anthropic conversation format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Role: "user" or "assistant".
    pub role: String,
    pub content: String,
}

// --- SSE event types ---

/// SSE event: content_block_delta
#[derive(Debug, Clone, Deserialize)]
pub struct SseContentBlockDelta {
    /// Index of the content block being updated.
    pub index: usize,
    pub delta: SseDelta,
}

/// A delta update within a content block.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum SseDelta {
    /// Text delta: appends text to the current block.
    #[serde(rename = "text_delta")]
    TextDelta { text: String },
    /// Deltas we do not render (tool input, thinking, signatures).
    #[serde(other)]
    Other,
}

/// SSE event: message_delta
#[derive(Debug, Clone, Deserialize)]
pub struct SseMessageDelta {
    pub delta: SseMessageDeltaInfo,
}

/// Delta information for a message_delta event.
#[derive(Debug, Clone, Deserialize)]
pub struct SseMessageDeltaInfo {
    /// Reason the generation stopped.
    pub stop_reason: Option<String>,
}

/// SSE event: error
#[derive(Debug, Clone, Deserialize)]
pub struct SseError {
    pub error: ApiErrorDetail,
}

/// API error response (non-streaming).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Error detail within an API error response or SSE error event.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    /// Error type identifier.
    #[serde(rename = "type")]
    pub type_: String,
    /// Human-readable error message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_message_request_with_system() {
        let req = MessageRequest {
            model: "claude-3-5-haiku-latest".into(),
            messages: vec![ApiMessage {
                role: "user".into(),
                content: "Pasta please".into(),
            }],
            system: Some("You are Larder.".into()),
            max_tokens: 2048,
            stream: true,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "claude-3-5-haiku-latest");
        assert_eq!(json["stream"], true);
        assert_eq!(json["max_tokens"], 2048);
        assert_eq!(json["system"], "You are Larder.");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Pasta please");
    }

    #[test]
    fn serialize_message_request_without_system() {
        let req = MessageRequest {
            model: "m".into(),
            messages: vec![],
            system: None,
            max_tokens: 1024,
            stream: true,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("system").is_none());
    }

    #[test]
    fn unknown_delta_types_deserialize_as_other() {
        let json = r#"{"index":0,"delta":{"type":"input_json_delta","partial_json":"{"}}"#;
        let delta: SseContentBlockDelta = serde_json::from_str(json).unwrap();
        assert!(matches!(delta.delta, SseDelta::Other));
    }

    #[test]
    fn deserialize_error_response() {
        let json = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        let err: ApiErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(err.error.type_, "authentication_error");
    }
}
