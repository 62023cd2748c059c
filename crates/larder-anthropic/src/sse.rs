// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for Anthropic Messages API streaming responses.
//!
//! Converts a reqwest response byte stream into typed [`StreamEvent`] variants
//! using the `eventsource-stream` crate for SSE protocol compliance.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use larder_core::LarderError;

use crate::types::{SseContentBlockDelta, SseError, SseMessageDelta};

/// Typed SSE events from the Anthropic streaming protocol.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Incremental update to a content block.
    ContentBlockDelta(SseContentBlockDelta),
    /// Message-level delta (stop_reason).
    MessageDelta(SseMessageDelta),
    /// The message is complete.
    MessageStop,
    /// Keep-alive ping.
    Ping,
    /// API error during streaming.
    Error(SseError),
}

fn parse_event<T: serde::de::DeserializeOwned>(
    name: &str,
    data: &str,
) -> Result<T, LarderError> {
    serde_json::from_str::<T>(data).map_err(|e| LarderError::Provider {
        message: format!("failed to parse {name}: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parses a reqwest streaming response into a stream of typed [`StreamEvent`]s.
///
/// Events we do not consume (message_start, content_block_start/stop, and
/// anything newer) are skipped per Anthropic's API versioning policy. A
/// broken connection surfaces as a transport error.
pub fn parse_sse_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LarderError>> + Send>> {
    let byte_stream = response.bytes_stream();
    let event_stream = byte_stream.eventsource();

    let mapped = event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => {
                let parsed = match event.event.as_str() {
                    "content_block_delta" => parse_event(&event.event, &event.data)
                        .map(StreamEvent::ContentBlockDelta),
                    "message_delta" => {
                        parse_event(&event.event, &event.data).map(StreamEvent::MessageDelta)
                    }
                    "message_stop" => Ok(StreamEvent::MessageStop),
                    "ping" => Ok(StreamEvent::Ping),
                    "error" => parse_event(&event.event, &event.data).map(StreamEvent::Error),
                    _ => return None,
                };
                Some(parsed)
            }
            Err(e) => Some(Err(LarderError::Transport {
                message: format!("SSE stream error: {e}"),
                source: None,
            })),
        }
    });

    Box::pin(mapped)
}
