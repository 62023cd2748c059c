// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE parsing for chat-completions streams.
//!
//! Each `data:` line carries a JSON [`ChatChunk`]; the literal `[DONE]` ends
//! the stream.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use larder_core::LarderError;

use crate::types::ChatChunk;

/// Sentinel payload closing an OpenAI-style stream.
const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Clone)]
pub enum StreamEvent {
    Chunk(ChatChunk),
    Done,
}

/// Parses a reqwest streaming response into [`StreamEvent`]s.
pub fn parse_sse_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LarderError>> + Send>> {
    let mapped = response
        .bytes_stream()
        .eventsource()
        .filter_map(|result| async move {
            match result {
                Ok(event) => {
                    let data = event.data.trim();
                    if data.is_empty() {
                        return None;
                    }
                    if data == DONE_MARKER {
                        return Some(Ok(StreamEvent::Done));
                    }
                    Some(
                        serde_json::from_str::<ChatChunk>(data)
                            .map(StreamEvent::Chunk)
                            .map_err(|e| LarderError::Provider {
                                message: format!("failed to parse stream chunk: {e}"),
                                source: Some(Box::new(e)),
                            }),
                    )
                }
                Err(e) => Some(Err(LarderError::Transport {
                    message: format!("SSE stream error: {e}"),
                    source: None,
                })),
            }
        });

    Box::pin(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn mock_sse_response(sse_text: &str) -> reqwest::Response {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_text.to_string()),
            )
            .mount(&server)
            .await;

        reqwest::get(&server.uri()).await.unwrap()
    }

    #[tokio::test]
    async fn chunks_then_done() {
        let sse = "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n\
                   : keep-alive comment\n\n\
                   data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n\
                   data: [DONE]\n\n";
        let events: Vec<_> = parse_sse_stream(mock_sse_response(sse).await)
            .map(|e| e.unwrap())
            .collect()
            .await;

        assert_eq!(events.len(), 3);
        match &events[0] {
            StreamEvent::Chunk(chunk) => assert_eq!(chunk.text(), "Hel"),
            other => panic!("expected chunk, got {other:?}"),
        }
        assert!(matches!(events[2], StreamEvent::Done));
    }

    #[tokio::test]
    async fn malformed_payload_is_provider_error() {
        let sse = "data: {not json\n\n";
        let mut stream = parse_sse_stream(mock_sse_response(sse).await);
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, LarderError::Provider { .. }));
    }
}
