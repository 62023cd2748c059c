// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! The API key is supplied per request since credentials live in the user's
//! store and may change between calls. Failures are reported as typed
//! errors; retrying is left to the caller.

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use larder_core::LarderError;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use tracing::debug;

use crate::sse::{self, StreamEvent};
use crate::types::{ApiErrorResponse, MessageRequest};

/// Default API origin.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// API version header value.
pub const API_VERSION: &str = "2023-06-01";

const PROVIDER_ID: &str = "anthropic";

/// HTTP client for Anthropic API communication.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    messages_url: String,
}

impl AnthropicClient {
    /// Creates a client for the API at `base_url` (scheme and host, no path).
    pub fn new(base_url: &str) -> Result<Self, LarderError> {
        let mut headers = HeaderMap::new();
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LarderError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            messages_url: format!("{}/v1/messages", base_url.trim_end_matches('/')),
        })
    }

    /// Sends a streaming request and returns a stream of SSE events.
    pub async fn stream_message(
        &self,
        request: &MessageRequest,
        api_key: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent, LarderError>> + Send>>, LarderError>
    {
        let mut req = request.clone();
        req.stream = true;

        let api_key = HeaderValue::from_str(api_key.trim())
            .map_err(|e| LarderError::Config(format!("invalid API key header value: {e}")))?;

        let response = self
            .client
            .post(&self.messages_url)
            .header("x-api-key", api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| LarderError::Transport {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "streaming response received");

        if status.is_success() {
            return Ok(sse::parse_sse_stream(response));
        }

        let retry_after = retry_after_header(response.headers());
        let body = response.text().await.unwrap_or_default();
        if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
            debug!(kind = %api_err.error.type_, "Anthropic API error: {}", api_err.error.message);
        }
        Err(LarderError::ProviderStatus {
            provider: PROVIDER_ID.to_string(),
            status: status.as_u16(),
            body: (!body.is_empty()).then_some(body),
            retry_after,
        })
    }
}

/// Whole-second `Retry-After` values. HTTP-date values are ignored.
fn retry_after_header(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiMessage;
    use futures::StreamExt;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_request() -> MessageRequest {
        MessageRequest {
            model: "claude-3-5-haiku-latest".into(),
            messages: vec![ApiMessage {
                role: "user".into(),
                content: "Hello".into(),
            }],
            system: None,
            max_tokens: 1024,
            stream: false,
        }
    }

    #[tokio::test]
    async fn sends_key_per_request_and_streams() {
        let server = MockServer::start().await;
        let sse = "event: message_stop\ndata: {}\n\n";

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-api-key"))
            .and(header("anthropic-version", API_VERSION))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = AnthropicClient::new(&server.uri()).unwrap();
        let mut stream = client.stream_message(&test_request(), "test-api-key").await.unwrap();
        assert!(matches!(stream.next().await.unwrap().unwrap(), StreamEvent::MessageStop));
    }

    #[tokio::test]
    async fn rate_limit_reports_status_body_and_retry_after() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "12")
                    .set_body_json(serde_json::json!({
                        "type": "error",
                        "error": {"type": "rate_limit_error", "message": "Rate limited"}
                    })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = AnthropicClient::new(&server.uri()).unwrap();
        let err = client.stream_message(&test_request(), "k").await.err().unwrap();
        match err {
            LarderError::ProviderStatus {
                provider,
                status,
                body,
                retry_after,
            } => {
                assert_eq!(provider, "anthropic");
                assert_eq!(status, 429);
                assert!(body.unwrap().contains("rate_limit_error"));
                assert_eq!(retry_after, Some(Duration::from_secs(12)));
            }
            other => panic!("expected ProviderStatus, got {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Nothing listens on port 9 (discard) on loopback.
        let client = AnthropicClient::new("http://127.0.0.1:9").unwrap();
        let err = client.stream_message(&test_request(), "k").await.err().unwrap();
        assert!(matches!(err, LarderError::Transport { .. }), "got {err}");
    }

    #[tokio::test]
    async fn invalid_key_characters_are_rejected_locally() {
        let client = AnthropicClient::new("http://127.0.0.1:9").unwrap();
        let err = client.stream_message(&test_request(), "bad\nkey").await.err().unwrap();
        assert!(matches!(err, LarderError::Config(_)), "got {err}");
    }
}
