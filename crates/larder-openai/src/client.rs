// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for chat-completions endpoints.
//!
//! One client serves every OpenAI-compatible service; only the base URL and
//! the provider id used in error reports differ.

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use larder_core::LarderError;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use tracing::debug;

use crate::sse::{self, StreamEvent};
use crate::types::{ApiErrorResponse, ChatRequest};

/// HTTP client for one OpenAI-compatible service.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    completions_url: String,
    provider_id: String,
}

impl OpenAiClient {
    /// Creates a client for `base_url`, which already includes the version
    /// path (e.g. `https://api.openai.com/v1`).
    pub fn new(base_url: &str, provider_id: &str) -> Result<Self, LarderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LarderError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            completions_url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            provider_id: provider_id.to_string(),
        })
    }

    /// Sends a streaming request and returns a stream of SSE events.
    pub async fn stream_chat(
        &self,
        request: &ChatRequest,
        api_key: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent, LarderError>> + Send>>, LarderError>
    {
        let mut req = request.clone();
        req.stream = true;

        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|e| LarderError::Config(format!("invalid API key header value: {e}")))?;

        let response = self
            .client
            .post(&self.completions_url)
            .header(reqwest::header::AUTHORIZATION, bearer)
            .json(&req)
            .send()
            .await
            .map_err(|e| LarderError::Transport {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(provider = %self.provider_id, status = %status, "streaming response received");

        if status.is_success() {
            return Ok(sse::parse_sse_stream(response));
        }

        let retry_after = retry_after_header(response.headers());
        let body = response.text().await.unwrap_or_default();
        if let Some(message) = error_message(&body) {
            debug!(provider = %self.provider_id, "API error: {message}");
        }
        Err(LarderError::ProviderStatus {
            provider: self.provider_id.clone(),
            status: status.as_u16(),
            body: (!body.is_empty()).then_some(body),
            retry_after,
        })
    }
}

/// Extracts the error message from either envelope shape.
fn error_message(body: &str) -> Option<String> {
    if let Ok(response) = serde_json::from_str::<ApiErrorResponse>(body) {
        return Some(response.error.message);
    }
    serde_json::from_str::<Vec<ApiErrorResponse>>(body)
        .ok()?
        .into_iter()
        .next()
        .map(|response| response.error.message)
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
    use crate::types::ChatMessage;
    use futures::StreamExt;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_request() -> ChatRequest {
        ChatRequest {
            model: "llama-3.3-70b-versatile".into(),
            messages: vec![ChatMessage::new("user", "Hello")],
            stream: false,
            temperature: None,
        }
    }

    #[tokio::test]
    async fn posts_to_completions_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(header("authorization", "Bearer gsk-test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string("data: [DONE]\n\n"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let base = format!("{}/openai/v1/", server.uri());
        let client = OpenAiClient::new(&base, "groq").unwrap();
        let mut stream = client.stream_chat(&test_request(), " gsk-test ").await.unwrap();
        assert!(matches!(stream.next().await.unwrap().unwrap(), StreamEvent::Done));
    }

    #[tokio::test]
    async fn status_error_names_the_configured_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "7")
                    .set_body_json(serde_json::json!({
                        "error": {"message": "Rate limit reached", "type": "tokens"}
                    })),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&server.uri(), "groq").unwrap();
        let err = client.stream_chat(&test_request(), "k").await.err().unwrap();
        match err {
            LarderError::ProviderStatus {
                provider,
                status,
                body,
                retry_after,
            } => {
                assert_eq!(provider, "groq");
                assert_eq!(status, 429);
                assert!(body.unwrap().contains("Rate limit reached"));
                assert_eq!(retry_after, Some(Duration::from_secs(7)));
            }
            other => panic!("expected ProviderStatus, got {other}"),
        }
    }

    #[test]
    fn error_message_reads_both_envelopes() {
        assert_eq!(
            error_message(r#"{"error":{"message":"bad key"}}"#).as_deref(),
            Some("bad key")
        );
        assert_eq!(
            error_message(r#"[{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}]"#)
                .as_deref(),
            Some("API key not valid")
        );
        assert_eq!(error_message("<html>502</html>"), None);
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let client = OpenAiClient::new("http://127.0.0.1:9/v1", "openai").unwrap();
        let err = client.stream_chat(&test_request(), "k").await.err().unwrap();
        assert!(matches!(err, LarderError::Transport { .. }), "got {err}");
    }
}
