// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with scripted replies,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use larder_core::LarderError;
use larder_core::traits::{ChunkStream, PluginAdapter, ProviderAdapter};
use larder_core::types::{
    AdapterType, GenerateOptions, HealthStatus, ProviderConfig, StreamChunk,
};

/// A failure the mock can produce, either on connect or mid-stream.
#[derive(Debug, Clone, PartialEq)]
pub enum MockFailure {
    /// The request never reached a server.
    Transport,
    /// The server answered with a non-success status.
    Status {
        status: u16,
        retry_after: Option<Duration>,
        body: Option<String>,
    },
}

impl MockFailure {
    pub fn status(status: u16) -> Self {
        Self::Status {
            status,
            retry_after: None,
            body: None,
        }
    }

    fn to_error(&self, provider: &str) -> LarderError {
        match self {
            Self::Transport => LarderError::Transport {
                message: "connection refused".to_string(),
                source: None,
            },
            Self::Status {
                status,
                retry_after,
                body,
            } => LarderError::ProviderStatus {
                provider: provider.to_string(),
                status: *status,
                body: body.clone(),
                retry_after: *retry_after,
            },
        }
    }
}

/// One scripted reply.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Streams the chunks, then a done marker.
    Text(Vec<String>),
    /// Streams the chunks and ends without a done marker.
    Unterminated(Vec<String>),
    /// Fails before any chunk is produced.
    Fail(MockFailure),
    /// Streams the chunks, then fails.
    BreakAfter(Vec<String>, MockFailure),
    /// Streams the chunks, then never yields again.
    Hang(Vec<String>),
}

impl MockReply {
    /// The whole text as a single chunk.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(vec![text.into()])
    }

    /// Text split into chunks of at most `size` characters.
    pub fn chunked(text: &str, size: usize) -> Self {
        let chars: Vec<char> = text.chars().collect();
        Self::Text(
            chars
                .chunks(size.max(1))
                .map(|chunk| chunk.iter().collect())
                .collect(),
        )
    }
}

/// Arguments of one `generate_recipe` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub system_prompt: String,
    pub user_prompt: String,
    pub credential: String,
    pub model: String,
}

/// A mock provider that returns scripted replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty, a default
/// "mock response" text is returned.
pub struct MockProvider {
    config: ProviderConfig,
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    call_count: AtomicUsize,
    chunk_delay: Option<Duration>,
}

impl MockProvider {
    /// Create a mock registered under `id` with an empty reply queue.
    pub fn new(id: &str) -> Self {
        Self::with_replies(id, Vec::new())
    }

    /// Create a mock pre-loaded with the given replies.
    pub fn with_replies(id: &str, replies: Vec<MockReply>) -> Self {
        Self {
            config: ProviderConfig {
                id: id.to_string(),
                name: format!("Mock {id}"),
                default_model: "mock-model".to_string(),
            },
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            calls: Arc::new(Mutex::new(Vec::new())),
            call_count: AtomicUsize::new(0),
            chunk_delay: None,
        }
    }

    /// Sleep this long before yielding each chunk.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    /// Add a reply to the end of the queue.
    pub async fn push_reply(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Number of `generate_recipe` calls so far.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Arguments of every call so far, oldest first.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    async fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::text("mock response"))
    }

    fn chunk_stream(
        &self,
        chunks: Vec<String>,
        tail: Vec<Result<StreamChunk, LarderError>>,
    ) -> futures::stream::BoxStream<'static, Result<StreamChunk, LarderError>> {
        let items = chunks
            .into_iter()
            .map(|text| Ok(StreamChunk::text(text)))
            .chain(tail);
        match self.chunk_delay {
            Some(delay) => stream::iter(items)
                .then(move |item| async move {
                    tokio::time::sleep(delay).await;
                    item
                })
                .boxed(),
            None => stream::iter(items).boxed(),
        }
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, LarderError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn generate_recipe(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        credential: &str,
        options: GenerateOptions,
    ) -> Result<ChunkStream, LarderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().await.push(RecordedCall {
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
            credential: credential.to_string(),
            model: options
                .model
                .unwrap_or_else(|| self.config.default_model.clone()),
        });

        let id = self.config.id.as_str();
        let stream = match self.next_reply().await {
            MockReply::Text(chunks) => self.chunk_stream(chunks, vec![Ok(StreamChunk::done())]),
            MockReply::Unterminated(chunks) => self.chunk_stream(chunks, Vec::new()),
            MockReply::Fail(failure) => return Err(failure.to_error(id)),
            MockReply::BreakAfter(chunks, failure) => {
                self.chunk_stream(chunks, vec![Err(failure.to_error(id))])
            }
            MockReply::Hang(chunks) => self
                .chunk_stream(chunks, Vec::new())
                .chain(stream::pending())
                .boxed(),
        };
        Ok(Box::pin(stream))
    }
}
