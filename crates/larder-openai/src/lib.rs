// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible provider adapter for Larder.
//!
//! OpenAI, Groq, OpenRouter, Gemini and Mistral all expose the same
//! chat-completions streaming protocol, so a single adapter type serves them;
//! each registered instance carries its own [`ProviderConfig`] and base URL.

pub mod client;
pub mod sse;
pub mod types;

use async_trait::async_trait;
use futures::stream::StreamExt;
use larder_core::error::LarderError;
use larder_core::traits::{ChunkStream, PluginAdapter, ProviderAdapter};
use larder_core::types::{AdapterType, GenerateOptions, HealthStatus, ProviderConfig, StreamChunk};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::sse::StreamEvent;
use crate::types::{ChatMessage, ChatRequest};

/// Sampling temperature for recipe generation.
const TEMPERATURE: f32 = 0.7;

/// Chat-completions provider implementing [`ProviderAdapter`].
pub struct OpenAiCompatibleProvider {
    client: OpenAiClient,
    config: ProviderConfig,
}

impl OpenAiCompatibleProvider {
    /// Creates a provider talking to `base_url`.
    pub fn new(config: ProviderConfig, base_url: &str) -> Result<Self, LarderError> {
        let client = OpenAiClient::new(base_url, &config.id)?;
        info!(
            provider = %config.id,
            model = %config.default_model,
            base_url,
            "OpenAI-compatible provider initialized"
        );
        Ok(Self { client, config })
    }

    fn to_chat_request(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerateOptions,
    ) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage::new("system", system_prompt));
        }
        messages.push(ChatMessage::new("user", user_prompt));

        ChatRequest {
            model: options
                .model
                .clone()
                .unwrap_or_else(|| self.config.default_model.clone()),
            messages,
            stream: true,
            temperature: Some(TEMPERATURE),
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiCompatibleProvider {
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
impl ProviderAdapter for OpenAiCompatibleProvider {
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
        let request = self.to_chat_request(system_prompt, user_prompt, &options);
        debug!(provider = %self.config.id, model = %request.model, "starting chat stream");
        let events = self.client.stream_chat(&request, credential).await?;

        let chunks = events.filter_map(|result| async move {
            match result {
                Ok(StreamEvent::Chunk(chunk)) => {
                    let text = chunk.text();
                    (!text.is_empty()).then(|| Ok(StreamChunk::text(text)))
                }
                Ok(StreamEvent::Done) => Some(Ok(StreamChunk::done())),
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::pin(chunks))
    }
}
