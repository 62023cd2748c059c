// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude provider adapter for Larder.
//!
//! This crate implements [`ProviderAdapter`] for the Anthropic Messages API,
//! streaming recipe text as it is generated.

pub mod client;
pub mod sse;
pub mod types;

use async_trait::async_trait;
use futures::stream::StreamExt;
use larder_core::error::LarderError;
use larder_core::traits::{ChunkStream, PluginAdapter, ProviderAdapter};
use larder_core::types::{AdapterType, GenerateOptions, HealthStatus, ProviderConfig, StreamChunk};
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::sse::StreamEvent;
use crate::types::{ApiMessage, MessageRequest, SseDelta};

/// Output budget for one recipe or ideas batch.
const MAX_TOKENS: u32 = 4096;

/// Anthropic Claude provider implementing [`ProviderAdapter`].
pub struct AnthropicProvider {
    client: AnthropicClient,
    config: ProviderConfig,
}

impl AnthropicProvider {
    /// Creates a provider talking to `base_url`.
    pub fn new(config: ProviderConfig, base_url: &str) -> Result<Self, LarderError> {
        let client = AnthropicClient::new(base_url)?;
        info!(
            provider = %config.id,
            model = %config.default_model,
            "Anthropic provider initialized"
        );
        Ok(Self { client, config })
    }

    fn to_message_request(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerateOptions,
    ) -> MessageRequest {
        MessageRequest {
            model: options
                .model
                .clone()
                .unwrap_or_else(|| self.config.default_model.clone()),
            messages: vec![ApiMessage {
                role: "user".into(),
                content: user_prompt.to_string(),
            }],
            system: (!system_prompt.is_empty()).then(|| system_prompt.to_string()),
            max_tokens: MAX_TOKENS,
            stream: true,
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
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
        // Avoid spending tokens on health checks.
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
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
        let request = self.to_message_request(system_prompt, user_prompt, &options);
        debug!(model = %request.model, "starting Anthropic stream");
        let events = self.client.stream_message(&request, credential).await?;

        let chunks = events.filter_map(|result| async move {
            match result {
                Ok(StreamEvent::ContentBlockDelta(delta)) => match delta.delta {
                    SseDelta::TextDelta { text } if !text.is_empty() => {
                        Some(Ok(StreamChunk::text(text)))
                    }
                    _ => None,
                },
                Ok(StreamEvent::MessageStop) => Some(Ok(StreamChunk::done())),
                Ok(StreamEvent::Error(err)) => Some(Err(LarderError::Provider {
                    message: format!("Anthropic stream error ({}): {}", err.error.type_, err.error.message),
                    source: None,
                })),
                Ok(StreamEvent::MessageDelta(_)) | Ok(StreamEvent::Ping) => None,
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::pin(chunks))
    }
}
