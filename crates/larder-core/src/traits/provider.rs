// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for text-generation services.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::LarderError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{GenerateOptions, ProviderConfig, StreamChunk};

/// A lazy, finite, non-restartable sequence of generated chunks.
///
/// Dropping the stream stops generation; no further chunks are produced.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, LarderError>> + Send>>;

/// Adapter for a text-generation provider.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Identity of this provider (registry id, display name, default model).
    fn config(&self) -> &ProviderConfig;

    /// Starts generating from a system prompt and a user prompt.
    ///
    /// Resolves once the provider accepted the request; HTTP failures surface
    /// here as [`LarderError::ProviderStatus`] or [`LarderError::Transport`].
    async fn generate_recipe(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        credential: &str,
        options: GenerateOptions,
    ) -> Result<ChunkStream, LarderError>;
}
