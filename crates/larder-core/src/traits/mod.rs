// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod guardrail;
pub mod provider;
pub mod storage;

pub use adapter::PluginAdapter;
pub use guardrail::Guardrail;
pub use provider::{ChunkStream, ProviderAdapter};
pub use storage::StorageBackend;
