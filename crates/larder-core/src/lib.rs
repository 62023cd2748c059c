// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Larder.
//!
//! This crate provides the trait definitions, error type, and common types
//! used throughout the Larder workspace. Provider adapters, the guardrail,
//! and storage media implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::LarderError;
pub use types::{AdapterType, HealthStatus};

pub use traits::{ChunkStream, Guardrail, PluginAdapter, ProviderAdapter, StorageBackend};
