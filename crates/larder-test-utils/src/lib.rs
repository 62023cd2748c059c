// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Larder integration tests.
//!
//! Provides mock adapters and a harness that wires them into a real
//! orchestrator, so the generation lifecycle can be tested without network
//! access.
//!
//! # Components
//!
//! - [`MockProvider`] - scripted provider replies, call recording
//! - [`MockGuardrail`] - guardrail with a fixed verdict
//! - [`GatedBackend`] - storage medium that can hold a write open
//! - [`TestHarness`] - orchestrator over mocks and a throwaway store

pub mod gated_backend;
pub mod harness;
pub mod mock_guardrail;
pub mod mock_provider;

pub use gated_backend::GatedBackend;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_guardrail::MockGuardrail;
pub use mock_provider::{MockFailure, MockProvider, MockReply, RecordedCall};
