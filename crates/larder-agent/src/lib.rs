// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation orchestration for Larder.
//!
//! [`GenerationOrchestrator`] owns the request lifecycle: guardrail
//! validation, credential and provider resolution, streaming with
//! cancellation, failure classification with scheduled retries, and
//! persistence of the exchange and any extracted recipe or ideas.

pub mod orchestrator;
pub mod prompt;
pub mod request;
pub mod status;

pub use orchestrator::{AttemptReport, GenerationOrchestrator, OrchestratorSettings, retry_policy};
pub use request::{Flavor, GenerationRequest};
pub use status::RequestStatus;
