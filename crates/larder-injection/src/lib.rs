// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt guardrail for Larder.
//!
//! User text is normalized and matched against known injection phrasings
//! before it reaches any provider. The same adapter builds the localized
//! system prompts for recipe and ideas generation.

pub mod guardrail;
pub mod patterns;
pub mod prompts;
pub mod sanitize;

pub use guardrail::{EMPTY_INPUT, PatternGuardrail};
pub use sanitize::DEFAULT_MAX_INPUT_CHARS;
