// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Failure handling for generation requests: classification into
//! user-facing errors with remediation metadata, retry-delay policy, and
//! cancellable retry countdowns.

pub mod api_error;
pub mod classifier;
pub mod countdown;

pub use api_error::{ApiError, ErrorCode, PrimaryAction};
pub use classifier::{ClassifyContext, ErrorClassifier, RetryPolicy, retry_after_hint};
pub use countdown::RetryCountdown;
