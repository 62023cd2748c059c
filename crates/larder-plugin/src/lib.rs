// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider registry and built-in provider catalog.
//!
//! The registry holds the live adapters the orchestrator can call. The
//! catalog is static metadata (default models, base URLs, free-tier flags)
//! used to build adapters and to suggest free alternatives on failure.

pub mod catalog;
pub mod registry;

pub use catalog::{
    CatalogEntry, WireProtocol, builtin_catalog, catalog_entry, free_tier_ids, search_catalog,
};
pub use registry::ProviderRegistry;
