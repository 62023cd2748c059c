// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./larder.toml` > `~/.config/larder/larder.toml` > `/etc/larder/larder.toml`
//! with environment variable overrides via `LARDER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::LarderConfig;

const SYSTEM_CONFIG: &str = "/etc/larder/larder.toml";
const LOCAL_CONFIG: &str = "larder.toml";

/// Path of the per-user config file, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("larder").join("larder.toml"))
}

/// Config files in merge order, lowest priority first.
pub fn config_file_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SYSTEM_CONFIG)];
    paths.extend(user_config_path());
    paths.push(PathBuf::from(LOCAL_CONFIG));
    paths
}

/// Build the Figment used for config loading.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/larder/larder.toml`
/// 3. `~/.config/larder/larder.toml`
/// 4. `./larder.toml`
/// 5. `LARDER_*` environment variables
pub fn build_figment() -> Figment {
    config_file_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(LarderConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
pub fn load_config() -> Result<LarderConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<LarderConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LarderConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LarderConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LarderConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `split("_")` because key names contain
/// underscores: `LARDER_GENERATION_MAX_AUTO_RETRIES` must become
/// `generation.max_auto_retries`. Provider tables take the id from the
/// segment after `PROVIDERS_`: `LARDER_PROVIDERS_GROQ_API_KEY` becomes
/// `providers.groq.api_key`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("LARDER_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    if let Some(rest) = key.strip_prefix("providers_") {
        return match rest.split_once('_') {
            Some((id, field)) => format!("providers.{id}.{field}"),
            None => format!("providers.{rest}"),
        };
    }
    for section in ["app", "generation", "storage"] {
        if let Some(field) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{field}");
        }
    }
    key.to_string()
}
