// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./conduit.toml` > `~/.config/conduit/conduit.toml` > `/etc/conduit/conduit.toml`
//! with environment variable overrides via `CONDUIT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ConduitConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/conduit/conduit.toml";

/// Local configuration file, relative to the working directory.
pub const LOCAL_CONFIG_PATH: &str = "conduit.toml";

/// Path of the per-user configuration file, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("conduit/conduit.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/conduit/conduit.toml` (system-wide)
/// 3. `~/.config/conduit/conduit.toml` (user XDG config)
/// 4. `./conduit.toml` (local directory)
/// 5. `CONDUIT_*` environment variables
pub fn load_config() -> Result<ConduitConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ConduitConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConduitConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ConduitConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConduitConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the XDG lookup, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ConduitConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider mapping `CONDUIT_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that keys containing
/// underscores survive: `CONDUIT_LIVE_CHANNEL_CAPACITY` maps to
/// `live.channel_capacity`, not `live.channel.capacity`. Keys reach the
/// map in their original case, so they are lowercased first.
fn env_provider() -> Env {
    Env::prefixed("CONDUIT_").map(|key| {
        let lowered = key.as_str().to_ascii_lowercase();
        let mapped = lowered
            .replacen("log_", "log.", 1)
            .replacen("metrics_", "metrics.", 1)
            .replacen("live_", "live.", 1)
            .replacen("principal_", "principal.", 1);
        mapped.into()
    })
}
