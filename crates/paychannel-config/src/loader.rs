// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./paychannel.toml` > `~/.config/paychannel/paychannel.toml`
//! > `/etc/paychannel/paychannel.toml` with environment variable overrides via
//! the `PAYCHANNEL_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use tracing::{debug, warn};

use crate::model::PaychannelConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/paychannel/paychannel.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "paychannel.toml";

/// Top-level sections an env var may address.
const SECTIONS: &[&str] = &[
    "service",
    "gateway",
    "ussd",
    "momo",
    "paystack",
    "payswitch",
    "storage",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/paychannel/paychannel.toml`
/// 3. `~/.config/paychannel/paychannel.toml`
/// 4. `./paychannel.toml`
/// 5. `PAYCHANNEL_*` environment variables
pub fn load_config() -> Result<PaychannelConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<PaychannelConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PaychannelConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PaychannelConfig, figment::Error> {
    if path.is_file() {
        debug!(path = %path.display(), "config file found");
    } else {
        warn!(path = %path.display(), "config file not found, using defaults");
    }
    Figment::new()
        .merge(Serialized::defaults(PaychannelConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    let sources = discovered_sources();
    if sources.is_empty() {
        debug!("no config files found, using defaults and environment");
    }
    for path in &sources {
        debug!(path = %path.display(), "config file found");
    }
    Figment::new()
        .merge(Serialized::defaults(PaychannelConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Config files of the XDG hierarchy present on disk, lowest precedence first.
pub fn discovered_sources() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
    candidates.extend(user_config_path());
    candidates.push(PathBuf::from(LOCAL_CONFIG_FILE));
    candidates.into_iter().filter(|p| p.is_file()).collect()
}

/// `~/.config/paychannel/paychannel.toml`, when a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("paychannel").join(LOCAL_CONFIG_FILE))
}

/// Maps a prefix-stripped, lowercased env key onto a dotted config path.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `paystack_secret_key` maps to `paystack.secret_key` and not
/// `paystack.secret.key`.
pub fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

fn env_provider() -> Env {
    Env::prefixed("PAYCHANNEL_").map(|key| map_env_key(key.as_str()).into())
}
