// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Paychannel service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Paychannel configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PaychannelConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// HTTP listener for the USSD callback and admin API.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// USSD dialogue timing and defaults.
    #[serde(default)]
    pub ussd: UssdConfig,

    /// Which mobile-money provider handles charges.
    #[serde(default)]
    pub momo: MomoConfig,

    /// Paystack credentials and endpoint.
    #[serde(default)]
    pub paystack: PaystackConfig,

    /// PaySwitch (theteller) credentials and endpoint.
    #[serde(default)]
    pub payswitch: PayswitchConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Instance name shown in logs and health output.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "paychannel".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token protecting `/v1` routes. `None` rejects every `/v1` request.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Maximum USSD callbacks processed concurrently.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
            max_in_flight: default_max_in_flight(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_in_flight() -> usize {
    256
}

/// USSD dialogue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UssdConfig {
    /// Seconds of inactivity after which a dialogue session is forgotten.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Interval between sweeps of expired sessions.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Upper bound on a single money-gateway call made inside a USSD turn.
    #[serde(default = "default_gateway_timeout_secs")]
    pub gateway_timeout_secs: u64,

    /// Network used when the aggregator sends an unrecognized network name.
    #[serde(default = "default_network")]
    pub default_network: String,
}

impl Default for UssdConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            gateway_timeout_secs: default_gateway_timeout_secs(),
            default_network: default_network(),
        }
    }
}

fn default_session_ttl_secs() -> u64 {
    120
}

fn default_sweep_interval_secs() -> u64 {
    30
}

fn default_gateway_timeout_secs() -> u64 {
    8
}

fn default_network() -> String {
    "mtn".to_string()
}

/// Supported mobile-money providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MomoProvider {
    #[default]
    Paystack,
    Payswitch,
}

/// Provider selection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MomoConfig {
    /// Provider used for USSD charges.
    #[serde(default)]
    pub provider: MomoProvider,
}

/// Paystack configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PaystackConfig {
    /// Secret key (`sk_...`). Usually supplied via `PAYCHANNEL_PAYSTACK_SECRET_KEY`.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// API base URL.
    #[serde(default = "default_paystack_base_url")]
    pub base_url: String,

    /// HTTP timeout for each request.
    #[serde(default = "default_paystack_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            base_url: default_paystack_base_url(),
            timeout_secs: default_paystack_timeout_secs(),
        }
    }
}

fn default_paystack_base_url() -> String {
    "https://api.paystack.co".to_string()
}

fn default_paystack_timeout_secs() -> u64 {
    15
}

/// PaySwitch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PayswitchConfig {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub merchant_id: Option<String>,

    #[serde(default = "default_payswitch_base_url")]
    pub base_url: String,

    #[serde(default = "default_payswitch_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PayswitchConfig {
    fn default() -> Self {
        Self {
            username: None,
            api_key: None,
            merchant_id: None,
            base_url: default_payswitch_base_url(),
            timeout_secs: default_payswitch_timeout_secs(),
        }
    }
}

fn default_payswitch_base_url() -> String {
    "https://prod.theteller.net/v1.1".to_string()
}

fn default_payswitch_timeout_secs() -> u64 {
    30
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("paychannel").join("paychannel.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("paychannel.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PaychannelConfig::default();
        assert_eq!(config.service.name, "paychannel");
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.ussd.session_ttl_secs, 120);
        assert_eq!(config.ussd.default_network, "mtn");
        assert_eq!(config.momo.provider, MomoProvider::Paystack);
        assert_eq!(config.paystack.base_url, "https://api.paystack.co");
        assert!(config.storage.database_path.ends_with("paychannel.db"));
    }

    #[test]
    fn provider_names_are_lowercase() {
        let config: PaychannelConfig = toml::from_str("[momo]\nprovider = \"payswitch\"\n").unwrap();
        assert_eq!(config.momo.provider, MomoProvider::Payswitch);
        assert!(toml::from_str::<PaychannelConfig>("[momo]\nprovider = \"Stripe\"\n").is_err());
    }
}
