// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind addresses, non-zero timers, and provider credentials.

use crate::diagnostic::ConfigError;
use crate::model::{MomoProvider, PaychannelConfig};

/// Network names the USSD layer understands as a default.
const KNOWN_NETWORKS: &[&str] = &["mtn", "airteltigo", "telecel", "vodafone"];

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PaychannelConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(validation("gateway.host must not be empty".to_string()));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(validation(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if config.gateway.max_in_flight == 0 {
        errors.push(validation("gateway.max_in_flight must be at least 1".to_string()));
    }

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(validation(format!(
            "service.log_level `{}` must be one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    for (key, value) in [
        ("ussd.session_ttl_secs", config.ussd.session_ttl_secs),
        ("ussd.sweep_interval_secs", config.ussd.sweep_interval_secs),
        ("ussd.gateway_timeout_secs", config.ussd.gateway_timeout_secs),
        ("paystack.timeout_secs", config.paystack.timeout_secs),
        ("payswitch.timeout_secs", config.payswitch.timeout_secs),
    ] {
        if value == 0 {
            errors.push(validation(format!("{key} must be greater than zero")));
        }
    }

    let network = config.ussd.default_network.to_ascii_lowercase();
    if !KNOWN_NETWORKS.contains(&network.as_str()) {
        errors.push(validation(format!(
            "ussd.default_network `{}` must be one of {}",
            config.ussd.default_network,
            KNOWN_NETWORKS.join(", ")
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(validation("storage.database_path must not be empty".to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks that the selected money-gateway provider has credentials.
///
/// Kept separate from [`validate_config`] so admin subcommands that never
/// charge anyone run without provider secrets.
pub fn validate_provider_credentials(config: &PaychannelConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    match config.momo.provider {
        MomoProvider::Paystack => {
            if is_blank(&config.paystack.secret_key) {
                errors.push(ConfigError::MissingKey {
                    key: "paystack.secret_key".to_string(),
                });
            }
        }
        MomoProvider::Payswitch => {
            for (key, value) in [
                ("payswitch.username", &config.payswitch.username),
                ("payswitch.api_key", &config.payswitch.api_key),
                ("payswitch.merchant_id", &config.payswitch.merchant_id),
            ] {
                if is_blank(value) {
                    errors.push(ConfigError::MissingKey {
                        key: key.to_string(),
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).is_none_or(str::is_empty)
}

fn validation(message: String) -> ConfigError {
    ConfigError::Validation { message }
}
