// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Paychannel service.

use thiserror::Error;

/// The primary error type used across all Paychannel adapter traits and core operations.
#[derive(Debug, Error)]
pub enum PaychannelError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, row decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Money-gateway errors that are not a normalized charge outcome
    /// (client construction, verification transport, unsupported operation).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An amount that cannot be expressed in minor units.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The payer's mobile network or the currency is not served by the selected gateway.
    #[error("{gateway} does not support {what}")]
    Unsupported { gateway: String, what: String },

    /// No channel with the given id.
    #[error("channel not found: {id}")]
    ChannelNotFound { id: String },

    /// No payment attempt with the given reference.
    #[error("payment not found: {reference}")]
    PaymentNotFound { reference: String },

    /// A payment status change that would break ledger monotonicity.
    #[error("payment {reference}: illegal status transition {from} -> {to}")]
    InvalidTransition {
        reference: String,
        from: String,
        to: String,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PaychannelError {
    /// True for errors caused by the caller's input rather than infrastructure.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PaychannelError::InvalidAmount(_) | PaychannelError::Unsupported { .. }
        )
    }
}
