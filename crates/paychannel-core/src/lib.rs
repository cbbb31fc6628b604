// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Paychannel USSD payment service.
//!
//! Holds the error type, domain types, money helpers, and the adapter traits
//! implemented by storage and money-gateway crates.

pub mod codes;
pub mod error;
pub mod money;
pub mod reference;
pub mod traits;
pub mod types;

pub use error::PaychannelError;
pub use types::{AdapterType, HealthStatus};

pub use traits::{ChannelDirectory, MoneyGateway, PaymentLedger, PluginAdapter, StorageAdapter};
