// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod directory;
pub mod gateway;
pub mod ledger;
pub mod storage;

pub use adapter::PluginAdapter;
pub use directory::ChannelDirectory;
pub use gateway::MoneyGateway;
pub use ledger::PaymentLedger;
pub use storage::StorageAdapter;
