// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends.

use async_trait::async_trait;

use crate::error::PaychannelError;
use crate::traits::adapter::PluginAdapter;

/// Lifecycle of a persistence backend that hosts the channel directory
/// and the payment ledger.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Opens the backend and applies pending migrations.
    async fn initialize(&self) -> Result<(), PaychannelError>;

    /// Closes the backend, flushing pending writes.
    async fn close(&self) -> Result<(), PaychannelError>;
}
