// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage, directory, and ledger traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use paychannel_config::model::StorageConfig;
use paychannel_core::types::{
    Channel, ChannelTotals, NewChannel, NewPayment, PaymentAttempt, PaymentStatus, StatusChange,
};
use paychannel_core::{
    AdapterType, ChannelDirectory, HealthStatus, PaychannelError, PaymentLedger, PluginAdapter,
    StorageAdapter,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed channel directory and payment ledger.
///
/// The database is opened on the first call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, PaychannelError> {
        self.db.get().ok_or_else(|| PaychannelError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(&self, db: &Database) -> Result<(), PaychannelError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        debug!(path = %self.config.database_path, "WAL checkpoint complete");
        Ok(())
    }

    // --- Channel administration ---

    pub async fn create_channel(&self, channel: NewChannel) -> Result<Channel, PaychannelError> {
        queries::channels::create_channel(self.db()?, channel).await
    }

    pub async fn list_channels(&self) -> Result<Vec<Channel>, PaychannelError> {
        queries::channels::list_channels(self.db()?).await
    }

    pub async fn set_ussd_enabled(&self, code: &str, enabled: bool) -> Result<bool, PaychannelError> {
        queries::channels::set_ussd_enabled(self.db()?, code, enabled).await
    }

    pub async fn channel_totals(&self, channel_id: &str) -> Result<ChannelTotals, PaychannelError> {
        queries::channels::channel_totals(self.db()?, channel_id).await
    }

    // --- Payment reporting ---

    pub async fn list_payments(
        &self,
        status: Option<PaymentStatus>,
        limit: usize,
    ) -> Result<Vec<PaymentAttempt>, PaychannelError> {
        queries::payments::list_payments(self.db()?, status, limit).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PaychannelError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PaychannelError> {
        if let Some(db) = self.db.get() {
            self.checkpoint(db).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), PaychannelError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| PaychannelError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), PaychannelError> {
        let db = self.db()?;
        self.checkpoint(db).await
    }
}

#[async_trait]
impl ChannelDirectory for SqliteStorage {
    async fn lookup_by_code(
        &self,
        code: &str,
        require_enabled: bool,
    ) -> Result<Option<Channel>, PaychannelError> {
        queries::channels::lookup_by_code(self.db()?, code, require_enabled).await
    }

    async fn get_channel(&self, id: &str) -> Result<Option<Channel>, PaychannelError> {
        queries::channels::get_channel(self.db()?, id).await
    }
}

#[async_trait]
impl PaymentLedger for SqliteStorage {
    async fn create_pending(&self, payment: NewPayment) -> Result<PaymentAttempt, PaychannelError> {
        queries::payments::create_pending(self.db()?, payment).await
    }

    async fn update_status(
        &self,
        reference: &str,
        status: PaymentStatus,
        gateway_response: Option<String>,
    ) -> Result<StatusChange, PaychannelError> {
        queries::payments::update_status(self.db()?, reference, status, gateway_response).await
    }

    async fn get_payment(&self, reference: &str) -> Result<Option<PaymentAttempt>, PaychannelError> {
        queries::payments::get_payment(self.db()?, reference).await
    }
}
