// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end dialogue testing.
//!
//! `TestHarness` assembles the dialogue engine over a temporary SQLite
//! database, an in-memory session store and a [`MockGateway`], seeded with
//! channels. `dial()` and `reply()` drive it the way a USSD aggregator would.

use std::sync::Arc;
use std::time::Duration;

use paychannel_config::model::StorageConfig;
use paychannel_core::types::{
    Channel, MobileNetwork, NewChannel, PaymentAttempt, UssdRequest, UssdResponse,
};
use paychannel_core::{PaychannelError, StorageAdapter};
use paychannel_engine::{
    DialogueEngine, EngineSettings, InMemorySessionStore, PaymentVerifier, SessionStore,
};
use paychannel_storage::SqliteStorage;
use rust_decimal::Decimal;

use crate::mock_gateway::MockGateway;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    channels: Vec<NewChannel>,
    gateway: MockGateway,
    session_ttl: Duration,
    gateway_timeout: Duration,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            channels: Vec::new(),
            gateway: MockGateway::new(),
            session_ttl: Duration::from_secs(120),
            gateway_timeout: Duration::from_secs(8),
        }
    }

    /// Seed a USSD-enabled channel. Codes are assigned in seeding order (1, 2, ...).
    pub fn with_channel(self, name: &str, amount: Decimal) -> Self {
        self.with_channel_config(name, amount, true)
    }

    /// Seed a channel with USSD access switched on or off.
    pub fn with_channel_config(mut self, name: &str, amount: Decimal, ussd_enabled: bool) -> Self {
        self.channels.push(NewChannel {
            name: name.to_string(),
            amount,
            currency: "GHS".to_string(),
            ussd_enabled,
            paylink_enabled: true,
        });
        self
    }

    /// Use a preconfigured gateway (e.g. one built with a delay).
    pub fn with_gateway(mut self, gateway: MockGateway) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    /// Build the harness, creating the temp database and seeding channels.
    pub async fn build(self) -> Result<TestHarness, PaychannelError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| PaychannelError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let storage = Arc::new(storage);

        let mut channels = Vec::with_capacity(self.channels.len());
        for channel in self.channels {
            channels.push(storage.create_channel(channel).await?);
        }

        let gateway = Arc::new(self.gateway);
        let sessions = Arc::new(InMemorySessionStore::new(self.session_ttl));
        let engine = Arc::new(DialogueEngine::new(
            storage.clone(),
            storage.clone(),
            gateway.clone(),
            sessions.clone() as Arc<dyn SessionStore>,
            EngineSettings {
                gateway_timeout: self.gateway_timeout,
                default_network: MobileNetwork::Mtn,
            },
        ));
        let verifier = Arc::new(PaymentVerifier::new(storage.clone(), gateway.clone()));

        Ok(TestHarness {
            storage,
            gateway,
            sessions,
            engine,
            verifier,
            channels,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete dialogue stack over temp storage and a mock gateway.
pub struct TestHarness {
    /// SQLite directory and ledger (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// The scripted money gateway.
    pub gateway: Arc<MockGateway>,
    pub sessions: Arc<InMemorySessionStore>,
    pub engine: Arc<DialogueEngine>,
    pub verifier: Arc<PaymentVerifier>,
    /// Seeded channels, in seeding order.
    pub channels: Vec<Channel>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// An aggregator event from the default test handset.
    pub fn event(session_id: &str, user_data: &str, new_session: bool) -> UssdRequest {
        UssdRequest {
            session_id: session_id.to_string(),
            msisdn: "233241234567".to_string(),
            user_data: user_data.to_string(),
            network: "mtn".to_string(),
            user_id: "agg-user".to_string(),
            new_session,
        }
    }

    /// First turn of a session.
    pub async fn dial(&self, session_id: &str, dial_string: &str) -> UssdResponse {
        self.engine
            .handle(&Self::event(session_id, dial_string, true))
            .await
    }

    /// Continuation turn.
    pub async fn reply(&self, session_id: &str, input: &str) -> UssdResponse {
        self.engine.handle(&Self::event(session_id, input, false)).await
    }

    /// Every payment attempt, newest first.
    pub async fn payments(&self) -> Result<Vec<PaymentAttempt>, PaychannelError> {
        self.storage.list_payments(None, 1000).await
    }
}
