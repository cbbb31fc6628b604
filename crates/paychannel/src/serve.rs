// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `paychannel serve` command implementation.
//!
//! Opens SQLite storage, builds the configured money gateway, wires the
//! dialogue engine over an in-memory session store and serves the HTTP API
//! until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::{Duration, Instant};

use paychannel_config::model::{MomoProvider, PaychannelConfig};
use paychannel_core::{MoneyGateway, PaychannelError, PluginAdapter, StorageAdapter};
use paychannel_engine::{
    DialogueEngine, EngineSettings, InMemorySessionStore, PaymentVerifier, SessionStore,
    spawn_session_sweeper,
};
use paychannel_gateway::{AuthConfig, GatewayState, HealthState, ServerConfig, start_server};
use paychannel_paystack::PaystackGateway;
use paychannel_payswitch::PayswitchGateway;
use paychannel_storage::SqliteStorage;
use tracing::{info, warn};

use crate::shutdown;

/// Opens and migrates the configured SQLite database.
pub async fn open_storage(config: &PaychannelConfig) -> Result<Arc<SqliteStorage>, PaychannelError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(Arc::new(storage))
}

/// Builds the money gateway selected by `momo.provider`.
pub fn build_money_gateway(
    config: &PaychannelConfig,
) -> Result<Arc<dyn MoneyGateway>, PaychannelError> {
    if let Err(errors) = paychannel_config::validate_provider_credentials(config) {
        paychannel_config::render_errors(&errors);
        return Err(PaychannelError::Config(format!(
            "{} missing credential(s) for the {:?} provider",
            errors.len(),
            config.momo.provider
        )));
    }

    let gateway: Arc<dyn MoneyGateway> = match config.momo.provider {
        MomoProvider::Paystack => Arc::new(PaystackGateway::new(&config.paystack)?),
        MomoProvider::Payswitch => Arc::new(PayswitchGateway::new(&config.payswitch)?),
    };
    Ok(gateway)
}

/// Runs the `paychannel serve` command.
pub async fn run_serve(config: PaychannelConfig) -> Result<(), PaychannelError> {
    init_tracing(&config.service.log_level);

    let storage = open_storage(&config).await?;
    let money_gateway = build_money_gateway(&config)?;
    let settings = EngineSettings::from_config(&config.ussd)?;

    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(
        Duration::from_secs(config.ussd.session_ttl_secs),
    ));
    let engine = Arc::new(DialogueEngine::new(
        storage.clone(),
        storage.clone(),
        money_gateway.clone(),
        sessions.clone(),
        settings,
    ));
    let verifier = Arc::new(PaymentVerifier::new(storage.clone(), money_gateway.clone()));

    if config.gateway.bearer_token.is_none() {
        warn!("gateway.bearer_token is not set, /v1 payment API will reject every request");
    }

    let state = GatewayState {
        engine,
        verifier,
        ledger: storage.clone(),
        auth: AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
        health: HealthState {
            start_time: Instant::now(),
            storage: storage.clone(),
            money_gateway: money_gateway.clone(),
        },
    };

    let cancel = shutdown::install_signal_handler();
    let sweeper = spawn_session_sweeper(
        sessions,
        Duration::from_secs(config.ussd.sweep_interval_secs.max(1)),
        cancel.clone(),
    );

    info!(
        service = %config.service.name,
        provider = money_gateway.name(),
        "paychannel starting"
    );

    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
        max_in_flight: config.gateway.max_in_flight,
    };
    let served = start_server(&server_config, state, cancel.clone()).await;

    // A bind failure returns before any signal; stop the sweeper either way.
    cancel.cancel();
    if let Err(e) = sweeper.await {
        warn!(error = %e, "session sweeper task failed");
    }
    if let Err(e) = money_gateway.shutdown().await {
        warn!(error = %e, "money gateway shutdown failed");
    }
    storage.close().await?;
    info!("paychannel stopped");

    served
}

/// Initialize the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("paychannel={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paystack_without_secret_is_rejected() {
        let config = PaychannelConfig::default();
        assert!(matches!(
            build_money_gateway(&config),
            Err(PaychannelError::Config(_))
        ));
    }

    #[test]
    fn builds_selected_provider() {
        let mut config = PaychannelConfig::default();
        config.paystack.secret_key = Some("sk_test_123".into());
        let gateway = build_money_gateway(&config).unwrap();
        assert_eq!(gateway.name(), "paystack");

        config.momo.provider = MomoProvider::Payswitch;
        config.payswitch.username = Some("merchant".into());
        config.payswitch.api_key = Some("key".into());
        config.payswitch.merchant_id = Some("TTM-0001".into());
        let gateway = build_money_gateway(&config).unwrap();
        assert_eq!(gateway.name(), "payswitch");
    }

    #[tokio::test]
    async fn open_storage_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PaychannelConfig::default();
        config.storage.database_path = dir.path().join("p.db").to_string_lossy().into_owned();
        let storage = open_storage(&config).await.unwrap();
        assert!(storage.list_channels().await.unwrap().is_empty());
        storage.close().await.unwrap();
    }
}
