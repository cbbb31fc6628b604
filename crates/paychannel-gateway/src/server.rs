// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use paychannel_core::PaychannelError;
use paychannel_core::traits::{MoneyGateway, PaymentLedger, StorageAdapter};
use paychannel_engine::{DialogueEngine, PaymentVerifier};
use tokio_util::sync::CancellationToken;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Health state for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    pub storage: Arc<dyn StorageAdapter>,
    pub money_gateway: Arc<dyn MoneyGateway>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub engine: Arc<DialogueEngine>,
    pub verifier: Arc<PaymentVerifier>,
    pub ledger: Arc<dyn PaymentLedger>,
    /// Authentication configuration.
    pub auth: AuthConfig,
    pub health: HealthState,
}

/// Gateway server configuration (mirrors GatewayConfig from paychannel-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// USSD callbacks processed concurrently before new ones wait.
    pub max_in_flight: usize,
}

/// Builds the application router.
///
/// - POST /ussd (aggregator callback, concurrency-limited)
/// - GET /health (no auth)
/// - GET /v1/payments/{reference} (bearer auth)
/// - POST /v1/payments/{reference}/verify (bearer auth)
pub fn build_router(state: GatewayState, max_in_flight: usize) -> Router {
    let auth_state = state.auth.clone();

    let ussd_routes = Router::new()
        .route("/ussd", post(handlers::post_ussd))
        .layer(GlobalConcurrencyLimitLayer::new(max_in_flight.max(1)))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/payments/{reference}", get(handlers::get_payment))
        .route("/v1/payments/{reference}/verify", post(handlers::post_verify))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(ussd_routes)
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves the gateway until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), PaychannelError> {
    let app = build_router(state, config.max_in_flight);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PaychannelError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| PaychannelError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
