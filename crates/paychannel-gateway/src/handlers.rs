// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Handles POST /ussd, GET /health, GET /v1/payments/{reference} and
//! POST /v1/payments/{reference}/verify.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use paychannel_core::PaychannelError;
use paychannel_core::traits::PluginAdapter;
use paychannel_core::types::{HealthStatus, UssdRequest, UssdResponse};
use serde::Serialize;

use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when every adapter is healthy, otherwise `degraded`.
    pub status: String,
    /// Binary version.
    pub version: String,
    pub uptime_secs: u64,
    pub storage: ComponentHealth,
    pub money_gateway: ComponentHealth,
}

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComponentHealth {
    fn from_check(name: &str, check: Result<HealthStatus, PaychannelError>) -> Self {
        let (status, detail) = match check {
            Ok(HealthStatus::Healthy) => ("healthy", None),
            Ok(HealthStatus::Degraded(d)) => ("degraded", Some(d)),
            Ok(HealthStatus::Unhealthy(d)) => ("unhealthy", Some(d)),
            Err(e) => ("unhealthy", Some(e.to_string())),
        };
        Self {
            name: name.to_string(),
            status: status.to_string(),
            detail,
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

fn error_response(err: PaychannelError) -> Response {
    let status = match &err {
        PaychannelError::PaymentNotFound { .. } | PaychannelError::ChannelNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        PaychannelError::Gateway { .. } => StatusCode::BAD_GATEWAY,
        PaychannelError::InvalidTransition { .. } => StatusCode::CONFLICT,
        _ => {
            tracing::error!(error = %err, "payment API request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// POST /ussd
///
/// One aggregator event in, exactly one USSD response out.
pub async fn post_ussd(
    State(state): State<GatewayState>,
    Json(request): Json<UssdRequest>,
) -> Json<UssdResponse> {
    Json(state.engine.handle(&request).await)
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let health = &state.health;
    let storage =
        ComponentHealth::from_check(health.storage.name(), health.storage.health_check().await);
    let money_gateway = ComponentHealth::from_check(
        health.money_gateway.name(),
        health.money_gateway.health_check().await,
    );

    let all_healthy = storage.is_healthy() && money_gateway.is_healthy();
    let body = HealthResponse {
        status: if all_healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: health.start_time.elapsed().as_secs(),
        storage,
        money_gateway,
    };
    let code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(body)).into_response()
}

/// GET /v1/payments/{reference}
pub async fn get_payment(
    State(state): State<GatewayState>,
    Path(reference): Path<String>,
) -> Response {
    match state.ledger.get_payment(&reference).await {
        Ok(Some(payment)) => Json(payment).into_response(),
        Ok(None) => error_response(PaychannelError::PaymentNotFound { reference }),
        Err(e) => error_response(e),
    }
}

/// POST /v1/payments/{reference}/verify
pub async fn post_verify(
    State(state): State<GatewayState>,
    Path(reference): Path<String>,
) -> Response {
    match state.verifier.verify(&reference).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}
