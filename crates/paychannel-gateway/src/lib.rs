// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Paychannel service.
//!
//! Exposes the USSD aggregator callback (`POST /ussd`), an unauthenticated
//! health check, and a bearer-protected payment API under `/v1`.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};
