// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Money-gateway client trait.

use async_trait::async_trait;

use crate::error::PaychannelError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChargeRequest, ChargeResult, GatewayVerification, OtpResult};

/// Rejection reason for transport failures and timeouts.
pub const GATEWAY_UNREACHABLE: &str = "gateway unreachable";

/// Rejection reason for provider payloads that cannot be decoded.
pub const INVALID_GATEWAY_RESPONSE: &str = "invalid gateway response";

/// Whether a rejection reason reports a fault on the way to the provider
/// rather than a provider decision. The provider may still have acted.
pub fn is_inconclusive_rejection(reason: &str) -> bool {
    reason == GATEWAY_UNREACHABLE || reason == INVALID_GATEWAY_RESPONSE
}

/// A mobile-money charge provider.
///
/// Transport failures, timeouts and unparseable provider payloads are folded
/// into `Rejected` outcomes. `Err` is reserved for requests the provider could
/// never accept (bad amount, unsupported network or currency).
#[async_trait]
pub trait MoneyGateway: PluginAdapter {
    /// Starts a mobile-money charge.
    async fn initiate_charge(&self, request: ChargeRequest) -> Result<ChargeResult, PaychannelError>;

    /// Submits the payer's one-time password for a charge awaiting it.
    async fn submit_otp(&self, otp: &str, reference: &str) -> OtpResult;

    /// Asks the provider for the current state of a transaction.
    async fn verify(&self, reference: &str) -> Result<GatewayVerification, PaychannelError>;
}
