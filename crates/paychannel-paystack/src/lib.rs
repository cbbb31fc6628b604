// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Paystack money-gateway adapter for Paychannel.
//!
//! This crate implements [`MoneyGateway`] against the Paystack charge API:
//! mobile-money charges, OTP submission, and transaction verification.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use paychannel_config::model::PaystackConfig;
use paychannel_core::error::PaychannelError;
use paychannel_core::money::to_minor_units;
use paychannel_core::traits::{MoneyGateway, PluginAdapter};
use paychannel_core::types::{
    AdapterType, ChargeRequest, ChargeResult, GatewayVerification, HealthStatus, OtpResult,
};
use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::client::PaystackClient;
use crate::types::{
    ChargeBody, MobileMoney, SubmitOtpBody, map_charge, map_otp, map_transaction_status,
    provider_code,
};

/// Paystack gateway implementing [`MoneyGateway`].
pub struct PaystackGateway {
    client: PaystackClient,
}

impl PaystackGateway {
    /// Creates a gateway from configuration.
    ///
    /// Fails when no secret key is configured.
    pub fn new(config: &PaystackConfig) -> Result<Self, PaychannelError> {
        let secret = config
            .secret_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                PaychannelError::Config(
                    "paystack.secret_key is required when momo.provider = \"paystack\"".into(),
                )
            })?;
        let client = PaystackClient::new(
            &SecretString::from(secret.to_string()),
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(base_url = %config.base_url, "Paystack gateway initialized");
        Ok(Self { client })
    }

    /// Creates a gateway around an existing client.
    pub fn from_client(client: PaystackClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for PaystackGateway {
    fn name(&self) -> &str {
        "paystack"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::MoneyGateway
    }

    async fn health_check(&self) -> Result<HealthStatus, PaychannelError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PaychannelError> {
        Ok(())
    }
}

#[async_trait]
impl MoneyGateway for PaystackGateway {
    async fn initiate_charge(&self, request: ChargeRequest) -> Result<ChargeResult, PaychannelError> {
        let amount = to_minor_units(request.amount)?;
        let body = ChargeBody {
            email: request.email,
            amount,
            currency: request.currency,
            mobile_money: MobileMoney {
                phone: request.phone,
                provider: provider_code(request.network),
            },
            reference: request.reference,
            metadata: request.metadata,
        };

        match self.client.charge(&body).await {
            Ok(envelope) => {
                let result = map_charge(&envelope);
                debug!(reference = %body.reference, ?result, "charge mapped");
                Ok(result)
            }
            Err(e) => {
                warn!(reference = %body.reference, error = %e, "charge request failed");
                Ok(ChargeResult::rejected(e.rejection_reason()))
            }
        }
    }

    async fn submit_otp(&self, otp: &str, reference: &str) -> OtpResult {
        let body = SubmitOtpBody {
            otp: otp.to_string(),
            reference: reference.to_string(),
        };
        match self.client.submit_otp(&body).await {
            Ok(envelope) => map_otp(&envelope),
            Err(e) => {
                warn!(reference, error = %e, "OTP submission failed");
                OtpResult::rejected(e.rejection_reason())
            }
        }
    }

    async fn verify(&self, reference: &str) -> Result<GatewayVerification, PaychannelError> {
        let envelope = self.client.verify(reference).await?;
        if !envelope.status {
            return Err(PaychannelError::Gateway {
                message: format!("verification refused: {}", envelope.message),
                source: None,
            });
        }
        let data = envelope.data.ok_or_else(|| PaychannelError::Gateway {
            message: "verification response has no data".into(),
            source: None,
        })?;
        let gateway_response = data
            .gateway_response
            .filter(|text| !text.trim().is_empty())
            .or_else(|| Some(envelope.message).filter(|text| !text.trim().is_empty()));
        Ok(GatewayVerification::new(
            map_transaction_status(data.status),
            gateway_response,
        ))
    }
}
