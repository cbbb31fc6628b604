// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock money gateway for deterministic testing.
//!
//! `MockGateway` implements `MoneyGateway` with scripted outcomes popped
//! from FIFO queues and counts every call, so tests can assert both what
//! the engine did with a result and whether the gateway was asked at all.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use paychannel_core::PaychannelError;
use paychannel_core::traits::{MoneyGateway, PluginAdapter};
use paychannel_core::types::{
    AdapterType, ChargeRequest, ChargeResult, GatewayTransactionStatus, GatewayVerification,
    HealthStatus, OtpResult,
};

/// A money gateway that replays pre-configured outcomes.
///
/// Empty queues fall back to `Approved` for charges, `Accepted` for OTPs
/// and `Pending` for verification.
#[derive(Default)]
pub struct MockGateway {
    charges: Mutex<VecDeque<Result<ChargeResult, PaychannelError>>>,
    otps: Mutex<VecDeque<OtpResult>>,
    verifications: Mutex<VecDeque<GatewayVerification>>,
    charge_requests: Mutex<Vec<ChargeRequest>>,
    submitted_otps: Mutex<Vec<(String, String)>>,
    charge_calls: AtomicUsize,
    otp_calls: AtomicUsize,
    verify_calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn push_charge(&self, result: ChargeResult) {
        self.charges.lock().await.push_back(Ok(result));
    }

    /// Next charge fails with `error` instead of producing an outcome.
    pub async fn push_charge_error(&self, error: PaychannelError) {
        self.charges.lock().await.push_back(Err(error));
    }

    pub async fn push_otp(&self, result: OtpResult) {
        self.otps.lock().await.push_back(result);
    }

    pub async fn push_verification(&self, status: GatewayTransactionStatus) {
        self.verifications
            .lock()
            .await
            .push_back(GatewayVerification::new(status, None));
    }

    /// Next verification reports `status` with the provider's wording `text`.
    pub async fn push_verification_text(&self, status: GatewayTransactionStatus, text: &str) {
        self.verifications
            .lock()
            .await
            .push_back(GatewayVerification::new(status, Some(text.to_string())));
    }

    pub fn charge_calls(&self) -> usize {
        self.charge_calls.load(Ordering::SeqCst)
    }

    pub fn otp_calls(&self) -> usize {
        self.otp_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    /// Charge requests received, in order.
    pub async fn charge_requests(&self) -> Vec<ChargeRequest> {
        self.charge_requests.lock().await.clone()
    }

    /// `(otp, reference)` pairs received, in order.
    pub async fn submitted_otps(&self) -> Vec<(String, String)> {
        self.submitted_otps.lock().await.clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl PluginAdapter for MockGateway {
    fn name(&self) -> &str {
        "mock-gateway"
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
impl MoneyGateway for MockGateway {
    async fn initiate_charge(&self, request: ChargeRequest) -> Result<ChargeResult, PaychannelError> {
        self.charge_calls.fetch_add(1, Ordering::SeqCst);
        self.charge_requests.lock().await.push(request);
        self.pause().await;
        self.charges
            .lock()
            .await
            .pop_front()
            .unwrap_or(Ok(ChargeResult::Approved))
    }

    async fn submit_otp(&self, otp: &str, reference: &str) -> OtpResult {
        self.otp_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted_otps
            .lock()
            .await
            .push((otp.to_string(), reference.to_string()));
        self.pause().await;
        self.otps.lock().await.pop_front().unwrap_or(OtpResult::Accepted)
    }

    async fn verify(&self, _reference: &str) -> Result<GatewayVerification, PaychannelError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        Ok(self
            .verifications
            .lock()
            .await
            .pop_front()
            .unwrap_or(GatewayVerification::new(GatewayTransactionStatus::Pending, None)))
    }
}
