// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Paystack charge and verification API.
//!
//! Provides [`PaystackClient`] which handles bearer authentication, envelope
//! decoding, and a single retry of verification lookups on transient errors.
//! Charge and OTP submissions are never retried.

use std::time::Duration;

use paychannel_core::PaychannelError;
use paychannel_core::traits::gateway::{GATEWAY_UNREACHABLE, INVALID_GATEWAY_RESPONSE};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::types::{ChargeBody, ChargeData, Envelope, SubmitOtpBody, VerifyData};

/// Failure to obtain a decodable Paystack envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Paystack unavailable (HTTP {status})")]
    Unavailable { status: u16 },

    #[error("undecodable Paystack response (HTTP {status}): {detail}")]
    Decode { status: u16, detail: String },

    #[error("reference `{0}` contains characters not allowed in a URL path")]
    InvalidReference(String),
}

impl ApiError {
    /// Normalized rejection reason for this failure.
    pub fn rejection_reason(&self) -> &'static str {
        match self {
            ApiError::Transport(_) | ApiError::Unavailable { .. } => GATEWAY_UNREACHABLE,
            ApiError::Decode { .. } | ApiError::InvalidReference(_) => INVALID_GATEWAY_RESPONSE,
        }
    }
}

impl From<ApiError> for PaychannelError {
    fn from(err: ApiError) -> Self {
        PaychannelError::Gateway {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// HTTP client for Paystack.
#[derive(Debug, Clone)]
pub struct PaystackClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl PaystackClient {
    /// Creates a client authenticating with `secret_key` against `base_url`.
    pub fn new(
        secret_key: &SecretString,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, PaychannelError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", secret_key.expose_secret()))
            .map_err(|e| PaychannelError::Config(format!("invalid Paystack secret key: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("authorization", auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| PaychannelError::Gateway {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    /// `POST /charge`.
    pub async fn charge(&self, body: &ChargeBody) -> Result<Envelope<ChargeData>, ApiError> {
        let url = format!("{}/charge", self.base_url);
        self.send(self.client.post(url).json(body)).await
    }

    /// `POST /charge/submit_otp`.
    pub async fn submit_otp(&self, body: &SubmitOtpBody) -> Result<Envelope<ChargeData>, ApiError> {
        let url = format!("{}/charge/submit_otp", self.base_url);
        self.send(self.client.post(url).json(body)).await
    }

    /// `GET /transaction/verify/{reference}`, retried once on transient errors.
    pub async fn verify(&self, reference: &str) -> Result<Envelope<VerifyData>, ApiError> {
        if !is_path_safe(reference) {
            return Err(ApiError::InvalidReference(reference.to_string()));
        }
        let url = format!("{}/transaction/verify/{reference}", self.base_url);

        let mut attempt = 0;
        loop {
            match self.send(self.client.get(&url)).await {
                Err(err @ ApiError::Unavailable { .. }) | Err(err @ ApiError::Transport(_))
                    if attempt < self.max_retries =>
                {
                    attempt += 1;
                    warn!(error = %err, attempt, "retrying verification after transient error");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                result => return result,
            }
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Envelope<T>, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = %status, "Paystack response received");

        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if is_transient_error(status) => Err(ApiError::Unavailable {
                status: status.as_u16(),
            }),
            Err(e) => Err(ApiError::Decode {
                status: status.as_u16(),
                detail: e.to_string(),
            }),
        }
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

fn is_path_safe(reference: &str) -> bool {
    !reference.is_empty()
        && reference
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}
