// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! USSD dialogue state machine.
//!
//! A session moves through: (no session) -> AwaitingConfirmation ->
//! AwaitingOtp -> (deleted). Every inbound event produces exactly one
//! response. A pending ledger row is always written before the money gateway
//! is asked to charge, and the engine never waits for final confirmation.

use std::sync::Arc;
use std::time::Duration;

use paychannel_config::model::UssdConfig;
use paychannel_core::error::PaychannelError;
use paychannel_core::reference::generate_reference;
use paychannel_core::traits::gateway::{GATEWAY_UNREACHABLE, is_inconclusive_rejection};
use paychannel_core::traits::{ChannelDirectory, MoneyGateway, PaymentLedger};
use paychannel_core::types::{
    Channel, ChannelType, ChargeMethod, ChargeRequest, ChargeResult, MobileNetwork, NewPayment,
    OtpResult, PaymentStatus, UssdRequest, UssdResponse,
};
use tracing::{debug, error, info, warn};

use crate::dial;
use crate::prompt;
use crate::session::{DialogueSession, DialogueState, SessionStore};
use crate::turns::TurnLocks;

/// Tunables for the dialogue engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Upper bound on one money-gateway call inside a turn.
    pub gateway_timeout: Duration,
    /// Network charged when the event names one no provider knows.
    pub default_network: MobileNetwork,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            gateway_timeout: Duration::from_secs(8),
            default_network: MobileNetwork::Mtn,
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &UssdConfig) -> Result<Self, PaychannelError> {
        let default_network = MobileNetwork::from_ussd_network(&config.default_network)
            .ok_or_else(|| {
                PaychannelError::Config(format!(
                    "unknown ussd.default_network `{}`",
                    config.default_network
                ))
            })?;
        Ok(Self {
            gateway_timeout: Duration::from_secs(config.gateway_timeout_secs),
            default_network,
        })
    }
}

/// Masks a phone number for logging, keeping the last four digits.
pub(crate) fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    let keep = chars.len().min(4);
    let hidden = chars.len() - keep;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{tail}", "*".repeat(hidden))
}

/// Handles inbound USSD events.
pub struct DialogueEngine {
    directory: Arc<dyn ChannelDirectory>,
    ledger: Arc<dyn PaymentLedger>,
    gateway: Arc<dyn MoneyGateway>,
    sessions: Arc<dyn SessionStore>,
    turns: TurnLocks,
    settings: EngineSettings,
}

impl DialogueEngine {
    pub fn new(
        directory: Arc<dyn ChannelDirectory>,
        ledger: Arc<dyn PaymentLedger>,
        gateway: Arc<dyn MoneyGateway>,
        sessions: Arc<dyn SessionStore>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            directory,
            ledger,
            gateway,
            sessions,
            turns: TurnLocks::new(),
            settings,
        }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Processes one event and returns the single response for it.
    pub async fn handle(&self, request: &UssdRequest) -> UssdResponse {
        let _turn = self.turns.acquire(&request.session_id).await;
        debug!(
            session_id = %request.session_id,
            msisdn = %mask_phone(&request.msisdn),
            new_session = request.new_session,
            "USSD turn"
        );

        let outcome = if request.new_session {
            self.start(request).await
        } else {
            self.resume(request).await
        };

        match outcome {
            Ok(response) => response,
            Err(e) => {
                error!(session_id = %request.session_id, error = %e, "USSD turn aborted");
                if let Err(e) = self.sessions.delete(&request.session_id).await {
                    warn!(session_id = %request.session_id, error = %e, "failed to drop session");
                }
                UssdResponse::end(request, prompt::SERVICE_UNAVAILABLE)
            }
        }
    }

    async fn start(&self, request: &UssdRequest) -> Result<UssdResponse, PaychannelError> {
        let Some(code) = dial::channel_code(&request.user_data) else {
            return Ok(UssdResponse::end(request, prompt::INVALID_FORMAT));
        };
        let Some(channel) = self.directory.lookup_by_code(code, true).await? else {
            debug!(code, "unknown or disabled channel code");
            return Ok(UssdResponse::end(request, prompt::INVALID_CHANNEL));
        };

        self.sessions
            .create(&request.session_id, DialogueSession::new(channel.id.clone()))
            .await?;
        info!(session_id = %request.session_id, channel = %channel.name, code, "session started");
        Ok(UssdResponse::prompt(request, prompt::confirmation(&channel)))
    }

    async fn resume(&self, request: &UssdRequest) -> Result<UssdResponse, PaychannelError> {
        let Some(session) = self.sessions.get(&request.session_id).await? else {
            return Ok(UssdResponse::end(request, prompt::SESSION_EXPIRED));
        };
        let input = request.user_data.trim();

        match session.state {
            DialogueState::AwaitingOtp { reference } => {
                self.submit_otp(request, input, &reference).await
            }
            DialogueState::AwaitingConfirmation => match input {
                "1" => self.confirm(request, &session.channel_id).await,
                "2" => {
                    self.sessions.delete(&request.session_id).await?;
                    info!(session_id = %request.session_id, "payment cancelled by payer");
                    Ok(UssdResponse::end(request, prompt::CANCELLED))
                }
                _ => Ok(UssdResponse::prompt(request, prompt::INVALID_OPTION)),
            },
        }
    }

    async fn confirm(
        &self,
        request: &UssdRequest,
        channel_id: &str,
    ) -> Result<UssdResponse, PaychannelError> {
        let channel = self
            .directory
            .get_channel(channel_id)
            .await?
            .ok_or_else(|| PaychannelError::ChannelNotFound {
                id: channel_id.to_string(),
            })?;

        let reference = generate_reference();
        self.ledger
            .create_pending(NewPayment {
                reference: reference.clone(),
                channel_id: channel.id.clone(),
                amount: channel.amount,
                currency: channel.currency.clone(),
                phone_number: request.msisdn.clone(),
                channel_type: ChannelType::Ussd,
                charge_type: ChargeMethod::Momo,
            })
            .await?;

        let charge = self.charge_request(request, &channel, &reference);
        let result = match tokio::time::timeout(
            self.settings.gateway_timeout,
            self.gateway.initiate_charge(charge),
        )
        .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(e)) if e.is_input_error() => ChargeResult::rejected(e.to_string()),
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                warn!(reference = %reference, timeout = ?self.settings.gateway_timeout, "charge timed out");
                ChargeResult::rejected(GATEWAY_UNREACHABLE)
            }
        };

        match result {
            ChargeResult::OtpRequired => {
                self.await_otp(request, &channel, reference).await?;
                Ok(UssdResponse::prompt(request, prompt::ENTER_OTP))
            }
            ChargeResult::Approved => {
                self.sessions.delete(&request.session_id).await?;
                info!(reference = %reference, channel = %channel.name, "charge initiated");
                Ok(UssdResponse::end(request, prompt::PAYMENT_INITIATED))
            }
            ChargeResult::Rejected { reason } => {
                warn!(reference = %reference, reason = %reason, "charge rejected");
                if let Err(e) = self
                    .ledger
                    .update_status(&reference, PaymentStatus::Pending, Some(reason))
                    .await
                {
                    warn!(reference = %reference, error = %e, "failed to record rejection");
                }
                self.sessions.delete(&request.session_id).await?;
                Ok(UssdResponse::end(request, prompt::PAYMENT_FAILED))
            }
        }
    }

    async fn await_otp(
        &self,
        request: &UssdRequest,
        channel: &Channel,
        reference: String,
    ) -> Result<(), PaychannelError> {
        let next = reference.clone();
        let updated = self
            .sessions
            .update(
                &request.session_id,
                Box::new(move |s| s.state = DialogueState::AwaitingOtp { reference: next }),
            )
            .await?;
        if updated.is_none() {
            // Expired while the gateway call was in flight.
            self.sessions
                .create(
                    &request.session_id,
                    DialogueSession {
                        channel_id: channel.id.clone(),
                        state: DialogueState::AwaitingOtp {
                            reference: reference.clone(),
                        },
                    },
                )
                .await?;
        }
        info!(reference = %reference, "charge awaiting OTP");
        Ok(())
    }

    async fn submit_otp(
        &self,
        request: &UssdRequest,
        otp: &str,
        reference: &str,
    ) -> Result<UssdResponse, PaychannelError> {
        if otp.is_empty() || !otp.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(UssdResponse::prompt(request, prompt::INVALID_OTP));
        }

        let result = tokio::time::timeout(
            self.settings.gateway_timeout,
            self.gateway.submit_otp(otp, reference),
        )
        .await
        .unwrap_or_else(|_| {
            warn!(reference, "OTP submission timed out");
            OtpResult::rejected(GATEWAY_UNREACHABLE)
        });

        self.sessions.delete(&request.session_id).await?;
        match result {
            OtpResult::Accepted | OtpResult::Requery => {
                info!(reference, outcome = ?result, "OTP submitted");
                Ok(UssdResponse::end(request, prompt::OTP_SUBMITTED))
            }
            OtpResult::Rejected { reason } => {
                // A fault leaves the row pending: the provider may have taken the OTP.
                let status = if is_inconclusive_rejection(&reason) {
                    PaymentStatus::Pending
                } else {
                    PaymentStatus::Failed
                };
                warn!(reference, reason = %reason, status = %status, "OTP rejected");
                if let Err(e) = self
                    .ledger
                    .update_status(reference, status, Some(reason))
                    .await
                {
                    warn!(reference, error = %e, "failed to record OTP rejection");
                }
                Ok(UssdResponse::end(request, prompt::OTP_FAILED))
            }
        }
    }

    fn charge_request(&self, request: &UssdRequest, channel: &Channel, reference: &str) -> ChargeRequest {
        let network = MobileNetwork::from_ussd_network(&request.network)
            .unwrap_or(self.settings.default_network);
        let network_name = match request.network.trim() {
            "" => self.settings.default_network.to_string(),
            raw => raw.to_ascii_lowercase(),
        };
        ChargeRequest {
            email: format!("{}-{}@{}.com", request.msisdn, request.user_id, network_name),
            amount: channel.amount,
            currency: channel.currency.clone(),
            network,
            phone: request.msisdn.clone(),
            reference: reference.to_string(),
            metadata: serde_json::json!({
                "source": "ussd",
                "channel": channel.name,
            }),
        }
    }
}
