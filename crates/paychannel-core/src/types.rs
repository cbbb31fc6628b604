// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the directory, ledger, gateway and dialogue layers.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

impl HealthStatus {
    /// Short lowercase label used in health responses.
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded(_) => "degraded",
            HealthStatus::Unhealthy(_) => "unhealthy",
        }
    }
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    MoneyGateway,
}

// --- Channels ---

/// A merchant's reusable payment collection point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Fixed amount charged per payment, two decimal places.
    pub amount: Decimal,
    pub currency: String,
    /// Decimal short code dialled as the last `*` segment.
    pub ussd_code: String,
    pub ussd_enabled: bool,
    pub paylink_enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for registering a new channel. The short code is assigned by storage.
#[derive(Debug, Clone)]
pub struct NewChannel {
    pub name: String,
    pub amount: Decimal,
    pub currency: String,
    pub ussd_enabled: bool,
    pub paylink_enabled: bool,
}

/// Aggregates over a channel's payment attempts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelTotals {
    pub payments_count: u64,
    pub ussd_amount: Decimal,
    pub paylink_amount: Decimal,
}

// --- Payments ---

/// Lifecycle status of a payment attempt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Abandoned,
    Reversed,
}

impl PaymentStatus {
    /// Whether the status is final from the engine's point of view.
    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    /// Whether moving from `self` to `next` keeps the ledger monotone.
    ///
    /// Pending may move anywhere, success may only be reversed, and
    /// re-applying the current status is always allowed (it is a no-op).
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        match (self, next) {
            (PaymentStatus::Pending, _) => true,
            (PaymentStatus::Success, PaymentStatus::Reversed) => true,
            (current, next) => current == next,
        }
    }
}

/// Surface the payment was initiated from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Ussd,
    Paylink,
}

/// Payment instrument.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChargeMethod {
    Momo,
    Card,
}

/// A durable record of one charge initiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAttempt {
    pub reference: String,
    pub channel_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub phone_number: String,
    pub channel_type: ChannelType,
    pub charge_type: ChargeMethod,
    pub status: PaymentStatus,
    /// Raw provider text or normalized rejection reason, if any.
    pub gateway_response: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for recording a new pending payment attempt.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub reference: String,
    pub channel_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub phone_number: String,
    pub channel_type: ChannelType,
    pub charge_type: ChargeMethod,
}

/// Outcome of a ledger status update.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusChange {
    /// The row was written.
    Applied(PaymentAttempt),
    /// The row already carried a terminal status equal to the requested one.
    Unchanged(PaymentAttempt),
}

impl StatusChange {
    pub fn payment(&self) -> &PaymentAttempt {
        match self {
            StatusChange::Applied(p) | StatusChange::Unchanged(p) => p,
        }
    }

    pub fn into_payment(self) -> PaymentAttempt {
        match self {
            StatusChange::Applied(p) | StatusChange::Unchanged(p) => p,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, StatusChange::Applied(_))
    }
}

// --- Money gateway ---

/// Mobile-money networks a payer can be charged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MobileNetwork {
    Mtn,
    AirtelTigo,
    Telecel,
    Mpesa,
    MpesaOffline,
    MpesaTill,
    Orange,
    Wave,
}

impl MobileNetwork {
    /// Maps the free-form `network` field sent by USSD aggregators.
    ///
    /// Returns `None` for names no provider table knows about.
    pub fn from_ussd_network(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        let network = match normalized.as_str() {
            "mtn" => MobileNetwork::Mtn,
            "airteltigo" | "airtel" | "tigo" | "at" | "atl" | "atmoneyairtel" => {
                MobileNetwork::AirtelTigo
            }
            "telecel" | "vodafone" | "vod" | "vdf" => MobileNetwork::Telecel,
            "mpesa" => MobileNetwork::Mpesa,
            "mpesaoffline" => MobileNetwork::MpesaOffline,
            "mpesatill" => MobileNetwork::MpesaTill,
            "orange" => MobileNetwork::Orange,
            "wave" => MobileNetwork::Wave,
            _ => return None,
        };
        Some(network)
    }
}

/// Everything a provider needs to start a mobile-money charge.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub email: String,
    pub amount: Decimal,
    pub currency: String,
    pub network: MobileNetwork,
    pub phone: String,
    pub reference: String,
    pub metadata: serde_json::Value,
}

/// Normalized outcome of a charge initiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeResult {
    /// Charge accepted; the payer approves on the handset.
    Approved,
    /// The provider needs a one-time password before proceeding.
    OtpRequired,
    /// Declined by the provider or not deliverable.
    Rejected { reason: String },
}

impl ChargeResult {
    pub fn rejected(reason: impl Into<String>) -> Self {
        ChargeResult::Rejected {
            reason: reason.into(),
        }
    }
}

/// Normalized outcome of an OTP submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpResult {
    Accepted,
    Rejected { reason: String },
    /// Provider accepted the OTP but the final state is not known yet.
    Requery,
}

impl OtpResult {
    pub fn rejected(reason: impl Into<String>) -> Self {
        OtpResult::Rejected {
            reason: reason.into(),
        }
    }
}

/// Provider-side transaction state returned by verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum GatewayTransactionStatus {
    Success,
    Failed,
    Abandoned,
    Reversed,
    Pending,
}

/// What the provider reported when asked about a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayVerification {
    pub status: GatewayTransactionStatus,
    /// Provider's own wording of the outcome, kept on the ledger row.
    pub gateway_response: Option<String>,
}

impl GatewayVerification {
    pub fn new(status: GatewayTransactionStatus, gateway_response: Option<String>) -> Self {
        Self {
            status,
            gateway_response,
        }
    }
}

impl From<GatewayTransactionStatus> for PaymentStatus {
    fn from(status: GatewayTransactionStatus) -> Self {
        match status {
            GatewayTransactionStatus::Success => PaymentStatus::Success,
            GatewayTransactionStatus::Failed => PaymentStatus::Failed,
            GatewayTransactionStatus::Abandoned => PaymentStatus::Abandoned,
            GatewayTransactionStatus::Reversed => PaymentStatus::Reversed,
            GatewayTransactionStatus::Pending => PaymentStatus::Pending,
        }
    }
}

// --- USSD wire types ---

fn default_network() -> String {
    "mtn".to_string()
}

/// Treats an explicit `null` like an absent field.
fn deserialize_text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_network<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_network))
}

/// Accepts a JSON boolean or a `"true"`/`"false"` string.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid newSession value `{other}`"
            ))),
        },
    }
}

/// One inbound event from the USSD aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UssdRequest {
    #[serde(rename = "sessionID")]
    pub session_id: String,
    pub msisdn: String,
    #[serde(
        rename = "userData",
        default,
        deserialize_with = "deserialize_text_or_empty"
    )]
    pub user_data: String,
    #[serde(default = "default_network", deserialize_with = "deserialize_network")]
    pub network: String,
    #[serde(rename = "userID", default)]
    pub user_id: String,
    #[serde(rename = "newSession", default, deserialize_with = "deserialize_flag")]
    pub new_session: bool,
}

/// The single prompt returned for an inbound event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UssdResponse {
    #[serde(rename = "sessionID")]
    pub session_id: String,
    pub message: String,
    #[serde(rename = "continueSession")]
    pub continue_session: bool,
    pub msisdn: String,
}

impl UssdResponse {
    /// Prompt that keeps the USSD session open for another turn.
    pub fn prompt(request: &UssdRequest, message: impl Into<String>) -> Self {
        Self {
            session_id: request.session_id.clone(),
            message: message.into(),
            continue_session: true,
            msisdn: request.msisdn.clone(),
        }
    }

    /// Final message; the handset closes the session.
    pub fn end(request: &UssdRequest, message: impl Into<String>) -> Self {
        Self {
            session_id: request.session_id.clone(),
            message: message.into(),
            continue_session: false,
            msisdn: request.msisdn.clone(),
        }
    }
}
