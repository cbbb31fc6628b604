// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Paystack wire types and the tables that map provider statuses onto
//! normalized gateway outcomes.

use paychannel_core::types::{
    ChargeResult, GatewayTransactionStatus, MobileNetwork, OtpResult,
};
use serde::{Deserialize, Serialize};

/// Paystack `mobile_money.provider` code for a network.
pub fn provider_code(network: MobileNetwork) -> &'static str {
    match network {
        MobileNetwork::Mtn => "mtn",
        MobileNetwork::AirtelTigo => "atl",
        MobileNetwork::Telecel => "vod",
        MobileNetwork::Mpesa => "mpesa",
        MobileNetwork::MpesaOffline => "mpesa_offline",
        MobileNetwork::MpesaTill => "mptill",
        MobileNetwork::Orange => "orange",
        MobileNetwork::Wave => "wave",
    }
}

/// Body of `POST /charge`.
#[derive(Debug, Clone, Serialize)]
pub struct ChargeBody {
    pub email: String,
    /// Minor units (pesewas, cents).
    pub amount: i64,
    pub currency: String,
    pub mobile_money: MobileMoney,
    pub reference: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct MobileMoney {
    pub phone: String,
    pub provider: &'static str,
}

/// Body of `POST /charge/submit_otp`.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOtpBody {
    pub otp: String,
    pub reference: String,
}

/// Every Paystack response is wrapped in this envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

/// `data` of charge and submit-otp responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeData {
    #[serde(default)]
    pub status: ChargeStatus,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub display_text: Option<String>,
    #[serde(default)]
    pub gateway_response: Option<String>,
}

/// Next-action statuses Paystack returns from the charge endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    Success,
    SendOtp,
    SendPin,
    SendPhone,
    SendBirthday,
    SendAddress,
    OpenUrl,
    PayOffline,
    Pending,
    Ongoing,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

/// `data` of `GET /transaction/verify/{reference}`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyData {
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub gateway_response: Option<String>,
}

/// Transaction states reported by verification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Success,
    Failed,
    Abandoned,
    Reversed,
    Ongoing,
    Pending,
    Processing,
    Queued,
    #[default]
    #[serde(other)]
    Unknown,
}

fn reason_from(data: &ChargeData, message: &str, fallback: &str) -> String {
    data.gateway_response
        .as_deref()
        .or(data.display_text.as_deref())
        .filter(|s| !s.trim().is_empty())
        .or(Some(message).filter(|s| !s.trim().is_empty()))
        .unwrap_or(fallback)
        .to_string()
}

/// Charge mapping table.
///
/// | envelope | data.status | outcome |
/// |---|---|---|
/// | `false` | any | Rejected(message) |
/// | `true` | `send_otp` | OtpRequired |
/// | `true` | `failed` | Rejected(gateway_response) |
/// | `true` | `send_pin`, `send_phone`, `send_birthday`, `send_address`, `open_url` | Rejected (step cannot be completed over USSD) |
/// | `true` | `success`, `pay_offline`, `pending`, `ongoing`, unknown | Approved |
pub fn map_charge(envelope: &Envelope<ChargeData>) -> ChargeResult {
    if !envelope.status {
        return ChargeResult::rejected(non_empty_or(&envelope.message, "charge declined"));
    }
    let Some(data) = envelope.data.as_ref() else {
        return ChargeResult::Approved;
    };
    match data.status {
        ChargeStatus::SendOtp => ChargeResult::OtpRequired,
        ChargeStatus::Failed => {
            ChargeResult::rejected(reason_from(data, &envelope.message, "charge failed"))
        }
        ChargeStatus::SendPin
        | ChargeStatus::SendPhone
        | ChargeStatus::SendBirthday
        | ChargeStatus::SendAddress
        | ChargeStatus::OpenUrl => ChargeResult::rejected("unsupported authorization step"),
        ChargeStatus::Success
        | ChargeStatus::PayOffline
        | ChargeStatus::Pending
        | ChargeStatus::Ongoing
        | ChargeStatus::Unknown => ChargeResult::Approved,
    }
}

/// OTP mapping table.
///
/// | envelope | data.status | outcome |
/// |---|---|---|
/// | `false` | any | Rejected(message) |
/// | `true` | `failed`, `send_otp` | Rejected |
/// | `true` | `success` | Accepted |
/// | `true` | `pay_offline`, `pending`, `ongoing`, unknown, missing data | Requery |
pub fn map_otp(envelope: &Envelope<ChargeData>) -> OtpResult {
    if !envelope.status {
        return OtpResult::rejected(non_empty_or(&envelope.message, "otp rejected"));
    }
    let Some(data) = envelope.data.as_ref() else {
        return OtpResult::Requery;
    };
    match data.status {
        ChargeStatus::Success => OtpResult::Accepted,
        ChargeStatus::Failed => {
            OtpResult::rejected(reason_from(data, &envelope.message, "otp rejected"))
        }
        ChargeStatus::SendOtp => OtpResult::rejected("otp not accepted"),
        ChargeStatus::SendPin
        | ChargeStatus::SendPhone
        | ChargeStatus::SendBirthday
        | ChargeStatus::SendAddress
        | ChargeStatus::OpenUrl
        | ChargeStatus::PayOffline
        | ChargeStatus::Pending
        | ChargeStatus::Ongoing
        | ChargeStatus::Unknown => OtpResult::Requery,
    }
}

/// Verification mapping table: in-flight and unknown states stay pending.
pub fn map_transaction_status(status: TransactionStatus) -> GatewayTransactionStatus {
    match status {
        TransactionStatus::Success => GatewayTransactionStatus::Success,
        TransactionStatus::Failed => GatewayTransactionStatus::Failed,
        TransactionStatus::Abandoned => GatewayTransactionStatus::Abandoned,
        TransactionStatus::Reversed => GatewayTransactionStatus::Reversed,
        TransactionStatus::Ongoing
        | TransactionStatus::Pending
        | TransactionStatus::Processing
        | TransactionStatus::Queued
        | TransactionStatus::Unknown => GatewayTransactionStatus::Pending,
    }
}

fn non_empty_or(message: &str, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message.to_string()
    }
}
