// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PaySwitch wire types.

use paychannel_core::types::{ChargeResult, MobileNetwork};
use serde::de::IntoDeserializer;
use serde::{Deserialize, Serialize};

/// Processing code for a mobile-money debit.
pub const PROCESSING_CODE: &str = "000200";

/// Width of the zero-padded `amount` field.
pub const AMOUNT_WIDTH: usize = 12;

/// Description used when the charge metadata carries none.
pub const DEFAULT_DESCRIPTION: &str = "Mobile Money Payment";

/// `r-switch` code for a network, or `None` when PaySwitch does not route it.
pub fn switch_code(network: MobileNetwork) -> Option<&'static str> {
    match network {
        MobileNetwork::Mtn => Some("MTN"),
        MobileNetwork::AirtelTigo => Some("ATL"),
        MobileNetwork::Telecel => Some("VDF"),
        _ => None,
    }
}

/// Body of `POST /transaction/process`.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessBody {
    pub amount: String,
    pub processing_code: &'static str,
    pub transaction_id: String,
    pub desc: String,
    pub merchant_id: String,
    pub subscriber_number: String,
    #[serde(rename = "r-switch")]
    pub r_switch: &'static str,
    pub customer_email: String,
}

/// Outcome PaySwitch reports for a process call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Approved,
    Declined,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response of `POST /transaction/process`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessResponse {
    #[serde(default, deserialize_with = "process_status")]
    pub status: ProcessStatus,
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// PaySwitch sends some fields as numbers or strings depending on the route.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Status names arrive in mixed case (`Approved`, `approved`).
fn process_status<'de, D>(deserializer: D) -> Result<ProcessStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = lenient_string(deserializer)?.trim().to_ascii_lowercase();
    ProcessStatus::deserialize(raw.as_str().into_deserializer())
        .map_err(|e: serde::de::value::Error| serde::de::Error::custom(e))
}

/// `approved` is accepted, `declined` is a decline, anything else is a failure.
pub fn map_process(response: &ProcessResponse) -> ChargeResult {
    match response.status {
        ProcessStatus::Approved => ChargeResult::Approved,
        ProcessStatus::Declined => ChargeResult::rejected("Payment declined"),
        ProcessStatus::Unknown => ChargeResult::rejected("Payment failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: serde_json::Value) -> ProcessResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn status_mapping_is_case_insensitive() {
        let ok = response(serde_json::json!({"status": "Approved", "code": "000"}));
        assert_eq!(ok.status, ProcessStatus::Approved);
        assert_eq!(map_process(&ok), ChargeResult::Approved);

        let declined = response(serde_json::json!({"status": "declined", "code": 100}));
        assert_eq!(declined.code, "100");
        assert_eq!(map_process(&declined), ChargeResult::rejected("Payment declined"));

        let other = response(serde_json::json!({"status": "vbv required"}));
        assert_eq!(other.status, ProcessStatus::Unknown);
        assert_eq!(map_process(&other), ChargeResult::rejected("Payment failed"));

        let padded = response(serde_json::json!({"status": " DECLINED "}));
        assert_eq!(padded.status, ProcessStatus::Declined);

        let null = response(serde_json::json!({"status": null}));
        assert_eq!(null.status, ProcessStatus::Unknown);

        let empty = response(serde_json::json!({}));
        assert_eq!(map_process(&empty), ChargeResult::rejected("Payment failed"));
    }

    #[test]
    fn only_ghana_networks_route() {
        assert_eq!(switch_code(MobileNetwork::Telecel), Some("VDF"));
        assert_eq!(switch_code(MobileNetwork::AirtelTigo), Some("ATL"));
        assert_eq!(switch_code(MobileNetwork::Mpesa), None);
    }

    #[test]
    fn body_uses_hyphenated_switch_key() {
        let body = ProcessBody {
            amount: "000000005000".into(),
            processing_code: PROCESSING_CODE,
            transaction_id: "PAY-1".into(),
            desc: DEFAULT_DESCRIPTION.into(),
            merchant_id: "TTM-1".into(),
            subscriber_number: "233241234567".into(),
            r_switch: "MTN",
            customer_email: "a@b.com".into(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["r-switch"], "MTN");
        assert_eq!(json["processing_code"], "000200");
    }
}
