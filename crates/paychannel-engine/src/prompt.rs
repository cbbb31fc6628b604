// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handset-facing message texts.

use paychannel_core::money::display_amount;
use paychannel_core::types::Channel;

pub const INVALID_FORMAT: &str = "Invalid USSD format";
pub const INVALID_CHANNEL: &str = "Invalid payment channel";
pub const SESSION_EXPIRED: &str = "Session expired. Dial again.";
pub const INVALID_OPTION: &str = "Invalid option\n1. Confirm\n2. Cancel";
pub const CANCELLED: &str = "Transaction cancelled.";
pub const ENTER_OTP: &str = "Enter the OTP sent to your phone:";
pub const INVALID_OTP: &str = "Invalid OTP. Enter the OTP sent to your phone:";
pub const OTP_SUBMITTED: &str = "OTP submitted successfully. Await payment confirmation.";
pub const OTP_FAILED: &str = "OTP verification failed. Transaction cancelled.";
pub const PAYMENT_INITIATED: &str = "Payment initiated. Approve on your phone.";
pub const PAYMENT_FAILED: &str = "Payment failed. Try again later.";
pub const SERVICE_UNAVAILABLE: &str = "Service unavailable. Try again later.";

/// Confirmation menu shown after a successful dial.
pub fn confirmation(channel: &Channel) -> String {
    format!(
        "{}\nAmount: {} {}\n1. Confirm\n2. Cancel",
        channel.name,
        channel.currency,
        display_amount(channel.amount)
    )
}
