// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `paychannel channel` and `paychannel payment` command implementations.
//!
//! These run against the database directly; `serve` does not need to be
//! running.

use paychannel_config::model::PaychannelConfig;
use paychannel_core::money::display_amount;
use paychannel_core::traits::PaymentLedger;
use paychannel_core::types::{NewChannel, PaymentAttempt, PaymentStatus};
use paychannel_core::{PaychannelError, PluginAdapter, StorageAdapter};
use paychannel_engine::PaymentVerifier;
use rust_decimal::Decimal;

use crate::serve::{build_money_gateway, open_storage};

/// Run the `paychannel channel add` command.
pub async fn add_channel(
    config: &PaychannelConfig,
    name: String,
    amount: Decimal,
    currency: String,
    ussd_enabled: bool,
) -> Result<(), PaychannelError> {
    if amount <= Decimal::ZERO {
        return Err(PaychannelError::InvalidAmount(format!(
            "channel amount must be positive, got {amount}"
        )));
    }
    let storage = open_storage(config).await?;
    let channel = storage
        .create_channel(NewChannel {
            name,
            amount,
            currency: currency.to_uppercase(),
            ussd_enabled,
            paylink_enabled: true,
        })
        .await?;
    storage.close().await?;

    println!(
        "created channel {} ({}) code={} amount={} {}",
        channel.name,
        channel.id,
        channel.ussd_code,
        display_amount(channel.amount),
        channel.currency
    );
    Ok(())
}

/// Run the `paychannel channel list` command.
pub async fn list_channels(config: &PaychannelConfig) -> Result<(), PaychannelError> {
    let storage = open_storage(config).await?;
    let channels = storage.list_channels().await?;

    if channels.is_empty() {
        println!("no channels");
    }
    for channel in &channels {
        let totals = storage.channel_totals(&channel.id).await?;
        println!(
            "{:>4}  {:<32} {:>10} {}  ussd={:<3} payments={} ussd_total={} paylink_total={}",
            channel.ussd_code,
            channel.name,
            display_amount(channel.amount),
            channel.currency,
            if channel.ussd_enabled { "on" } else { "off" },
            totals.payments_count,
            display_amount(totals.ussd_amount),
            display_amount(totals.paylink_amount),
        );
    }
    storage.close().await
}

/// Run `paychannel channel enable|disable`.
pub async fn set_ussd(
    config: &PaychannelConfig,
    code: &str,
    enabled: bool,
) -> Result<(), PaychannelError> {
    let storage = open_storage(config).await?;
    let found = storage.set_ussd_enabled(code, enabled).await?;
    storage.close().await?;

    if !found {
        return Err(PaychannelError::ChannelNotFound {
            id: format!("code {code}"),
        });
    }
    println!(
        "channel {code}: ussd {}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Run the `paychannel payment list` command.
pub async fn list_payments(
    config: &PaychannelConfig,
    status: Option<PaymentStatus>,
    limit: usize,
) -> Result<(), PaychannelError> {
    let storage = open_storage(config).await?;
    let payments = storage.list_payments(status, limit).await?;
    storage.close().await?;

    if payments.is_empty() {
        println!("no payments");
    }
    for payment in &payments {
        println!("{}", summary_line(payment));
    }
    Ok(())
}

/// Run the `paychannel payment show` command.
pub async fn show_payment(config: &PaychannelConfig, reference: &str) -> Result<(), PaychannelError> {
    let storage = open_storage(config).await?;
    let payment = storage.get_payment(reference).await?;
    storage.close().await?;

    let payment = payment.ok_or_else(|| PaychannelError::PaymentNotFound {
        reference: reference.to_string(),
    })?;
    print_json(&payment)
}

/// Run the `paychannel payment verify` command.
pub async fn verify_payment(
    config: &PaychannelConfig,
    reference: &str,
) -> Result<(), PaychannelError> {
    let storage = open_storage(config).await?;
    let gateway = build_money_gateway(config)?;
    let verifier = PaymentVerifier::new(storage.clone(), gateway.clone());

    let report = verifier.verify(reference).await;
    gateway.shutdown().await?;
    storage.close().await?;

    print_json(&report?)
}

fn summary_line(payment: &PaymentAttempt) -> String {
    let mut line = format!(
        "{}  {:<9} {:>10} {}  {}  {}",
        payment.reference,
        payment.status.to_string(),
        display_amount(payment.amount),
        payment.currency,
        payment.channel_type,
        payment.created_at,
    );
    if let Some(reason) = &payment.gateway_response {
        line.push_str("  ");
        line.push_str(reason);
    }
    line
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), PaychannelError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| PaychannelError::Internal(format!("failed to render JSON: {e}")))?;
    println!("{rendered}");
    Ok(())
}
