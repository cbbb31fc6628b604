// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment ledger operations.
//!
//! Status updates read the current row and write the new status inside one
//! `BEGIN IMMEDIATE` transaction, so an OTP outcome and a verification result
//! racing on the same reference are applied one after the other and the
//! transition check always sees the latest status.

use std::str::FromStr;

use paychannel_core::PaychannelError;
use paychannel_core::types::{NewPayment, PaymentAttempt, PaymentStatus, StatusChange};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::database::Database;
use crate::queries::channels::parse_decimal;

const PAYMENT_COLUMNS: &str = "reference, channel_id, amount, currency, phone_number, \
                               channel_type, charge_type, status, gateway_response, \
                               created_at, updated_at";

fn parse_enum<T>(idx: usize, raw: &str) -> Result<T, rusqlite::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_payment(row: &rusqlite::Row<'_>) -> Result<PaymentAttempt, rusqlite::Error> {
    let amount: String = row.get(2)?;
    let channel_type: String = row.get(5)?;
    let charge_type: String = row.get(6)?;
    let status: String = row.get(7)?;
    Ok(PaymentAttempt {
        reference: row.get(0)?,
        channel_id: row.get(1)?,
        amount: parse_decimal(2, &amount)?,
        currency: row.get(3)?,
        phone_number: row.get(4)?,
        channel_type: parse_enum(5, &channel_type)?,
        charge_type: parse_enum(6, &charge_type)?,
        status: parse_enum(7, &status)?,
        gateway_response: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn select_payment(
    conn: &rusqlite::Connection,
    reference: &str,
) -> Result<Option<PaymentAttempt>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE reference = ?1"),
        params![reference],
        row_to_payment,
    )
    .optional()
}

/// Record a new attempt with status `pending`.
pub async fn create_pending(
    db: &Database,
    payment: NewPayment,
) -> Result<PaymentAttempt, PaychannelError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO payments (reference, channel_id, amount, currency, phone_number, channel_type, charge_type, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'pending')",
                params![
                    payment.reference,
                    payment.channel_id,
                    payment.amount.to_string(),
                    payment.currency,
                    payment.phone_number,
                    payment.channel_type.to_string(),
                    payment.charge_type.to_string(),
                ],
            )?;
            select_payment(conn, &payment.reference)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get an attempt by reference.
pub async fn get_payment(
    db: &Database,
    reference: &str,
) -> Result<Option<PaymentAttempt>, PaychannelError> {
    let reference = reference.to_string();
    db.connection()
        .call(move |conn| select_payment(conn, &reference))
        .await
        .map_err(crate::database::map_tr_err)
}

/// List attempts, newest first, optionally filtered by status.
pub async fn list_payments(
    db: &Database,
    status: Option<PaymentStatus>,
    limit: usize,
) -> Result<Vec<PaymentAttempt>, PaychannelError> {
    let status = status.map(|s| s.to_string());
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PAYMENT_COLUMNS} FROM payments
                 WHERE (?1 IS NULL OR status = ?1)
                 ORDER BY created_at DESC, reference DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![status, limit], row_to_payment)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

enum UpdateOutcome {
    Missing,
    Illegal(PaymentStatus),
    Unchanged(PaymentAttempt),
    Applied(PaymentAttempt),
}

/// Move an attempt to `status`, enforcing monotone transitions.
///
/// `gateway_response`, when given, replaces the stored provider text.
pub async fn update_status(
    db: &Database,
    reference: &str,
    status: PaymentStatus,
    gateway_response: Option<String>,
) -> Result<StatusChange, PaychannelError> {
    let key = reference.to_string();
    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let Some(current) = select_payment(&tx, &key)? else {
                return Ok(UpdateOutcome::Missing);
            };

            if current.status.is_terminal() && current.status == status {
                return Ok(UpdateOutcome::Unchanged(current));
            }
            if !current.status.can_transition_to(status) {
                return Ok(UpdateOutcome::Illegal(current.status));
            }

            tx.execute(
                "UPDATE payments
                 SET status = ?1,
                     gateway_response = COALESCE(?2, gateway_response),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE reference = ?3",
                params![status.to_string(), gateway_response, key],
            )?;
            let updated = select_payment(&tx, &key)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(UpdateOutcome::Applied(updated))
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    match outcome {
        UpdateOutcome::Missing => Err(PaychannelError::PaymentNotFound {
            reference: reference.to_string(),
        }),
        UpdateOutcome::Illegal(from) => Err(PaychannelError::InvalidTransition {
            reference: reference.to_string(),
            from: from.to_string(),
            to: status.to_string(),
        }),
        UpdateOutcome::Unchanged(p) => Ok(StatusChange::Unchanged(p)),
        UpdateOutcome::Applied(p) => Ok(StatusChange::Applied(p)),
    }
}
