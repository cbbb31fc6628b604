// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel registration, lookup, and per-channel totals.

use std::str::FromStr;

use paychannel_core::PaychannelError;
use paychannel_core::codes::next_ussd_code;
use paychannel_core::types::{Channel, ChannelTotals, ChannelType, NewChannel};
use rusqlite::{ErrorCode, OptionalExtension, TransactionBehavior, params};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::database::Database;

/// Attempts at claiming a short code before giving up.
const CODE_ASSIGNMENT_ATTEMPTS: usize = 5;

const CHANNEL_COLUMNS: &str = "id, name, slug, amount, currency, ussd_code, ussd_enabled, \
                               paylink_enabled, created_at, updated_at";

pub(crate) fn parse_decimal(idx: usize, raw: &str) -> Result<Decimal, rusqlite::Error> {
    Decimal::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_channel(row: &rusqlite::Row<'_>) -> Result<Channel, rusqlite::Error> {
    let amount: String = row.get(3)?;
    Ok(Channel {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        amount: parse_decimal(3, &amount)?,
        currency: row.get(4)?,
        ussd_code: row.get(5)?,
        ussd_enabled: row.get(6)?,
        paylink_enabled: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn select_channel(
    conn: &rusqlite::Connection,
    id: &str,
) -> Result<Option<Channel>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = ?1"),
        params![id],
        row_to_channel,
    )
    .optional()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// URL-friendly form of a channel name, suffixed with part of the id.
pub fn slugify(name: &str, id: &str) -> String {
    let mut slug = String::with_capacity(name.len() + 9);
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let base = slug.trim_end_matches('-');
    let suffix: String = id.chars().filter(|c| *c != '-').take(8).collect();
    if base.is_empty() {
        suffix
    } else {
        format!("{base}-{suffix}")
    }
}

/// Register a channel, assigning the lowest free USSD code.
///
/// The code search and insert share one `BEGIN IMMEDIATE` transaction, and the
/// `UNIQUE` constraint on `ussd_code` turns any remaining race with another
/// process into a retry.
pub async fn create_channel(db: &Database, new: NewChannel) -> Result<Channel, PaychannelError> {
    if new.name.trim().is_empty() {
        return Err(PaychannelError::Config(
            "channel name must not be empty".to_string(),
        ));
    }
    if new.amount < Decimal::new(1, 2) {
        return Err(PaychannelError::InvalidAmount(format!(
            "channel amount must be at least 0.01, got {}",
            new.amount
        )));
    }
    paychannel_core::money::to_minor_units(new.amount)?;

    let id = uuid::Uuid::new_v4().to_string();
    let slug = slugify(&new.name, &id);
    let mut amount = new.amount;
    amount.rescale(2);
    let amount = amount.to_string();

    let channel = db
        .connection()
        .call(move |conn| {
            let mut attempt = 0;
            loop {
                attempt += 1;
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let existing: Vec<String> = {
                    let mut stmt = tx.prepare("SELECT ussd_code FROM channels")?;
                    let rows = stmt.query_map([], |row| row.get(0))?;
                    rows.collect::<Result<_, _>>()?
                };
                let code = next_ussd_code(existing.iter().map(String::as_str));

                let inserted = tx.execute(
                    "INSERT INTO channels (id, name, slug, amount, currency, ussd_code, ussd_enabled, paylink_enabled)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        id,
                        new.name.trim(),
                        slug,
                        amount,
                        new.currency,
                        code,
                        new.ussd_enabled,
                        new.paylink_enabled,
                    ],
                );
                match inserted {
                    Ok(_) => {
                        let channel = select_channel(&tx, &id)?;
                        tx.commit()?;
                        return channel.ok_or(rusqlite::Error::QueryReturnedNoRows);
                    }
                    Err(e) if is_unique_violation(&e) && attempt < CODE_ASSIGNMENT_ATTEMPTS => {
                        warn!(code = %code, attempt, "ussd code taken concurrently, retrying");
                        drop(tx);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    debug!(id = %channel.id, code = %channel.ussd_code, "channel created");
    Ok(channel)
}

/// Get a channel by id.
pub async fn get_channel(db: &Database, id: &str) -> Result<Option<Channel>, PaychannelError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| select_channel(conn, &id))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Exact-match lookup on the USSD code.
pub async fn lookup_by_code(
    db: &Database,
    code: &str,
    require_enabled: bool,
) -> Result<Option<Channel>, PaychannelError> {
    let code = code.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {CHANNEL_COLUMNS} FROM channels
                     WHERE ussd_code = ?1 AND (?2 = 0 OR ussd_enabled = 1)"
                ),
                params![code, require_enabled],
                row_to_channel,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All channels ordered by numeric short code.
pub async fn list_channels(db: &Database) -> Result<Vec<Channel>, PaychannelError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHANNEL_COLUMNS} FROM channels
                 ORDER BY CAST(ussd_code AS INTEGER), ussd_code"
            ))?;
            let rows = stmt.query_map([], row_to_channel)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Switch USSD access for the channel with `code`. Returns false if no such channel.
pub async fn set_ussd_enabled(
    db: &Database,
    code: &str,
    enabled: bool,
) -> Result<bool, PaychannelError> {
    let code = code.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE channels
                 SET ussd_enabled = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE ussd_code = ?2",
                params![enabled, code],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Payment count and successful amounts per surface for one channel.
pub async fn channel_totals(db: &Database, channel_id: &str) -> Result<ChannelTotals, PaychannelError> {
    let channel_id = channel_id.to_string();
    db.connection()
        .call(move |conn| {
            let payments_count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM payments WHERE channel_id = ?1",
                params![channel_id],
                |row| row.get(0),
            )?;

            let mut totals = ChannelTotals {
                payments_count: payments_count.max(0) as u64,
                ..ChannelTotals::default()
            };

            let mut stmt = conn.prepare(
                "SELECT channel_type, amount FROM payments
                 WHERE channel_id = ?1 AND status = 'success'",
            )?;
            let mut rows = stmt.query(params![channel_id])?;
            while let Some(row) = rows.next()? {
                let kind: String = row.get(0)?;
                let amount: String = row.get(1)?;
                let amount = parse_decimal(1, &amount)?;
                match ChannelType::from_str(&kind) {
                    Ok(ChannelType::Ussd) => totals.ussd_amount += amount,
                    Ok(ChannelType::Paylink) => totals.paylink_amount += amount,
                    Err(e) => {
                        return Err(rusqlite::Error::FromSqlConversionFailure(
                            0,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        ));
                    }
                }
            }
            Ok(totals)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn new_channel(name: &str) -> NewChannel {
        NewChannel {
            name: name.to_string(),
            amount: dec!(50.00),
            currency: "GHS".to_string(),
            ussd_enabled: true,
            paylink_enabled: true,
        }
    }

    #[tokio::test]
    async fn codes_are_assigned_sequentially() {
        let (db, _dir) = setup_db().await;
        let a = create_channel(&db, new_channel("Church Dues")).await.unwrap();
        let b = create_channel(&db, new_channel("School Fees")).await.unwrap();
        assert_eq!(a.ussd_code, "1");
        assert_eq!(b.ussd_code, "2");
        assert_eq!(a.amount, dec!(50));
        assert!(a.slug.starts_with("church-dues-"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn amounts_are_stored_with_two_places() {
        let (db, _dir) = setup_db().await;
        let mut whole = new_channel("Whole");
        whole.amount = dec!(50);
        let ch = create_channel(&db, whole).await.unwrap();
        assert_eq!(ch.amount.scale(), 2);
        assert_eq!(ch.amount.to_string(), "50.00");
        assert_eq!(paychannel_core::money::to_minor_units(ch.amount).unwrap(), 5000);

        let mut padded = new_channel("Padded");
        padded.amount = dec!(12.300);
        assert!(matches!(
            create_channel(&db, padded).await,
            Err(PaychannelError::InvalidAmount(_))
        ));
    }

    #[tokio::test]
    async fn freed_codes_are_reused_first() {
        let (db, _dir) = setup_db().await;
        for name in ["a", "b", "c"] {
            create_channel(&db, new_channel(name)).await.unwrap();
        }
        db.connection()
            .call(|conn| conn.execute("DELETE FROM channels WHERE ussd_code = '2'", []))
            .await
            .unwrap();
        let d = create_channel(&db, new_channel("d")).await.unwrap();
        assert_eq!(d.ussd_code, "2");
    }

    #[tokio::test]
    async fn concurrent_creation_never_duplicates_codes() {
        let (db, _dir) = setup_db().await;
        let mut handles = Vec::new();
        for i in 0..10 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                create_channel(&db, new_channel(&format!("ch{i}"))).await
            }));
        }
        let mut codes = Vec::new();
        for handle in handles {
            codes.push(handle.await.unwrap().unwrap().ussd_code);
        }
        codes.sort_by_key(|c| c.parse::<u32>().unwrap());
        let expected: Vec<String> = (1..=10).map(|n| n.to_string()).collect();
        assert_eq!(codes, expected);
    }

    #[tokio::test]
    async fn lookup_respects_enabled_flag() {
        let (db, _dir) = setup_db().await;
        let ch = create_channel(&db, new_channel("Dues")).await.unwrap();

        assert!(lookup_by_code(&db, &ch.ussd_code, true).await.unwrap().is_some());
        assert!(set_ussd_enabled(&db, &ch.ussd_code, false).await.unwrap());
        assert!(lookup_by_code(&db, &ch.ussd_code, true).await.unwrap().is_none());
        assert!(lookup_by_code(&db, &ch.ussd_code, false).await.unwrap().is_some());
        assert!(!set_ussd_enabled(&db, "999", true).await.unwrap());
    }

    #[tokio::test]
    async fn lookup_is_exact_match() {
        let (db, _dir) = setup_db().await;
        create_channel(&db, new_channel("Dues")).await.unwrap();
        assert!(lookup_by_code(&db, "01", false).await.unwrap().is_none());
        assert!(lookup_by_code(&db, "1", false).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn rejects_bad_channel_input() {
        let (db, _dir) = setup_db().await;
        let mut bad = new_channel("  ");
        assert!(create_channel(&db, bad.clone()).await.is_err());
        bad.name = "ok".into();
        bad.amount = dec!(0);
        assert!(matches!(
            create_channel(&db, bad.clone()).await,
            Err(PaychannelError::InvalidAmount(_))
        ));
        bad.amount = dec!(1.005);
        assert!(create_channel(&db, bad).await.is_err());
    }

    #[tokio::test]
    async fn list_orders_numerically() {
        let (db, _dir) = setup_db().await;
        for i in 0..11 {
            create_channel(&db, new_channel(&format!("c{i}"))).await.unwrap();
        }
        let codes: Vec<String> = list_channels(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.ussd_code)
            .collect();
        assert_eq!(codes.first().map(String::as_str), Some("1"));
        assert_eq!(codes.last().map(String::as_str), Some("11"));
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(
            slugify("St. Mary's  Harvest!", "abcd1234-ffff"),
            "st-mary-s-harvest-abcd1234"
        );
        assert_eq!(slugify("***", "abcd1234"), "abcd1234");
    }
}
