// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use paychannel_core::PaychannelError;
use tracing::debug;

/// How long SQLite waits on a lock held by another process before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Maps a tokio-rusqlite call error into the workspace error type.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> PaychannelError {
    PaychannelError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the single SQLite writer connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path` in WAL mode and runs migrations.
    pub async fn open(path: &str) -> Result<Self, PaychannelError> {
        Self::open_with(path, true).await
    }

    /// Opens the database, choosing the journal mode explicitly.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, PaychannelError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| PaychannelError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| PaychannelError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                let mode: String =
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
                debug!(journal_mode = %mode, "journal mode set");
            }
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| -> Result<(), PaychannelError> { crate::migrations::run_migrations(conn) })
            .await
            .map_err(|e| PaychannelError::Storage {
                source: Box::new(e),
            })?;

        Ok(Self { conn })
    }

    /// The underlying async connection. All queries go through its `call`.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoints the WAL and closes the connection.
    pub async fn close(self) -> Result<(), PaychannelError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn
            .close()
            .await
            .map_err(|e| PaychannelError::Storage {
                source: Box::new(e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("pay.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('channels', 'payments') ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        assert_eq!(tables, vec!["channels".to_string(), "payments".to_string()]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_does_not_rerun_migrations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pay.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("fk.db").to_str().unwrap())
            .await
            .unwrap();
        let result = db
            .connection()
            .call(|conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "INSERT INTO payments (reference, channel_id, amount, currency, phone_number, channel_type, charge_type)
                     VALUES ('PAY-x', 'missing', '1.00', 'GHS', '233', 'ussd', 'momo')",
                    [],
                )
            })
            .await;
        assert!(result.is_err());
    }
}
