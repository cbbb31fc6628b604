// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment reference generation.

use chrono::{DateTime, Utc};

/// Generates a reference of the form `PAY-<YYYYMMDDHHMMSS><micros>-<4 hex>`.
///
/// The random suffix keeps references unique when two sessions confirm
/// within the same microsecond.
pub fn generate_reference() -> String {
    generate_reference_at(Utc::now())
}

/// Same as [`generate_reference`] with an explicit clock reading.
pub fn generate_reference_at(now: DateTime<Utc>) -> String {
    let suffix: [u8; 2] = rand::random();
    format!(
        "PAY-{}-{}",
        now.format("%Y%m%d%H%M%S%6f"),
        hex::encode(suffix)
    )
}
