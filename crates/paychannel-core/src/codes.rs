// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! USSD short-code assignment.

use std::collections::HashSet;

/// Returns the smallest positive integer not already used as a code.
///
/// Codes that are not purely decimal are ignored, so a hand-assigned
/// vanity code never blocks the numeric sequence.
pub fn next_ussd_code<'a, I>(existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let used: HashSet<u64> = existing
        .into_iter()
        .filter(|code| !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|code| code.parse().ok())
        .collect();

    let mut candidate = 1u64;
    while used.contains(&candidate) {
        candidate += 1;
    }
    candidate.to_string()
}
