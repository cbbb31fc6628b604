// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing of the dial string sent on the first turn of a USSD session.

use std::sync::LazyLock;

use regex::Regex;

/// `*<digits>` segments, optionally terminated by `#`.
static DIAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\d+(\*\d+)*#?$").unwrap());

/// Extracts the channel code from a dial string such as `*928*144#`.
///
/// The code is the last `*` segment. Returns `None` when the input is not a
/// well-formed dial string.
pub fn channel_code(input: &str) -> Option<&str> {
    let input = input.trim();
    if !DIAL_PATTERN.is_match(input) {
        return None;
    }
    input.trim_end_matches('#').rsplit('*').next()
}
