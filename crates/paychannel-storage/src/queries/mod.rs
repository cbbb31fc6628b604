// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for channel and payment rows.

pub mod channels;
pub mod payments;
