// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion between decimal major-unit amounts and provider minor units.
//!
//! Providers take integer pesewas (or cents). Amounts with sub-cent precision
//! or a negative sign are refused rather than silently rounded.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::PaychannelError;

/// Converts a major-unit amount to minor units (x100, truncating toward zero).
pub fn to_minor_units(amount: Decimal) -> Result<i64, PaychannelError> {
    if amount < Decimal::ZERO {
        return Err(PaychannelError::InvalidAmount(format!(
            "{amount} is negative"
        )));
    }
    if amount.scale() > 2 {
        return Err(PaychannelError::InvalidAmount(format!(
            "{amount} has more than two decimal places"
        )));
    }
    (amount * Decimal::ONE_HUNDRED)
        .trunc()
        .to_i64()
        .ok_or_else(|| PaychannelError::InvalidAmount(format!("{amount} is out of range")))
}

/// Minor units rendered as a zero-padded decimal string of exactly `width` digits.
pub fn to_fixed_width_minor_units(amount: Decimal, width: usize) -> Result<String, PaychannelError> {
    let minor = to_minor_units(amount)?;
    let rendered = format!("{minor:0width$}");
    if rendered.len() > width {
        return Err(PaychannelError::InvalidAmount(format!(
            "{amount} does not fit in {width} digits"
        )));
    }
    Ok(rendered)
}

/// Renders an amount with exactly two decimal places, e.g. `50` -> `50.00`.
pub fn display_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}
