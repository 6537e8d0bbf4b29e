//! Decimal formatting for display.
//!
//! Magnitude shortening with K/M/B/T suffixes and currency formatting with
//! bounded fractional digits and digit grouping. All arithmetic stays in
//! `rust_decimal::Decimal` so rounding never goes through floats.

use crate::constants::{SHORTENED_SCALE, SHORTEN_UNITS};
use crate::types::Currency;
use rust_decimal::{Decimal, RoundingStrategy};

/// Scaled amounts that round up to this move to the next larger unit.
const CARRY_LIMIT: i64 = 1000;

fn round_to_scale(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    rounded
}

/// Split a value into a scaled amount and a unit suffix.
///
/// Picks the largest unit the absolute value reaches, so the scaled amount keeps
/// at most three integer digits. The amount is rounded to two decimal places; if
/// rounding reaches 1000 of a unit, the next larger unit is used instead.
/// Values below one thousand get an empty suffix.
pub fn shorten_value(value: Decimal) -> (Decimal, &'static str) {
    let abs = value.abs();
    let carry_limit = Decimal::from(CARRY_LIMIT);

    let mut larger: Option<(Decimal, &'static str)> = None;
    for &(exponent, suffix) in SHORTEN_UNITS {
        let unit = Decimal::from(10i64.pow(exponent));
        if abs >= unit {
            let scaled = round_to_scale(value / unit, SHORTENED_SCALE);
            return match larger {
                Some((larger_unit, larger_suffix)) if scaled.abs() >= carry_limit => {
                    (round_to_scale(value / larger_unit, SHORTENED_SCALE), larger_suffix)
                }
                _ => (scaled, suffix),
            };
        }
        larger = Some((unit, suffix));
    }

    let scaled = round_to_scale(value, SHORTENED_SCALE);
    match larger {
        Some((smallest_unit, suffix)) if scaled.abs() >= carry_limit => {
            (round_to_scale(value / smallest_unit, SHORTENED_SCALE), suffix)
        }
        _ => (scaled, ""),
    }
}

/// Insert `separator` between groups of three digits, counting from the right.
pub fn group_digits(integer: &str, separator: char) -> String {
    let len = integer.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(digit);
    }
    grouped
}

/// Format a value as a fiat amount in `currency`.
///
/// The value is rounded half away from zero to at most `max_fraction_digits`
/// and padded to at least `min_fraction_digits`; within those bounds the
/// decimal's own scale decides how many fractional digits are shown. The sign
/// precedes the currency symbol.
pub fn format_fiat(
    value: Decimal,
    currency: &Currency,
    min_fraction_digits: u32,
    max_fraction_digits: u32,
) -> String {
    let mut rounded =
        value.round_dp_with_strategy(max_fraction_digits, RoundingStrategy::MidpointAwayFromZero);
    if rounded.scale() < min_fraction_digits {
        rounded.rescale(min_fraction_digits);
    }

    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().to_string();
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

    let mut out = String::with_capacity(digits.len() + currency.symbol().len() + 4);
    if negative {
        out.push('-');
    }
    out.push_str(currency.symbol());
    out.push_str(&group_digits(integer, currency.grouping_separator()));
    if !fraction.is_empty() {
        out.push(currency.decimal_separator());
        out.push_str(fraction);
    }
    out
}
