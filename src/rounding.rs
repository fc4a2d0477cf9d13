//! Two-place decimal rounding shared by the allocator and display code.
//!
//! Per-day base amounts are truncated toward zero; the remainder correction
//! and anything shown to a person is rounded half-up.

use rust_decimal::{Decimal, RoundingStrategy};

pub const CENTS: u32 = 2;

pub fn truncate_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CENTS, RoundingStrategy::ToZero)
}

pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CENTS, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount the way the dashboard shows it: `1.234,50`.
pub fn format_amount(value: Decimal) -> String {
    let mut rounded = round_cents(value);
    rounded.rescale(CENTS);

    let text = rounded.abs().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped},{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn truncation_goes_toward_zero() {
        assert_eq!(truncate_cents(dec!(3.339)), dec!(3.33));
        assert_eq!(truncate_cents(dec!(-3.339)), dec!(-3.33));
        assert_eq!(truncate_cents(dec!(6)), dec!(6));
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_cents(dec!(0.005)), dec!(0.01));
        assert_eq!(round_cents(dec!(0.004)), dec!(0.00));
        assert_eq!(round_cents(dec!(2.675)), dec!(2.68));
    }

    #[test]
    fn formats_with_brazilian_separators() {
        assert_eq!(format_amount(dec!(1234.5)), "1.234,50");
        assert_eq!(format_amount(dec!(3.333)), "3,33");
        assert_eq!(format_amount(dec!(0)), "0,00");
        assert_eq!(format_amount(dec!(1000000)), "1.000.000,00");
        assert_eq!(format_amount(dec!(-12.345)), "-12,35");
    }
}
