//! Money helpers.
//!
//! Prices are carried as [`rust_decimal::Decimal`] in the currency's standard
//! unit (dollars). The payment gateway wants minor units (cents); templates
//! and invoices want a two-decimal, currency-prefixed string.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount for display, e.g. `$19.99`. Rounds half-up.
#[must_use]
pub fn format_usd(amount: Decimal) -> String {
    format!(
        "${:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Convert an amount to minor currency units (cents), rounding half-up.
///
/// Returns `None` if the amount does not fit in an `i64` - a sign of corrupt
/// price data, not a condition a caller can recover from silently.
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(Decimal::new(1999, 2)), "$19.99");
        assert_eq!(format_usd(Decimal::new(5, 0)), "$5.00");
        assert_eq!(format_usd(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn test_format_usd_rounds_to_two_places() {
        // 10.005 rounds half-up to 10.01
        assert_eq!(format_usd(Decimal::new(10_005, 3)), "$10.01");
    }

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(Decimal::new(1999, 2)), Some(1999));
        assert_eq!(to_minor_units(Decimal::new(5, 0)), Some(500));
        assert_eq!(to_minor_units(Decimal::ZERO), Some(0));
    }

    #[test]
    fn test_to_minor_units_rounds_sub_cent_amounts() {
        // 0.015 dollars -> 2 cents (half-up)
        assert_eq!(to_minor_units(Decimal::new(15, 3)), Some(2));
    }

    #[test]
    fn test_to_minor_units_midpoint_rounds_away_from_zero() {
        // 12.5 cents goes up to 13, not to the even neighbor 12
        assert_eq!(to_minor_units(Decimal::new(125, 3)), Some(13));
    }

    #[test]
    fn test_to_minor_units_overflow() {
        assert_eq!(to_minor_units(Decimal::MAX), None);
    }
}
