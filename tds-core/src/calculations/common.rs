//! Common utility functions for TDS calculations.
//!
//! Rounding and percentage helpers shared by the rate, interest and bulk
//! calculations.

use rust_decimal::Decimal;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// This follows standard financial rounding conventions where values at exactly
/// 0.005 are rounded up to 0.01 (away from zero).
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tds_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Applies a percentage rate (`10` means 10%) and rounds to paise.
///
/// Returns `None` when the product does not fit in a [`Decimal`].
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use tds_core::calculations::common::percent_of;
///
/// assert_eq!(percent_of(dec!(150000), dec!(2)), Some(dec!(3000.00)));
/// assert_eq!(percent_of(dec!(1234.56), dec!(0.1)), Some(dec!(1.23)));
/// assert_eq!(percent_of(Decimal::MAX, dec!(30)), None);
/// ```
pub fn percent_of(
    amount: Decimal,
    rate: Decimal,
) -> Option<Decimal> {
    amount
        .checked_mul(rate)?
        .checked_div(Decimal::ONE_HUNDRED)
        .map(round_half_up)
}

/// Sums amounts, returning `None` on overflow.
pub fn checked_total(amounts: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
}

/// Renders a percentage rate without trailing zeros: `10%`, `0.1%`.
pub fn format_rate(rate: Decimal) -> String {
    format!("{}%", rate.normalize())
}
