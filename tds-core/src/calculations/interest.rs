//! Interest on late deposit under Section 201(1A).
//!
//! Interest runs at 1.5% per month from the month of deduction to the month
//! of payment, both inclusive. A part of a month counts as a full month.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::calculations::CalculationError;
use crate::calculations::common::round_half_up;

/// Monthly interest rate for late deposit (1.5%).
pub const MONTHLY_INTEREST_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LateInterest {
    pub months: u32,
    pub interest: Decimal,
    pub is_late: bool,
}

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month())
}

/// Computes late-payment interest on `tds_amount`.
///
/// Payment on the due date is on time.
///
/// # Errors
///
/// Returns [`CalculationError::AmountOutOfRange`] when the interest overflows.
pub fn late_interest(
    tds_amount: Decimal,
    deduction_date: NaiveDate,
    payment_date: NaiveDate,
    due_date: NaiveDate,
) -> Result<LateInterest, CalculationError> {
    if payment_date <= due_date {
        return Ok(LateInterest::default());
    }

    let span = month_index(payment_date) - month_index(deduction_date) + 1;
    let months = u32::try_from(span.max(0)).unwrap_or(u32::MAX);

    let interest = tds_amount
        .checked_mul(MONTHLY_INTEREST_RATE)
        .and_then(|monthly| monthly.checked_mul(Decimal::from(months)))
        .ok_or(CalculationError::AmountOutOfRange)?;

    Ok(LateInterest {
        months,
        interest: round_half_up(interest),
        is_late: true,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn date(
        y: i32,
        m: u32,
        d: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_rate_is_one_and_a_half_percent() {
        assert_eq!(MONTHLY_INTEREST_RATE, dec!(0.015));
    }

    #[test]
    fn payment_on_due_date_is_not_late() {
        let interest = late_interest(dec!(1500), date(2025, 4, 10), date(2025, 5, 7), date(2025, 5, 7)).unwrap();

        assert_eq!(interest, LateInterest::default());
    }

    #[test]
    fn one_day_late_counts_both_months() {
        // deducted in April, paid on 8 May
        let interest = late_interest(dec!(1500), date(2025, 4, 10), date(2025, 5, 8), date(2025, 5, 7)).unwrap();

        assert!(interest.is_late);
        assert_eq!(interest.months, 2);
        assert_eq!(interest.interest, dec!(45.00));
    }

    #[test]
    fn months_counted_across_year_end() {
        // November 2025 to February 2026 inclusive
        let interest = late_interest(dec!(10000), date(2025, 11, 20), date(2026, 2, 1), date(2025, 12, 7)).unwrap();

        assert_eq!(interest.months, 4);
        assert_eq!(interest.interest, dec!(600.00));
    }

    #[test]
    fn interest_rounded_to_paise() {
        let interest = late_interest(dec!(333.33), date(2025, 6, 1), date(2025, 7, 8), date(2025, 7, 7)).unwrap();

        // 333.33 * 0.015 * 2 = 9.9999
        assert_eq!(interest.interest, dec!(10.00));
    }

    #[test]
    fn zero_tds_still_reports_lateness() {
        let interest = late_interest(Decimal::ZERO, date(2025, 6, 1), date(2025, 8, 1), date(2025, 7, 7)).unwrap();

        assert!(interest.is_late);
        assert_eq!(interest.months, 3);
        assert_eq!(interest.interest, Decimal::ZERO);
    }

    #[test]
    fn interest_overflow_is_an_error() {
        let interest = late_interest(Decimal::MAX, date(2025, 4, 10), date(2026, 3, 8), date(2025, 5, 7));

        assert_eq!(interest, Err(CalculationError::AmountOutOfRange));
    }
}
