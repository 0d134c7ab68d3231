//! Due date for depositing deducted tax.
//!
//! | Deduction month         | Due date                                |
//! |-------------------------|-----------------------------------------|
//! | April to February       | 7th of the following month              |
//! | March                   | 30th April                              |
//! | Property (194IA, 194IB) | 30 days from the end of the month       |

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::calculations::CalculationError;
use crate::models::TdsSection;

const PROPERTY_GRACE_DAYS: u64 = 30;

/// Returns the last day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// Computes the deposit due date for a deduction made on `deduction_date`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use tds_core::TdsSection;
/// use tds_core::calculations::due_date;
///
/// let section = TdsSection::new("194H", "Commission / Brokerage");
/// let deducted = NaiveDate::from_ymd_opt(2025, 12, 15).unwrap();
///
/// assert_eq!(
///     due_date(deducted, &section).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 1, 7).unwrap()
/// );
/// ```
pub fn due_date(
    deduction_date: NaiveDate,
    section: &TdsSection,
) -> Result<NaiveDate, CalculationError> {
    let out_of_range = || CalculationError::DateOutOfRange(deduction_date);

    if section.is_property_section {
        return month_end(deduction_date)
            .and_then(|end| end.checked_add_days(Days::new(PROPERTY_GRACE_DAYS)))
            .ok_or_else(out_of_range);
    }

    if deduction_date.month() == 3 {
        return NaiveDate::from_ymd_opt(deduction_date.year(), 4, 30).ok_or_else(out_of_range);
    }

    deduction_date
        .with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.with_day(7))
        .ok_or_else(out_of_range)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn date(
        y: i32,
        m: u32,
        d: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ordinary() -> TdsSection {
        TdsSection::new("194J(b)", "Fees for Professional Services")
    }

    fn property() -> TdsSection {
        TdsSection {
            is_property_section: true,
            ..TdsSection::new("194IA", "Transfer of certain immovable property")
        }
    }

    #[test]
    fn ordinary_month_due_on_seventh_of_next_month() {
        assert_eq!(due_date(date(2025, 4, 10), &ordinary()).unwrap(), date(2025, 5, 7));
        assert_eq!(due_date(date(2025, 4, 30), &ordinary()).unwrap(), date(2025, 5, 7));
    }

    #[test]
    fn december_rolls_into_january() {
        assert_eq!(due_date(date(2025, 12, 31), &ordinary()).unwrap(), date(2026, 1, 7));
    }

    #[test]
    fn march_due_on_thirtieth_april() {
        assert_eq!(due_date(date(2026, 3, 5), &ordinary()).unwrap(), date(2026, 4, 30));
    }

    #[test]
    fn property_section_thirty_days_after_month_end() {
        // 31 Jan + 30 days
        assert_eq!(due_date(date(2026, 1, 3), &property()).unwrap(), date(2026, 3, 2));
        // 30 Jun + 30 days
        assert_eq!(due_date(date(2025, 6, 20), &property()).unwrap(), date(2025, 7, 30));
    }

    #[test]
    fn property_section_in_march_ignores_march_rule() {
        assert_eq!(due_date(date(2026, 3, 1), &property()).unwrap(), date(2026, 4, 30));
        assert_eq!(due_date(date(2025, 2, 14), &property()).unwrap(), date(2025, 3, 30));
    }

    #[test]
    fn month_end_handles_leap_february() {
        assert_eq!(month_end(date(2028, 2, 10)), Some(date(2028, 2, 29)));
        assert_eq!(month_end(date(2026, 2, 10)), Some(date(2026, 2, 28)));
    }

    #[test]
    fn out_of_range_date_is_an_error() {
        let last = NaiveDate::MAX;

        assert_eq!(
            due_date(last, &ordinary()),
            Err(CalculationError::DateOutOfRange(last))
        );
    }
}
