//! Display formatting for money and dates in the Indian style.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::calculations::common::round_half_up;

/// `strftime` pattern for dates shown to users: `07-Jun-2025`.
pub const DISPLAY_DATE_FORMAT: &str = "%d-%b-%Y";

/// `strftime` pattern for dates on the wire: `2025-06-07`.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Groups the digits of a non-negative integer the Indian way: the last
/// three digits, then pairs (`12,34,567`).
pub fn indian_grouping(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = left;
    }
    groups.push(rest);
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Formats an amount in rupees: `₹1,50,000` or `₹1,234.50`.
///
/// The amount is rounded to paise; the fraction is shown only when it is
/// non-zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tds_core::format::indian_currency;
///
/// assert_eq!(indian_currency(dec!(1234567)), "₹12,34,567");
/// assert_eq!(indian_currency(dec!(1500.5)), "₹1,500.50");
/// ```
pub fn indian_currency(amount: Decimal) -> String {
    let rounded = round_half_up(amount);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let rounded = rounded.abs();

    let whole = rounded.trunc();
    let paise = ((rounded - whole) * Decimal::ONE_HUNDRED)
        .to_u32()
        .unwrap_or_default();

    let mut out = format!("{sign}₹{}", indian_grouping(&whole.normalize().to_string()));
    if paise > 0 {
        out.push_str(&format!(".{paise:02}"));
    }
    out
}

pub fn display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

pub fn iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn grouping_leaves_short_numbers_alone() {
        assert_eq!(indian_grouping("0"), "0");
        assert_eq!(indian_grouping("999"), "999");
    }

    #[test]
    fn grouping_uses_pairs_above_thousands() {
        assert_eq!(indian_grouping("1000"), "1,000");
        assert_eq!(indian_grouping("100000"), "1,00,000");
        assert_eq!(indian_grouping("12345678"), "1,23,45,678");
    }

    #[test]
    fn currency_hides_zero_fraction() {
        assert_eq!(indian_currency(dec!(150000.00)), "₹1,50,000");
        assert_eq!(indian_currency(Decimal::ZERO), "₹0");
    }

    #[test]
    fn currency_shows_two_digit_fraction() {
        assert_eq!(indian_currency(dec!(45.5)), "₹45.50");
        assert_eq!(indian_currency(dec!(1000.05)), "₹1,000.05");
    }

    #[test]
    fn currency_rounds_to_paise() {
        assert_eq!(indian_currency(dec!(99.999)), "₹100");
    }

    #[test]
    fn currency_keeps_sign() {
        assert_eq!(indian_currency(dec!(-2500)), "-₹2,500");
    }

    #[test]
    fn dates_render_in_both_forms() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 7).unwrap();

        assert_eq!(display_date(date), "07-Jun-2025");
        assert_eq!(iso_date(date), "2025-06-07");
    }
}
