use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid amount '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Error returned when a form date cannot be read.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid date '{0}': use YYYY-MM-DD or DD-MM-YYYY")]
pub struct ParseDateError(String);

const FORM_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d-%b-%Y"];

/// Normalizes input for decimal parsing: trims whitespace and removes the
/// rupee sign and grouping commas (Indian or western).
fn normalize_decimal_input(s: &str) -> String {
    s.trim().trim_start_matches('₹').trim().replace(',', "")
}

/// Parses a string into a [`Decimal`].
///
/// Handles commas in any grouping (e.g. `"1,23,456.50"`).
/// Empty or whitespace-only input is treated as 0.
/// Returns an error and logs when the input is invalid (non-empty but not parseable).
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseDecimalError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    normalized.parse().map_err(|e| {
        tracing::error!(input = %s, "invalid decimal: {}", e);
        ParseDecimalError {
            input: s.to_string(),
            source: e,
        }
    })
}

/// Parses an optional form date. Blank input gives `None`.
pub fn parse_form_date(s: &str) -> Result<Option<NaiveDate>, ParseDateError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    FORM_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(Some)
        .ok_or_else(|| ParseDateError(s.to_string()))
}

/// Formats an amount for an input field; zero shows as blank.
pub fn amount_field(value: Decimal) -> String {
    if value.is_zero() {
        String::new()
    } else {
        value.normalize().to_string()
    }
}

/// Formats a date for an input field.
pub fn date_field(value: Option<NaiveDate>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Writes a downloaded report into `dir`, creating the directory when
/// needed. Returns the full path written.
pub fn save_report(
    dir: &Path,
    filename: &str,
    bytes: &[u8],
) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_decimal_accepts_indian_grouping() {
        assert_eq!(parse_decimal("1,23,456.50").unwrap(), dec!(123456.50));
        assert_eq!(parse_decimal("₹ 1,50,000").unwrap(), dec!(150000));
    }

    #[test]
    fn parse_decimal_trim_whitespace() {
        assert_eq!(parse_decimal("  123.45  ").unwrap(), dec!(123.45));
    }

    #[test]
    fn parse_decimal_empty_treated_as_zero() {
        assert_eq!(parse_decimal("").unwrap(), Decimal::ZERO);
        assert_eq!(parse_decimal("   ").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn parse_decimal_invalid_returns_error() {
        assert!(parse_decimal("abc").is_err());
    }

    #[test]
    fn parse_form_date_accepts_common_layouts() {
        let expected = NaiveDate::from_ymd_opt(2025, 6, 10);

        assert_eq!(parse_form_date("2025-06-10").unwrap(), expected);
        assert_eq!(parse_form_date("10-06-2025").unwrap(), expected);
        assert_eq!(parse_form_date("10/06/2025").unwrap(), expected);
        assert_eq!(parse_form_date("10-Jun-2025").unwrap(), expected);
        assert_eq!(parse_form_date("  ").unwrap(), None);
    }

    #[test]
    fn parse_form_date_rejects_garbage() {
        assert_eq!(
            parse_form_date("31-02-2025"),
            Err(ParseDateError("31-02-2025".to_string()))
        );
    }

    #[test]
    fn field_formatting() {
        assert_eq!(amount_field(Decimal::ZERO), "");
        assert_eq!(amount_field(dec!(45000.50)), "45000.5");
        assert_eq!(date_field(NaiveDate::from_ymd_opt(2025, 3, 31)), "2025-03-31");
        assert_eq!(date_field(None), "");
    }

    #[test]
    fn save_report_creates_directory() {
        let dir = std::env::temp_dir().join(format!("tds-ui-save-{}", std::process::id()));

        let path = save_report(&dir.join("nested"), "Acme_Report_20250701.xlsx", b"PK").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"PK");
        fs::remove_dir_all(&dir).unwrap();
    }
}
