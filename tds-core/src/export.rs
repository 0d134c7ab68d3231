//! Naming rules for the Excel report.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Excel's sheet name length limit.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const SHEET_NAME_FORBIDDEN: &[char] = &['\\', '/', '*', '?', ':', '[', ']'];

static FILENAME_UNSAFE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]"));

/// Strips everything but word characters, whitespace and `-`, trims, and
/// turns spaces into underscores.
pub fn safe_entity_name(entity_name: &str) -> String {
    let stripped = match FILENAME_UNSAFE.as_ref() {
        Ok(re) => re.replace_all(entity_name, "").into_owned(),
        Err(_) => entity_name
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_' || *c == '-')
            .collect(),
    };
    stripped.trim().replace(' ', "_")
}

/// Report filename: `{safe_name}_Report_{YYYYMMDD}.xlsx`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use tds_core::export::excel_filename;
///
/// let date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
/// assert_eq!(
///     excel_filename("Acme & Sons Pvt. Ltd.", date),
///     "Acme__Sons_Pvt_Ltd_Report_20250701.xlsx"
/// );
/// ```
pub fn excel_filename(
    entity_name: &str,
    date: NaiveDate,
) -> String {
    format!(
        "{}_Report_{}.xlsx",
        safe_entity_name(entity_name),
        date.format("%Y%m%d")
    )
}

/// Removes characters Excel forbids in sheet names and truncates to 31
/// characters.
pub fn sanitize_sheet_name(name: &str) -> String {
    name.chars()
        .filter(|c| !SHEET_NAME_FORBIDDEN.contains(c))
        .take(MAX_SHEET_NAME_LEN)
        .collect()
}

/// Sheet name for the n-th (1-based) result.
pub fn transaction_sheet_name(number: usize) -> String {
    sanitize_sheet_name(&format!("Transaction_{number}"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 3).unwrap()
    }

    #[test]
    fn filename_keeps_hyphens_and_underscores() {
        assert_eq!(
            excel_filename("North-East_Traders", day()),
            "North-East_Traders_Report_20251103.xlsx"
        );
    }

    #[test]
    fn filename_trims_before_replacing_spaces() {
        assert_eq!(
            excel_filename("  Ravi Kumar (HUF)  ", day()),
            "Ravi_Kumar_HUF_Report_20251103.xlsx"
        );
    }

    #[test]
    fn filename_keeps_unicode_letters() {
        assert_eq!(
            excel_filename("Śrī Traders", day()),
            "Śrī_Traders_Report_20251103.xlsx"
        );
    }

    #[test]
    fn filename_with_only_symbols_has_empty_prefix() {
        assert_eq!(excel_filename("&&&", day()), "_Report_20251103.xlsx");
    }

    #[test]
    fn sheet_name_drops_forbidden_characters() {
        assert_eq!(sanitize_sheet_name("a/b\\c*d?e:f[g]h"), "abcdefgh");
    }

    #[test]
    fn sheet_name_truncated_to_excel_limit() {
        let long = "x".repeat(40);

        assert_eq!(sanitize_sheet_name(&long).chars().count(), MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn transaction_sheet_names_are_numbered() {
        assert_eq!(transaction_sheet_name(12), "Transaction_12");
    }
}
