//! Excel report generation.
//!
//! Each result gets its own sheet. The layout is planned as a list of
//! [`ReportRow`]s first and then written with `rust_xlsxwriter`, so the
//! content can be checked without opening a workbook.

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, XlsxError};
use tds_core::export::transaction_sheet_name;
use tds_core::{Entity, TdsResult};

const NAVY: u32 = 0x1E3C72;
const BLUE: u32 = 0x2A5298;
const RED: u32 = 0xDC3545;
const GREEN: u32 = 0x28A745;

const LABEL_WIDTH: f64 = 35.0;
const VALUE_WIDTH: f64 = 40.0;

/// How a value cell is emphasised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueStyle {
    Plain,
    Currency,
    Late,
    OnTime,
}

/// One planned row of a transaction sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportRow {
    /// Entity name and PAN banners.
    Banner(String),
    /// Block heading.
    Heading(String),
    /// Block heading for the late-payment interest block.
    InterestHeading(String),
    Field {
        label: &'static str,
        value: String,
        style: ValueStyle,
    },
    Blank,
    /// Footer with the total payable.
    Total(String),
}

fn field(
    label: &'static str,
    value: impl Into<String>,
) -> ReportRow {
    let style = if label.contains("Amount") || label.contains("Rate") {
        ValueStyle::Currency
    } else {
        ValueStyle::Plain
    };
    ReportRow::Field {
        label,
        value: value.into(),
        style,
    }
}

/// Plans the rows for one transaction sheet.
pub fn report_rows(
    entity: &Entity,
    result: &TdsResult,
) -> Vec<ReportRow> {
    let mut rows = vec![
        ReportRow::Banner(format!("Entity Name: {}", entity.entity_name)),
        ReportRow::Banner(format!("PAN Number: {}", entity.pan_number)),
        ReportRow::Blank,
        ReportRow::Heading("TDS CALCULATION DETAILS".to_string()),
        field("TDS Section", &result.section),
        field("Description", &result.section_description),
        field("Category", &result.category_short),
        field(
            "PAN Status",
            if result.pan_available {
                "Available"
            } else {
                "Not Available"
            },
        ),
        field("Transaction Amount", &result.amount_formatted),
        field("Applicable Threshold", &result.effective_threshold_note),
        field("Applicable TDS Rate", &result.rate_display),
        field("TDS Amount", &result.tds_amount_formatted),
        ReportRow::Blank,
        ReportRow::Heading("PAYMENT DUE DATE INFORMATION".to_string()),
        field("Date of Deduction", &result.deduction_date_formatted),
        field("Due Date for Payment", &result.due_date_formatted),
        field("Actual Payment Date", &result.payment_date_formatted),
        ReportRow::Field {
            label: "Payment Status",
            value: if result.is_late { "LATE" } else { "ON TIME" }.to_string(),
            style: if result.is_late {
                ValueStyle::Late
            } else {
                ValueStyle::OnTime
            },
        },
    ];

    if result.is_late {
        rows.extend([
            ReportRow::Blank,
            ReportRow::InterestHeading("INTEREST CALCULATION (Section 201(1A))".to_string()),
            ReportRow::Field {
                label: "Interest Rate",
                value: "1.5% per month".to_string(),
                style: ValueStyle::Plain,
            },
            field("Number of Months", format!("{} month(s)", result.months_late)),
            ReportRow::Field {
                label: "Interest Amount",
                value: result.interest_formatted.clone(),
                style: ValueStyle::Late,
            },
        ]);
    }

    rows.push(ReportRow::Blank);
    rows.push(ReportRow::Total(format!(
        "TOTAL AMOUNT PAYABLE: {}",
        result.total_payable_formatted
    )));
    rows
}

struct Styles {
    banner: Format,
    heading: Format,
    interest_heading: Format,
    label: Format,
    plain: Format,
    currency: Format,
    late: Format,
    on_time: Format,
    total: Format,
}

impl Styles {
    fn new() -> Self {
        let centered = Format::new()
            .set_bold()
            .set_font_color(Color::White)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
        let value = Format::new().set_font_size(11).set_border(FormatBorder::Thin);

        Self {
            banner: centered
                .clone()
                .set_font_size(14)
                .set_background_color(Color::RGB(BLUE)),
            heading: centered
                .clone()
                .set_font_size(12)
                .set_background_color(Color::RGB(NAVY)),
            interest_heading: centered
                .clone()
                .set_font_size(12)
                .set_background_color(Color::RGB(RED)),
            label: value.clone().set_bold(),
            plain: value.clone(),
            currency: value.clone().set_bold().set_font_color(Color::RGB(NAVY)),
            late: value.clone().set_bold().set_font_color(Color::RGB(RED)),
            on_time: value.set_bold().set_font_color(Color::RGB(GREEN)),
            total: centered
                .set_font_size(14)
                .set_background_color(Color::RGB(NAVY)),
        }
    }

    fn value(
        &self,
        style: ValueStyle,
    ) -> &Format {
        match style {
            ValueStyle::Plain => &self.plain,
            ValueStyle::Currency => &self.currency,
            ValueStyle::Late => &self.late,
            ValueStyle::OnTime => &self.on_time,
        }
    }
}

/// Builds the workbook and returns the `.xlsx` bytes.
pub fn generate_report(
    entity: &Entity,
    results: &[TdsResult],
) -> Result<Vec<u8>, XlsxError> {
    let styles = Styles::new();
    let mut workbook = Workbook::new();

    for (idx, result) in results.iter().enumerate() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(transaction_sheet_name(idx + 1))?;
        sheet.set_column_width(0, LABEL_WIDTH)?;
        sheet.set_column_width(1, VALUE_WIDTH)?;

        for (row, planned) in (0u32..).zip(report_rows(entity, result)) {
            match planned {
                ReportRow::Banner(text) => {
                    sheet.merge_range(row, 0, row, 1, &text, &styles.banner)?;
                    sheet.set_row_height(row, 30)?;
                }
                ReportRow::Heading(text) => {
                    sheet.merge_range(row, 0, row, 1, &text, &styles.heading)?;
                    sheet.set_row_height(row, 25)?;
                }
                ReportRow::InterestHeading(text) => {
                    sheet.merge_range(row, 0, row, 1, &text, &styles.interest_heading)?;
                    sheet.set_row_height(row, 25)?;
                }
                ReportRow::Field {
                    label,
                    value,
                    style,
                } => {
                    sheet.write_string_with_format(row, 0, label, &styles.label)?;
                    sheet.write_string_with_format(row, 1, value, styles.value(style))?;
                }
                ReportRow::Blank => {}
                ReportRow::Total(text) => {
                    sheet.merge_range(row, 0, row, 1, &text, &styles.total)?;
                    sheet.set_row_height(row, 35)?;
                }
            }
        }
    }

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tds_core::DeducteeCategory;

    use super::*;

    fn result(is_late: bool) -> TdsResult {
        TdsResult {
            transaction_number: 1,
            section: "194C".to_string(),
            section_description: "Payment to Contractors".to_string(),
            category: DeducteeCategory::Individual,
            category_short: "Individual/HUF".to_string(),
            pan_available: true,
            amount: dec!(150000),
            amount_formatted: "₹1,50,000".to_string(),
            effective_threshold: Some(dec!(100000)),
            effective_threshold_note: "₹1,00,000 (Annual)".to_string(),
            rate: Some(dec!(1)),
            rate_display: "1%".to_string(),
            tds_amount: dec!(1500),
            tds_amount_formatted: "₹1,500".to_string(),
            above_threshold: true,
            deduction_date: "2025-06-10".to_string(),
            deduction_date_formatted: "10-Jun-2025".to_string(),
            due_date: "2025-07-07".to_string(),
            due_date_formatted: "07-Jul-2025".to_string(),
            payment_date: "2025-09-02".to_string(),
            payment_date_formatted: "02-Sep-2025".to_string(),
            is_late,
            months_late: if is_late { 4 } else { 0 },
            interest: if is_late { dec!(90) } else { Decimal::ZERO },
            interest_formatted: if is_late { "₹90" } else { "₹0" }.to_string(),
            total_payable: if is_late { dec!(1590) } else { dec!(1500) },
            total_payable_formatted: if is_late { "₹1,590" } else { "₹1,500" }.to_string(),
            is_property_section: false,
            has_threshold_types: true,
            has_slabs: false,
            has_conditions: false,
        }
    }

    fn entity() -> Entity {
        Entity::new("Acme Traders", "AAACA1234F")
    }

    #[test]
    fn on_time_sheet_skips_interest_block() {
        let rows = report_rows(&entity(), &result(false));

        assert_eq!(rows[0], ReportRow::Banner("Entity Name: Acme Traders".to_string()));
        assert_eq!(rows[1], ReportRow::Banner("PAN Number: AAACA1234F".to_string()));
        assert!(!rows.iter().any(|r| matches!(r, ReportRow::InterestHeading(_))));
        assert_eq!(
            rows.last(),
            Some(&ReportRow::Total("TOTAL AMOUNT PAYABLE: ₹1,500".to_string()))
        );
        assert!(rows.contains(&ReportRow::Field {
            label: "Payment Status",
            value: "ON TIME".to_string(),
            style: ValueStyle::OnTime,
        }));
    }

    #[test]
    fn late_sheet_adds_interest_block() {
        let rows = report_rows(&entity(), &result(true));

        assert!(rows.contains(&ReportRow::InterestHeading(
            "INTEREST CALCULATION (Section 201(1A))".to_string()
        )));
        assert!(rows.contains(&ReportRow::Field {
            label: "Number of Months",
            value: "4 month(s)".to_string(),
            style: ValueStyle::Plain,
        }));
        assert!(rows.contains(&ReportRow::Field {
            label: "Interest Amount",
            value: "₹90".to_string(),
            style: ValueStyle::Late,
        }));
    }

    #[test]
    fn amounts_and_rates_use_currency_style() {
        let rows = report_rows(&entity(), &result(false));

        assert!(rows.contains(&ReportRow::Field {
            label: "Applicable TDS Rate",
            value: "1%".to_string(),
            style: ValueStyle::Currency,
        }));
        assert!(rows.contains(&ReportRow::Field {
            label: "Category",
            value: "Individual/HUF".to_string(),
            style: ValueStyle::Plain,
        }));
    }

    #[test]
    fn generates_zip_container() {
        let bytes = generate_report(&entity(), &[result(false), result(true)]).unwrap();

        assert!(bytes.starts_with(b"PK"));
    }
}
