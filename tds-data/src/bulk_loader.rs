//! CSV front end for bulk TDS calculation.
//!
//! Input columns match the bulk upload template: `Deductee Name`,
//! `Deductee PAN`, `TDS Section`, `Transaction Amount`, `Date of Deduction`.
//! Rows that cannot be read are kept and reported with an error status.

use std::io::{Read, Write};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tds_core::SectionCatalog;
use tds_core::calculations::{BulkOutcome, BulkRow, BulkStatus, process_row};
use tds_core::format::DISPLAY_DATE_FORMAT;
use thiserror::Error;
use tracing::warn;

pub const REQUIRED_COLUMNS: [&str; 5] = [
    "Deductee Name",
    "Deductee PAN",
    "TDS Section",
    "Transaction Amount",
    "Date of Deduction",
];

const INPUT_DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d-%b-%Y",
    "%Y/%m/%d",
    "%d %b %Y",
];

/// Errors that stop a bulk file from being read or written at all.
#[derive(Debug, Error)]
pub enum BulkLoadError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for BulkLoadError {
    fn from(err: csv::Error) -> Self {
        BulkLoadError::CsvParse(err.to_string())
    }
}

/// A single row from the bulk upload CSV, kept as text until processed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkRecord {
    #[serde(rename = "Deductee Name", default)]
    pub deductee_name: String,
    #[serde(rename = "Deductee PAN", default)]
    pub deductee_pan: String,
    #[serde(rename = "TDS Section", default)]
    pub section_code: String,
    #[serde(rename = "Transaction Amount", default)]
    pub amount: String,
    #[serde(rename = "Date of Deduction", default)]
    pub deduction_date: String,
}

/// Parses an amount, ignoring a leading `₹` and digit grouping commas.
/// A blank amount is zero.
pub fn parse_amount(value: &str) -> Result<Decimal, String> {
    let cleaned: String = value
        .trim()
        .trim_start_matches('₹')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Ok(Decimal::ZERO);
    }

    cleaned
        .parse::<Decimal>()
        .map_err(|_| format!("invalid transaction amount '{}'", value.trim()))
}

/// Parses a deduction date in any of the accepted layouts. Blank or
/// unrecognised dates give `None`, which the calculation replaces with the
/// run date.
pub fn parse_deduction_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    // Spreadsheet exports often carry a time component.
    let value = value.split_once([' ', 'T']).map_or(value, |(date, rest)| {
        if rest.contains(':') { date } else { value }
    });

    INPUT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

impl BulkRecord {
    pub fn to_row(&self) -> Result<BulkRow, String> {
        Ok(BulkRow {
            deductee_name: self.deductee_name.trim().to_string(),
            deductee_pan: self.deductee_pan.trim().to_string(),
            section_code: self.section_code.trim().to_string(),
            amount: parse_amount(&self.amount)?,
            deduction_date: parse_deduction_date(&self.deduction_date),
        })
    }

    fn failed(
        &self,
        message: String,
        today: NaiveDate,
    ) -> BulkOutcome {
        let pan = self.deductee_pan.trim().to_ascii_uppercase();
        BulkOutcome {
            deductee_name: self.deductee_name.trim().to_string(),
            deductee_pan: (!pan.is_empty()).then_some(pan),
            category: Default::default(),
            pan_available: false,
            section_code: self.section_code.trim().to_string(),
            amount: Decimal::ZERO,
            rate_display: None,
            tds_amount: Decimal::ZERO,
            deduction_date: today,
            due_date: None,
            status: BulkStatus::Error(message),
        }
    }
}

/// One line of the results CSV.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BulkResultRecord {
    #[serde(rename = "Deductee Name")]
    pub deductee_name: String,
    #[serde(rename = "Deductee PAN")]
    pub deductee_pan: String,
    #[serde(rename = "Detected Category")]
    pub category: String,
    #[serde(rename = "TDS Section")]
    pub section_code: String,
    #[serde(rename = "Transaction Amount")]
    pub amount: String,
    #[serde(rename = "Applicable TDS Rate")]
    pub rate: String,
    #[serde(rename = "TDS Amount")]
    pub tds_amount: String,
    #[serde(rename = "Date of Deduction")]
    pub deduction_date: String,
    #[serde(rename = "Due Date for Payment")]
    pub due_date: String,
    #[serde(rename = "Status")]
    pub status: String,
}

impl From<&BulkOutcome> for BulkResultRecord {
    fn from(outcome: &BulkOutcome) -> Self {
        let failed = matches!(outcome.status, BulkStatus::Error(_));
        let or_error = |value: String| if failed { "Error".to_string() } else { value };

        Self {
            deductee_name: outcome.deductee_name.clone(),
            deductee_pan: outcome
                .deductee_pan
                .clone()
                .unwrap_or_else(|| "Not Provided".to_string()),
            category: or_error(outcome.category.short_label().to_string()),
            section_code: outcome.section_code.clone(),
            amount: outcome.amount.normalize().to_string(),
            rate: or_error(
                outcome
                    .rate_display
                    .clone()
                    .unwrap_or_else(|| "N/A".to_string()),
            ),
            tds_amount: format!("{:.2}", outcome.tds_amount),
            deduction_date: or_error(
                outcome
                    .deduction_date
                    .format(DISPLAY_DATE_FORMAT)
                    .to_string(),
            ),
            due_date: or_error(
                outcome
                    .due_date
                    .map(|d| d.format(DISPLAY_DATE_FORMAT).to_string())
                    .unwrap_or_else(|| "N/A".to_string()),
            ),
            status: outcome.status.to_string(),
        }
    }
}

/// Reads bulk upload CSVs and writes the calculated results.
pub struct BulkLoader;

impl BulkLoader {
    /// Parse bulk records from a CSV reader, checking the header first.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BulkRecord>, BulkLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| !headers.iter().any(|h| h == **col))
            .map(|col| col.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(BulkLoadError::MissingColumns(missing));
        }

        let mut records = Vec::new();
        for result in csv_reader.deserialize() {
            let record: BulkRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Runs the calculation for every record. Records that cannot be
    /// converted produce an outcome with an error status.
    pub fn process(
        catalog: &SectionCatalog,
        records: &[BulkRecord],
        today: NaiveDate,
    ) -> Vec<BulkOutcome> {
        records
            .iter()
            .map(|record| match record.to_row() {
                Ok(row) => process_row(catalog, &row, today),
                Err(message) => {
                    warn!(deductee = %record.deductee_name, %message, "skipping unreadable bulk row");
                    record.failed(message, today)
                }
            })
            .collect()
    }

    /// Write the results CSV.
    pub fn write_results<W: Write>(
        writer: W,
        outcomes: &[BulkOutcome],
    ) -> Result<(), BulkLoadError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for outcome in outcomes {
            csv_writer.serialize(BulkResultRecord::from(outcome))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write an upload template with a few sample rows.
    pub fn write_template<W: Write>(writer: W) -> Result<(), BulkLoadError> {
        let sample = [
            ("ABC Corporation", "ABCPD1234E", "194C", "150000", "2026-01-15"),
            ("John Doe", "BXYPJ5678K", "194J(b)", "75000", "2026-01-20"),
            ("XYZ Ltd", "XYZPF9012L", "194Q-Exceed", "600000", "2026-01-10"),
            ("No PAN Person", "", "194A", "50000", "2026-01-05"),
        ];

        let mut csv_writer = csv::Writer::from_writer(writer);
        for (name, pan, section, amount, date) in sample {
            csv_writer.serialize(BulkRecord {
                deductee_name: name.to_string(),
                deductee_pan: pan.to_string(),
                section_code: section.to_string(),
                amount: amount.to_string(),
                deduction_date: date.to_string(),
            })?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
