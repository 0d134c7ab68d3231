//! Bulk TDS calculation over a list of deductee payments.
//!
//! Unlike the wizard, bulk rows carry no category or PAN flag: both are
//! derived from the deductee PAN. Rows never abort the run; problems are
//! reported through [`BulkStatus`].

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calculations::{
    TdsStatus, applicable_rate, compute_tds, due_date, effective_threshold,
};
use crate::models::{DeducteeCategory, SectionCatalog};
use crate::pan::{detect_category, is_valid_pan};

/// One input row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkRow {
    pub deductee_name: String,
    pub deductee_pan: String,
    pub section_code: String,
    pub amount: Decimal,
    /// Falls back to the run date when absent.
    pub deduction_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkStatus {
    Computed(TdsStatus),
    InvalidSection(String),
    Error(String),
}

impl fmt::Display for BulkStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Computed(status) => status.fmt(f),
            Self::InvalidSection(code) => write!(f, "Invalid Section Code: {code}"),
            Self::Error(message) => write!(f, "Processing Error: {message}"),
        }
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub deductee_name: String,
    /// Uppercased PAN, or `None` when the row had none.
    pub deductee_pan: Option<String>,
    pub category: DeducteeCategory,
    pub pan_available: bool,
    pub section_code: String,
    pub amount: Decimal,
    /// `None` when the section is unknown.
    pub rate_display: Option<String>,
    pub tds_amount: Decimal,
    pub deduction_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: BulkStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkSummary {
    pub total: usize,
    pub taxable: usize,
    pub under_threshold: usize,
    /// `None` when the sum overflows.
    pub total_tds: Option<Decimal>,
}

/// Processes a single row. Never fails; failures become statuses.
pub fn process_row(
    catalog: &SectionCatalog,
    row: &BulkRow,
    today: NaiveDate,
) -> BulkOutcome {
    let pan = row.deductee_pan.trim().to_ascii_uppercase();
    let pan_available = !pan.is_empty() && is_valid_pan(&pan);
    let category = pan_available
        .then(|| detect_category(&pan))
        .flatten()
        .unwrap_or_default();
    let deduction_date = row.deduction_date.unwrap_or(today);

    let mut outcome = BulkOutcome {
        deductee_name: row.deductee_name.trim().to_string(),
        deductee_pan: (!pan.is_empty()).then_some(pan),
        category,
        pan_available,
        section_code: row.section_code.trim().to_string(),
        amount: row.amount,
        rate_display: None,
        tds_amount: Decimal::ZERO,
        deduction_date,
        due_date: None,
        status: BulkStatus::Computed(TdsStatus::NotApplicable),
    };

    let Some(section) = catalog.find(&outcome.section_code) else {
        outcome.status = BulkStatus::InvalidSection(outcome.section_code.clone());
        return outcome;
    };

    let rate = applicable_rate(section, category, pan_available);
    let threshold = effective_threshold(section, None, false);

    outcome.section_code = section.code.clone();
    outcome.rate_display = Some(rate.display);

    let computed = compute_tds(row.amount, rate.rate, threshold.threshold, threshold.tds_on_excess)
        .and_then(|tds| Ok((tds, due_date(deduction_date, section)?)));

    match computed {
        Ok((tds, due)) => {
            outcome.tds_amount = tds.amount;
            outcome.due_date = Some(due);
            outcome.status = BulkStatus::Computed(tds.status);
        }
        Err(e) => {
            warn!(deductee = %outcome.deductee_name, error = %e, "bulk row failed");
            outcome.status = BulkStatus::Error(e.to_string());
        }
    }

    outcome
}

/// Processes every row in order.
pub fn process_bulk(
    catalog: &SectionCatalog,
    rows: &[BulkRow],
    today: NaiveDate,
) -> Vec<BulkOutcome> {
    rows.iter()
        .map(|row| process_row(catalog, row, today))
        .collect()
}

pub fn summarize(outcomes: &[BulkOutcome]) -> BulkSummary {
    outcomes.iter().fold(
        BulkSummary {
            total: outcomes.len(),
            taxable: 0,
            under_threshold: 0,
            total_tds: Some(Decimal::ZERO),
        },
        |mut summary, outcome| {
            match outcome.status {
                BulkStatus::Computed(TdsStatus::Taxable) => summary.taxable += 1,
                BulkStatus::Computed(TdsStatus::UnderThreshold) => summary.under_threshold += 1,
                _ => {}
            }
            summary.total_tds = summary
                .total_tds
                .and_then(|total| total.checked_add(outcome.tds_amount));
            summary
        },
    )
}
