use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{DeducteeCategory, Entity, TransactionInput};
use crate::calculations::common::checked_total;

/// The outcome of calculating TDS for one transaction.
///
/// Dates are carried both as ISO strings (`2025-06-07`) and in the
/// `DD-Mon-YYYY` display form; money is carried both as a decimal and as
/// an Indian-formatted string (`₹1,50,000`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TdsResult {
    pub transaction_number: usize,
    pub section: String,
    pub section_description: String,
    pub category: DeducteeCategory,
    pub category_short: String,
    pub pan_available: bool,
    pub amount: Decimal,
    pub amount_formatted: String,
    pub effective_threshold: Option<Decimal>,
    pub effective_threshold_note: String,
    pub rate: Option<Decimal>,
    pub rate_display: String,
    pub tds_amount: Decimal,
    pub tds_amount_formatted: String,
    pub above_threshold: bool,
    pub deduction_date: String,
    pub deduction_date_formatted: String,
    pub due_date: String,
    pub due_date_formatted: String,
    pub payment_date: String,
    pub payment_date_formatted: String,
    pub is_late: bool,
    pub months_late: u32,
    pub interest: Decimal,
    pub interest_formatted: String,
    pub total_payable: Decimal,
    pub total_payable_formatted: String,
    pub is_property_section: bool,
    pub has_threshold_types: bool,
    pub has_slabs: bool,
    pub has_conditions: bool,
}

/// Body of `POST /calculate/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub entity: Entity,
    pub transactions: Vec<TransactionInput>,
}

/// Response of `POST /calculate/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub entity: Entity,
    pub results: Vec<TdsResult>,
}

/// Totals are `None` when the sum does not fit in a [`Decimal`].
impl CalculateResponse {
    pub fn total_tds(&self) -> Option<Decimal> {
        checked_total(self.results.iter().map(|r| r.tds_amount))
    }

    pub fn total_interest(&self) -> Option<Decimal> {
        checked_total(self.results.iter().map(|r| r.interest))
    }

    pub fn total_payable(&self) -> Option<Decimal> {
        checked_total(self.results.iter().map(|r| r.total_payable))
    }
}

/// Body of `POST /generate-excel/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcelRequest {
    pub entity: Entity,
    pub results: Vec<TdsResult>,
}
