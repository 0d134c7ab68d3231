//! Full TDS computation for one transaction.
//!
//! The worksheet runs the steps in order:
//!
//! 1. Base rate from PAN availability and deductee category.
//! 2. Slab or condition override.
//! 3. Effective threshold (threshold type, 194Q carry-over).
//! 4. TDS amount.
//! 5. Due date.
//! 6. Late-payment interest.
//! 7. Total payable = TDS + interest.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use tds_core::calculations::TdsWorksheet;
//! use tds_core::{DeducteeCategory, SectionCatalog, TdsSection, TransactionInput};
//!
//! let catalog = SectionCatalog::new(vec![TdsSection {
//!     threshold: Some(dec!(20000)),
//!     company_rate: Some(dec!(2)),
//!     individual_rate: Some(dec!(2)),
//!     ..TdsSection::new("194H", "Commission / Brokerage")
//! }]);
//!
//! let input = TransactionInput {
//!     deductee_name: None,
//!     deductee_pan: None,
//!     section_code: "194H".to_string(),
//!     amount: dec!(50000),
//!     category: DeducteeCategory::Individual,
//!     pan_available: true,
//!     deduction_date: NaiveDate::from_ymd_opt(2025, 5, 15).unwrap(),
//!     payment_date: NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
//!     threshold_type: None,
//!     annual_threshold_exceeded: false,
//!     selected_slab: None,
//!     selected_condition: None,
//!     threshold_exceeded_before: false,
//! };
//!
//! let result = TdsWorksheet::new(&catalog).calculate(&input, 1).unwrap();
//!
//! assert_eq!(result.tds_amount, dec!(1000));
//! assert_eq!(result.due_date, "2025-06-07");
//! assert!(!result.is_late);
//! ```

use tracing::debug;

use crate::calculations::common::checked_total;
use crate::calculations::{
    CalculationError, compute_tds, due_date, effective_threshold, late_interest, resolve_rate,
};
use crate::format::{display_date, indian_currency, iso_date};
use crate::models::{SectionCatalog, TdsResult, TransactionInput};

/// Computes [`TdsResult`]s against a section catalog.
#[derive(Debug, Clone, Copy)]
pub struct TdsWorksheet<'a> {
    catalog: &'a SectionCatalog,
}

impl<'a> TdsWorksheet<'a> {
    pub fn new(catalog: &'a SectionCatalog) -> Self {
        Self { catalog }
    }

    /// Computes the result for one transaction.
    ///
    /// `transaction_number` is the 1-based position shown on the report.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::UnknownSection`] when the section code is
    /// not in the catalog, [`CalculationError::DateOutOfRange`] when the
    /// due date cannot be represented and
    /// [`CalculationError::AmountOutOfRange`] when tax or interest overflows.
    pub fn calculate(
        &self,
        input: &TransactionInput,
        transaction_number: usize,
    ) -> Result<TdsResult, CalculationError> {
        let section = self
            .catalog
            .find(&input.section_code)
            .ok_or_else(|| CalculationError::UnknownSection(input.section_code.clone()))?;

        let rate = resolve_rate(
            section,
            input.category,
            input.pan_available,
            input.selected_slab.as_deref(),
            input.selected_condition.as_deref(),
        );

        let threshold = effective_threshold(
            section,
            input.threshold_type.as_deref(),
            input.threshold_exceeded_before,
        );

        let tds = compute_tds(
            input.amount,
            rate.rate,
            threshold.threshold,
            threshold.tds_on_excess,
        )?;

        let due = due_date(input.deduction_date, section)?;
        let interest = late_interest(tds.amount, input.deduction_date, input.payment_date, due)?;
        let total_payable = tds
            .amount
            .checked_add(interest.interest)
            .ok_or(CalculationError::AmountOutOfRange)?;

        debug!(
            section = %section.code,
            amount = %input.amount,
            tds = %tds.amount,
            months_late = interest.months,
            "calculated transaction {}",
            transaction_number
        );

        Ok(TdsResult {
            transaction_number,
            section: section.code.clone(),
            section_description: section.description.clone(),
            category: input.category,
            category_short: input.category.short_label().to_string(),
            pan_available: input.pan_available,
            amount: input.amount,
            amount_formatted: indian_currency(input.amount),
            effective_threshold: threshold.threshold,
            effective_threshold_note: threshold.note,
            rate: rate.rate,
            rate_display: rate.display,
            tds_amount: tds.amount,
            tds_amount_formatted: indian_currency(tds.amount),
            above_threshold: tds.above_threshold,
            deduction_date: iso_date(input.deduction_date),
            deduction_date_formatted: display_date(input.deduction_date),
            due_date: iso_date(due),
            due_date_formatted: display_date(due),
            payment_date: iso_date(input.payment_date),
            payment_date_formatted: display_date(input.payment_date),
            is_late: interest.is_late,
            months_late: interest.months,
            interest: interest.interest,
            interest_formatted: indian_currency(interest.interest),
            total_payable,
            total_payable_formatted: indian_currency(total_payable),
            is_property_section: section.is_property_section,
            has_threshold_types: section.has_threshold_types(),
            has_slabs: section.has_slabs(),
            has_conditions: section.has_conditions(),
        })
    }

    /// Computes every transaction, numbering them from 1. Stops at the
    /// first failure.
    ///
    /// The batch is rejected with [`CalculationError::AmountOutOfRange`]
    /// when its grand total would overflow.
    pub fn calculate_all(
        &self,
        inputs: &[TransactionInput],
    ) -> Result<Vec<TdsResult>, CalculationError> {
        let results = inputs
            .iter()
            .enumerate()
            .map(|(i, input)| self.calculate(input, i + 1))
            .collect::<Result<Vec<_>, _>>()?;

        checked_total(results.iter().map(|r| r.total_payable))
            .ok_or(CalculationError::AmountOutOfRange)?;

        Ok(results)
    }
}
