use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{DeducteeCategory, TdsSection};
use crate::calculations::PURCHASE_OF_GOODS_SECTION;

/// A fully specified transaction as accepted by the calculation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    #[serde(default)]
    pub deductee_name: Option<String>,
    #[serde(default)]
    pub deductee_pan: Option<String>,
    pub section_code: String,
    pub amount: Decimal,
    pub category: DeducteeCategory,
    pub pan_available: bool,
    pub deduction_date: NaiveDate,
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub threshold_type: Option<String>,
    #[serde(default)]
    pub annual_threshold_exceeded: bool,
    #[serde(default)]
    pub selected_slab: Option<String>,
    #[serde(default)]
    pub selected_condition: Option<String>,
    /// For 194Q: the 50 lakh threshold was crossed by earlier purchases, so
    /// TDS applies to the whole of this payment.
    #[serde(default)]
    pub threshold_exceeded_before: bool,
}

/// The in-progress form state for one transaction.
///
/// Drafts start empty and are edited in place; see
/// [`crate::validation`] for when a draft counts as complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub deductee_name: String,
    pub deductee_pan: String,
    pub section_code: String,
    pub amount: Decimal,
    pub category: DeducteeCategory,
    pub pan_available: bool,
    pub deduction_date: Option<NaiveDate>,
    pub payment_date: Option<NaiveDate>,
    pub threshold_type: Option<String>,
    pub annual_threshold_exceeded: bool,
    pub selected_slab: Option<String>,
    pub selected_condition: Option<String>,
    pub threshold_exceeded_before: bool,
}

impl Default for TransactionDraft {
    fn default() -> Self {
        Self {
            deductee_name: String::new(),
            deductee_pan: String::new(),
            section_code: String::new(),
            amount: Decimal::ZERO,
            category: DeducteeCategory::default(),
            pan_available: true,
            deduction_date: None,
            payment_date: None,
            threshold_type: None,
            annual_threshold_exceeded: false,
            selected_slab: None,
            selected_condition: None,
            threshold_exceeded_before: false,
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn non_blank_opt(s: &Option<String>) -> Option<String> {
    s.as_deref().and_then(non_blank)
}

impl TransactionDraft {
    /// Switches the draft to `section`. Threshold type, slab and condition
    /// default to the section's first option, and the prior-purchases flag
    /// is cleared unless the section is 194Q.
    pub fn select_section(
        &mut self,
        section: &TdsSection,
    ) {
        self.section_code = section.code.clone();
        self.threshold_type = section.threshold_types.first().map(|t| t.name.clone());
        self.selected_slab = section.slabs.first().map(|s| s.description.clone());
        self.selected_condition = section.conditions.first().map(|c| c.condition.clone());
        if section.code != PURCHASE_OF_GOODS_SECTION {
            self.threshold_exceeded_before = false;
        }
    }

    /// Converts the draft to a request row. Returns `None` while either date
    /// is missing; callers validate first to report which fields are absent.
    pub fn to_input(&self) -> Option<TransactionInput> {
        Some(TransactionInput {
            deductee_name: non_blank(&self.deductee_name),
            deductee_pan: non_blank(&self.deductee_pan).map(|p| p.to_ascii_uppercase()),
            section_code: self.section_code.trim().to_string(),
            amount: self.amount,
            category: self.category,
            pan_available: self.pan_available,
            deduction_date: self.deduction_date?,
            payment_date: self.payment_date?,
            threshold_type: non_blank_opt(&self.threshold_type),
            annual_threshold_exceeded: self.annual_threshold_exceeded,
            selected_slab: non_blank_opt(&self.selected_slab),
            selected_condition: non_blank_opt(&self.selected_condition),
            threshold_exceeded_before: self.threshold_exceeded_before,
        })
    }
}
