//! Rate and threshold selection for a single payment.
//!
//! The applicable rate depends on PAN availability and the deductee
//! category; slab and condition selections override it. The threshold
//! comes from the section unless the user picked one of its threshold
//! types.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::CalculationError;
use crate::calculations::common::{format_rate, percent_of};
use crate::models::{DeducteeCategory, TdsSection};

/// Section whose threshold stops applying once earlier purchases crossed it.
pub const PURCHASE_OF_GOODS_SECTION: &str = "194Q";

const NOT_APPLICABLE: &str = "Not Applicable";

/// The rate that applies to a payment together with its display string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicableRate {
    /// Percentage rate, or `None` when the section does not apply.
    pub rate: Option<Decimal>,
    pub display: String,
}

impl ApplicableRate {
    fn not_applicable() -> Self {
        Self {
            rate: None,
            display: NOT_APPLICABLE.to_string(),
        }
    }

    fn with_note(
        rate: Decimal,
        note: &str,
    ) -> Self {
        Self {
            rate: Some(rate),
            display: format!("{} {}", format_rate(rate), note)
                .trim()
                .to_string(),
        }
    }
}

/// Picks the base rate from the section's rate columns.
pub fn applicable_rate(
    section: &TdsSection,
    category: DeducteeCategory,
    pan_available: bool,
) -> ApplicableRate {
    if !pan_available {
        return ApplicableRate {
            rate: Some(section.no_pan_rate),
            display: format!("{} (No PAN)", format_rate(section.no_pan_rate)),
        };
    }

    let (rate, note) = match category {
        DeducteeCategory::Company => (section.company_rate, &section.company_rate_note),
        DeducteeCategory::Individual => (section.individual_rate, &section.individual_rate_note),
    };

    match rate {
        Some(rate) => ApplicableRate::with_note(rate, note),
        None => ApplicableRate::not_applicable(),
    }
}

/// Applies a matching slab or condition selection on top of the base rate.
///
/// Unknown selections are ignored and the base rate stands.
pub fn resolve_rate(
    section: &TdsSection,
    category: DeducteeCategory,
    pan_available: bool,
    selected_slab: Option<&str>,
    selected_condition: Option<&str>,
) -> ApplicableRate {
    let mut applicable = applicable_rate(section, category, pan_available);

    if let Some(slab) = selected_slab.and_then(|s| section.slab(s)) {
        applicable = ApplicableRate::with_note(slab.rate, "");
    }

    if let Some(condition) = selected_condition.and_then(|c| section.condition(c)) {
        applicable = ApplicableRate::with_note(condition.rate, "");
    }

    applicable
}

/// The threshold a payment is tested against, with its display note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveThreshold {
    pub threshold: Option<Decimal>,
    pub note: String,
    pub tds_on_excess: bool,
}

/// Determines the threshold and excess rule for a payment.
pub fn effective_threshold(
    section: &TdsSection,
    threshold_type: Option<&str>,
    threshold_exceeded_before: bool,
) -> EffectiveThreshold {
    let mut effective = EffectiveThreshold {
        threshold: section.threshold,
        note: section.threshold_note.clone(),
        tds_on_excess: section.tds_on_excess,
    };

    if let Some(chosen) = threshold_type.and_then(|t| section.threshold_type(t)) {
        effective.threshold = Some(chosen.threshold);
        effective.note = chosen.threshold_note.clone();
    }

    if section.code == PURCHASE_OF_GOODS_SECTION && threshold_exceeded_before {
        effective.threshold = None;
        effective.tds_on_excess = false;
    }

    effective
}

/// Why a payment did or did not attract TDS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TdsStatus {
    Taxable,
    UnderThreshold,
    NotApplicable,
}

impl fmt::Display for TdsStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            Self::Taxable => "Taxable",
            Self::UnderThreshold => "Under Threshold",
            Self::NotApplicable => NOT_APPLICABLE,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TdsAmount {
    pub amount: Decimal,
    pub above_threshold: bool,
    pub status: TdsStatus,
}

/// Computes the tax to deduct.
///
/// A payment exactly at the threshold is taxable. For excess-only sections
/// the rate applies to `amount - threshold`.
///
/// # Errors
///
/// Returns [`CalculationError::AmountOutOfRange`] when the tax overflows.
pub fn compute_tds(
    amount: Decimal,
    rate: Option<Decimal>,
    threshold: Option<Decimal>,
    tds_on_excess: bool,
) -> Result<TdsAmount, CalculationError> {
    let Some(rate) = rate else {
        return Ok(TdsAmount {
            amount: Decimal::ZERO,
            above_threshold: false,
            status: TdsStatus::NotApplicable,
        });
    };

    if let Some(threshold) = threshold {
        if amount < threshold {
            return Ok(TdsAmount {
                amount: Decimal::ZERO,
                above_threshold: false,
                status: TdsStatus::UnderThreshold,
            });
        }
    }

    let taxable = match threshold {
        Some(threshold) if tds_on_excess => amount.checked_sub(threshold),
        _ => Some(amount),
    };

    Ok(TdsAmount {
        amount: taxable
            .and_then(|taxable| percent_of(taxable, rate))
            .ok_or(CalculationError::AmountOutOfRange)?,
        above_threshold: true,
        status: TdsStatus::Taxable,
    })
}
