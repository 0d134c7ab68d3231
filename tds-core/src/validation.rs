//! Form validation for entities and transaction drafts.
//!
//! A transaction is complete when it has a section code, a positive amount
//! and both dates. Nothing else is required: the backend decides whether
//! the section applies.

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{Entity, TransactionDraft, TransactionInput};
use crate::pan::is_valid_pan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    SectionCode,
    Amount,
    DeductionDate,
    PaymentDate,
}

impl fmt::Display for MissingField {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            Self::SectionCode => "section",
            Self::Amount => "amount",
            Self::DeductionDate => "deduction date",
            Self::PaymentDate => "payment date",
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Entity name is required")]
    MissingEntityName,

    #[error("Invalid PAN format: {0}")]
    InvalidPan(String),

    #[error("Transaction {number} is incomplete: missing {}", join(.missing))]
    IncompleteTransaction {
        /// 1-based position in the list.
        number: usize,
        missing: Vec<MissingField>,
    },
}

fn join(missing: &[MissingField]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Lists the required fields the draft does not yet have.
pub fn missing_fields(draft: &TransactionDraft) -> Vec<MissingField> {
    let mut missing = Vec::new();
    if draft.section_code.trim().is_empty() {
        missing.push(MissingField::SectionCode);
    }
    if draft.amount <= Decimal::ZERO {
        missing.push(MissingField::Amount);
    }
    if draft.deduction_date.is_none() {
        missing.push(MissingField::DeductionDate);
    }
    if draft.payment_date.is_none() {
        missing.push(MissingField::PaymentDate);
    }
    missing
}

pub fn is_complete(draft: &TransactionDraft) -> bool {
    missing_fields(draft).is_empty()
}

/// Checks a draft and converts it to a request row.
///
/// `index` is the 0-based position used for the error message.
pub fn validate_draft(
    index: usize,
    draft: &TransactionDraft,
) -> Result<TransactionInput, ValidationError> {
    let incomplete = |missing| ValidationError::IncompleteTransaction {
        number: index + 1,
        missing,
    };

    let missing = missing_fields(draft);
    if !missing.is_empty() {
        return Err(incomplete(missing));
    }

    draft
        .to_input()
        .ok_or_else(|| incomplete(vec![MissingField::DeductionDate, MissingField::PaymentDate]))
}

/// Validates every draft, stopping at the first incomplete one.
pub fn validate_all(drafts: &[TransactionDraft]) -> Result<Vec<TransactionInput>, ValidationError> {
    drafts
        .iter()
        .enumerate()
        .map(|(i, draft)| validate_draft(i, draft))
        .collect()
}

/// Trims the entity fields, uppercases the PAN and checks its format.
pub fn validate_entity(
    name: &str,
    pan: &str,
) -> Result<Entity, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingEntityName);
    }

    let pan = pan.trim().to_ascii_uppercase();
    if !is_valid_pan(&pan) {
        return Err(ValidationError::InvalidPan(pan));
    }

    Ok(Entity::new(name, pan))
}
