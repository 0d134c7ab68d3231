//! PAN (Permanent Account Number) helpers.
//!
//! A PAN is ten characters: five letters, four digits, one letter. The
//! fourth letter encodes the holder's status, which decides the deductee
//! category.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::DeducteeCategory;

static PAN_FORMAT: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$"));

/// Returns `true` when `pan` has the PAN shape, ignoring case.
pub fn is_valid_pan(pan: &str) -> bool {
    let pan = pan.trim().to_ascii_uppercase();
    PAN_FORMAT
        .as_ref()
        .is_ok_and(|re| re.is_match(&pan))
}

/// Maps the PAN status letter to a deductee category.
///
/// `P` (person) and `H` (HUF) are individuals; companies, firms,
/// government, local authorities, artificial juridical persons, AOPs,
/// BOIs and trusts are treated as companies. Any other letter, or a PAN
/// shorter than four characters, yields `None`.
pub fn detect_category(pan: &str) -> Option<DeducteeCategory> {
    let status = pan.trim().chars().nth(3)?.to_ascii_uppercase();
    match status {
        'P' | 'H' => Some(DeducteeCategory::Individual),
        'C' | 'F' | 'G' | 'L' | 'J' | 'A' | 'B' | 'T' => Some(DeducteeCategory::Company),
        _ => None,
    }
}
