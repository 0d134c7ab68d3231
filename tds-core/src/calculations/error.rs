use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while computing a transaction's TDS.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalculationError {
    #[error("Section {0} not found")]
    UnknownSection(String),

    /// The due date would fall outside the supported calendar.
    #[error("due date for deduction on {0} is out of range")]
    DateOutOfRange(NaiveDate),

    /// Tax, interest or a total does not fit in a `Decimal`.
    #[error("amount is too large to compute TDS")]
    AmountOutOfRange,
}
