//! TDS calculation engine.
//!
//! [`TdsWorksheet`] runs the full computation for wizard transactions;
//! [`process_bulk`] runs the reduced PAN-driven variant for bulk uploads.
//! The remaining modules hold the individual rules.

mod bulk;
pub mod common;
mod due_date;
mod error;
mod interest;
mod rate;
mod worksheet;

pub use bulk::{BulkOutcome, BulkRow, BulkStatus, BulkSummary, process_bulk, process_row, summarize};
pub use due_date::{due_date, month_end};
pub use error::CalculationError;
pub use interest::{LateInterest, MONTHLY_INTEREST_RATE, late_interest};
pub use rate::{
    ApplicableRate, EffectiveThreshold, PURCHASE_OF_GOODS_SECTION, TdsAmount, TdsStatus,
    applicable_rate, compute_tds, effective_threshold, resolve_rate,
};
pub use worksheet::TdsWorksheet;
