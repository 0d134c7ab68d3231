//! Core types and rules for computing Tax Deducted at Source (TDS) on
//! non-salary payments for FY 2025-26.

pub mod calculations;
pub mod db;
pub mod export;
pub mod format;
pub mod models;
pub mod pan;
pub mod validation;

pub use calculations::{CalculationError, TdsWorksheet};
pub use db::repository::{RepositoryError, SectionRepository};
pub use models::*;

/// The financial year the rate chart covers.
pub const FINANCIAL_YEAR: &str = "2025-26";

/// Most transactions a single calculation may carry.
pub const MAX_TRANSACTIONS: usize = 20;
