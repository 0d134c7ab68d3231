//! HTTP backend for the TDS calculator.
//!
//! Serves the rate chart, runs calculations and renders Excel reports.

pub mod errors;
pub mod excel;
pub mod handlers;
pub mod routes;
pub mod state;

pub use errors::{ApiError, ErrorResponse};
pub use routes::{create_router, serve};
pub use state::AppState;
