//! Terminal wizard for the TDS calculator.
//!
//! The wizard collects an entity and its transactions, sends them to the
//! TDS service and shows the results. [`state::Wizard`] holds the step
//! machine, [`api::ApiClient`] talks to the service and [`views`] renders
//! each step with cursive.

pub mod api;
pub mod app;
pub mod config;
pub mod logging;
pub mod state;
pub mod utils;
pub mod views;
