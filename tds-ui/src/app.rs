//! Application state shared by every view.
//!
//! Views hold no state of their own: they read [`AppState`] from cursive's
//! user data, mutate the wizard and call the service through the actions
//! below. Every failed action leaves its message in the wizard banner.

use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tds_core::{SectionCatalog, TdsSection};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::state::{Wizard, WizardError};
use crate::utils::save_report;

/// Filename used when neither the service nor the entity suggests one.
const FALLBACK_REPORT_NAME: &str = "TDS_Report.xlsx";

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Calculate TDS before exporting")]
    NothingToExport,

    #[error("Could not save report to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub struct AppState {
    pub wizard: Wizard,
    api: ApiClient,
    catalog: SectionCatalog,
    export_dir: PathBuf,
}

impl AppState {
    pub fn new(
        api: ApiClient,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            wizard: Wizard::new(),
            api,
            catalog: SectionCatalog::default(),
            export_dir,
        }
    }

    pub fn catalog(&self) -> &SectionCatalog {
        &self.catalog
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn api_url(&self) -> &str {
        self.api.base_url()
    }

    fn report<T>(
        &mut self,
        result: Result<T, ActionError>,
    ) -> Result<T, ActionError> {
        if let Err(e) = &result {
            warn!(error = %e, "action failed");
            self.wizard.set_banner(e.to_string());
        }
        result
    }

    /// Replaces the catalog with the service's section list.
    pub fn refresh_sections(&mut self) -> Result<usize, ActionError> {
        let result = self
            .api
            .sections()
            .map(|listings| {
                self.catalog =
                    SectionCatalog::new(listings.into_iter().map(TdsSection::from).collect());
                info!(sections = self.catalog.len(), "section catalog loaded");
                self.catalog.len()
            })
            .map_err(ActionError::from);
        self.report(result)
    }

    /// Loads the catalog if it is still empty.
    pub fn ensure_sections(&mut self) -> Result<usize, ActionError> {
        if self.catalog.is_empty() {
            self.refresh_sections()
        } else {
            Ok(self.catalog.len())
        }
    }

    /// Submits the current transactions and moves to the results step.
    pub fn calculate(&mut self) -> Result<(), ActionError> {
        let result = self.submit();
        self.report(result)
    }

    fn submit(&mut self) -> Result<(), ActionError> {
        let request = self.wizard.calculation_request()?;
        let response = self.api.calculate(&request)?;
        info!(
            entity = %response.entity.entity_name,
            results = response.results.len(),
            "calculation complete"
        );
        self.wizard.accept_results(response)?;
        Ok(())
    }

    /// Downloads the report for the current results and writes it into
    /// the export directory.
    pub fn export_report(
        &mut self,
        today: NaiveDate,
    ) -> Result<PathBuf, ActionError> {
        let result = self.download(today);
        self.report(result)
    }

    fn download(
        &self,
        today: NaiveDate,
    ) -> Result<PathBuf, ActionError> {
        let request = self
            .wizard
            .excel_request()
            .ok_or(ActionError::NothingToExport)?;
        let download = self.api.generate_excel(&request)?;

        let filename = download
            .filename
            .or_else(|| self.wizard.export_filename(today))
            .unwrap_or_else(|| FALLBACK_REPORT_NAME.to_string());

        let path = save_report(&self.export_dir, &filename, &download.bytes).map_err(
            |source| ActionError::Save {
                path: self.export_dir.join(&filename),
                source,
            },
        )?;
        info!(path = %path.display(), bytes = download.bytes.len(), "report saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::state::Step;

    fn offline() -> AppState {
        // Port 9 (discard) is never served in test environments.
        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        AppState::new(api, PathBuf::from("reports"))
    }

    #[test]
    fn starts_with_empty_catalog() {
        let state = offline();

        assert!(state.catalog().is_empty());
        assert_eq!(state.export_dir(), Path::new("reports"));
        assert_eq!(state.api_url(), "http://127.0.0.1:9");
    }

    #[test]
    fn export_without_results_sets_banner() {
        let mut state = offline();

        let err = state
            .export_report(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap())
            .unwrap_err();

        assert!(matches!(err, ActionError::NothingToExport));
        assert_eq!(state.wizard.banner(), Some("Calculate TDS before exporting"));
    }

    #[test]
    fn calculate_outside_transactions_step_is_rejected() {
        let mut state = offline();

        let err = state.calculate().unwrap_err();

        assert!(matches!(
            err,
            ActionError::Wizard(WizardError::WrongStep { step: Step::Entity, .. })
        ));
        assert!(state.wizard.banner().is_some());
    }

    #[test]
    fn unreachable_service_reports_network_error() {
        let mut state = offline();

        let err = state.refresh_sections().unwrap_err();

        assert!(matches!(err, ActionError::Api(ApiError::Network { .. })));
        assert!(
            state
                .wizard
                .banner()
                .unwrap()
                .starts_with("Could not reach the TDS service")
        );
    }
}
