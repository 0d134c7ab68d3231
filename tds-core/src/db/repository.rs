use async_trait::async_trait;
use thiserror::Error;

use crate::models::{SectionCatalog, TdsSection};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Storage for the TDS rate chart.
#[async_trait]
pub trait SectionRepository: Send + Sync {
    /// All sections in chart order.
    async fn list_sections(&self) -> Result<Vec<TdsSection>, RepositoryError>;

    /// Looks up a section by code, ignoring ASCII case.
    async fn get_section(
        &self,
        code: &str,
    ) -> Result<TdsSection, RepositoryError>;

    /// Inserts or replaces a section together with its slabs, threshold
    /// types and conditions. New sections go to the end of the chart.
    async fn upsert_section(
        &self,
        section: &TdsSection,
    ) -> Result<(), RepositoryError>;

    async fn delete_section(
        &self,
        code: &str,
    ) -> Result<(), RepositoryError>;

    /// Loads the whole chart as a catalog for calculation.
    async fn catalog(&self) -> Result<SectionCatalog, RepositoryError> {
        Ok(SectionCatalog::new(self.list_sections().await?))
    }
}
