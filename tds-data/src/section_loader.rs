use std::collections::HashSet;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use tds_core::{
    RateCondition, RateSlab, RepositoryError, SectionRepository, TdsSection, ThresholdType,
};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading the rate chart.
#[derive(Debug, Error)]
pub enum SectionLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Section {code}: invalid {column} entry '{entry}'")]
    InvalidList {
        code: String,
        column: &'static str,
        entry: String,
    },

    #[error("Duplicate section code '{0}' in CSV")]
    DuplicateCode(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for SectionLoaderError {
    fn from(err: csv::Error) -> Self {
        SectionLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the rate chart CSV file.
///
/// Columns:
/// - `code`, `description`
/// - `threshold`: empty when the section has no threshold
/// - `threshold_note`: text shown next to the threshold
/// - `company_rate`, `individual_rate`: percentages, empty when not applicable
/// - `no_pan_rate`: percentage applied when the deductee has no PAN
/// - `company_rate_note`, `individual_rate_note`: optional
/// - `is_property_section`, `tds_on_excess`: `true`/`false`, `1`/`0`, `yes`/`no`
/// - `threshold_types`: `name=threshold=note` entries separated by `;`
/// - `slabs`: `description=rate` entries separated by `;`
/// - `conditions`: `condition=rate` entries separated by `;`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SectionRecord {
    pub code: String,
    pub description: String,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub threshold: Option<Decimal>,
    #[serde(default)]
    pub threshold_note: String,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub company_rate: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub individual_rate: Option<Decimal>,
    pub no_pan_rate: Decimal,
    #[serde(default)]
    pub company_rate_note: String,
    #[serde(default)]
    pub individual_rate_note: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_property_section: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub tds_on_excess: bool,
    #[serde(default)]
    pub threshold_types: String,
    #[serde(default)]
    pub slabs: String,
    #[serde(default)]
    pub conditions: String,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        None | Some("") | Some("false") | Some("0") | Some("no") | Some("n") => Ok(false),
        Some("true") | Some("1") | Some("yes") | Some("y") => Ok(true),
        Some(other) => Err(serde::de::Error::custom(format!("invalid flag '{other}'"))),
    }
}

fn entries(list: &str) -> impl Iterator<Item = &str> {
    list.split(';').map(str::trim).filter(|e| !e.is_empty())
}

impl SectionRecord {
    fn invalid(
        &self,
        column: &'static str,
        entry: &str,
    ) -> SectionLoaderError {
        SectionLoaderError::InvalidList {
            code: self.code.clone(),
            column,
            entry: entry.to_string(),
        }
    }

    fn parse_rate(
        &self,
        column: &'static str,
        entry: &str,
        value: &str,
    ) -> Result<Decimal, SectionLoaderError> {
        value
            .trim()
            .parse::<Decimal>()
            .map_err(|_| self.invalid(column, entry))
    }

    /// Converts the record to a section, parsing the list columns.
    pub fn to_section(&self) -> Result<TdsSection, SectionLoaderError> {
        let threshold_types = entries(&self.threshold_types)
            .map(|entry| {
                let mut parts = entry.splitn(3, '=');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(name), Some(threshold), Some(note)) => Ok(ThresholdType {
                        name: name.trim().to_string(),
                        threshold: self.parse_rate("threshold_types", entry, threshold)?,
                        threshold_note: note.trim().to_string(),
                    }),
                    _ => Err(self.invalid("threshold_types", entry)),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let slabs = entries(&self.slabs)
            .map(|entry| match entry.rsplit_once('=') {
                Some((description, rate)) => Ok(RateSlab {
                    description: description.trim().to_string(),
                    rate: self.parse_rate("slabs", entry, rate)?,
                }),
                None => Err(self.invalid("slabs", entry)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let conditions = entries(&self.conditions)
            .map(|entry| match entry.rsplit_once('=') {
                Some((condition, rate)) => Ok(RateCondition {
                    condition: condition.trim().to_string(),
                    rate: self.parse_rate("conditions", entry, rate)?,
                }),
                None => Err(self.invalid("conditions", entry)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let threshold_note = match self.threshold_note.trim() {
            "" => "-".to_string(),
            note => note.to_string(),
        };

        Ok(TdsSection {
            code: self.code.trim().to_string(),
            description: self.description.trim().to_string(),
            threshold: self.threshold,
            threshold_note,
            company_rate: self.company_rate,
            individual_rate: self.individual_rate,
            no_pan_rate: self.no_pan_rate,
            company_rate_note: self.company_rate_note.trim().to_string(),
            individual_rate_note: self.individual_rate_note.trim().to_string(),
            is_property_section: self.is_property_section,
            tds_on_excess: self.tds_on_excess,
            slabs,
            threshold_types,
            conditions,
        })
    }
}

/// Loader for the TDS rate chart from CSV files.
///
/// This loader reads CSV data and writes it through the
/// `SectionRepository` trait, so it works with any database backend.
pub struct SectionLoader;

impl SectionLoader {
    /// Parse rate chart records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<SectionRecord>, SectionLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: SectionRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Converts records to sections, rejecting duplicate codes (compared
    /// without regard to case).
    pub fn to_sections(records: &[SectionRecord]) -> Result<Vec<TdsSection>, SectionLoaderError> {
        let mut seen = HashSet::new();
        records
            .iter()
            .map(|record| {
                let section = record.to_section()?;
                if !seen.insert(section.code.to_uppercase()) {
                    return Err(SectionLoaderError::DuplicateCode(section.code));
                }
                Ok(section)
            })
            .collect()
    }

    /// Load rate chart records into the database.
    ///
    /// Every record is validated before anything is written. Existing
    /// sections are replaced along with their slabs, threshold types and
    /// conditions, so loading the same file twice gives the same result.
    pub async fn load<R: SectionRepository + ?Sized>(
        repo: &R,
        records: &[SectionRecord],
    ) -> Result<usize, SectionLoaderError> {
        let sections = Self::to_sections(records)?;

        for section in &sections {
            repo.upsert_section(section).await?;
            debug!(code = %section.code, "loaded section");
        }

        info!(count = sections.len(), "rate chart loaded");
        Ok(sections.len())
    }

    /// Deletes sections that do not appear in `records`. Returns the number
    /// of sections removed.
    pub async fn prune<R: SectionRepository + ?Sized>(
        repo: &R,
        records: &[SectionRecord],
    ) -> Result<usize, SectionLoaderError> {
        let keep: HashSet<String> = records
            .iter()
            .map(|r| r.code.trim().to_uppercase())
            .collect();

        let mut removed = 0;
        for section in repo.list_sections().await? {
            if !keep.contains(&section.code.to_uppercase()) {
                repo.delete_section(&section.code).await?;
                info!(code = %section.code, "removed section missing from rate chart");
                removed += 1;
            }
        }

        Ok(removed)
    }
}
