use std::fmt::Write as _;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A rate that applies when the payment falls into a named slab
/// (e.g. cash withdrawals by non-filers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSlab {
    pub description: String,
    pub rate: Decimal,
}

/// An alternative threshold the user can pick for sections that have more
/// than one (e.g. 194C single transaction vs. annual aggregate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdType {
    #[serde(rename = "type")]
    pub name: String,
    pub threshold: Decimal,
    pub threshold_note: String,
}

/// A rate that replaces the category rate when the named condition holds
/// (e.g. non-resident unit holders).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateCondition {
    pub condition: String,
    pub rate: Decimal,
}

/// One row of the TDS rate chart.
///
/// Rates are percentages (`10` means 10%). A `None` rate means the section
/// does not apply to that deductee category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TdsSection {
    pub code: String,
    pub description: String,
    pub threshold: Option<Decimal>,
    pub threshold_note: String,
    pub company_rate: Option<Decimal>,
    pub individual_rate: Option<Decimal>,
    pub no_pan_rate: Decimal,
    pub company_rate_note: String,
    pub individual_rate_note: String,
    /// Due date is 30 days from the end of the deduction month (194IA, 194IB).
    pub is_property_section: bool,
    /// TDS is charged only on the amount exceeding the threshold.
    pub tds_on_excess: bool,
    pub slabs: Vec<RateSlab>,
    pub threshold_types: Vec<ThresholdType>,
    pub conditions: Vec<RateCondition>,
}

impl TdsSection {
    /// A section with no threshold, no applicable rates and the standard
    /// 20% no-PAN rate. Intended as the base for struct-update syntax.
    pub fn new(
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            threshold: None,
            threshold_note: "-".to_string(),
            company_rate: None,
            individual_rate: None,
            no_pan_rate: Decimal::from(20),
            company_rate_note: String::new(),
            individual_rate_note: String::new(),
            is_property_section: false,
            tds_on_excess: false,
            slabs: Vec::new(),
            threshold_types: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// Label used in dropdowns: `"194C - Payment to Contractors"`.
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.code, self.description)
    }

    pub fn has_slabs(&self) -> bool {
        !self.slabs.is_empty()
    }

    pub fn has_threshold_types(&self) -> bool {
        !self.threshold_types.is_empty()
    }

    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }

    pub fn slab(
        &self,
        description: &str,
    ) -> Option<&RateSlab> {
        self.slabs.iter().find(|s| s.description == description)
    }

    pub fn threshold_type(
        &self,
        name: &str,
    ) -> Option<&ThresholdType> {
        self.threshold_types.iter().find(|t| t.name == name)
    }

    pub fn condition(
        &self,
        condition: &str,
    ) -> Option<&RateCondition> {
        self.conditions.iter().find(|c| c.condition == condition)
    }

    /// Short tags describing the section's non-standard rules, in the order
    /// shown on the section reference table.
    pub fn special_notes(&self) -> Vec<&'static str> {
        let mut notes = Vec::new();
        if self.has_threshold_types() {
            notes.push("Multiple Threshold Types");
        }
        if self.has_slabs() {
            notes.push("Slab-based");
        }
        if self.has_conditions() {
            notes.push("Conditional Rates");
        }
        if self.tds_on_excess {
            notes.push("TDS on Excess Amount");
        }
        if self.is_property_section {
            notes.push("Property (30-day due date)");
        }
        notes
    }

    /// One line of the section reference table.
    pub fn reference_line(&self) -> String {
        let rate = |r: Option<Decimal>| {
            r.map(|r| format!("{}%", r.normalize()))
                .unwrap_or_else(|| "N/A".to_string())
        };
        let notes = self.special_notes();

        let mut line = String::new();
        let _ = write!(
            line,
            "{:<14} {:<10} {:<10} {:<10} {}",
            self.code,
            rate(self.company_rate),
            rate(self.individual_rate),
            format!("{}%", self.no_pan_rate.normalize()),
            self.threshold_note,
        );
        if !notes.is_empty() {
            let _ = write!(line, "  [{}]", notes.join(", "));
        }
        line
    }
}

/// Wire shape of one entry in the `GET /sections/` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionListing {
    pub section: String,
    pub description: String,
    pub display_name: String,
    pub threshold: Option<Decimal>,
    pub threshold_note: String,
    pub company_rate: Option<Decimal>,
    pub individual_rate: Option<Decimal>,
    pub no_pan_rate: Decimal,
    pub has_slabs: bool,
    pub slabs: Option<Vec<RateSlab>>,
    pub is_property_section: bool,
    pub has_threshold_types: bool,
    pub threshold_types: Option<Vec<ThresholdType>>,
    pub has_conditions: bool,
    pub conditions: Option<Vec<RateCondition>>,
    #[serde(default)]
    pub tds_on_excess: bool,
}

fn non_empty<T: Clone>(items: &[T]) -> Option<Vec<T>> {
    (!items.is_empty()).then(|| items.to_vec())
}

impl From<&TdsSection> for SectionListing {
    fn from(section: &TdsSection) -> Self {
        Self {
            section: section.code.clone(),
            description: section.description.clone(),
            display_name: section.display_name(),
            threshold: section.threshold,
            threshold_note: section.threshold_note.clone(),
            company_rate: section.company_rate,
            individual_rate: section.individual_rate,
            no_pan_rate: section.no_pan_rate,
            has_slabs: section.has_slabs(),
            slabs: non_empty(&section.slabs),
            is_property_section: section.is_property_section,
            has_threshold_types: section.has_threshold_types(),
            threshold_types: non_empty(&section.threshold_types),
            has_conditions: section.has_conditions(),
            conditions: non_empty(&section.conditions),
            tds_on_excess: section.tds_on_excess,
        }
    }
}

/// Rebuilds a section from its listing. Rate notes are not part of the
/// listing and come back empty.
impl From<SectionListing> for TdsSection {
    fn from(listing: SectionListing) -> Self {
        Self {
            code: listing.section,
            description: listing.description,
            threshold: listing.threshold,
            threshold_note: listing.threshold_note,
            company_rate: listing.company_rate,
            individual_rate: listing.individual_rate,
            no_pan_rate: listing.no_pan_rate,
            company_rate_note: String::new(),
            individual_rate_note: String::new(),
            is_property_section: listing.is_property_section,
            tds_on_excess: listing.tds_on_excess,
            slabs: listing.slabs.unwrap_or_default(),
            threshold_types: listing.threshold_types.unwrap_or_default(),
            conditions: listing.conditions.unwrap_or_default(),
        }
    }
}

/// The full set of sections known to the calculator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionCatalog {
    sections: Vec<TdsSection>,
}

impl SectionCatalog {
    pub fn new(sections: Vec<TdsSection>) -> Self {
        Self { sections }
    }

    /// Looks up a section by code, ignoring ASCII case.
    pub fn find(
        &self,
        code: &str,
    ) -> Option<&TdsSection> {
        let code = code.trim();
        self.sections
            .iter()
            .find(|s| s.code.eq_ignore_ascii_case(code))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TdsSection> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sections whose code or description contains `query`, ignoring case.
    /// An empty query matches everything.
    pub fn search(
        &self,
        query: &str,
    ) -> Vec<&TdsSection> {
        let query = query.trim().to_lowercase();
        self.sections
            .iter()
            .filter(|s| {
                query.is_empty()
                    || s.code.to_lowercase().contains(&query)
                    || s.description.to_lowercase().contains(&query)
            })
            .collect()
    }

    pub fn listings(&self) -> Vec<SectionListing> {
        self.sections.iter().map(SectionListing::from).collect()
    }
}
