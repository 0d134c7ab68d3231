use std::fmt;

use serde::{Deserialize, Serialize};

const COMPANY_LABEL: &str = "Company / Firm / Co-operative Society / Local Authority";
const INDIVIDUAL_LABEL: &str = "Individual / HUF";

/// The deductee category that decides which rate column applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeducteeCategory {
    #[serde(rename = "Company / Firm / Co-operative Society / Local Authority")]
    Company,
    #[default]
    #[serde(rename = "Individual / HUF")]
    Individual,
}

impl DeducteeCategory {
    pub fn all() -> &'static [DeducteeCategory] {
        &[DeducteeCategory::Company, DeducteeCategory::Individual]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => COMPANY_LABEL,
            Self::Individual => INDIVIDUAL_LABEL,
        }
    }

    pub fn short_label(&self) -> &'static str {
        match self {
            Self::Company => "Company/Firm/Co-op/LA",
            Self::Individual => "Individual/HUF",
        }
    }

    /// Accepts the long label or a bare `company` / `individual`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s == COMPANY_LABEL || s.eq_ignore_ascii_case("company") {
            Some(Self::Company)
        } else if s == INDIVIDUAL_LABEL || s.eq_ignore_ascii_case("individual") {
            Some(Self::Individual)
        } else {
            None
        }
    }
}

impl fmt::Display for DeducteeCategory {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn serializes_to_long_label() {
        let json = serde_json::to_string(&DeducteeCategory::Individual).unwrap();

        assert_eq!(json, "\"Individual / HUF\"");
    }

    #[test]
    fn deserializes_from_long_label() {
        let category: DeducteeCategory = serde_json::from_str(
            "\"Company / Firm / Co-operative Society / Local Authority\"",
        )
        .unwrap();

        assert_eq!(category, DeducteeCategory::Company);
    }

    #[test]
    fn parse_accepts_short_names() {
        assert_eq!(
            DeducteeCategory::parse("Company"),
            Some(DeducteeCategory::Company)
        );
        assert_eq!(
            DeducteeCategory::parse(" individual "),
            Some(DeducteeCategory::Individual)
        );
        assert_eq!(DeducteeCategory::parse("trust"), None);
    }

    #[test]
    fn default_is_individual() {
        assert_eq!(DeducteeCategory::default(), DeducteeCategory::Individual);
    }
}
