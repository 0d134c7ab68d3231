use serde::{Deserialize, Serialize};

/// The deductor the report is prepared for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_name: String,
    pub pan_number: String,
}

impl Entity {
    pub fn new(
        entity_name: impl Into<String>,
        pan_number: impl Into<String>,
    ) -> Self {
        Self {
            entity_name: entity_name.into(),
            pan_number: pan_number.into(),
        }
    }
}
