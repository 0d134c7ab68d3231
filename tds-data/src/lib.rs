//! CSV loaders for the TDS calculator: the section rate chart and bulk
//! deductee files.

mod bulk_loader;
mod section_loader;

pub use bulk_loader::{
    BulkLoadError, BulkLoader, BulkRecord, BulkResultRecord, REQUIRED_COLUMNS, parse_amount,
    parse_deduction_date,
};
pub use section_loader::{SectionLoader, SectionLoaderError, SectionRecord};
