mod category;
mod entity;
mod section;
mod tds_result;
mod transaction;

pub use category::DeducteeCategory;
pub use entity::Entity;
pub use section::{
    RateCondition, RateSlab, SectionCatalog, SectionListing, TdsSection, ThresholdType,
};
pub use tds_result::{CalculateRequest, CalculateResponse, ExcelRequest, TdsResult};
pub use transaction::{TransactionDraft, TransactionInput};
