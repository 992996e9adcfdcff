//! Batch extraction over tabular case listings.

mod driver;
mod table;

pub use driver::{
    BatchDriver, BatchSummary, CaseProgress, ExtractionTarget, FailureRecord, FieldTally,
    ADDRESS_COLUMN, ADDRESS_ERROR_COLUMN, ADDRESS_STATUS_COLUMN, DEMAND_AMOUNT_COLUMN,
    DEMAND_ERROR_COLUMN, DEMAND_SOURCE_COLUMN, DEMAND_STATUS_COLUMN, DEMAND_WARNING_COLUMN,
};
pub use table::{CaseRows, CaseTable};
