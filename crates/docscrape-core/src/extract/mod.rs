//! Turning recognized text into normalized field values.

mod address;
mod demand;
mod labels;
pub mod patterns;

pub use address::{parse_address, parse_street, parse_zip};
pub use demand::{normalize_amount, parse_demand, DemandParser};
