//! Salesforce object (SObject) records
//!
//! Builds the SOQL query for one entity and extracts its records.

mod extractor;
mod query;

pub use extractor::RecordsExtractor;
pub use query::{QuerySpec, soql};
