//! Salesforce Extract
//!
//! Pulls every record of one Salesforce object into a CSV file:
//! load credentials, authenticate, query, write.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod etl;
pub mod extraction;
pub mod sobjects;
pub mod storage;
pub mod transform;

// Re-exports for convenience
pub use client::{Authenticator, Connection, SalesforceClient, SalesforceLogin};
pub use config::{ConfigFile, Credentials, CredentialsSource};
pub use error::{AuthError, ConfigError, ExtractError, FetchError, FetchStage, WriteError};
pub use etl::{Extractor, Loader, Transformer};
pub use extraction::{ExtractRequest, ExtractSummary, Extraction, Stage, fetch_and_save};
pub use sobjects::{QuerySpec, RecordsExtractor};
pub use storage::{CsvReader, CsvWriter};
pub use transform::FieldDropper;
