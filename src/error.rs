//! Error types for each extraction stage
//!
//! Every stage of a run fails with its own error type. [`ExtractError`] gathers
//! them so the orchestrator can short-circuit and callers can branch on the
//! variant instead of the message. The `Display` text of each error is the
//! human-readable message shown to users.

use crate::extraction::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading credentials from the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error: Config file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Error: YAML parsing error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Error: Missing required key in config file: '{field}'")]
    MissingField { field: String },

    #[error("Error loading credentials: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while exchanging credentials for a session
#[derive(Debug, Error)]
#[error("Error connecting to Salesforce please check if you have valid credentials: {reason}")]
pub struct AuthError {
    pub reason: String,
}

impl AuthError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The fetch step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Describe,
    Execute,
}

/// Failure while resolving fields or running the query
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Error retrieving fields for {entity}: {reason}")]
    Describe { entity: String, reason: String },

    #[error("Error executing query: {reason}")]
    Execute { reason: String },
}

impl FetchError {
    pub fn stage(&self) -> FetchStage {
        match self {
            Self::Describe { .. } => FetchStage::Describe,
            Self::Execute { .. } => FetchStage::Execute,
        }
    }
}

/// Failure while writing the CSV file
#[derive(Debug, Error)]
#[error("Error saving data to file: {reason}")]
pub struct WriteError {
    pub path: PathBuf,
    pub reason: String,
}

/// Any failure of an extraction run
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Error: Please provide a table name for fetching data first.")]
    MissingEntity,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl ExtractError {
    /// The last stage the run reached before this error stopped it
    pub fn stage(&self) -> Stage {
        match self {
            Self::MissingEntity | Self::Config(_) => Stage::Idle,
            Self::Auth(_) => Stage::ConfigLoaded,
            Self::Fetch(_) => Stage::Authenticated,
            Self::Write(_) => Stage::Fetched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_legacy_text() {
        let err = ConfigError::MissingField {
            field: "sftoken".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Error: Missing required key in config file: 'sftoken'"
        );

        let err = ExtractError::from(AuthError::new("INVALID_LOGIN"));
        assert!(err.to_string().contains("Error connecting to Salesforce"));
        assert!(err.to_string().ends_with("INVALID_LOGIN"));

        let err = FetchError::Describe {
            entity: "Widget__c".to_string(),
            reason: "NOT_FOUND".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Error retrieving fields for Widget__c: NOT_FOUND"
        );
    }

    #[test]
    fn test_stage_of_error() {
        assert_eq!(ExtractError::MissingEntity.stage(), Stage::Idle);
        assert_eq!(
            ExtractError::from(AuthError::new("nope")).stage(),
            Stage::ConfigLoaded
        );
        let fetch = FetchError::Execute {
            reason: "MALFORMED_QUERY".to_string(),
        };
        assert_eq!(fetch.stage(), FetchStage::Execute);
        assert_eq!(ExtractError::from(fetch).stage(), Stage::Authenticated);
    }
}
