//! CLI helper functions

use crate::{
    client::{Connection, SalesforceLogin},
    config::ConfigFile,
    error::{ExtractError, FetchError},
    extraction::{ExtractRequest, ExtractSummary, Extraction},
};
use std::path::Path;

/// Build an extraction from a config file path and optional domain override
pub fn load_extraction(
    config: impl AsRef<Path>,
    domain: Option<String>,
) -> Extraction<ConfigFile, SalesforceLogin> {
    Extraction::new(ConfigFile::new(config), SalesforceLogin::new()).with_domain(domain)
}

/// Split a comma-separated field list, dropping blanks
///
/// Accepts repeated flags too, so `-f Id,Name -f Email` yields three fields.
pub fn parse_fields(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract an entity's records to CSV
///
/// Pipeline: ConfigFile → SalesforceLogin → RecordsExtractor → FieldDropper → CsvWriter
pub async fn extract(
    config: impl AsRef<Path>,
    domain: Option<String>,
    entity: &str,
    fields: &[String],
    output: Option<&str>,
) -> Result<ExtractSummary, ExtractError> {
    let mut request = ExtractRequest::new(entity).fields(parse_fields(fields));
    if let Some(output) = output {
        request = request.output(output);
    }

    log::info!(
        "Extracting {} to {}",
        request.entity(),
        request.output_path().display()
    );

    load_extraction(config, domain).run(&request).await
}

/// List the fields of an entity
pub async fn describe(
    config: impl AsRef<Path>,
    domain: Option<String>,
    entity: &str,
) -> Result<Vec<String>, ExtractError> {
    if entity.trim().is_empty() {
        return Err(ExtractError::MissingEntity);
    }

    let connection = load_extraction(config, domain).connect().await?;
    let fields = connection
        .describe(entity)
        .await
        .map_err(|e| FetchError::Describe {
            entity: entity.to_string(),
            reason: e.to_string(),
        })?;

    log::info!("{} has {} field(s)", entity, fields.len());
    Ok(fields)
}

/// Test that the configured credentials authenticate
pub async fn auth(config: impl AsRef<Path>, domain: Option<String>) -> Result<String, ExtractError> {
    let connection = load_extraction(config, domain).connect().await?;
    Ok(connection.to_string())
}
