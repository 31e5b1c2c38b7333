//! SObject records extractor
//!
//! Resolves the field list, runs one SOQL query, and returns the raw records.

use super::query::{QuerySpec, soql};
use crate::client::Connection;
use crate::error::FetchError;
use crate::etl::Extractor;

use eyre::Result;
use serde_json::Value;

/// Extractor for the records of one Salesforce object
///
/// # Example
/// ```no_run
/// use salesforce_extract::client::{Authenticator, SalesforceLogin};
/// use salesforce_extract::config::Credentials;
/// use salesforce_extract::etl::Extractor;
/// use salesforce_extract::sobjects::{QuerySpec, RecordsExtractor};
///
/// # async fn example() -> eyre::Result<()> {
/// let creds = Credentials::new("user@example.com", "secret", "TOKEN");
/// let client = SalesforceLogin::new().authenticate(&creds, "login").await?;
/// let spec = QuerySpec::new("Account", vec!["Id".into(), "Name".into()])?;
/// let records = RecordsExtractor::new(&client, spec).extract().await?;
/// # Ok(())
/// # }
/// ```
pub struct RecordsExtractor<'a, C> {
    connection: &'a C,
    spec: QuerySpec,
}

impl<'a, C: Connection> RecordsExtractor<'a, C> {
    pub fn new(connection: &'a C, spec: QuerySpec) -> Self {
        Self { connection, spec }
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// The explicit field list, or every field the service describes
    pub async fn resolve_fields(&self) -> Result<Vec<String>, FetchError> {
        if !self.spec.selects_all() {
            return Ok(self.spec.fields().to_vec());
        }

        let entity = self.spec.entity();
        log::debug!("No fields requested, describing {}", entity);
        let fields = self
            .connection
            .describe(entity)
            .await
            .map_err(|e| FetchError::Describe {
                entity: entity.to_string(),
                reason: e.to_string(),
            })?;

        if fields.is_empty() {
            return Err(FetchError::Describe {
                entity: entity.to_string(),
                reason: "describe returned no fields".to_string(),
            });
        }

        log::debug!("Discovered {} field(s) on {}", fields.len(), entity);
        Ok(fields)
    }

    /// Run the query for the resolved fields
    pub async fn fetch(&self) -> Result<Vec<Value>, FetchError> {
        let fields = self.resolve_fields().await?;
        let query = soql(self.spec.entity(), &fields);
        log::debug!("Executing: {}", query);

        let response = self
            .connection
            .query(&query)
            .await
            .map_err(|e| FetchError::Execute {
                reason: e.to_string(),
            })?;

        if !response.done {
            log::warn!(
                "Only the first {} of {} record(s) were returned for {}",
                response.records.len(),
                response.total_size,
                self.spec.entity()
            );
        }

        Ok(response.records)
    }
}

impl<C: Connection> Extractor for RecordsExtractor<'_, C> {
    type Item = Value;

    async fn extract(&self) -> Result<Vec<Self::Item>> {
        let records = self.fetch().await?;

        log::info!(
            "Extracted {} {} record(s)",
            records.len(),
            self.spec.entity()
        );

        Ok(records)
    }
}
