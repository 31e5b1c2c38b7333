//! Query specification and SOQL construction

use crate::error::ExtractError;

/// What to fetch: one entity and an optional field list
///
/// An empty field list means "every field", resolved through describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    entity: String,
    fields: Vec<String>,
}

impl QuerySpec {
    /// Create a query spec
    ///
    /// # Errors
    /// Returns [`ExtractError::MissingEntity`] if the entity name is blank
    pub fn new(entity: impl Into<String>, fields: Vec<String>) -> Result<Self, ExtractError> {
        let entity = entity.into();
        if entity.trim().is_empty() {
            return Err(ExtractError::MissingEntity);
        }
        Ok(Self { entity, fields })
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// True when the field list must be discovered
    pub fn selects_all(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Build `SELECT <fields> FROM <entity>` with no filter, ordering, or limit
pub fn soql(entity: &str, fields: &[String]) -> String {
    format!("SELECT {} FROM {}", fields.join(", "), entity)
}
