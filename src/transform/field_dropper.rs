//! Field dropper transformer
//!
//! Removes specified fields from JSON records, typically service metadata
//! that should not end up in the exported file.

use crate::etl::Transformer;
use eyre::Result;
use serde_json::Value;

/// Transformer that drops specified fields from records
///
/// Salesforce wraps every record with an `attributes` envelope
/// (`{"type": "Account", "url": "/services/data/..."}`); nested relationship
/// records carry one too.
///
/// # Example
/// ```
/// use salesforce_extract::transform::FieldDropper;
/// use salesforce_extract::etl::Transformer;
/// use serde_json::json;
///
/// let dropper = FieldDropper::salesforce_metadata();
/// let input = json!({
///     "attributes": {"type": "Account", "url": "/services/data/v59.0/sobjects/Account/001"},
///     "Id": "001",
///     "Name": "Acme"
/// });
///
/// let output = dropper.transform(input).unwrap();
/// assert!(!output.as_object().unwrap().contains_key("attributes"));
/// assert_eq!(output["Name"], "Acme");
/// ```
pub struct FieldDropper {
    fields: Vec<String>,
}

impl FieldDropper {
    /// Create a new field dropper with the specified fields to remove
    pub fn new(fields: Vec<&str>) -> Self {
        Self {
            fields: fields.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create a field dropper for the per-record `attributes` envelope
    pub fn salesforce_metadata() -> Self {
        Self::new(vec!["attributes"])
    }

    fn drop_fields(&self, value: &mut Value) {
        if let Some(obj) = value.as_object_mut() {
            for field in &self.fields {
                // shift_remove keeps the remaining keys in query order
                obj.shift_remove(field);
            }
            // Relationship fields hold nested records
            for nested in obj.values_mut() {
                self.drop_fields(nested);
            }
        } else if let Some(items) = value.as_array_mut() {
            // Subquery results hold child records under `records`
            for item in items {
                self.drop_fields(item);
            }
        }
    }
}

impl Transformer for FieldDropper {
    type Input = Value;
    type Output = Value;

    fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
        if !input.is_object() {
            eyre::bail!("Expected a record object, got: {}", input);
        }
        self.drop_fields(&mut input);
        Ok(input)
    }
}
