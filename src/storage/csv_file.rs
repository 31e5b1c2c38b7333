//! CSV file operations

use crate::error::WriteError;
use crate::etl::{Extractor, Loader};

use eyre::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Write records to a CSV file
///
/// The header is the union of record keys in order of first appearance.
/// An existing file at the path is replaced.
pub struct CsvWriter {
    path: PathBuf,
}

impl CsvWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write records with a header row
    pub fn write(&self, records: &[Value]) -> Result<(), WriteError> {
        let rows = records
            .iter()
            .map(|record| {
                record.as_object().ok_or_else(|| self.error(format!(
                    "record is not an object: {}",
                    record
                )))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let columns = columns(&rows);
        log::debug!(
            "Writing {} row(s) x {} column(s) to {}",
            rows.len(),
            columns.len(),
            self.path.display()
        );

        let mut writer = csv::Writer::from_path(&self.path).map_err(|e| self.error(e))?;
        if !columns.is_empty() {
            writer.write_record(&columns).map_err(|e| self.error(e))?;
        }
        for row in rows {
            let cells = columns
                .iter()
                .map(|column| row.get(column.as_str()).map(cell).unwrap_or_default());
            writer.write_record(cells).map_err(|e| self.error(e))?;
        }
        writer.flush().map_err(|e| self.error(e))?;

        Ok(())
    }

    fn error(&self, reason: impl std::fmt::Display) -> WriteError {
        WriteError {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

// Implement Loader trait for writing CSV files

impl Loader for CsvWriter {
    type Item = Value;

    async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
        self.write(&items)?;
        Ok(items.len())
    }
}

/// Column names in order of first appearance across all records
fn columns(rows: &[&Map<String, Value>]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Render one value as a CSV cell
///
/// Nested records and arrays are kept as compact JSON.
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Read a CSV file back into records of string values
pub struct CsvReader {
    path: PathBuf,
}

impl CsvReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read all rows, keyed by the header
    pub fn read(&self) -> Result<Vec<Value>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open CSV file: {}", self.path.display()))?;
        let headers = reader
            .headers()
            .with_context(|| format!("Failed to read CSV header: {}", self.path.display()))?
            .clone();

        reader
            .records()
            .map(|row| {
                let row = row.with_context(|| {
                    format!("Failed to read CSV row: {}", self.path.display())
                })?;
                Ok::<_, eyre::Report>(Value::Object(
                    headers
                        .iter()
                        .zip(row.iter())
                        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                        .collect(),
                ))
            })
            .collect()
    }
}

// Implement Extractor trait for reading CSV files

impl Extractor for CsvReader {
    type Item = Value;

    async fn extract(&self) -> Result<Vec<Self::Item>> {
        self.read()
    }
}
