//! File system storage operations
//!
//! This module handles the tabular output files written by an extraction
//! and reading them back.

mod csv_file;

pub use csv_file::{CsvReader, CsvWriter, cell};
