//! Export module
//!
//! Writes ledger data out in three formats:
//! - JSON: full, schema-versioned export with metadata
//! - YAML: the same document, human-readable, with a header comment
//! - CSV: entries or budgets as spreadsheet rows

pub mod csv;
pub mod json;
pub mod yaml;

use std::fmt;

pub use self::csv::{export_budgets_csv, export_entries_csv};
pub use json::{export_full_json, ExportMetadata, FullExport, EXPORT_SCHEMA_VERSION};
pub use yaml::export_full_yaml;

use crate::error::LedgerError;

fn export_error(err: impl fmt::Display) -> LedgerError {
    LedgerError::Export(err.to_string())
}
