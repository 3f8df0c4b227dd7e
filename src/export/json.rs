//! JSON export
//!
//! The full ledger as one schema-versioned document.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerResult;
use crate::ledger::stats::category_set;
use crate::models::{Entry, MonthlyBudget};
use crate::storage::LedgerSnapshot;

use super::export_error;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full ledger export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    /// Newest first
    pub entries: Vec<Entry>,

    /// Oldest period first
    pub budgets: Vec<MonthlyBudget>,

    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub entry_count: usize,
    pub budget_count: usize,
    pub category_count: usize,

    /// Date range of entries
    pub earliest_entry: Option<String>,
    pub latest_entry: Option<String>,
}

impl FullExport {
    pub fn from_snapshot(snapshot: &LedgerSnapshot) -> Self {
        let mut entries = snapshot.entries.clone();
        entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));

        let mut budgets = snapshot.budgets.clone();
        budgets.sort_by(|a, b| (a.year, a.month, &a.category).cmp(&(b.year, b.month, &b.category)));

        let metadata = ExportMetadata {
            entry_count: entries.len(),
            budget_count: budgets.len(),
            category_count: category_set(&entries, &budgets).len(),
            earliest_entry: entries
                .iter()
                .map(|e| e.date)
                .min()
                .map(|d| d.date_naive().to_string()),
            latest_entry: entries
                .iter()
                .map(|e| e.date)
                .max()
                .map(|d| d.date_naive().to_string()),
        };

        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            entries,
            budgets,
            metadata,
        }
    }
}

/// Export the full ledger to JSON
pub fn export_full_json<W: Write>(
    snapshot: &LedgerSnapshot,
    writer: &mut W,
    pretty: bool,
) -> LedgerResult<()> {
    let export = FullExport::from_snapshot(snapshot);

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(export_error)?;

    Ok(())
}
