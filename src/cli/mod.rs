//! CLI command handlers
//!
//! Bridges clap argument parsing with the ledger coordinator. Handlers
//! print their results; errors bubble up to `main`, which decides how to
//! show them.

pub mod budget;
pub mod entry;
pub mod export;
pub mod report;

pub use budget::{handle_budget_command, BudgetCommands};
pub use entry::{handle_entry_command, EntryCommands};
pub use export::{handle_export_command, ExportArgs};
pub use report::{handle_categories, handle_config, handle_reset, handle_stats, handle_summary};

use chrono::{DateTime, Datelike, Utc};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Money, PeriodFilter};

pub(crate) fn parse_amount(text: &str) -> LedgerResult<Money> {
    Money::parse(text).map_err(|e| LedgerError::Validation(e.to_string()))
}

pub(crate) fn parse_period(text: &str, now: DateTime<Utc>) -> LedgerResult<PeriodFilter> {
    PeriodFilter::parse(text, now).map_err(|e| LedgerError::Validation(e.to_string()))
}

/// The month named by a `--period` argument; defaults to the current month
pub(crate) fn parse_month(text: Option<&str>, now: DateTime<Utc>) -> LedgerResult<(u32, i32)> {
    let Some(text) = text else {
        return Ok((now.month(), now.year()));
    };
    match parse_period(text, now)? {
        PeriodFilter::Month { year, month } => Ok((month, year)),
        other => Err(LedgerError::Validation(format!(
            "Expected a month like 2025-06, got '{}'",
            other
        ))),
    }
}
