//! CSV export of entries or budgets

use std::io::Write;

use crate::error::LedgerResult;
use crate::models::{Entry, MonthlyBudget};

use super::export_error;

/// One row per entry: ID, date, category, amount, note
pub fn export_entries_csv<W: Write>(entries: &[Entry], writer: W) -> LedgerResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["ID", "Date", "Category", "Amount", "Note"])
        .map_err(export_error)?;

    for entry in entries {
        csv.write_record([
            entry.id.as_uuid().to_string(),
            entry.date.to_rfc3339(),
            entry.category.clone(),
            entry.amount.to_decimal_string(),
            entry.note.clone().unwrap_or_default(),
        ])
        .map_err(export_error)?;
    }

    csv.flush().map_err(export_error)?;
    Ok(())
}

/// One row per budget: ID, year, month, category, amount, historical flag
pub fn export_budgets_csv<W: Write>(budgets: &[MonthlyBudget], writer: W) -> LedgerResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["ID", "Year", "Month", "Category", "Amount", "Historical"])
        .map_err(export_error)?;

    for budget in budgets {
        csv.write_record([
            budget.id.as_uuid().to_string(),
            budget.year.to_string(),
            budget.month.to_string(),
            budget.category.clone(),
            budget.amount.to_decimal_string(),
            budget.is_historical.to_string(),
        ])
        .map_err(export_error)?;
    }

    csv.flush().map_err(export_error)?;
    Ok(())
}
