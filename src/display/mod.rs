//! Display formatting for terminal output
//!
//! Plain-text tables and detail views for entries, budgets, statistics and
//! the month summary. Amounts are rendered with the configured currency
//! symbol.

pub mod budget;
pub mod entry;
pub mod summary;

pub use budget::{format_budget_list, format_budget_status};
pub use entry::{format_entry_details, format_entry_register};
pub use summary::{format_statistics, format_summary};

/// Pad or cut `s` to exactly `width` characters
pub(crate) fn fit(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        format!("{:width$}", s, width = width)
    } else {
        let cut: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
