//! Statistics and summary formatting

use crate::ledger::{LedgerStatistics, LedgerSummary};

pub fn format_statistics(stats: &LedgerStatistics, symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Entries:        {}\n", stats.entry_count));
    output.push_str(&format!("Budgets:        {}\n", stats.budget_count));
    output.push_str(&format!("Categories:     {}\n", stats.category_count));
    output.push_str(&format!(
        "Total spent:    {}\n",
        stats.total_spent.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "Total budgeted: {}\n",
        stats.total_budgeted.format_with_symbol(symbol)
    ));
    if let (Some(oldest), Some(newest)) = (stats.oldest_entry, stats.newest_entry) {
        output.push_str(&format!(
            "Date range:     {} to {}\n",
            oldest.format("%Y-%m-%d"),
            newest.format("%Y-%m-%d")
        ));
    }
    output.push_str(&format!("Integrity:      {:.0}%\n", stats.integrity_score * 100.0));

    output
}

pub fn format_summary(summary: &LedgerSummary, symbol: &str) -> String {
    format!(
        "{}-{:02}: spent {} of {} ({} left) across {} entries in {} categories\n",
        summary.year,
        summary.month,
        summary.spent.format_with_symbol(symbol),
        summary.budget_total.format_with_symbol(symbol),
        summary.remaining.format_with_symbol(symbol),
        summary.transaction_count,
        summary.category_count
    )
}
