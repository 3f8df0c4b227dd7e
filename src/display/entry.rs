//! Entry display formatting

use crate::models::{Entry, Money};

use super::fit;

/// One register line: short ID, date, category, amount, note
pub fn format_entry_row(entry: &Entry, symbol: &str) -> String {
    format!(
        "{:12} {} {} {:>12}  {}",
        entry.id.to_string(),
        entry.date.format("%Y-%m-%d"),
        fit(&entry.category, 18),
        entry.amount.format_with_symbol(symbol),
        entry.note.as_deref().unwrap_or("")
    )
    .trim_end()
    .to_string()
}

/// Format a list of entries as a register with a total line
pub fn format_entry_register(entries: &[Entry], symbol: &str) -> String {
    if entries.is_empty() {
        return "No entries found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:12} {:10} {:18} {:>12}  {}\n",
        "ID", "Date", "Category", "Amount", "Note"
    ));
    output.push_str(&"-".repeat(60));
    output.push('\n');

    for entry in entries {
        output.push_str(&format_entry_row(entry, symbol));
        output.push('\n');
    }

    let total = entries.iter().map(|e| e.amount).sum::<Money>();
    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "{} entries, total {}\n",
        entries.len(),
        total.format_with_symbol(symbol)
    ));

    output
}

pub fn format_entry_details(entry: &Entry, symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Entry:    {}\n", entry.id));
    output.push_str(&format!("Date:     {}\n", entry.date.format("%Y-%m-%d %H:%M")));
    output.push_str(&format!("Amount:   {}\n", entry.amount.format_with_symbol(symbol)));
    output.push_str(&format!("Category: {}\n", entry.category));
    if let Some(note) = &entry.note {
        output.push_str(&format!("Note:     {}\n", note));
    }
    output.push_str(&format!("UUID:     {}\n", entry.id.as_uuid()));

    output
}
