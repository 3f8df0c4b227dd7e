//! Entry CLI commands

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_entry_details, format_entry_register};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{EntryQuery, Ledger, SortKey};
use crate::models::Entry;

use super::{parse_amount, parse_period};

#[derive(Subcommand, Debug)]
pub enum EntryCommands {
    /// Record an expenditure
    Add {
        /// Amount (e.g., "45.67")
        amount: String,
        /// Category name
        category: String,
        /// Date (YYYY-MM-DD or RFC 3339; defaults to now)
        #[arg(short, long)]
        date: Option<String>,
        /// Free-text note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// List entries
    List {
        /// Period ("current", "2025-06", "2025-06-03", "2025", "START..END")
        #[arg(short, long)]
        period: Option<String>,
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
        /// Sort by date, amount or category
        #[arg(short, long, default_value = "date")]
        sort: SortKey,
        /// Oldest/smallest first
        #[arg(long)]
        asc: bool,
        /// Show at most this many
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one entry
    Show {
        /// Entry ID (short "ent-..." form or full UUID)
        id: String,
    },

    /// Change an entry
    Edit {
        id: String,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        date: Option<String>,
        /// New note (an empty string clears it)
        #[arg(long)]
        note: Option<String>,
    },

    /// Delete an entry
    Delete { id: String },
}

pub async fn handle_entry_command(
    ledger: &Ledger,
    settings: &Settings,
    cmd: EntryCommands,
) -> LedgerResult<()> {
    let symbol = settings.currency_symbol.as_str();
    let now = Utc::now();

    match cmd {
        EntryCommands::Add {
            amount,
            category,
            date,
            note,
        } => {
            let date = match date {
                Some(text) => parse_entry_date(&text, now)?,
                None => now,
            };
            let mut entry = Entry::new(parse_amount(&amount)?, category, date);
            if let Some(note) = note {
                entry = entry.with_note(note);
            }

            let duplicates = ledger.probable_duplicates(&entry);
            let entry = ledger.add_entry(entry).await?;
            println!("Added {}", entry.id);
            for other in duplicates {
                println!("Note: looks like {} ({})", other.id, other);
            }
        }

        EntryCommands::List {
            period,
            category,
            sort,
            asc,
            limit,
        } => {
            let mut query = EntryQuery::new().sort_by(sort, asc);
            if let Some(period) = period {
                query = query.period(parse_period(&period, now)?);
            }
            if let Some(category) = category {
                query = query.category(category);
            }

            let mut entries = ledger.get_entries(&query);
            if let Some(limit) = limit {
                entries.truncate(limit);
            }
            print!("{}", format_entry_register(&entries, symbol));
        }

        EntryCommands::Show { id } => {
            let entry = ledger.find_entry(&id)?;
            print!("{}", format_entry_details(&entry, symbol));
        }

        EntryCommands::Edit {
            id,
            amount,
            category,
            date,
            note,
        } => {
            let mut entry = ledger.find_entry(&id)?;
            if let Some(amount) = amount {
                entry.amount = parse_amount(&amount)?;
            }
            if let Some(category) = category {
                entry.category = category;
            }
            if let Some(date) = date {
                entry.date = parse_entry_date(&date, now)?;
            }
            if let Some(note) = note {
                entry = entry.with_note(note);
            }

            let entry = ledger.update_entry(entry).await?;
            println!("Updated {}", entry.id);
        }

        EntryCommands::Delete { id } => {
            let entry = ledger.find_entry(&id)?;
            ledger.delete_entry(entry.id).await?;
            println!("Deleted {} ({})", entry.id, entry);
        }
    }

    Ok(())
}

/// Parse an entry date
///
/// A bare date means "now" when it is today and noon UTC otherwise, so a
/// same-day entry never lands in the future.
pub fn parse_entry_date(text: &str, now: DateTime<Utc>) -> LedgerResult<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Ok(at.with_timezone(&Utc));
    }

    let day = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| {
        LedgerError::Validation(format!(
            "Invalid date '{}' (expected YYYY-MM-DD or RFC 3339)",
            text
        ))
    })?;
    if day == now.date_naive() {
        return Ok(now);
    }
    day.and_hms_opt(12, 0, 0)
        .map(|at| Utc.from_utc_datetime(&at))
        .ok_or_else(|| LedgerError::Validation(format!("Invalid date '{}'", text)))
}
