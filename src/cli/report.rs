//! Read-only reports and housekeeping commands

use crate::config::{LedgerPaths, Settings};
use crate::display::{format_statistics, format_summary};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;

pub fn handle_categories(ledger: &Ledger) -> LedgerResult<()> {
    let categories = ledger.get_categories();
    if categories.is_empty() {
        println!("No categories yet.");
    }
    for category in categories {
        println!("{}", category);
    }
    Ok(())
}

pub fn handle_stats(ledger: &Ledger, settings: &Settings, json: bool) -> LedgerResult<()> {
    let stats = ledger.get_statistics();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{}", format_statistics(&stats, &settings.currency_symbol));
    }
    Ok(())
}

pub fn handle_summary(ledger: &Ledger, settings: &Settings, json: bool) -> LedgerResult<()> {
    let summary = ledger.summary_now();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", format_summary(&summary, &settings.currency_symbol));
    }
    Ok(())
}

/// Delete everything; refuses unless confirmed
pub async fn handle_reset(ledger: &Ledger, confirmed: bool) -> LedgerResult<()> {
    if !confirmed {
        return Err(LedgerError::Validation(
            "Reset deletes every entry and budget. Re-run with --yes to confirm.".into(),
        ));
    }
    ledger.reset().await?;
    println!("All entries and budgets deleted.");
    Ok(())
}

pub fn handle_config(paths: &LedgerPaths, settings: &Settings) -> LedgerResult<()> {
    println!("Pocket Ledger Configuration");
    println!("===========================");
    println!("Base directory:  {}", paths.base_dir().display());
    println!("Data directory:  {}", paths.data_dir().display());
    println!("Cache directory: {}", paths.cache_dir().display());
    println!("Settings file:   {}", paths.settings_file().display());
    println!();
    println!("Settings:");
    println!(
        "  Max amount:          {}",
        settings
            .max_transaction_amount
            .format_with_symbol(&settings.currency_symbol)
    );
    println!("  Future entries:      {}", settings.allow_future_entries);
    println!("  Cache validity:      {}s", settings.cache_validity_secs);
    println!("  Summary debounce:    {}ms", settings.summary_debounce_ms);
    println!(
        "  Write retries:       {} (backoff {}ms)",
        settings.write_retry.max_retries, settings.write_retry.backoff_ms
    );
    println!("  Background grace:    {}ms", settings.background_grace_ms);
    println!("  Cache retention:     {} days", settings.cache_retention_days);
    println!("  Log level:           {}", settings.log_level);
    Ok(())
}
