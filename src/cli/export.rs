//! CLI command for data export

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::error::{LedgerError, LedgerResult};
use crate::export::{export_budgets_csv, export_entries_csv, export_full_json, export_full_yaml};
use crate::ledger::Ledger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// JSON (full ledger)
    Json,
    /// YAML (full ledger, human-readable)
    Yaml,
    /// CSV (entries or budgets, see --data)
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CsvData {
    Entries,
    Budgets,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "json")]
    format: ExportFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// What to write for CSV
    #[arg(long, value_enum, default_value = "entries")]
    data: CsvData,
}

pub fn handle_export_command(ledger: &Ledger, args: ExportArgs) -> LedgerResult<()> {
    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                LedgerError::Export(format!("Failed to create file {}: {}", path.display(), e))
            })?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };

    let snapshot = ledger.snapshot();
    match args.format {
        ExportFormat::Json => export_full_json(&snapshot, &mut writer, args.pretty)?,
        ExportFormat::Yaml => export_full_yaml(&snapshot, &mut writer)?,
        ExportFormat::Csv => match args.data {
            CsvData::Entries => export_entries_csv(&snapshot.entries, &mut writer)?,
            CsvData::Budgets => export_budgets_csv(&ledger.all_budgets(), &mut writer)?,
        },
    }
    writer
        .flush()
        .map_err(|e| LedgerError::Export(e.to_string()))?;

    if let Some(path) = &args.output {
        println!(
            "Exported {} entries and {} budgets to: {}",
            snapshot.entries.len(),
            snapshot.budgets.len(),
            path.display()
        );
    }
    Ok(())
}
