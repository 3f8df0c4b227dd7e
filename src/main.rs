use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pocket_ledger::cli::{
    handle_budget_command, handle_categories, handle_config, handle_entry_command,
    handle_export_command, handle_reset, handle_stats, handle_summary, BudgetCommands,
    EntryCommands, ExportArgs,
};
use pocket_ledger::config::{LedgerPaths, Settings};
use pocket_ledger::error::LedgerError;
use pocket_ledger::ledger::{Ledger, SummaryFileSink};
use pocket_ledger::lifecycle::{LifecycleController, LifecycleEvent};
use pocket_ledger::storage::{JsonStore, RetryPolicy};

#[derive(Parser)]
#[command(
    name = "ledger",
    version,
    about = "Personal spending ledger with monthly budgets",
    long_about = "Records everyday expenditures by category, keeps a monthly budget \
                  per category and reports spending against it. Data lives in \
                  $LEDGER_DATA_DIR or the platform data directory."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expenditure entries
    #[command(subcommand)]
    Entry(EntryCommands),

    /// Monthly budgets
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// List every category in use
    Categories,

    /// Totals, date range and data health
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// This month's budget, spending and remaining amount
    Summary {
        #[arg(long)]
        json: bool,
    },

    /// Export the ledger
    Export(ExportArgs),

    /// Delete every entry and budget
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Show configuration and paths
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<LedgerError>() {
                Some(ledger_err) => eprintln!("Error: {}", ledger_err.user_message()),
                None => eprintln!("Error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let paths = LedgerPaths::new()?;
    paths.ensure_directories()?;
    let settings = Settings::load_or_create(&paths)?;
    init_tracing(&settings.log_level);

    if let Commands::Config = cli.command {
        handle_config(&paths, &settings)?;
        return Ok(());
    }

    let store = JsonStore::open(paths.clone(), RetryPolicy::from(settings.write_retry)).await?;
    let ledger = Arc::new(Ledger::open(Arc::new(store), &settings).await?);
    let sink = SummaryFileSink::new(paths.summary_file());
    let mirror = sink.clone().spawn(ledger.subscribe_summary());
    let lifecycle =
        LifecycleController::new(Arc::clone(&ledger), &paths, &settings).with_summary_sink(sink);

    lifecycle.handle(LifecycleEvent::EnteredForeground).await;
    let outcome = dispatch(&ledger, &settings, cli.command).await;
    lifecycle.handle(LifecycleEvent::Terminating).await;
    mirror.abort();

    outcome?;
    Ok(())
}

async fn dispatch(ledger: &Ledger, settings: &Settings, command: Commands) -> Result<()> {
    match command {
        Commands::Entry(cmd) => handle_entry_command(ledger, settings, cmd).await?,
        Commands::Budget(cmd) => handle_budget_command(ledger, settings, cmd).await?,
        Commands::Categories => handle_categories(ledger)?,
        Commands::Stats { json } => handle_stats(ledger, settings, json)?,
        Commands::Summary { json } => handle_summary(ledger, settings, json)?,
        Commands::Export(args) => handle_export_command(ledger, args)?,
        Commands::Reset { yes } => handle_reset(ledger, yes).await?,
        Commands::Config => {}
    }
    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level applies to this crate
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pocket_ledger={level},ledger={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
