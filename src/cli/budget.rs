//! Budget CLI commands

use chrono::Utc;
use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_budget_list, format_budget_status};
use crate::error::LedgerResult;
use crate::ledger::Ledger;
use crate::models::MonthlyBudget;
use crate::storage::BudgetRange;

use super::{parse_amount, parse_month};

#[derive(Subcommand, Debug)]
pub enum BudgetCommands {
    /// Set the budget for a category and month (replaces any existing one)
    Set {
        category: String,
        /// Amount (e.g., "400" or "400.00")
        amount: String,
        /// Month (e.g., "2025-06" or "current")
        #[arg(short, long)]
        period: Option<String>,
        /// Mark as no longer the active budget
        #[arg(long)]
        historical: bool,
    },

    /// List budgets
    List {
        /// Only this month; all budgets if omitted
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Delete a category's budget for a month
    Delete {
        category: String,
        #[arg(short, long)]
        period: Option<String>,
        /// Also delete every later month of the same year
        #[arg(long)]
        forward: bool,
    },

    /// Budget vs. actual spending for a month
    Status {
        #[arg(short, long)]
        period: Option<String>,
    },
}

pub async fn handle_budget_command(
    ledger: &Ledger,
    settings: &Settings,
    cmd: BudgetCommands,
) -> LedgerResult<()> {
    let symbol = settings.currency_symbol.as_str();
    let now = Utc::now();

    match cmd {
        BudgetCommands::Set {
            category,
            amount,
            period,
            historical,
        } => {
            let (month, year) = parse_month(period.as_deref(), now)?;
            let mut budget = MonthlyBudget::new(category, parse_amount(&amount)?, month, year);
            if historical {
                budget = budget.historical();
            }

            let replaced = ledger.set_budget(budget.clone()).await?;
            match replaced {
                Some(old) => println!(
                    "Budget for {} in {}-{:02} changed from {} to {}",
                    budget.category,
                    year,
                    month,
                    old.amount.format_with_symbol(symbol),
                    budget.amount.format_with_symbol(symbol)
                ),
                None => println!(
                    "Budget for {} in {}-{:02} set to {}",
                    budget.category,
                    year,
                    month,
                    budget.amount.format_with_symbol(symbol)
                ),
            }
        }

        BudgetCommands::List { period } => {
            let budgets = match period {
                Some(period) => {
                    let (month, year) = parse_month(Some(&period), now)?;
                    ledger.get_budgets(month, year)
                }
                None => ledger.all_budgets(),
            };
            print!("{}", format_budget_list(&budgets, symbol));
        }

        BudgetCommands::Delete {
            category,
            period,
            forward,
        } => {
            let (month, year) = parse_month(period.as_deref(), now)?;
            let mut range = BudgetRange::new(category, month, year);
            if forward {
                range = range.and_future_months();
            }

            let removed = ledger.delete_budgets(range).await?;
            println!("Deleted {} budget(s)", removed);
        }

        BudgetCommands::Status { period } => {
            let (month, year) = parse_month(period.as_deref(), now)?;
            let rows = ledger.budget_status(month, year);
            print!("{}", format_budget_status(month, year, &rows, symbol));
        }
    }

    Ok(())
}
