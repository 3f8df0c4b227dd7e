//! Budget display formatting

use crate::ledger::BudgetStatus;
use crate::models::{Money, MonthlyBudget};

use super::fit;

pub fn format_budget_list(budgets: &[MonthlyBudget], symbol: &str) -> String {
    if budgets.is_empty() {
        return "No budgets found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!("{:7} {:20} {:>12}\n", "Period", "Category", "Budget"));
    output.push_str(&"-".repeat(41));
    output.push('\n');

    for budget in budgets {
        let marker = if budget.is_historical { " (historical)" } else { "" };
        output.push_str(&format!(
            "{}-{:02} {} {:>12}{}\n",
            budget.year,
            budget.month,
            fit(&budget.category, 20),
            budget.amount.format_with_symbol(symbol),
            marker
        ));
    }

    output
}

/// Budget vs. actual table for one month
pub fn format_budget_status(month: u32, year: i32, rows: &[BudgetStatus], symbol: &str) -> String {
    let mut output = format!("Budget status for {}-{:02}\n", year, month);
    if rows.is_empty() {
        output.push_str("No budgets set for this month.\n");
        return output;
    }

    output.push_str(&format!(
        "{:20} {:>12} {:>12} {:>12}\n",
        "Category", "Budget", "Spent", "Remaining"
    ));
    output.push_str(&"-".repeat(59));
    output.push('\n');

    for row in rows {
        let flag = if row.is_over() { "  OVER" } else { "" };
        output.push_str(&format!(
            "{} {:>12} {:>12} {:>12}{}\n",
            fit(&row.budget.category, 20),
            row.budget.amount.format_with_symbol(symbol),
            row.spent.format_with_symbol(symbol),
            row.remaining.format_with_symbol(symbol),
            flag
        ));
    }

    let budgeted: Money = rows.iter().map(|r| r.budget.amount).sum();
    let spent: Money = rows.iter().map(|r| r.spent).sum();
    output.push_str(&"-".repeat(59));
    output.push('\n');
    output.push_str(&format!(
        "{} {:>12} {:>12} {:>12}\n",
        fit("Total", 20),
        budgeted.format_with_symbol(symbol),
        spent.format_with_symbol(symbol),
        (budgeted - spent).format_with_symbol(symbol)
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_marks_historical() {
        let budgets = vec![
            MonthlyBudget::new("Food", Money::from_cents(40_000), 6, 2025),
            MonthlyBudget::new("Rent", Money::from_cents(150_000), 5, 2025).historical(),
        ];
        let output = format_budget_list(&budgets, "$");
        assert!(output.contains("2025-06 Food"));
        assert!(output.contains("$1500.00 (historical)"));
    }

    #[test]
    fn test_status_flags_overspend() {
        let rows = vec![BudgetStatus {
            budget: MonthlyBudget::new("Food", Money::from_cents(5000), 6, 2025),
            spent: Money::from_cents(5500),
            remaining: Money::from_cents(-500),
        }];
        let output = format_budget_status(6, 2025, &rows, "$");
        assert!(output.starts_with("Budget status for 2025-06"));
        assert!(output.contains("-$5.00  OVER"));
    }

    #[test]
    fn test_status_empty_month() {
        let output = format_budget_status(1, 2024, &[], "$");
        assert!(output.contains("No budgets set"));
    }
}
