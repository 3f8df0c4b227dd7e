//! The durable store contract
//!
//! The Coordinator only talks to storage through this trait, which keeps the
//! file engine swappable and lets tests inject write failures.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Entry, EntryId, MonthlyBudget};

use super::notify::StoreChange;

/// Everything the store holds, as read by a full scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub entries: Vec<Entry>,
    pub budgets: Vec<MonthlyBudget>,
}

impl LedgerSnapshot {
    /// Reject data holding two budgets for one (category, month, year)
    pub fn check_budget_keys(&self) -> LedgerResult<()> {
        for (i, budget) in self.budgets.iter().enumerate() {
            if self.budgets[i + 1..].iter().any(|b| b.same_period(budget)) {
                return Err(LedgerError::DuplicateBudgetPeriod {
                    category: budget.category.clone(),
                    month: budget.month,
                    year: budget.year,
                });
            }
        }
        Ok(())
    }
}

/// Selects budgets for a range delete: one month, or that month and every
/// later month of the same year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetRange {
    pub category: String,
    pub from_month: u32,
    pub year: i32,
    pub include_future_months: bool,
}

impl BudgetRange {
    pub fn new(category: impl Into<String>, from_month: u32, year: i32) -> Self {
        Self {
            category: category.into().trim().to_string(),
            from_month,
            year,
            include_future_months: false,
        }
    }

    pub fn and_future_months(mut self) -> Self {
        self.include_future_months = true;
        self
    }

    pub fn matches(&self, budget: &MonthlyBudget) -> bool {
        if budget.category.trim() != self.category || budget.year != self.year {
            return false;
        }
        if self.include_future_months {
            budget.month >= self.from_month
        } else {
            budget.month == self.from_month
        }
    }
}

/// Durable persistence for entries and budgets
///
/// Mutations run on a single serialized background path. Every successful
/// mutation publishes a [`StoreChange`].
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Full scan; fails with `LedgerError::Load` on unreadable data
    async fn load_all(&self) -> LedgerResult<LedgerSnapshot>;

    /// Insert an entry (an existing ID is overwritten, so retries are safe)
    async fn insert(&self, entry: Entry) -> LedgerResult<()>;

    /// Replace the entry with the same ID; `NotFound` if absent
    async fn update(&self, entry: Entry) -> LedgerResult<()>;

    /// Remove the entry; `NotFound` if absent
    async fn delete(&self, id: EntryId) -> LedgerResult<()>;

    /// Insert or replace the budget for its (category, month, year).
    /// Returns the record that was replaced.
    async fn upsert_budget(&self, budget: MonthlyBudget) -> LedgerResult<Option<MonthlyBudget>>;

    /// Delete the budgets selected by `range`, returning how many went
    async fn delete_budgets(&self, range: BudgetRange) -> LedgerResult<usize>;

    /// Clear both collections
    async fn delete_all(&self) -> LedgerResult<()>;

    /// Resolve once every previously queued write is on stable storage
    async fn force_flush(&self) -> LedgerResult<()>;

    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;

    #[test]
    fn test_single_month_range() {
        let range = BudgetRange::new("Travel", 6, 2025);
        assert!(range.matches(&MonthlyBudget::new("Travel", Money::zero(), 6, 2025)));
        assert!(!range.matches(&MonthlyBudget::new("Travel", Money::zero(), 7, 2025)));
        assert!(!range.matches(&MonthlyBudget::new("Food", Money::zero(), 6, 2025)));
    }

    #[test]
    fn test_forward_range_stays_in_year() {
        let range = BudgetRange::new("Travel", 6, 2025).and_future_months();
        assert!(!range.matches(&MonthlyBudget::new("Travel", Money::zero(), 5, 2025)));
        assert!(range.matches(&MonthlyBudget::new("Travel", Money::zero(), 6, 2025)));
        assert!(range.matches(&MonthlyBudget::new("Travel", Money::zero(), 12, 2025)));
        assert!(!range.matches(&MonthlyBudget::new("Travel", Money::zero(), 1, 2026)));
    }

    #[test]
    fn test_duplicate_keys_detected() {
        let snapshot = LedgerSnapshot {
            entries: Vec::new(),
            budgets: vec![
                MonthlyBudget::new("Food", Money::from_cents(1), 6, 2025),
                MonthlyBudget::new("Rent", Money::from_cents(1), 6, 2025),
                MonthlyBudget::new("Food", Money::from_cents(2), 6, 2025),
            ],
        };
        assert!(matches!(
            snapshot.check_budget_keys(),
            Err(LedgerError::DuplicateBudgetPeriod { month: 6, .. })
        ));
    }
}
