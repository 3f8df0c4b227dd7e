//! Aggregate statistics and the integrity score
//!
//! The integrity score is a health hint over the stored data. Nothing reads
//! it to decide whether an operation may proceed.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Entry, Money, MonthlyBudget};

const EMPTY_CATEGORY_WEIGHT: f64 = 0.3;
const NON_POSITIVE_AMOUNT_WEIGHT: f64 = 0.4;
const FUTURE_DATE_WEIGHT: f64 = 0.2;
const OVER_MAX_WEIGHT: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerStatistics {
    pub entry_count: usize,
    pub budget_count: usize,
    pub category_count: usize,
    pub total_spent: Money,
    pub total_budgeted: Money,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
    /// 0.0 (all entries suspect) to 1.0 (clean)
    pub integrity_score: f64,
}

impl LedgerStatistics {
    pub fn compute(
        entries: &[Entry],
        budgets: &[MonthlyBudget],
        max_amount: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            entry_count: entries.len(),
            budget_count: budgets.len(),
            category_count: category_set(entries, budgets).len(),
            total_spent: entries.iter().map(|e| e.amount).sum(),
            total_budgeted: budgets.iter().map(|b| b.amount).sum(),
            oldest_entry: entries.iter().map(|e| e.date).min(),
            newest_entry: entries.iter().map(|e| e.date).max(),
            integrity_score: integrity_score(entries, max_amount, now),
        }
    }
}

/// Distinct non-empty categories across both collections, sorted
pub fn category_set(entries: &[Entry], budgets: &[MonthlyBudget]) -> BTreeSet<String> {
    entries
        .iter()
        .map(|e| e.category.trim())
        .chain(budgets.iter().map(|b| b.category.trim()))
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Weighted share of suspicious entries subtracted from 1.0, clamped to [0, 1]
pub fn integrity_score(entries: &[Entry], max_amount: Money, now: DateTime<Utc>) -> f64 {
    if entries.is_empty() {
        return 1.0;
    }

    let score = 1.0
        - share(entries, |e| e.category.trim().is_empty()) * EMPTY_CATEGORY_WEIGHT
        - share(entries, |e| !e.amount.is_positive()) * NON_POSITIVE_AMOUNT_WEIGHT
        - share(entries, |e| e.date > now) * FUTURE_DATE_WEIGHT
        - share(entries, |e| e.amount > max_amount) * OVER_MAX_WEIGHT;

    score.clamp(0.0, 1.0)
}

fn share(entries: &[Entry], pred: impl Fn(&Entry) -> bool) -> f64 {
    entries.iter().filter(|&e| pred(e)).count() as f64 / entries.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn clean(n: usize) -> Vec<Entry> {
        (0..n)
            .map(|i| Entry::new(Money::from_cents(100 + i as i64), "Food", now() - Duration::days(1)))
            .collect()
    }

    const MAX: Money = Money::from_cents(1_000_000);

    #[test]
    fn test_empty_is_healthy() {
        assert_eq!(integrity_score(&[], MAX, now()), 1.0);
    }

    #[test]
    fn test_clean_data_scores_one() {
        assert_eq!(integrity_score(&clean(5), MAX, now()), 1.0);
    }

    #[test]
    fn test_weights() {
        let mut entries = clean(3);
        let mut bad = Entry::new(Money::zero(), "Food", now());
        bad.category = String::new();
        entries.push(bad);

        // one of four: empty category (0.3) and non-positive amount (0.4)
        let score = integrity_score(&entries, MAX, now());
        assert!((score - (1.0 - 0.25 * 0.3 - 0.25 * 0.4)).abs() < 1e-9);

        let future = vec![Entry::new(Money::from_cents(2_000_000), "Toys", now() + Duration::days(2))];
        let score = integrity_score(&future, MAX, now());
        assert!((score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_adding_non_positive_entry_lowers_score() {
        for n in 1..20 {
            let mut entries = clean(n);
            let before = integrity_score(&entries, MAX, now());
            entries.push(Entry::new(Money::from_cents(-5), "Food", now()));
            let after = integrity_score(&entries, MAX, now());
            assert!(after < before, "n={n}: {after} !< {before}");
        }
    }

    #[test]
    fn test_compute_aggregates() {
        let entries = vec![
            Entry::new(Money::from_cents(1000), "Food", now() - Duration::days(3)),
            Entry::new(Money::from_cents(2500), "Rent", now() - Duration::days(1)),
        ];
        let budgets = vec![
            MonthlyBudget::new("Food", Money::from_cents(40_000), 6, 2025),
            MonthlyBudget::new("Travel", Money::from_cents(10_000), 6, 2025),
        ];

        let stats = LedgerStatistics::compute(&entries, &budgets, MAX, now());
        assert_eq!(stats.entry_count, 2);
        assert_eq!(stats.budget_count, 2);
        assert_eq!(stats.category_count, 3);
        assert_eq!(stats.total_spent.cents(), 3500);
        assert_eq!(stats.total_budgeted.cents(), 50_000);
        assert_eq!(stats.oldest_entry, Some(now() - Duration::days(3)));
        assert_eq!(stats.newest_entry, Some(now() - Duration::days(1)));
        assert_eq!(stats.integrity_score, 1.0);
    }
}
