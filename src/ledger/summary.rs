//! Month rollups and the debounced summary publisher
//!
//! After each committed write the ledger marks the summary dirty. A
//! background task waits for a quiet period (every new mark restarts it)
//! and then publishes one fresh [`LedgerSummary`] on a `watch` channel.
//! Consumers subscribe; nothing polls the ledger.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::error::LedgerResult;
use crate::models::{Entry, Money, MonthlyBudget, PeriodFilter};
use crate::storage::file_io::write_bytes_atomic;

/// Snapshot pushed to the home-screen widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub month: u32,
    pub year: i32,
    pub budget_total: Money,
    pub spent: Money,
    pub remaining: Money,
    pub category_count: usize,
    pub transaction_count: usize,
    pub generated_at: DateTime<Utc>,
}

impl LedgerSummary {
    /// Roll up the month containing `now`
    pub fn compute(entries: &[Entry], budgets: &[MonthlyBudget], now: DateTime<Utc>) -> Self {
        let (month, year) = (now.month(), now.year());
        let period = PeriodFilter::month(year, month);

        let month_entries: Vec<&Entry> = entries.iter().filter(|e| period.contains(e.date)).collect();
        let month_budgets: Vec<&MonthlyBudget> = budgets.iter().filter(|b| b.is_for(month, year)).collect();

        let budget_total: Money = month_budgets.iter().map(|b| b.amount).sum();
        let spent: Money = month_entries.iter().map(|e| e.amount).sum();
        let categories: BTreeSet<&str> = month_entries
            .iter()
            .map(|e| e.category.as_str())
            .chain(month_budgets.iter().map(|b| b.category.as_str()))
            .collect();

        Self {
            month,
            year,
            budget_total,
            spent,
            remaining: budget_total - spent,
            category_count: categories.len(),
            transaction_count: month_entries.len(),
            generated_at: now,
        }
    }
}

/// Budget vs. actual for one category in one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetStatus {
    pub budget: MonthlyBudget,
    pub spent: Money,
    pub remaining: Money,
}

impl BudgetStatus {
    pub fn is_over(&self) -> bool {
        self.remaining.is_negative()
    }
}

/// Produces a fresh summary on demand
pub type SummarySource = Arc<dyn Fn() -> LedgerSummary + Send + Sync>;

/// Debounced publisher
pub struct SummaryPublisher {
    dirty: mpsc::Sender<()>,
    latest: watch::Sender<Option<LedgerSummary>>,
    source: SummarySource,
    task: JoinHandle<()>,
}

impl SummaryPublisher {
    /// Start the debounce task. Must be called inside a tokio runtime.
    pub fn spawn(quiet: Duration, source: SummarySource) -> Self {
        // One slot is enough: a pending mark already means "publish soon"
        let (dirty, marks) = mpsc::channel(1);
        let (latest, _) = watch::channel(None);
        let task = tokio::spawn(debounce(marks, quiet, Arc::clone(&source), latest.clone()));

        Self {
            dirty,
            latest,
            source,
            task,
        }
    }

    /// Note that a write happened; publishing follows after the quiet period
    pub fn mark_dirty(&self) {
        let _ = self.dirty.try_send(());
    }

    /// Publish immediately, bypassing the debounce
    pub fn publish_now(&self) -> LedgerSummary {
        let summary = (self.source)();
        self.latest.send_replace(Some(summary.clone()));
        summary
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<LedgerSummary>> {
        self.latest.subscribe()
    }

    pub fn latest(&self) -> Option<LedgerSummary> {
        self.latest.borrow().clone()
    }
}

impl Drop for SummaryPublisher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn debounce(
    mut marks: mpsc::Receiver<()>,
    quiet: Duration,
    source: SummarySource,
    latest: watch::Sender<Option<LedgerSummary>>,
) {
    while marks.recv().await.is_some() {
        loop {
            tokio::select! {
                mark = marks.recv() => {
                    if mark.is_none() {
                        break;
                    }
                }
                _ = sleep(quiet) => break,
            }
        }
        let summary = source();
        tracing::debug!(spent = %summary.spent, remaining = %summary.remaining, "publishing summary");
        latest.send_replace(Some(summary));
    }
}

/// Mirrors published summaries into a JSON file for out-of-process readers
///
/// Clones share one lock, so a follower task and direct writes from
/// lifecycle events never race on the temp file.
#[derive(Debug, Clone)]
pub struct SummaryFileSink {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl SummaryFileSink {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn write(&self, summary: &LedgerSummary) -> LedgerResult<()> {
        let bytes = serde_json::to_vec_pretty(summary)?;
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        write_bytes_atomic(&self.path, &bytes)
    }

    /// Follow a summary channel until it closes
    pub fn spawn(self, mut updates: watch::Receiver<Option<LedgerSummary>>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let current = updates.borrow_and_update().clone();
                if let Some(summary) = current {
                    if let Err(err) = self.write(&summary) {
                        tracing::warn!(%err, path = %self.path.display(), "failed to write summary file");
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_compute_only_counts_current_month() {
        let entries = vec![
            Entry::new(Money::from_cents(4567), "Groceries", now()),
            Entry::new(Money::from_cents(1000), "Fuel", now()),
            Entry::new(
                Money::from_cents(9999),
                "Groceries",
                Utc.with_ymd_and_hms(2025, 5, 31, 23, 0, 0).unwrap(),
            ),
        ];
        let budgets = vec![
            MonthlyBudget::new("Groceries", Money::from_cents(40_000), 6, 2025),
            MonthlyBudget::new("Rent", Money::from_cents(150_000), 6, 2025),
            MonthlyBudget::new("Groceries", Money::from_cents(1), 7, 2025),
        ];

        let summary = LedgerSummary::compute(&entries, &budgets, now());
        assert_eq!((summary.month, summary.year), (6, 2025));
        assert_eq!(summary.budget_total.cents(), 190_000);
        assert_eq!(summary.spent.cents(), 5567);
        assert_eq!(summary.remaining.cents(), 184_433);
        assert_eq!(summary.category_count, 3);
        assert_eq!(summary.transaction_count, 2);
    }

    fn counting_source(counter: Arc<AtomicUsize>) -> SummarySource {
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            LedgerSummary::compute(&[], &[], now())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_publishes_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let publisher = SummaryPublisher::spawn(
            Duration::from_millis(750),
            counting_source(Arc::clone(&counter)),
        );
        let mut updates = publisher.subscribe();

        for _ in 0..5 {
            publisher.mark_dirty();
            sleep(Duration::from_millis(200)).await;
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(publisher.latest().is_none());

        sleep(Duration::from_millis(800)).await;
        updates.changed().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(publisher.latest().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_now_skips_debounce() {
        let counter = Arc::new(AtomicUsize::new(0));
        let publisher = SummaryPublisher::spawn(
            Duration::from_secs(60),
            counting_source(Arc::clone(&counter)),
        );

        let summary = publisher.publish_now();
        assert_eq!(publisher.latest(), Some(summary));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_file_sink_writes_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache").join("summary.json");
        let sink = SummaryFileSink::new(path.clone());

        let summary = LedgerSummary::compute(&[], &[], now());
        sink.write(&summary).unwrap();

        let loaded: LedgerSummary =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(loaded, summary);
    }

    #[tokio::test]
    async fn test_file_sink_follows_debounced_publishes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("summary.json");
        let counter = Arc::new(AtomicUsize::new(0));
        let publisher = SummaryPublisher::spawn(
            Duration::from_millis(10),
            counting_source(Arc::clone(&counter)),
        );
        let follower = SummaryFileSink::new(path.clone()).spawn(publisher.subscribe());

        publisher.mark_dirty();

        tokio::time::timeout(Duration::from_secs(2), async {
            while !path.exists() {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        let loaded: LedgerSummary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!((loaded.month, loaded.year), (6, 2025));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        follower.abort();
    }
}
