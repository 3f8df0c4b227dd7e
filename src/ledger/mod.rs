//! The ledger coordinator
//!
//! [`Ledger`] owns the in-memory copy of every entry and budget and is the
//! only thing callers read from or write through. Reads are synchronous and
//! served from memory. Every write follows the same three phases:
//!
//! 1. validate the input (no locks, no I/O);
//! 2. take the write gate and wait for the durable store to accept it;
//! 3. apply the change in memory, drop derived caches, mark the summary
//!    dirty.
//!
//! A failure in phase 1 or 2 leaves memory exactly as it was.

pub mod cache;
pub mod query;
pub mod stats;
pub mod summary;

pub use cache::TimedCache;
pub use query::{EntryQuery, SortKey};
pub use stats::LedgerStatistics;
pub use summary::{BudgetStatus, LedgerSummary, SummaryFileSink, SummaryPublisher};

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use std::time::Duration;

use chrono::{Datelike, Utc};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::Settings;
use crate::error::{ErrorReporter, LedgerError, LedgerResult, TracingReporter};
use crate::models::budget::{MAX_BUDGET_YEAR, MIN_BUDGET_YEAR};
use crate::models::{Entry, EntryId, Money, MonthlyBudget, PeriodFilter, ValidationRules};
use crate::storage::{BudgetRange, DurableStore, LedgerSnapshot, StoreChange};

#[derive(Debug, Default)]
struct LedgerState {
    entries: Vec<Entry>,
    budgets: Vec<MonthlyBudget>,
}

#[derive(Debug, Clone, Copy)]
struct MonthTotal {
    month: u32,
    year: i32,
    total: Money,
}

struct DerivedCaches {
    categories: TimedCache<Vec<String>>,
    month_total: TimedCache<MonthTotal>,
    statistics: TimedCache<LedgerStatistics>,
}

impl DerivedCaches {
    fn new(ttl: Duration) -> Self {
        Self {
            categories: TimedCache::new(ttl),
            month_total: TimedCache::new(ttl),
            statistics: TimedCache::new(ttl),
        }
    }

    fn invalidate_all(&self) {
        self.categories.invalidate();
        self.month_total.invalidate();
        self.statistics.invalidate();
    }

    #[cfg(test)]
    fn any_warm(&self) -> bool {
        self.categories.is_warm() || self.month_total.is_warm() || self.statistics.is_warm()
    }
}

/// Single entry point for reading and writing ledger data
pub struct Ledger {
    store: Arc<dyn DurableStore>,
    state: Arc<RwLock<LedgerState>>,
    caches: Arc<DerivedCaches>,
    write_gate: Mutex<()>,
    rules: ValidationRules,
    summary: SummaryPublisher,
    reporter: Arc<dyn ErrorReporter>,
    listener: JoinHandle<()>,
}

impl Ledger {
    /// Load everything from `store` and start serving
    pub async fn open(store: Arc<dyn DurableStore>, settings: &Settings) -> LedgerResult<Self> {
        Self::open_with_reporter(store, settings, Arc::new(TracingReporter)).await
    }

    pub async fn open_with_reporter(
        store: Arc<dyn DurableStore>,
        settings: &Settings,
        reporter: Arc<dyn ErrorReporter>,
    ) -> LedgerResult<Self> {
        // Subscribe before loading so no change slips between the two
        let changes = store.subscribe();

        let snapshot = match store.load_all().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                if err.is_reportable() {
                    reporter.report("load ledger", &err);
                }
                return Err(err);
            }
        };
        tracing::info!(
            entries = snapshot.entries.len(),
            budgets = snapshot.budgets.len(),
            "ledger loaded"
        );

        let state = Arc::new(RwLock::new(LedgerState {
            entries: snapshot.entries,
            budgets: snapshot.budgets,
        }));
        let caches = Arc::new(DerivedCaches::new(settings.cache_validity()));
        let listener = tokio::spawn(invalidate_on_change(changes, Arc::clone(&caches)));

        let source_state = Arc::clone(&state);
        let summary = SummaryPublisher::spawn(
            settings.summary_debounce(),
            Arc::new(move || {
                let state = read_lock(&source_state);
                LedgerSummary::compute(&state.entries, &state.budgets, Utc::now())
            }),
        );

        Ok(Self {
            store,
            state,
            caches,
            write_gate: Mutex::new(()),
            rules: ValidationRules::from(settings),
            summary,
            reporter,
            listener,
        })
    }

    // ---- reads ------------------------------------------------------------

    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        read_lock(&self.state)
    }

    /// Entries matching `query`, in the query's order
    pub fn get_entries(&self, query: &EntryQuery) -> Vec<Entry> {
        query.apply(&self.read().entries)
    }

    pub fn get_entry(&self, id: EntryId) -> Option<Entry> {
        self.read().entries.iter().find(|e| e.id == id).cloned()
    }

    /// Look up an entry by full UUID or short ID (`ent-1a2b3c4d`)
    pub fn find_entry(&self, text: &str) -> LedgerResult<Entry> {
        let state = self.read();
        let mut matches = state.entries.iter().filter(|e| e.id.matches(text));
        match (matches.next(), matches.next()) {
            (Some(entry), None) => Ok(entry.clone()),
            (Some(_), Some(_)) => Err(LedgerError::Validation(format!(
                "'{}' matches more than one entry",
                text
            ))),
            (None, _) => Err(LedgerError::entry_not_found(text)),
        }
    }

    /// Budgets for one month, by category
    pub fn get_budgets(&self, month: u32, year: i32) -> Vec<MonthlyBudget> {
        let mut budgets: Vec<MonthlyBudget> = self
            .read()
            .budgets
            .iter()
            .filter(|b| b.is_for(month, year))
            .cloned()
            .collect();
        budgets.sort_by(|a, b| a.category.cmp(&b.category));
        budgets
    }

    /// Every budget, oldest period first
    pub fn all_budgets(&self) -> Vec<MonthlyBudget> {
        let mut budgets = self.read().budgets.clone();
        budgets.sort_by(|a, b| {
            (a.year, a.month, &a.category).cmp(&(b.year, b.month, &b.category))
        });
        budgets
    }

    /// Distinct categories across entries and budgets, sorted
    pub fn get_categories(&self) -> Vec<String> {
        self.caches.categories.get_or_compute(|| {
            tracing::debug!("recomputing categories");
            let state = self.read();
            stats::category_set(&state.entries, &state.budgets)
                .into_iter()
                .collect()
        })
    }

    /// Sum of budgets for the current calendar month
    pub fn get_current_month_budget_total(&self) -> Money {
        let now = Utc::now();
        let (month, year) = (now.month(), now.year());

        let cached = self
            .caches
            .month_total
            .get_or_compute(|| self.month_total(month, year));
        if (cached.month, cached.year) == (month, year) {
            return cached.total;
        }

        // The month rolled over since the value was cached
        self.caches.month_total.invalidate();
        self.caches
            .month_total
            .get_or_compute(|| self.month_total(month, year))
            .total
    }

    fn month_total(&self, month: u32, year: i32) -> MonthTotal {
        tracing::debug!(month, year, "recomputing month budget total");
        let total = self
            .read()
            .budgets
            .iter()
            .filter(|b| b.is_for(month, year))
            .map(|b| b.amount)
            .sum();
        MonthTotal { month, year, total }
    }

    pub fn get_statistics(&self) -> LedgerStatistics {
        self.caches.statistics.get_or_compute(|| {
            tracing::debug!("recomputing statistics");
            let state = self.read();
            LedgerStatistics::compute(
                &state.entries,
                &state.budgets,
                self.rules.max_amount,
                Utc::now(),
            )
        })
    }

    /// Stored entries that look like `entry` (same amount, category and day)
    pub fn probable_duplicates(&self, entry: &Entry) -> Vec<Entry> {
        self.read()
            .entries
            .iter()
            .filter(|e| e.is_probable_duplicate_of(entry))
            .cloned()
            .collect()
    }

    /// Total spent in one category during one month
    pub fn spent_in(&self, category: &str, month: u32, year: i32) -> Money {
        let category = category.trim();
        let period = PeriodFilter::month(year, month);
        self.read()
            .entries
            .iter()
            .filter(|e| e.category == category && period.contains(e.date))
            .map(|e| e.amount)
            .sum()
    }

    /// Budget vs. actual for every budget in one month
    pub fn budget_status(&self, month: u32, year: i32) -> Vec<BudgetStatus> {
        self.get_budgets(month, year)
            .into_iter()
            .map(|budget| {
                let spent = self.spent_in(&budget.category, month, year);
                BudgetStatus {
                    remaining: budget.amount - spent,
                    spent,
                    budget,
                }
            })
            .collect()
    }

    /// Copy of everything in memory
    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.read();
        LedgerSnapshot {
            entries: state.entries.clone(),
            budgets: state.budgets.clone(),
        }
    }

    // ---- summary ----------------------------------------------------------

    /// Summary for the current month, computed now
    pub fn summary_now(&self) -> LedgerSummary {
        let state = self.read();
        LedgerSummary::compute(&state.entries, &state.budgets, Utc::now())
    }

    /// Push a summary to subscribers without waiting for the debounce
    pub fn publish_summary(&self) -> LedgerSummary {
        self.summary.publish_now()
    }

    pub fn subscribe_summary(&self) -> watch::Receiver<Option<LedgerSummary>> {
        self.summary.subscribe()
    }

    // ---- caches -----------------------------------------------------------

    /// Drop every derived value; the next read recomputes
    pub fn invalidate_caches(&self) {
        self.caches.invalidate_all();
    }

    /// Recompute every derived value now
    pub fn refresh_caches(&self) {
        self.caches.invalidate_all();
        self.get_categories();
        self.get_current_month_budget_total();
        self.get_statistics();
    }

    #[cfg(test)]
    pub(crate) fn has_warm_caches(&self) -> bool {
        self.caches.any_warm()
    }

    // ---- writes -----------------------------------------------------------

    /// Record a new expenditure
    pub async fn add_entry(&self, entry: Entry) -> LedgerResult<Entry> {
        let entry = entry.normalized();
        self.validate_entry(&entry)?;

        let _gate = self.write_gate.lock().await;
        let duplicates = self.probable_duplicates(&entry).len();
        if duplicates > 0 {
            tracing::warn!(id = %entry.id, duplicates, "entry looks like a duplicate");
        }

        self.durable("add entry", self.store.insert(entry.clone()))
            .await?;
        // The store overwrites on a repeated ID, so a retried create must too
        self.commit(|state| {
            match state.entries.iter_mut().find(|e| e.id == entry.id) {
                Some(slot) => *slot = entry.clone(),
                None => state.entries.push(entry.clone()),
            }
        });

        tracing::info!(id = %entry.id, amount = %entry.amount, category = %entry.category, "entry added");
        Ok(entry)
    }

    /// Replace the stored entry with the same ID
    pub async fn update_entry(&self, entry: Entry) -> LedgerResult<Entry> {
        let entry = entry.normalized();
        self.validate_entry(&entry)?;

        let _gate = self.write_gate.lock().await;
        self.durable("update entry", self.store.update(entry.clone()))
            .await?;
        self.commit(|state| {
            match state.entries.iter_mut().find(|e| e.id == entry.id) {
                Some(slot) => *slot = entry.clone(),
                None => state.entries.push(entry.clone()),
            }
        });

        tracing::info!(id = %entry.id, "entry updated");
        Ok(entry)
    }

    pub async fn delete_entry(&self, id: EntryId) -> LedgerResult<()> {
        let _gate = self.write_gate.lock().await;
        self.durable("delete entry", self.store.delete(id)).await?;
        self.commit(|state| state.entries.retain(|e| e.id != id));

        tracing::info!(%id, "entry deleted");
        Ok(())
    }

    /// Create or replace the budget for its (category, month, year).
    /// Returns the budget that was replaced, if any.
    pub async fn set_budget(&self, budget: MonthlyBudget) -> LedgerResult<Option<MonthlyBudget>> {
        let budget = budget.normalized();
        budget
            .validate(&self.rules)
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        let _gate = self.write_gate.lock().await;
        let replaced = self
            .durable("save budget", self.store.upsert_budget(budget.clone()))
            .await?;
        self.commit(|state| {
            state.budgets.retain(|b| !b.same_period(&budget));
            state.budgets.push(budget.clone());
        });

        tracing::info!(
            id = %budget.id,
            category = %budget.category,
            month = budget.month,
            year = budget.year,
            replaced = replaced.is_some(),
            "budget saved"
        );
        Ok(replaced)
    }

    /// Delete one month's budget for a category, or that month and every
    /// later month of the year. Returns how many were removed.
    pub async fn delete_budgets(&self, range: BudgetRange) -> LedgerResult<usize> {
        validate_range(&range)?;

        let _gate = self.write_gate.lock().await;
        let removed = self
            .durable("delete budgets", self.store.delete_budgets(range.clone()))
            .await?;
        if removed > 0 {
            self.commit(|state| state.budgets.retain(|b| !range.matches(b)));
        }

        tracing::info!(category = %range.category, year = range.year, removed, "budgets deleted");
        Ok(removed)
    }

    /// Remove every entry and budget
    pub async fn reset(&self) -> LedgerResult<()> {
        let _gate = self.write_gate.lock().await;
        if let Err(err) = self.durable("reset ledger", self.store.delete_all()).await {
            // A reset spans two documents and may have been half applied
            self.resync().await;
            return Err(err);
        }
        self.commit(|state| {
            state.entries.clear();
            state.budgets.clear();
        });

        tracing::info!("ledger reset");
        Ok(())
    }

    /// Wait until every accepted write is on stable storage
    pub async fn force_flush(&self) -> LedgerResult<()> {
        self.durable("flush", self.store.force_flush()).await
    }

    /// Adopt the store's contents if they no longer match memory
    async fn resync(&self) {
        let disk = match self.store.load_all().await {
            Ok(disk) => disk,
            Err(err) => {
                tracing::warn!(%err, "could not re-read store after failed write");
                return;
            }
        };
        if same_records(&self.snapshot(), &disk) {
            return;
        }

        tracing::warn!(
            entries = disk.entries.len(),
            budgets = disk.budgets.len(),
            "memory diverged from store, reloading"
        );
        self.commit(|state| {
            state.entries = disk.entries;
            state.budgets = disk.budgets;
        });
    }

    fn validate_entry(&self, entry: &Entry) -> LedgerResult<()> {
        entry
            .validate(&self.rules, Utc::now())
            .map_err(|e| LedgerError::Validation(e.to_string()))
    }

    async fn durable<T>(
        &self,
        context: &str,
        write: impl Future<Output = LedgerResult<T>>,
    ) -> LedgerResult<T> {
        write.await.map_err(|err| {
            if err.is_reportable() {
                self.reporter.report(context, &err);
            }
            err
        })
    }

    fn commit(&self, apply: impl FnOnce(&mut LedgerState)) {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            apply(&mut state);
        }
        self.caches.invalidate_all();
        self.summary.mark_dirty();
    }
}

impl Drop for Ledger {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

fn read_lock(state: &RwLock<LedgerState>) -> RwLockReadGuard<'_, LedgerState> {
    state.read().unwrap_or_else(PoisonError::into_inner)
}

/// Same entries and budgets, ignoring order
fn same_records(memory: &LedgerSnapshot, disk: &LedgerSnapshot) -> bool {
    let (mut memory, mut disk) = (memory.clone(), disk.clone());
    for snapshot in [&mut memory, &mut disk] {
        snapshot.entries.sort_by_key(|e| e.id);
        snapshot.budgets.sort_by_key(|b| b.id);
    }
    memory == disk
}

fn validate_range(range: &BudgetRange) -> LedgerResult<()> {
    if range.category.is_empty() {
        return Err(LedgerError::Validation("Category cannot be empty".into()));
    }
    if !(1..=12).contains(&range.from_month) {
        return Err(LedgerError::Validation(format!(
            "Month must be 1-12, got {}",
            range.from_month
        )));
    }
    if !(MIN_BUDGET_YEAR..=MAX_BUDGET_YEAR).contains(&range.year) {
        return Err(LedgerError::Validation(format!(
            "Year must be {}-{}, got {}",
            MIN_BUDGET_YEAR, MAX_BUDGET_YEAR, range.year
        )));
    }
    Ok(())
}

/// Drop derived values whenever the store reports a change
async fn invalidate_on_change(
    mut changes: broadcast::Receiver<StoreChange>,
    caches: Arc<DerivedCaches>,
) {
    loop {
        match changes.recv().await {
            Ok(change) => {
                tracing::trace!(?change, "store changed");
                caches.invalidate_all();
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::debug!(missed, "change listener lagged");
                caches.invalidate_all();
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
