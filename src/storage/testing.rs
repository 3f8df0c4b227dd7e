//! Test doubles for the storage boundary

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::broadcast;

use crate::config::LedgerPaths;
use crate::error::{ErrorReporter, LedgerError, LedgerResult};
use crate::models::{Entry, EntryId, MonthlyBudget};

use super::{BudgetRange, DurableStore, JsonStore, LedgerSnapshot, RetryPolicy, StoreChange};

/// A [`JsonStore`] whose writes can be switched to fail
pub struct FlakyStore {
    inner: JsonStore,
    fail_writes: AtomicBool,
    partial_reset: AtomicBool,
    writes: AtomicUsize,
    flush_delay_ms: AtomicU64,
}

impl FlakyStore {
    pub async fn open(temp_dir: &TempDir) -> Self {
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let inner = JsonStore::open(paths, RetryPolicy::new(0, Duration::ZERO))
            .await
            .unwrap();
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
            partial_reset: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
            flush_delay_ms: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &JsonStore {
        &self.inner
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make `delete_all` clear the budgets and then fail
    pub fn fail_reset_halfway(&self, fail: bool) {
        self.partial_reset.store(fail, Ordering::SeqCst);
    }

    /// Make `force_flush` stall before reaching the store
    pub fn delay_flush(&self, delay: Duration) {
        self.flush_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of mutating calls that reached the store
    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn gate(&self) -> LedgerResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::Write("simulated disk failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DurableStore for FlakyStore {
    async fn load_all(&self) -> LedgerResult<LedgerSnapshot> {
        self.inner.load_all().await
    }

    async fn insert(&self, entry: Entry) -> LedgerResult<()> {
        self.gate()?;
        self.inner.insert(entry).await
    }

    async fn update(&self, entry: Entry) -> LedgerResult<()> {
        self.gate()?;
        self.inner.update(entry).await
    }

    async fn delete(&self, id: EntryId) -> LedgerResult<()> {
        self.gate()?;
        self.inner.delete(id).await
    }

    async fn upsert_budget(&self, budget: MonthlyBudget) -> LedgerResult<Option<MonthlyBudget>> {
        self.gate()?;
        self.inner.upsert_budget(budget).await
    }

    async fn delete_budgets(&self, range: BudgetRange) -> LedgerResult<usize> {
        self.gate()?;
        self.inner.delete_budgets(range).await
    }

    async fn delete_all(&self) -> LedgerResult<()> {
        self.gate()?;
        if !self.partial_reset.load(Ordering::SeqCst) {
            return self.inner.delete_all().await;
        }

        let snapshot = self.inner.load_all().await?;
        for budget in &snapshot.budgets {
            self.inner
                .delete_budgets(BudgetRange::new(budget.category.clone(), budget.month, budget.year))
                .await?;
        }
        Err(LedgerError::Write("simulated failure after clearing budgets".into()))
    }

    async fn force_flush(&self) -> LedgerResult<()> {
        let delay = self.flush_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.inner.force_flush().await
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.inner.subscribe()
    }
}

/// Reporter that remembers what it was told
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn contexts(&self) -> Vec<String> {
        self.reports.lock().unwrap().clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, context: &str, _error: &LedgerError) {
        self.reports.lock().unwrap().push(context.to_string());
    }
}
