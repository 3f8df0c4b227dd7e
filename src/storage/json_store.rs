//! JSON-file implementation of the durable store
//!
//! Layout: `data/entries.json` and `data/budgets.json`, each a versioned
//! document replaced atomically on every write.
//!
//! Two fixed execution paths touch the files:
//! - reads (`load_all`) run on the caller's path via `spawn_blocking`;
//! - every mutation is queued to one writer task, which owns the last
//!   committed copy of both collections and applies commands strictly in
//!   order. A mutation is built on a scratch copy and only adopted once the
//!   file write (with retries) succeeded.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::config::LedgerPaths;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Entry, EntryId, MonthlyBudget};

use super::file_io::{read_json, sync_dir, write_bytes_atomic};
use super::notify::{ChangeNotifier, StoreChange};
use super::retry::RetryPolicy;
use super::store::{BudgetRange, DurableStore, LedgerSnapshot};

const SCHEMA_VERSION: u32 = 1;
const COMMAND_QUEUE: usize = 64;

fn schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EntryFile {
    #[serde(default = "schema_version")]
    version: u32,
    #[serde(default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct BudgetFile {
    #[serde(default = "schema_version")]
    version: u32,
    #[serde(default)]
    budgets: Vec<MonthlyBudget>,
}

type Reply<T> = oneshot::Sender<LedgerResult<T>>;

enum Command {
    Insert(Entry, Reply<()>),
    Update(Entry, Reply<()>),
    Delete(EntryId, Reply<()>),
    UpsertBudget(MonthlyBudget, Reply<Option<MonthlyBudget>>),
    DeleteBudgets(BudgetRange, Reply<usize>),
    DeleteAll(Reply<()>),
    Flush(Reply<()>),
}

/// Durable store backed by two JSON documents
pub struct JsonStore {
    paths: LedgerPaths,
    commands: mpsc::Sender<Command>,
    changes: ChangeNotifier,
}

impl JsonStore {
    /// Open the store and start its writer task
    ///
    /// Must be called inside a tokio runtime. Fails with `Load` if the
    /// existing files cannot be read.
    pub async fn open(paths: LedgerPaths, retry: RetryPolicy) -> LedgerResult<Self> {
        paths.ensure_directories()?;
        let snapshot = read_snapshot(paths.clone()).await?;

        let changes = ChangeNotifier::new();
        let (commands, queue) = mpsc::channel(COMMAND_QUEUE);
        let writer = Writer {
            paths: paths.clone(),
            retry,
            changes: changes.clone(),
            entries: snapshot.entries,
            budgets: snapshot.budgets,
        };
        tokio::spawn(writer.run(queue));

        tracing::debug!(dir = %paths.data_dir().display(), "json store opened");
        Ok(Self {
            paths,
            commands,
            changes,
        })
    }

    pub fn paths(&self) -> &LedgerPaths {
        &self.paths
    }

    async fn submit<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> LedgerResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| writer_stopped())?;
        response.await.map_err(|_| writer_stopped())?
    }
}

fn writer_stopped() -> LedgerError {
    LedgerError::Write("store writer is not running".into())
}

fn into_load_error(err: LedgerError) -> LedgerError {
    match err {
        LedgerError::Storage(msg) | LedgerError::Io(msg) => LedgerError::Load(msg),
        other => other,
    }
}

async fn read_snapshot(paths: LedgerPaths) -> LedgerResult<LedgerSnapshot> {
    let snapshot = tokio::task::spawn_blocking(move || -> LedgerResult<LedgerSnapshot> {
        let entries: EntryFile = read_json(paths.entries_file())?;
        let budgets: BudgetFile = read_json(paths.budgets_file())?;
        Ok(LedgerSnapshot {
            entries: entries.entries,
            budgets: budgets.budgets,
        })
    })
    .await
    .map_err(|e| LedgerError::Load(format!("load task failed: {}", e)))?
    .map_err(into_load_error)?;

    snapshot.check_budget_keys()?;
    Ok(snapshot)
}

#[async_trait]
impl DurableStore for JsonStore {
    async fn load_all(&self) -> LedgerResult<LedgerSnapshot> {
        read_snapshot(self.paths.clone()).await
    }

    async fn insert(&self, entry: Entry) -> LedgerResult<()> {
        self.submit(|reply| Command::Insert(entry, reply)).await
    }

    async fn update(&self, entry: Entry) -> LedgerResult<()> {
        self.submit(|reply| Command::Update(entry, reply)).await
    }

    async fn delete(&self, id: EntryId) -> LedgerResult<()> {
        self.submit(|reply| Command::Delete(id, reply)).await
    }

    async fn upsert_budget(&self, budget: MonthlyBudget) -> LedgerResult<Option<MonthlyBudget>> {
        self.submit(|reply| Command::UpsertBudget(budget, reply))
            .await
    }

    async fn delete_budgets(&self, range: BudgetRange) -> LedgerResult<usize> {
        self.submit(|reply| Command::DeleteBudgets(range, reply))
            .await
    }

    async fn delete_all(&self) -> LedgerResult<()> {
        self.submit(Command::DeleteAll).await
    }

    async fn force_flush(&self) -> LedgerResult<()> {
        self.submit(Command::Flush).await
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

/// The single background write path
struct Writer {
    paths: LedgerPaths,
    retry: RetryPolicy,
    changes: ChangeNotifier,
    entries: Vec<Entry>,
    budgets: Vec<MonthlyBudget>,
}

impl Writer {
    async fn run(mut self, mut queue: mpsc::Receiver<Command>) {
        while let Some(command) = queue.recv().await {
            match command {
                Command::Insert(entry, reply) => {
                    let _ = reply.send(self.insert(entry).await);
                }
                Command::Update(entry, reply) => {
                    let _ = reply.send(self.update(entry).await);
                }
                Command::Delete(id, reply) => {
                    let _ = reply.send(self.delete(id).await);
                }
                Command::UpsertBudget(budget, reply) => {
                    let _ = reply.send(self.upsert_budget(budget).await);
                }
                Command::DeleteBudgets(range, reply) => {
                    let _ = reply.send(self.delete_budgets(range).await);
                }
                Command::DeleteAll(reply) => {
                    let _ = reply.send(self.delete_all().await);
                }
                Command::Flush(reply) => {
                    let _ = reply.send(self.flush().await);
                }
            }
        }
        tracing::debug!("store writer stopped");
    }

    async fn insert(&mut self, entry: Entry) -> LedgerResult<()> {
        let id = entry.id;
        let mut next = self.entries.clone();
        match next.iter_mut().find(|e| e.id == id) {
            Some(slot) => *slot = entry,
            None => next.push(entry),
        }

        self.entries = self.commit_entries(next).await?;
        self.changes.publish(StoreChange::EntryInserted(id));
        Ok(())
    }

    async fn update(&mut self, entry: Entry) -> LedgerResult<()> {
        let id = entry.id;
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| LedgerError::entry_not_found(id.to_string()))?;

        let mut next = self.entries.clone();
        next[index] = entry;

        self.entries = self.commit_entries(next).await?;
        self.changes.publish(StoreChange::EntryUpdated(id));
        Ok(())
    }

    async fn delete(&mut self, id: EntryId) -> LedgerResult<()> {
        if !self.entries.iter().any(|e| e.id == id) {
            return Err(LedgerError::entry_not_found(id.to_string()));
        }

        let next: Vec<Entry> = self.entries.iter().filter(|e| e.id != id).cloned().collect();

        self.entries = self.commit_entries(next).await?;
        self.changes.publish(StoreChange::EntryDeleted(id));
        Ok(())
    }

    async fn upsert_budget(&mut self, budget: MonthlyBudget) -> LedgerResult<Option<MonthlyBudget>> {
        let id = budget.id;
        let mut next = self.budgets.clone();
        let replaced = match next.iter().position(|b| b.same_period(&budget)) {
            Some(index) => Some(std::mem::replace(&mut next[index], budget)),
            None => {
                next.push(budget);
                None
            }
        };

        self.budgets = self.commit_budgets(next).await?;
        self.changes.publish(StoreChange::BudgetUpserted {
            id,
            replaced: replaced.as_ref().map(|b| b.id),
        });
        Ok(replaced)
    }

    async fn delete_budgets(&mut self, range: BudgetRange) -> LedgerResult<usize> {
        let next: Vec<MonthlyBudget> = self
            .budgets
            .iter()
            .filter(|b| !range.matches(b))
            .cloned()
            .collect();
        let count = self.budgets.len() - next.len();
        if count == 0 {
            return Ok(0);
        }

        self.budgets = self.commit_budgets(next).await?;
        self.changes.publish(StoreChange::BudgetsDeleted {
            category: range.category,
            year: range.year,
            count,
        });
        Ok(count)
    }

    async fn delete_all(&mut self) -> LedgerResult<()> {
        // Budgets go first: if the entries write then fails, the budgets
        // file is put back and the ledger keeps both documents.
        let previous_budgets = self.budgets.clone();
        self.budgets = self.commit_budgets(Vec::new()).await?;

        match self.commit_entries(Vec::new()).await {
            Ok(entries) => self.entries = entries,
            Err(err) => {
                match self.commit_budgets(previous_budgets).await {
                    Ok(restored) => self.budgets = restored,
                    Err(restore_err) => {
                        // The mirror already matches disk: budgets empty, entries kept
                        tracing::error!(%restore_err, "failed to restore budgets after partial reset");
                    }
                }
                return Err(err);
            }
        }

        self.changes.publish(StoreChange::Cleared);
        Ok(())
    }

    async fn flush(&self) -> LedgerResult<()> {
        let dir = self.paths.data_dir();
        tokio::task::spawn_blocking(move || sync_dir(dir))
            .await
            .map_err(|e| LedgerError::Write(format!("flush task failed: {}", e)))?
            .map_err(|e| LedgerError::Write(e.to_string()))
    }

    async fn commit_entries(&self, mut entries: Vec<Entry>) -> LedgerResult<Vec<Entry>> {
        entries.sort_by(|a, b| b.date.cmp(&a.date).then(a.id.cmp(&b.id)));
        let file = EntryFile {
            version: SCHEMA_VERSION,
            entries,
        };
        let bytes = serde_json::to_vec_pretty(&file)?;
        self.persist(self.paths.entries_file(), bytes).await?;
        Ok(file.entries)
    }

    async fn commit_budgets(&self, mut budgets: Vec<MonthlyBudget>) -> LedgerResult<Vec<MonthlyBudget>> {
        budgets.sort_by(|a, b| {
            (a.year, a.month, &a.category).cmp(&(b.year, b.month, &b.category))
        });
        let file = BudgetFile {
            version: SCHEMA_VERSION,
            budgets,
        };
        let bytes = serde_json::to_vec_pretty(&file)?;
        self.persist(self.paths.budgets_file(), bytes).await?;
        Ok(file.budgets)
    }

    async fn persist(&self, path: PathBuf, bytes: Vec<u8>) -> LedgerResult<()> {
        let bytes = Arc::new(bytes);
        self.retry
            .run(|_| {
                let path = path.clone();
                let bytes = Arc::clone(&bytes);
                async move {
                    tokio::task::spawn_blocking(move || write_bytes_atomic(&path, &bytes))
                        .await
                        .map_err(|e| LedgerError::Storage(format!("write task failed: {}", e)))?
                }
            })
            .await
            .map_err(|e| {
                LedgerError::Write(format!(
                    "{} after {} attempts: {}",
                    path.display(),
                    self.retry.max_attempts(),
                    e
                ))
            })
    }
}
