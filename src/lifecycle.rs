//! Host lifecycle handling
//!
//! The host (a GUI shell, a CLI, a service wrapper) reports state changes
//! through [`LifecycleController::handle`]:
//!
//! - **foreground**: derived caches are dropped and a fresh summary goes out;
//! - **background**: pending writes are flushed, expired cache files and
//!   stray temp files are pruned, caches are refreshed and a summary is
//!   published, all within the configured grace period. Whatever is left
//!   when the period runs out is abandoned;
//! - **terminating**: a best-effort flush, then an immediate summary.
//!   A process killed before the flush resolves can still lose the last
//!   accepted writes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::config::{LedgerPaths, Settings};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{Ledger, SummaryFileSink};

/// Temp files younger than this may belong to a write in progress
const STALE_TEMP_AGE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    EnteredForeground,
    EnteredBackground,
    Terminating,
}

/// What a background pass managed to do before its deadline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub flushed: bool,
    pub pruned: Vec<PathBuf>,
    pub refreshed: bool,
    pub timed_out: bool,
}

/// File housekeeping run while the host is in the background
#[derive(Debug, Clone)]
pub struct Maintenance {
    cache_dir: PathBuf,
    data_dir: PathBuf,
    cache_retention: Duration,
}

impl Maintenance {
    pub fn new(paths: &LedgerPaths, cache_retention: Duration) -> Self {
        Self {
            cache_dir: paths.cache_dir(),
            data_dir: paths.data_dir(),
            cache_retention,
        }
    }

    /// Delete expired cache files and leftover `*.tmp` files from
    /// interrupted writes. Returns the removed paths. Stops between files
    /// once `cancelled` is set.
    pub fn prune(&self, now: SystemTime, cancelled: &AtomicBool) -> LedgerResult<Vec<PathBuf>> {
        let mut removed =
            prune_older_than(&self.cache_dir, self.cache_retention, now, cancelled, |_| true)?;
        removed.extend(prune_older_than(
            &self.data_dir,
            STALE_TEMP_AGE,
            now,
            cancelled,
            |path| path.extension().map_or(false, |ext| ext == "tmp"),
        )?);
        Ok(removed)
    }
}

/// Remove regular files in `dir` accepted by `select` and last modified
/// more than `max_age` before `now`
pub fn prune_older_than(
    dir: &Path,
    max_age: Duration,
    now: SystemTime,
    cancelled: &AtomicBool,
    select: impl Fn(&Path) -> bool,
) -> LedgerResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut removed = Vec::new();
    for entry in fs::read_dir(dir)
        .map_err(|e| LedgerError::Io(format!("Failed to read {}: {}", dir.display(), e)))?
    {
        if cancelled.load(Ordering::Relaxed) {
            tracing::debug!(dir = %dir.display(), "pruning cancelled");
            break;
        }
        let entry =
            entry.map_err(|e| LedgerError::Io(format!("Failed to read directory entry: {}", e)))?;
        let path = entry.path();
        if !path.is_file() || !select(&path) {
            continue;
        }

        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .map_err(|e| LedgerError::Io(format!("Failed to stat {}: {}", path.display(), e)))?;
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age > max_age {
            fs::remove_file(&path).map_err(|e| {
                LedgerError::Io(format!("Failed to delete {}: {}", path.display(), e))
            })?;
            removed.push(path);
        }
    }

    Ok(removed)
}

/// Applies lifecycle events to a ledger
pub struct LifecycleController {
    ledger: Arc<Ledger>,
    maintenance: Maintenance,
    grace: Duration,
    sink: Option<SummaryFileSink>,
}

impl LifecycleController {
    pub fn new(ledger: Arc<Ledger>, paths: &LedgerPaths, settings: &Settings) -> Self {
        Self {
            ledger,
            maintenance: Maintenance::new(paths, settings.cache_retention()),
            grace: settings.background_grace(),
            sink: None,
        }
    }

    /// Also mirror every summary this controller publishes to a file
    pub fn with_summary_sink(mut self, sink: SummaryFileSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Returns a report for background passes, `None` otherwise
    pub async fn handle(&self, event: LifecycleEvent) -> Option<MaintenanceReport> {
        tracing::debug!(?event, "lifecycle event");
        match event {
            LifecycleEvent::EnteredForeground => {
                self.ledger.invalidate_caches();
                self.publish_summary();
                None
            }
            LifecycleEvent::EnteredBackground => Some(self.entered_background().await),
            LifecycleEvent::Terminating => {
                self.terminating().await;
                None
            }
        }
    }

    async fn entered_background(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();
        let cancelled = Arc::new(AtomicBool::new(false));
        let pass = self.run_maintenance(&mut report, Arc::clone(&cancelled));
        let finished = tokio::time::timeout(self.grace, pass).await.is_ok();

        if !finished {
            // Reaches the blocking prune step, which outlives the timeout
            cancelled.store(true, Ordering::Relaxed);
            report.timed_out = true;
            tracing::warn!(
                grace_ms = self.grace.as_millis() as u64,
                flushed = report.flushed,
                "background maintenance ran out of time"
            );
        }
        report
    }

    async fn run_maintenance(&self, report: &mut MaintenanceReport, cancelled: Arc<AtomicBool>) {
        match self.ledger.force_flush().await {
            Ok(()) => report.flushed = true,
            Err(err) => tracing::warn!(%err, "flush before background failed"),
        }

        let maintenance = self.maintenance.clone();
        let prune = move || maintenance.prune(SystemTime::now(), &cancelled);
        match tokio::task::spawn_blocking(prune).await {
            Ok(Ok(pruned)) => {
                if !pruned.is_empty() {
                    tracing::info!(count = pruned.len(), "pruned stale files");
                }
                report.pruned = pruned;
            }
            Ok(Err(err)) => tracing::warn!(%err, "pruning failed"),
            Err(err) => tracing::warn!(%err, "pruning task failed"),
        }

        self.ledger.refresh_caches();
        self.publish_summary();
        report.refreshed = true;
    }

    async fn terminating(&self) {
        if let Err(err) = self.ledger.force_flush().await {
            tracing::warn!(%err, "final flush failed; recent writes may be lost");
        }
        self.publish_summary();
    }

    fn publish_summary(&self) {
        let summary = self.ledger.publish_summary();
        if let Some(sink) = &self.sink {
            if let Err(err) = sink.write(&summary) {
                tracing::warn!(%err, "failed to write summary file");
            }
        }
    }
}
