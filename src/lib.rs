//! Pocket Ledger - local-first personal spending ledger
//!
//! Records expenditures by category, keeps one budget per category per
//! month and reports spending against those budgets. Everything is kept in
//! memory for reads and written through a durable JSON store before any
//! change becomes visible.
//!
//! # Architecture
//!
//! - `config`: paths and settings
//! - `error`: error types and the process-wide error reporter
//! - `models`: entries, budgets, money, IDs and period filters
//! - `storage`: the durable store contract and its JSON implementation
//! - `ledger`: the coordinator, derived caches, queries and the summary feed
//! - `lifecycle`: foreground/background/terminating handling
//! - `export`: JSON, YAML and CSV export
//! - `display` and `cli`: terminal output and command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pocket_ledger::config::{LedgerPaths, Settings};
//! use pocket_ledger::ledger::Ledger;
//! use pocket_ledger::storage::{JsonStore, RetryPolicy};
//!
//! let paths = LedgerPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let store = JsonStore::open(paths, RetryPolicy::from(settings.write_retry)).await?;
//! let ledger = Ledger::open(Arc::new(store), &settings).await?;
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod ledger;
pub mod lifecycle;
pub mod models;
pub mod storage;

pub use error::{LedgerError, LedgerResult};
