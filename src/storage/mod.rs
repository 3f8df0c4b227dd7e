//! Storage layer
//!
//! The [`DurableStore`] trait is the boundary the ledger writes through;
//! [`JsonStore`] is the on-disk implementation with atomic file writes, a
//! serialized background write path, bounded retries and change
//! notifications.

pub mod file_io;
pub mod json_store;
pub mod notify;
pub mod retry;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use json_store::JsonStore;
pub use notify::{ChangeNotifier, StoreChange};
pub use retry::RetryPolicy;
pub use store::{BudgetRange, DurableStore, LedgerSnapshot};
