//! Core data models
//!
//! Value types for the ledger: expenditure entries, monthly budgets, money
//! and the period filters used to query them.

pub mod budget;
pub mod entry;
pub mod ids;
pub mod money;
pub mod period;
pub mod rules;

pub use budget::{BudgetValidationError, MonthlyBudget};
pub use entry::{Entry, EntryValidationError};
pub use ids::{BudgetId, EntryId};
pub use money::{Money, MoneyParseError};
pub use period::{PeriodFilter, PeriodParseError};
pub use rules::ValidationRules;
