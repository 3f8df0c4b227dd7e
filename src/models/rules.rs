//! Validation limits shared by entries and budgets

use crate::config::Settings;

use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    /// Ceiling for any single amount
    pub max_amount: Money,
    /// Accept entries dated after "now"
    pub allow_future_entries: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for ValidationRules {
    fn from(settings: &Settings) -> Self {
        Self {
            max_amount: settings.max_transaction_amount,
            allow_future_entries: settings.allow_future_entries,
        }
    }
}
