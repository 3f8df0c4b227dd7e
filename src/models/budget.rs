//! Monthly budget model
//!
//! A spending ceiling for one category in one calendar month. The
//! (category, month, year) triple is the natural key.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::BudgetId;
use super::money::Money;
use super::rules::ValidationRules;

pub const MIN_BUDGET_YEAR: i32 = 1900;
pub const MAX_BUDGET_YEAR: i32 = 9999;

/// A budget for a specific category in a specific month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBudget {
    pub id: BudgetId,

    pub category: String,

    /// Ceiling for the month (zero allowed)
    pub amount: Money,

    /// 1-12
    pub month: u32,

    pub year: i32,

    /// No longer the active budget for its period
    #[serde(default)]
    pub is_historical: bool,
}

impl MonthlyBudget {
    pub fn new(category: impl Into<String>, amount: Money, month: u32, year: i32) -> Self {
        Self {
            id: BudgetId::new(),
            category: category.into().trim().to_string(),
            amount,
            month,
            year,
            is_historical: false,
        }
    }

    pub fn historical(mut self) -> Self {
        self.is_historical = true;
        self
    }

    /// Copy with the category trimmed
    pub fn normalized(mut self) -> Self {
        self.category = self.category.trim().to_string();
        self
    }

    /// Whether this budget occupies the given key
    pub fn has_key(&self, category: &str, month: u32, year: i32) -> bool {
        self.month == month && self.year == year && self.category.trim() == category.trim()
    }

    /// Whether this budget shares its key with `other`
    pub fn same_period(&self, other: &MonthlyBudget) -> bool {
        self.has_key(&other.category, other.month, other.year)
    }

    pub fn is_for(&self, month: u32, year: i32) -> bool {
        self.month == month && self.year == year
    }

    pub fn validate(&self, rules: &ValidationRules) -> Result<(), BudgetValidationError> {
        if self.amount.is_negative() {
            return Err(BudgetValidationError::NegativeAmount);
        }

        if self.amount > rules.max_amount {
            return Err(BudgetValidationError::AmountTooLarge {
                amount: self.amount,
                max: rules.max_amount,
            });
        }

        if self.category.trim().is_empty() {
            return Err(BudgetValidationError::EmptyCategory);
        }

        if !(1..=12).contains(&self.month) {
            return Err(BudgetValidationError::InvalidMonth(self.month));
        }

        if !(MIN_BUDGET_YEAR..=MAX_BUDGET_YEAR).contains(&self.year) {
            return Err(BudgetValidationError::InvalidYear(self.year));
        }

        Ok(())
    }
}

impl fmt::Display for MonthlyBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:02} {}: {}",
            self.year, self.month, self.category, self.amount
        )
    }
}

/// Validation errors for budgets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetValidationError {
    NegativeAmount,
    AmountTooLarge { amount: Money, max: Money },
    EmptyCategory,
    InvalidMonth(u32),
    InvalidYear(i32),
}

impl fmt::Display for BudgetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeAmount => write!(f, "Budget amount cannot be negative"),
            Self::AmountTooLarge { amount, max } => {
                write!(f, "Budget amount {} exceeds the maximum of {}", amount, max)
            }
            Self::EmptyCategory => write!(f, "Category cannot be empty"),
            Self::InvalidMonth(m) => write!(f, "Month must be between 1 and 12, got {}", m),
            Self::InvalidYear(y) => write!(
                f,
                "Year must be between {} and {}, got {}",
                MIN_BUDGET_YEAR, MAX_BUDGET_YEAR, y
            ),
        }
    }
}

impl std::error::Error for BudgetValidationError {}
