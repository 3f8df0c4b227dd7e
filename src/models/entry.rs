//! Entry model
//!
//! A single recorded expenditure. Entries are never edited in place: an
//! update replaces the stored value under the same ID.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::EntryId;
use super::money::Money;
use super::rules::ValidationRules;

/// A single expenditure record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier
    pub id: EntryId,

    /// Amount spent (positive)
    pub amount: Money,

    /// Category name, trimmed
    pub category: String,

    /// When the expenditure happened
    pub date: DateTime<Utc>,

    /// Free-text note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Entry {
    /// Create a new entry with a fresh ID
    pub fn new(amount: Money, category: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            id: EntryId::new(),
            amount,
            category: category.into().trim().to_string(),
            date,
            note: None,
        }
    }

    /// Attach a note; blank notes are dropped
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.note = if note.trim().is_empty() {
            None
        } else {
            Some(note)
        };
        self
    }

    /// Copy with the category trimmed
    pub fn normalized(mut self) -> Self {
        self.category = self.category.trim().to_string();
        self
    }

    /// Validate against the configured rules
    pub fn validate(
        &self,
        rules: &ValidationRules,
        now: DateTime<Utc>,
    ) -> Result<(), EntryValidationError> {
        if !self.amount.is_positive() {
            return Err(EntryValidationError::NonPositiveAmount);
        }

        if self.amount > rules.max_amount {
            return Err(EntryValidationError::AmountTooLarge {
                amount: self.amount,
                max: rules.max_amount,
            });
        }

        if self.category.trim().is_empty() {
            return Err(EntryValidationError::EmptyCategory);
        }

        if !rules.allow_future_entries && self.date > now {
            return Err(EntryValidationError::FutureDate);
        }

        Ok(())
    }

    /// Advisory duplicate check: same amount, category and calendar day
    pub fn is_probable_duplicate_of(&self, other: &Entry) -> bool {
        self.id != other.id
            && self.amount == other.amount
            && self.category == other.category
            && self.date.date_naive() == other.date.date_naive()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.date.format("%Y-%m-%d"),
            self.category,
            self.amount
        )
    }
}

/// Validation errors for entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    NonPositiveAmount,
    AmountTooLarge { amount: Money, max: Money },
    EmptyCategory,
    FutureDate,
}

impl fmt::Display for EntryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount => write!(f, "Amount must be greater than zero"),
            Self::AmountTooLarge { amount, max } => {
                write!(f, "Amount {} exceeds the maximum of {}", amount, max)
            }
            Self::EmptyCategory => write!(f, "Category cannot be empty"),
            Self::FutureDate => write!(f, "Date cannot be in the future"),
        }
    }
}

impl std::error::Error for EntryValidationError {}
