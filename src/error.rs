//! Custom error types for the ledger
//!
//! This module defines the error hierarchy using thiserror. The first five
//! variants are the kinds callers are expected to branch on; the rest are
//! ambient failures from configuration, files and exports.

use thiserror::Error;

/// The main error type for ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed input rejected before anything reaches the store
    #[error("Validation error: {0}")]
    Validation(String),

    /// Update/delete target is absent from the store
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Durable write failed after exhausting retries
    #[error("Write error: {0}")]
    Write(String),

    /// Startup full scan failed
    #[error("Load error: {0}")]
    Load(String),

    /// A second budget for an existing (category, month, year)
    #[error("A budget for '{category}' already exists for {year}-{month:02}")]
    DuplicateBudgetPeriod {
        category: String,
        month: u32,
        year: i32,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Storage engine errors (channel closed, task panicked)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),
}

impl LedgerError {
    /// Create a "not found" error for entries
    pub fn entry_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Entry",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a write error
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write(_))
    }

    /// Check if this is a load error
    pub fn is_load(&self) -> bool {
        matches!(self, Self::Load(_))
    }

    /// Whether this error should also go to the process-wide reporter
    pub fn is_reportable(&self) -> bool {
        matches!(self, Self::Write(_) | Self::Load(_))
    }

    /// Message suitable for showing to the user
    ///
    /// Validation and lookup failures are specific; storage failures get a
    /// generic message since the user can only retry.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::NotFound { .. } | Self::DuplicateBudgetPeriod { .. } => self.to_string(),
            Self::Write(_) => "Could not save your data. Please try again.".to_string(),
            Self::Load(_) => "Could not load your data. Please try again.".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Process-wide sink for write/load failures
///
/// The user-facing layer installs its own implementation to surface a
/// "could not save" banner; the default just logs.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, context: &str, error: &LedgerError);
}

/// Reporter that forwards to tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, context: &str, error: &LedgerError) {
        tracing::error!(context, %error, "ledger operation failed");
    }
}
