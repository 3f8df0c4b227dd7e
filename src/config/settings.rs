//! User settings for the ledger
//!
//! Holds validation limits, cache windows, retry policy and the lifecycle
//! grace period. Every field has a serde default so older config files keep
//! loading after new knobs are added.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::LedgerPaths;
use crate::error::LedgerError;
use crate::models::Money;

/// Retry policy for durable writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRetry {
    /// Retries after the first failed attempt
    pub max_retries: u32,
    /// Backoff unit; retry `n` waits `backoff_ms * n`
    pub backoff_ms: u64,
}

impl Default for WriteRetry {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 100,
        }
    }
}

/// User settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Largest amount accepted for a single entry or budget
    #[serde(default = "default_max_transaction_amount")]
    pub max_transaction_amount: Money,

    /// How long derived caches may be served without recomputing
    #[serde(default = "default_cache_validity_secs")]
    pub cache_validity_secs: u64,

    /// Quiet period before a summary snapshot is published
    #[serde(default = "default_summary_debounce_ms")]
    pub summary_debounce_ms: u64,

    #[serde(default)]
    pub write_retry: WriteRetry,

    /// Budget for flush + maintenance when the app is backgrounded
    #[serde(default = "default_background_grace_ms")]
    pub background_grace_ms: u64,

    /// Cache files older than this are pruned during maintenance
    #[serde(default = "default_cache_retention_days")]
    pub cache_retention_days: u32,

    /// Accept entries dated after "now"
    #[serde(default)]
    pub allow_future_entries: bool,

    /// Default tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Default currency symbol
    #[serde(default = "default_currency")]
    pub currency_symbol: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_max_transaction_amount() -> Money {
    Money::from_dollars_cents(1_000_000, 0)
}

fn default_cache_validity_secs() -> u64 {
    300
}

fn default_summary_debounce_ms() -> u64 {
    750
}

fn default_background_grace_ms() -> u64 {
    5_000
}

fn default_cache_retention_days() -> u32 {
    7
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_currency() -> String {
    "$".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            max_transaction_amount: default_max_transaction_amount(),
            cache_validity_secs: default_cache_validity_secs(),
            summary_debounce_ms: default_summary_debounce_ms(),
            write_retry: WriteRetry::default(),
            background_grace_ms: default_background_grace_ms(),
            cache_retention_days: default_cache_retention_days(),
            allow_future_entries: false,
            log_level: default_log_level(),
            currency_symbol: default_currency(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or use defaults if the file doesn't exist
    pub fn load_or_create(paths: &LedgerPaths) -> Result<Self, LedgerError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| LedgerError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                LedgerError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &LedgerPaths) -> Result<(), LedgerError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| LedgerError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    pub fn cache_validity(&self) -> Duration {
        Duration::from_secs(self.cache_validity_secs)
    }

    pub fn summary_debounce(&self) -> Duration {
        Duration::from_millis(self.summary_debounce_ms)
    }

    pub fn background_grace(&self) -> Duration {
        Duration::from_millis(self.background_grace_ms)
    }

    pub fn cache_retention(&self) -> Duration {
        Duration::from_secs(u64::from(self.cache_retention_days) * 24 * 60 * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.cache_validity_secs, 300);
        assert_eq!(settings.write_retry.max_retries, 3);
        assert_eq!(settings.write_retry.backoff_ms, 100);
        assert!(!settings.allow_future_entries);
        assert_eq!(settings.max_transaction_amount.cents(), 100_000_000);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.cache_validity_secs = 60;
        settings.allow_future_entries = true;

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.cache_validity_secs, 60);
        assert!(loaded.allow_future_entries);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();
        std::fs::write(paths.settings_file(), r#"{"summary_debounce_ms": 10}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.summary_debounce(), Duration::from_millis(10));
        assert_eq!(loaded.cache_validity_secs, 300);
        assert_eq!(loaded.currency_symbol, "$");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();
        std::fs::write(paths.settings_file(), "not json").unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }
}
