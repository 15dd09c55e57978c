//! Store configuration loaded from environment variables.
//!
//! Every setting has a default so a store can be opened with zero
//! configuration.

use std::path::PathBuf;

use academy_shared::constants::{DEFAULT_EVENT_CAPACITY, DEFAULT_QUOTA_BYTES};

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database file location.
    /// Env: `ACADEMY_DB_PATH`
    /// Default: `None` (platform data directory, see [`crate::Database::default_path`]).
    pub db_path: Option<PathBuf>,

    /// Total bytes of stored values allowed for the origin.
    /// Env: `ACADEMY_QUOTA_BYTES`
    /// Default: 5 MiB.
    pub quota_bytes: usize,

    /// Capacity of the change notification channel. Subscribers that fall
    /// further behind than this observe a lag.
    /// Env: `ACADEMY_EVENT_CAPACITY`
    /// Default: `256`
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            quota_bytes: DEFAULT_QUOTA_BYTES,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("ACADEMY_DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        if let Ok(val) = std::env::var("ACADEMY_QUOTA_BYTES") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.quota_bytes = n,
                _ => tracing::warn!(value = %val, "Invalid ACADEMY_QUOTA_BYTES, using default"),
            }
        }

        if let Ok(val) = std::env::var("ACADEMY_EVENT_CAPACITY") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.event_capacity = n,
                _ => tracing::warn!(value = %val, "Invalid ACADEMY_EVENT_CAPACITY, using default"),
            }
        }

        config
    }
}
