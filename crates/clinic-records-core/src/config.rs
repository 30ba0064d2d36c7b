//! Connection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-connection settings applied when a store is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// How long a writer waits for the SQLite write lock before failing
    pub busy_timeout_ms: u64,
    /// Use write-ahead logging for file-backed stores
    pub wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            wal: true,
        }
    }
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
