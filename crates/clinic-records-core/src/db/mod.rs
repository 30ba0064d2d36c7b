//! Database layer for the clinic record store.

mod billing;
mod cascade;
mod integrity;
mod lab_tests;
mod medications;
mod patients;
mod practitioners;
mod prescriptions;
mod schema;
mod setup;
mod visits;

pub use cascade::*;
pub use schema::*;
pub use setup::*;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use thiserror::Error;

use crate::config::DatabaseConfig;

/// Database errors.
///
/// `Validation`, `UniquenessViolation`, `Reference` and `CascadeFailure` are
/// raised before anything is persisted; the others come from the engine.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Duplicate {field}: '{value}' is already in use")]
    UniquenessViolation { field: String, value: String },

    #[error("Referenced {entity} {id} does not exist")]
    Reference { entity: String, id: i64 },

    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: i64 },

    #[error("Cascading delete of {entity} {id} failed: {reason}")]
    CascadeFailure {
        entity: String,
        id: i64,
        reason: String,
    },
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
///
/// Reads take `&self`; anything that writes takes `&mut self` and runs in its
/// own `BEGIN IMMEDIATE` transaction.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::open_with_config(path, &DatabaseConfig::default())
    }

    /// Open database at path with explicit connection settings.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: &DatabaseConfig) -> DbResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(config.busy_timeout())?;
        if config.wal {
            let _mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        }
        let db = Self { conn };
        db.initialize()?;
        tracing::debug!(path = %path.as_ref().display(), wal = config.wal, "Opened record store");
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a write transaction holding the database write lock.
    pub fn transaction(&mut self) -> DbResult<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}
