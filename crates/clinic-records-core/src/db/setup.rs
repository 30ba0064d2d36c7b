//! Store reset and schema introspection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{Database, DbResult, SCHEMA, TABLES};

/// The schema fingerprint and row count of every table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSummary {
    pub fingerprint: String,
    pub row_counts: BTreeMap<String, i64>,
}

impl StoreSummary {
    pub fn to_json(&self) -> DbResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.row_counts.values().all(|&count| count == 0)
    }
}

impl Database {
    /// Drop every table and recreate the schema empty.
    ///
    /// Idempotent: two resets in a row leave the same store behind.
    pub fn reset(&mut self) -> DbResult<()> {
        let tx = self.transaction()?;
        // Children before parents, so foreign keys never dangle mid-drop
        for table in TABLES {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
        }
        // AUTOINCREMENT counters start over with the tables
        let has_sequence: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE name = 'sqlite_sequence')",
            [],
            |row| row.get(0),
        )?;
        if has_sequence {
            tx.execute("DELETE FROM sqlite_sequence", [])?;
        }
        tx.execute_batch(SCHEMA)?;
        tx.commit()?;

        tracing::info!(tables = TABLES.len(), "Record store reset");
        Ok(())
    }

    /// SHA-256 over the stored schema DDL, hex encoded.
    pub fn schema_fingerprint(&self) -> DbResult<String> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT type, name, sql FROM sqlite_master
            WHERE sql IS NOT NULL AND name NOT LIKE 'sqlite_%'
            ORDER BY type, name
            "#,
        )?;
        let mut rows = stmt.query([])?;

        let mut hasher = Sha256::new();
        while let Some(row) = rows.next()? {
            let kind: String = row.get(0)?;
            let name: String = row.get(1)?;
            let sql: String = row.get(2)?;
            hasher.update(kind.as_bytes());
            hasher.update([0]);
            hasher.update(name.as_bytes());
            hasher.update([0]);
            hasher.update(sql.as_bytes());
            hasher.update([0]);
        }
        Ok(hex::encode(hasher.finalize()))
    }

    /// Fingerprint plus per-table row counts.
    pub fn store_summary(&self) -> DbResult<StoreSummary> {
        let mut row_counts = BTreeMap::new();
        for table in TABLES {
            let count: i64 =
                self.conn
                    .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            row_counts.insert(table.to_string(), count);
        }
        Ok(StoreSummary {
            fingerprint: self.schema_fingerprint()?,
            row_counts,
        })
    }
}
