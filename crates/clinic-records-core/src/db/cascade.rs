//! Cascading deletion over an explicit ownership graph.
//!
//! ```text
//! Patient ──┐
//!           ├──► Visit ──┬──► Prescription ◄── Medication
//! Practitioner ┘         ├──► LabTest
//!                        └──► BillingRecord
//! ```
//!
//! Deleting a record first deletes everything it owns, depth first, then the
//! record itself. The whole walk runs in one IMMEDIATE transaction: either the
//! full closure is removed or nothing is.

use std::collections::BTreeMap;
use std::fmt;

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::integrity::ensure_found;
use super::{Database, DbError, DbResult};

/// Every persisted entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Patient,
    Practitioner,
    Medication,
    Visit,
    Prescription,
    LabTest,
    BillingRecord,
}

impl EntityKind {
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Patient => "patients",
            EntityKind::Practitioner => "practitioners",
            EntityKind::Medication => "medications",
            EntityKind::Visit => "visits",
            EntityKind::Prescription => "prescriptions",
            EntityKind::LabTest => "lab_tests",
            EntityKind::BillingRecord => "billing_records",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Patient => "patient",
            EntityKind::Practitioner => "practitioner",
            EntityKind::Medication => "medication",
            EntityKind::Visit => "visit",
            EntityKind::Prescription => "prescription",
            EntityKind::LabTest => "lab test",
            EntityKind::BillingRecord => "billing record",
        }
    }

    /// Kinds this kind directly owns.
    pub fn owned(self) -> impl Iterator<Item = &'static OwnershipEdge> {
        OWNERSHIP.iter().filter(move |edge| edge.parent == self)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `child.column` references `parent.id`, and the child cannot outlive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipEdge {
    pub parent: EntityKind,
    pub child: EntityKind,
    pub column: &'static str,
}

/// The owning edges of the record graph.
pub const OWNERSHIP: &[OwnershipEdge] = &[
    OwnershipEdge {
        parent: EntityKind::Patient,
        child: EntityKind::Visit,
        column: "patient_id",
    },
    OwnershipEdge {
        parent: EntityKind::Practitioner,
        child: EntityKind::Visit,
        column: "practitioner_id",
    },
    OwnershipEdge {
        parent: EntityKind::Visit,
        child: EntityKind::Prescription,
        column: "visit_id",
    },
    OwnershipEdge {
        parent: EntityKind::Visit,
        child: EntityKind::LabTest,
        column: "visit_id",
    },
    OwnershipEdge {
        parent: EntityKind::Visit,
        child: EntityKind::BillingRecord,
        column: "visit_id",
    },
    OwnershipEdge {
        parent: EntityKind::Medication,
        child: EntityKind::Prescription,
        column: "medication_id",
    },
];

/// What a cascading delete removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    pub root: EntityKind,
    pub root_id: i64,
    /// Rows removed per kind, root included
    pub removed: BTreeMap<EntityKind, usize>,
}

impl CascadeReport {
    fn new(root: EntityKind, root_id: i64) -> Self {
        Self {
            root,
            root_id,
            removed: BTreeMap::new(),
        }
    }

    /// Number of rows of `kind` removed.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.removed.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.removed.values().sum()
    }
}

impl Database {
    /// Delete a record and everything it transitively owns, atomically.
    ///
    /// Returns `NotFound` if the root does not exist and `CascadeFailure` if
    /// any step fails; in both cases the store is unchanged.
    pub fn delete_cascade(&mut self, kind: EntityKind, id: i64) -> DbResult<CascadeReport> {
        let tx = self.transaction()?;

        ensure_found(&tx, kind, id)?;

        let mut report = CascadeReport::new(kind, id);
        let outcome = match delete_closure(&tx, kind, id, &mut report) {
            Ok(()) => tx.commit().map_err(DbError::from),
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            tracing::warn!(entity = %kind, id, error = %e, "Cascading delete rolled back");
            return Err(DbError::CascadeFailure {
                entity: kind.label().into(),
                id,
                reason: e.to_string(),
            });
        }

        tracing::info!(
            entity = %kind,
            id,
            visits = report.count(EntityKind::Visit),
            prescriptions = report.count(EntityKind::Prescription),
            lab_tests = report.count(EntityKind::LabTest),
            billing_records = report.count(EntityKind::BillingRecord),
            "Cascade-deleted record with all owned records"
        );

        Ok(report)
    }
}

fn delete_closure(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
    report: &mut CascadeReport,
) -> DbResult<()> {
    for edge in kind.owned() {
        for child_id in owned_ids(conn, edge, id)? {
            delete_closure(conn, edge.child, child_id, report)?;
        }
    }

    let deleted = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", kind.table()),
        params![id],
    )?;
    if deleted > 0 {
        *report.removed.entry(kind).or_insert(0) += deleted;
    }
    Ok(())
}

fn owned_ids(conn: &Connection, edge: &OwnershipEdge, parent_id: i64) -> DbResult<Vec<i64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id FROM {} WHERE {} = ?1 ORDER BY id",
        edge.child.table(),
        edge.column
    ))?;
    let ids = stmt
        .query_map(params![parent_id], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}
