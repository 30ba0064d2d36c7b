//! Lab test database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::integrity::{ensure_found, ensure_reference, not_found};
use super::{CascadeReport, Database, DbResult, EntityKind};
use crate::models::{LabTest, LabTestFields, LabTestId, LabTestStatus, VisitId};

const COLUMNS: &str =
    "id, visit_id, test_name, test_date, results, status, cost, notes, created_at, updated_at";

impl Database {
    /// Order a lab test for a visit.
    pub fn create_lab_test(&mut self, fields: &LabTestFields) -> DbResult<LabTest> {
        fields.validate()?;

        let tx = self.transaction()?;
        ensure_reference(&tx, EntityKind::Visit, fields.visit_id.get())?;
        tx.execute(
            r#"
            INSERT INTO lab_tests (
                visit_id, test_name, test_date, results, status, cost, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                fields.visit_id,
                fields.test_name,
                fields.test_date,
                fields.results,
                fields.status,
                fields.cost,
                fields.notes,
            ],
        )?;
        let id = LabTestId(tx.last_insert_rowid());
        tx.commit()?;

        self.require_lab_test(id)
    }

    /// Replace a lab test's fields, e.g. to record results.
    pub fn update_lab_test(&mut self, id: LabTestId, fields: &LabTestFields) -> DbResult<LabTest> {
        fields.validate()?;

        let tx = self.transaction()?;
        ensure_found(&tx, EntityKind::LabTest, id.get())?;
        ensure_reference(&tx, EntityKind::Visit, fields.visit_id.get())?;
        tx.execute(
            r#"
            UPDATE lab_tests SET
                visit_id = ?2,
                test_name = ?3,
                test_date = ?4,
                results = ?5,
                status = ?6,
                cost = ?7,
                notes = ?8,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                id,
                fields.visit_id,
                fields.test_name,
                fields.test_date,
                fields.results,
                fields.status,
                fields.cost,
                fields.notes,
            ],
        )?;
        tx.commit()?;

        self.require_lab_test(id)
    }

    /// Change only the status of a lab test.
    pub fn set_lab_test_status(&mut self, id: LabTestId, status: LabTestStatus) -> DbResult<LabTest> {
        let rows_affected = self.conn.execute(
            "UPDATE lab_tests SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![id, status],
        )?;
        if rows_affected == 0 {
            return Err(not_found(EntityKind::LabTest, id.get()));
        }
        self.require_lab_test(id)
    }

    /// Get a lab test by ID.
    pub fn get_lab_test(&self, id: LabTestId) -> DbResult<Option<LabTest>> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM lab_tests WHERE id = ?"),
                [id],
                lab_test_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_lab_tests(&self) -> DbResult<Vec<LabTest>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM lab_tests ORDER BY id"))?;
        let rows = stmt.query_map([], lab_test_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List the lab tests ordered during a visit.
    pub fn list_lab_tests_for_visit(&self, visit_id: VisitId) -> DbResult<Vec<LabTest>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM lab_tests WHERE visit_id = ? ORDER BY test_date, id"
        ))?;
        let rows = stmt.query_map([visit_id], lab_test_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn delete_lab_test(&mut self, id: LabTestId) -> DbResult<CascadeReport> {
        self.delete_cascade(EntityKind::LabTest, id.get())
    }

    fn require_lab_test(&self, id: LabTestId) -> DbResult<LabTest> {
        self.get_lab_test(id)?
            .ok_or_else(|| not_found(EntityKind::LabTest, id.get()))
    }
}

fn lab_test_from_row(row: &Row<'_>) -> rusqlite::Result<LabTest> {
    Ok(LabTest {
        id: row.get(0)?,
        fields: LabTestFields {
            visit_id: row.get(1)?,
            test_name: row.get(2)?,
            test_date: row.get(3)?,
            results: row.get(4)?,
            status: row.get(5)?,
            cost: row.get(6)?,
            notes: row.get(7)?,
        },
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use crate::db::DbError;
    use crate::models::Money;

    #[test]
    fn test_order_then_record_results() {
        let mut db = Database::open_in_memory().unwrap();
        let (_, _, visit) = seed_visit(&mut db);

        let mut fields = LabTestFields::ordered(visit.id, "Complete Blood Count", date(2024, 3, 1));
        fields.cost = Some(Money::new(45, 0));
        let ordered = db.create_lab_test(&fields).unwrap();
        assert_eq!(ordered.fields.status, LabTestStatus::Pending);

        let mut fields = ordered.fields.clone();
        fields.results = Some("Within normal range".into());
        fields.status = LabTestStatus::Completed;
        let done = db.update_lab_test(ordered.id, &fields).unwrap();
        assert_eq!(done.fields.status, LabTestStatus::Completed);
        assert_eq!(done.fields.cost, Some(Money::from_cents(4500)));
        assert_eq!(done.fields.results.as_deref(), Some("Within normal range"));
    }

    #[test]
    fn test_unknown_visit_is_reference_error() {
        let mut db = Database::open_in_memory().unwrap();
        let fields = LabTestFields::ordered(VisitId(12), "Lipid Panel", date(2024, 3, 1));
        assert!(matches!(
            db.create_lab_test(&fields),
            Err(DbError::Reference { id: 12, .. })
        ));
        assert!(db.list_lab_tests().unwrap().is_empty());
    }

    #[test]
    fn test_cancel_then_reopen() {
        let mut db = Database::open_in_memory().unwrap();
        let (_, _, visit) = seed_visit(&mut db);
        let test = db
            .create_lab_test(&LabTestFields::ordered(visit.id, "Lipid Panel", date(2024, 3, 1)))
            .unwrap();

        let cancelled = db.set_lab_test_status(test.id, LabTestStatus::Cancelled).unwrap();
        assert_eq!(cancelled.fields.status, LabTestStatus::Cancelled);
        let reopened = db.set_lab_test_status(test.id, LabTestStatus::Pending).unwrap();
        assert_eq!(reopened.fields.status, LabTestStatus::Pending);
    }

    #[test]
    fn test_delete_single_test() {
        let mut db = Database::open_in_memory().unwrap();
        let (_, _, visit) = seed_visit(&mut db);
        let a = db
            .create_lab_test(&LabTestFields::ordered(visit.id, "A1C", date(2024, 3, 1)))
            .unwrap();
        let b = db
            .create_lab_test(&LabTestFields::ordered(visit.id, "TSH", date(2024, 3, 2)))
            .unwrap();

        let report = db.delete_lab_test(a.id).unwrap();
        assert_eq!(report.total(), 1);
        assert_eq!(db.list_lab_tests_for_visit(visit.id).unwrap(), vec![b]);
        assert!(db.get_visit(visit.id).unwrap().is_some());
    }
}
