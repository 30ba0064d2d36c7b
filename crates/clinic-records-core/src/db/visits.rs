//! Visit database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::integrity::{ensure_found, ensure_reference, not_found};
use super::{CascadeReport, Database, DbResult, EntityKind};
use crate::models::{PatientId, PractitionerId, Visit, VisitFields, VisitId, VisitStatus};

const COLUMNS: &str = "id, patient_id, practitioner_id, visit_date, purpose, diagnosis, status, \
                       created_at, updated_at";

fn ensure_participants(conn: &Connection, fields: &VisitFields) -> DbResult<()> {
    ensure_reference(conn, EntityKind::Patient, fields.patient_id.get())?;
    ensure_reference(conn, EntityKind::Practitioner, fields.practitioner_id.get())
}

impl Database {
    /// Schedule a visit between an existing patient and practitioner.
    pub fn create_visit(&mut self, fields: &VisitFields) -> DbResult<Visit> {
        fields.validate()?;

        let tx = self.transaction()?;
        ensure_participants(&tx, fields)?;
        tx.execute(
            r#"
            INSERT INTO visits (
                patient_id, practitioner_id, visit_date, purpose, diagnosis, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                fields.patient_id,
                fields.practitioner_id,
                fields.visit_date,
                fields.purpose,
                fields.diagnosis,
                fields.status,
            ],
        )?;
        let id = VisitId(tx.last_insert_rowid());
        tx.commit()?;

        tracing::debug!(
            visit_id = %id,
            patient_id = %fields.patient_id,
            practitioner_id = %fields.practitioner_id,
            "Visit scheduled"
        );
        self.require_visit(id)
    }

    /// Replace a visit's fields. Any status may follow any other.
    pub fn update_visit(&mut self, id: VisitId, fields: &VisitFields) -> DbResult<Visit> {
        fields.validate()?;

        let tx = self.transaction()?;
        ensure_found(&tx, EntityKind::Visit, id.get())?;
        ensure_participants(&tx, fields)?;
        tx.execute(
            r#"
            UPDATE visits SET
                patient_id = ?2,
                practitioner_id = ?3,
                visit_date = ?4,
                purpose = ?5,
                diagnosis = ?6,
                status = ?7,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                id,
                fields.patient_id,
                fields.practitioner_id,
                fields.visit_date,
                fields.purpose,
                fields.diagnosis,
                fields.status,
            ],
        )?;
        tx.commit()?;

        self.require_visit(id)
    }

    /// Change only the status of a visit.
    pub fn set_visit_status(&mut self, id: VisitId, status: VisitStatus) -> DbResult<Visit> {
        let rows_affected = self.conn.execute(
            "UPDATE visits SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![id, status],
        )?;
        if rows_affected == 0 {
            return Err(not_found(EntityKind::Visit, id.get()));
        }
        self.require_visit(id)
    }

    /// Get a visit by ID.
    pub fn get_visit(&self, id: VisitId) -> DbResult<Option<Visit>> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM visits WHERE id = ?"),
                [id],
                visit_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all visits, most recent first.
    pub fn list_visits(&self) -> DbResult<Vec<Visit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM visits ORDER BY visit_date DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], visit_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List a patient's visits, most recent first.
    pub fn list_visits_for_patient(&self, patient_id: PatientId) -> DbResult<Vec<Visit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM visits WHERE patient_id = ? ORDER BY visit_date DESC, id DESC"
        ))?;
        let rows = stmt.query_map([patient_id], visit_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List a practitioner's visits, most recent first.
    pub fn list_visits_for_practitioner(
        &self,
        practitioner_id: PractitionerId,
    ) -> DbResult<Vec<Visit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM visits WHERE practitioner_id = ? ORDER BY visit_date DESC, id DESC"
        ))?;
        let rows = stmt.query_map([practitioner_id], visit_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a visit with its prescriptions, lab tests and billing record.
    pub fn delete_visit(&mut self, id: VisitId) -> DbResult<CascadeReport> {
        self.delete_cascade(EntityKind::Visit, id.get())
    }

    fn require_visit(&self, id: VisitId) -> DbResult<Visit> {
        self.get_visit(id)?
            .ok_or_else(|| not_found(EntityKind::Visit, id.get()))
    }
}

fn visit_from_row(row: &Row<'_>) -> rusqlite::Result<Visit> {
    Ok(Visit {
        id: row.get(0)?,
        fields: VisitFields {
            patient_id: row.get(1)?,
            practitioner_id: row.get(2)?,
            visit_date: row.get(3)?,
            purpose: row.get(4)?,
            diagnosis: row.get(5)?,
            status: row.get(6)?,
        },
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
