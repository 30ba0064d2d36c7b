//! Prescription database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::integrity::{ensure_found, ensure_reference, not_found};
use super::{CascadeReport, Database, DbResult, EntityKind};
use crate::models::{MedicationId, Prescription, PrescriptionFields, PrescriptionId, VisitId};

const COLUMNS: &str = "id, visit_id, medication_id, dosage, frequency, duration, instructions, \
                       prescribed_date, created_at, updated_at";

fn ensure_parents(conn: &Connection, fields: &PrescriptionFields) -> DbResult<()> {
    ensure_reference(conn, EntityKind::Visit, fields.visit_id.get())?;
    ensure_reference(conn, EntityKind::Medication, fields.medication_id.get())
}

impl Database {
    /// Prescribe a catalog medication during a visit.
    pub fn create_prescription(&mut self, fields: &PrescriptionFields) -> DbResult<Prescription> {
        fields.validate()?;

        let tx = self.transaction()?;
        ensure_parents(&tx, fields)?;
        tx.execute(
            r#"
            INSERT INTO prescriptions (
                visit_id, medication_id, dosage, frequency, duration,
                instructions, prescribed_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                fields.visit_id,
                fields.medication_id,
                fields.dosage,
                fields.frequency,
                fields.duration,
                fields.instructions,
                fields.prescribed_date,
            ],
        )?;
        let id = PrescriptionId(tx.last_insert_rowid());
        tx.commit()?;

        self.require_prescription(id)
    }

    /// Replace a prescription's fields.
    pub fn update_prescription(
        &mut self,
        id: PrescriptionId,
        fields: &PrescriptionFields,
    ) -> DbResult<Prescription> {
        fields.validate()?;

        let tx = self.transaction()?;
        ensure_found(&tx, EntityKind::Prescription, id.get())?;
        ensure_parents(&tx, fields)?;
        tx.execute(
            r#"
            UPDATE prescriptions SET
                visit_id = ?2,
                medication_id = ?3,
                dosage = ?4,
                frequency = ?5,
                duration = ?6,
                instructions = ?7,
                prescribed_date = ?8,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                id,
                fields.visit_id,
                fields.medication_id,
                fields.dosage,
                fields.frequency,
                fields.duration,
                fields.instructions,
                fields.prescribed_date,
            ],
        )?;
        tx.commit()?;

        self.require_prescription(id)
    }

    /// Get a prescription by ID.
    pub fn get_prescription(&self, id: PrescriptionId) -> DbResult<Option<Prescription>> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM prescriptions WHERE id = ?"),
                [id],
                prescription_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all prescriptions.
    pub fn list_prescriptions(&self) -> DbResult<Vec<Prescription>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM prescriptions ORDER BY id"))?;
        let rows = stmt.query_map([], prescription_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List the prescriptions written during a visit.
    pub fn list_prescriptions_for_visit(&self, visit_id: VisitId) -> DbResult<Vec<Prescription>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM prescriptions WHERE visit_id = ? ORDER BY id"
        ))?;
        let rows = stmt.query_map([visit_id], prescription_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List every prescription of a medication.
    pub fn list_prescriptions_for_medication(
        &self,
        medication_id: MedicationId,
    ) -> DbResult<Vec<Prescription>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM prescriptions WHERE medication_id = ? ORDER BY id"
        ))?;
        let rows = stmt.query_map([medication_id], prescription_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a single prescription.
    pub fn delete_prescription(&mut self, id: PrescriptionId) -> DbResult<CascadeReport> {
        self.delete_cascade(EntityKind::Prescription, id.get())
    }

    fn require_prescription(&self, id: PrescriptionId) -> DbResult<Prescription> {
        self.get_prescription(id)?
            .ok_or_else(|| not_found(EntityKind::Prescription, id.get()))
    }
}

fn prescription_from_row(row: &Row<'_>) -> rusqlite::Result<Prescription> {
    Ok(Prescription {
        id: row.get(0)?,
        fields: PrescriptionFields {
            visit_id: row.get(1)?,
            medication_id: row.get(2)?,
            dosage: row.get(3)?,
            frequency: row.get(4)?,
            duration: row.get(5)?,
            instructions: row.get(6)?,
            prescribed_date: row.get(7)?,
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
    use crate::models::{MedicationFields, Money};

    fn prescription(visit_id: VisitId, medication_id: MedicationId) -> PrescriptionFields {
        PrescriptionFields {
            visit_id,
            medication_id,
            dosage: "500mg".into(),
            frequency: "twice daily".into(),
            duration: "10 days".into(),
            instructions: Some("Take with food".into()),
            prescribed_date: date(2024, 3, 1),
        }
    }

    #[test]
    fn test_create_and_list_for_visit() {
        let mut db = Database::open_in_memory().unwrap();
        let (_, _, visit) = seed_visit(&mut db);
        let med = db
            .create_medication(&MedicationFields::new("Amoxicillin", Money::new(12, 0)))
            .unwrap();

        let created = db.create_prescription(&prescription(visit.id, med.id)).unwrap();
        let listed = db.list_prescriptions_for_visit(visit.id).unwrap();
        assert_eq!(listed, vec![created]);
    }

    #[test]
    fn test_unknown_medication_is_reference_error() {
        let mut db = Database::open_in_memory().unwrap();
        let (_, _, visit) = seed_visit(&mut db);

        let err = db
            .create_prescription(&prescription(visit.id, MedicationId(77)))
            .unwrap_err();
        assert!(matches!(err, DbError::Reference { id: 77, .. }));
        assert!(db.list_prescriptions().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_visit_is_reference_error() {
        let mut db = Database::open_in_memory().unwrap();
        let med = db
            .create_medication(&MedicationFields::new("Amoxicillin", Money::new(12, 0)))
            .unwrap();
        let err = db
            .create_prescription(&prescription(VisitId(5), med.id))
            .unwrap_err();
        assert!(matches!(err, DbError::Reference { id: 5, .. }));
    }

    #[test]
    fn test_update_dosage() {
        let mut db = Database::open_in_memory().unwrap();
        let (_, _, visit) = seed_visit(&mut db);
        let med = db
            .create_medication(&MedicationFields::new("Amoxicillin", Money::new(12, 0)))
            .unwrap();
        let created = db.create_prescription(&prescription(visit.id, med.id)).unwrap();

        let mut fields = created.fields.clone();
        fields.dosage = "250mg".into();
        let updated = db.update_prescription(created.id, &fields).unwrap();
        assert_eq!(updated.fields.dosage, "250mg");
    }
}
