//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::integrity::{ensure_found, ensure_unique, not_found};
use super::{CascadeReport, Database, DbResult, EntityKind};
use crate::models::{Patient, PatientFields, PatientId};

const COLUMNS: &str = "id, first_name, last_name, birth_date, gender, address, city, state, \
                       zip_code, phone, email, insurance_provider, insurance_number, \
                       created_at, updated_at";

impl Database {
    /// Register a new patient.
    pub fn create_patient(&mut self, fields: &PatientFields) -> DbResult<Patient> {
        fields.validate()?;

        let tx = self.transaction()?;
        if let Some(email) = fields.stored_email() {
            ensure_unique(&tx, EntityKind::Patient, "email", email, None)?;
        }
        tx.execute(
            r#"
            INSERT INTO patients (
                first_name, last_name, birth_date, gender, address, city, state,
                zip_code, phone, email, insurance_provider, insurance_number
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                fields.first_name,
                fields.last_name,
                fields.birth_date,
                fields.gender,
                fields.address,
                fields.city,
                fields.state,
                fields.zip_code,
                fields.phone,
                fields.stored_email(),
                fields.insurance_provider,
                fields.insurance_number,
            ],
        )?;
        let id = PatientId(tx.last_insert_rowid());
        tx.commit()?;

        self.require_patient(id)
    }

    /// Replace a patient's fields.
    pub fn update_patient(&mut self, id: PatientId, fields: &PatientFields) -> DbResult<Patient> {
        fields.validate()?;

        let tx = self.transaction()?;
        ensure_found(&tx, EntityKind::Patient, id.get())?;
        if let Some(email) = fields.stored_email() {
            ensure_unique(&tx, EntityKind::Patient, "email", email, Some(id.get()))?;
        }
        tx.execute(
            r#"
            UPDATE patients SET
                first_name = ?2,
                last_name = ?3,
                birth_date = ?4,
                gender = ?5,
                address = ?6,
                city = ?7,
                state = ?8,
                zip_code = ?9,
                phone = ?10,
                email = ?11,
                insurance_provider = ?12,
                insurance_number = ?13,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                id,
                fields.first_name,
                fields.last_name,
                fields.birth_date,
                fields.gender,
                fields.address,
                fields.city,
                fields.state,
                fields.zip_code,
                fields.phone,
                fields.stored_email(),
                fields.insurance_provider,
                fields.insurance_number,
            ],
        )?;
        tx.commit()?;

        self.require_patient(id)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: PatientId) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM patients WHERE id = ?"),
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all patients.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM patients ORDER BY last_name, first_name, id"
        ))?;
        let rows = stmt.query_map([], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a patient together with their visits and everything under them.
    pub fn delete_patient(&mut self, id: PatientId) -> DbResult<CascadeReport> {
        self.delete_cascade(EntityKind::Patient, id.get())
    }

    fn require_patient(&self, id: PatientId) -> DbResult<Patient> {
        self.get_patient(id)?
            .ok_or_else(|| not_found(EntityKind::Patient, id.get()))
    }
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        fields: PatientFields {
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            birth_date: row.get(3)?,
            gender: row.get(4)?,
            address: row.get(5)?,
            city: row.get(6)?,
            state: row.get(7)?,
            zip_code: row.get(8)?,
            phone: row.get(9)?,
            email: row.get(10)?,
            insurance_provider: row.get(11)?,
            insurance_number: row.get(12)?,
        },
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use crate::db::DbError;
    use crate::models::Gender;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let mut db = setup_db();

        let mut fields = patient_fields(Some("ada@example.com"));
        fields.city = Some("London".into());
        let patient = db.create_patient(&fields).unwrap();

        let retrieved = db.get_patient(patient.id).unwrap().unwrap();
        assert_eq!(retrieved.fields.first_name, "Ada");
        assert_eq!(retrieved.fields.gender, Gender::Female);
        assert_eq!(retrieved.fields.city, Some("London".into()));
        assert_eq!(retrieved.fields.birth_date, date(1985, 12, 10));
        assert_eq!(retrieved.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let mut db = setup_db();
        let first = db.create_patient(&patient_fields(Some("ada@example.com"))).unwrap();

        let err = db
            .create_patient(&patient_fields(Some("ada@example.com")))
            .unwrap_err();
        assert!(matches!(err, DbError::UniquenessViolation { .. }));

        // First record untouched, second never written
        assert_eq!(db.list_patients().unwrap().len(), 1);
        assert_eq!(db.get_patient(first.id).unwrap().unwrap(), first);
    }

    #[test]
    fn test_patients_without_email_do_not_collide() {
        let mut db = setup_db();
        db.create_patient(&patient_fields(None)).unwrap();
        db.create_patient(&patient_fields(Some(""))).unwrap();
        assert_eq!(db.list_patients().unwrap().len(), 2);
    }

    #[test]
    fn test_update_keeps_own_email() {
        let mut db = setup_db();
        let patient = db.create_patient(&patient_fields(Some("ada@example.com"))).unwrap();

        let mut fields = patient.fields.clone();
        fields.phone = "555-0111".into();
        let updated = db.update_patient(patient.id, &fields).unwrap();
        assert_eq!(updated.fields.phone, "555-0111");
        assert_eq!(updated.created_at, patient.created_at);
    }

    #[test]
    fn test_update_to_taken_email_rejected() {
        let mut db = setup_db();
        db.create_patient(&patient_fields(Some("ada@example.com"))).unwrap();
        let other = db.create_patient(&patient_fields(Some("bob@example.com"))).unwrap();

        let fields = other.fields.clone().with_email("ada@example.com");
        let err = db.update_patient(other.id, &fields).unwrap_err();
        assert!(matches!(err, DbError::UniquenessViolation { .. }));
        assert_eq!(
            db.get_patient(other.id).unwrap().unwrap().fields.email,
            Some("bob@example.com".into())
        );
    }

    #[test]
    fn test_update_missing_patient() {
        let mut db = setup_db();
        let err = db.update_patient(PatientId(99), &patient_fields(None)).unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_invalid_fields_write_nothing() {
        let mut db = setup_db();
        let mut fields = patient_fields(None);
        fields.first_name = "".into();
        assert!(matches!(db.create_patient(&fields), Err(DbError::Validation { .. })));
        assert!(db.list_patients().unwrap().is_empty());
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut db = setup_db();
        let first = db.create_patient(&patient_fields(None)).unwrap();
        db.delete_patient(first.id).unwrap();
        let second = db.create_patient(&patient_fields(None)).unwrap();
        assert!(second.id > first.id);
    }
}
