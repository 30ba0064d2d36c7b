//! Practitioner database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::integrity::{ensure_found, ensure_unique, not_found};
use super::{CascadeReport, Database, DbResult, EntityKind};
use crate::models::{Practitioner, PractitionerFields, PractitionerId};

const COLUMNS: &str = "id, first_name, last_name, specialization, phone, email, license_number, \
                       hire_date, department, created_at, updated_at";

/// Email and license number are each unique across practitioners.
fn ensure_identity_free(
    conn: &Connection,
    fields: &PractitionerFields,
    exclude: Option<PractitionerId>,
) -> DbResult<()> {
    let exclude = exclude.map(PractitionerId::get);
    ensure_unique(conn, EntityKind::Practitioner, "email", &fields.email, exclude)?;
    ensure_unique(
        conn,
        EntityKind::Practitioner,
        "license_number",
        &fields.license_number,
        exclude,
    )
}

impl Database {
    /// Onboard a new practitioner.
    pub fn create_practitioner(&mut self, fields: &PractitionerFields) -> DbResult<Practitioner> {
        fields.validate()?;

        let tx = self.transaction()?;
        ensure_identity_free(&tx, fields, None)?;
        tx.execute(
            r#"
            INSERT INTO practitioners (
                first_name, last_name, specialization, phone, email,
                license_number, hire_date, department
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                fields.first_name,
                fields.last_name,
                fields.specialization,
                fields.phone,
                fields.email,
                fields.license_number,
                fields.hire_date,
                fields.department,
            ],
        )?;
        let id = PractitionerId(tx.last_insert_rowid());
        tx.commit()?;

        self.require_practitioner(id)
    }

    /// Replace a practitioner's fields.
    pub fn update_practitioner(
        &mut self,
        id: PractitionerId,
        fields: &PractitionerFields,
    ) -> DbResult<Practitioner> {
        fields.validate()?;

        let tx = self.transaction()?;
        ensure_found(&tx, EntityKind::Practitioner, id.get())?;
        ensure_identity_free(&tx, fields, Some(id))?;
        tx.execute(
            r#"
            UPDATE practitioners SET
                first_name = ?2,
                last_name = ?3,
                specialization = ?4,
                phone = ?5,
                email = ?6,
                license_number = ?7,
                hire_date = ?8,
                department = ?9,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                id,
                fields.first_name,
                fields.last_name,
                fields.specialization,
                fields.phone,
                fields.email,
                fields.license_number,
                fields.hire_date,
                fields.department,
            ],
        )?;
        tx.commit()?;

        self.require_practitioner(id)
    }

    /// Get a practitioner by ID.
    pub fn get_practitioner(&self, id: PractitionerId) -> DbResult<Option<Practitioner>> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM practitioners WHERE id = ?"),
                [id],
                practitioner_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all practitioners.
    pub fn list_practitioners(&self) -> DbResult<Vec<Practitioner>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM practitioners ORDER BY last_name, first_name, id"
        ))?;
        let rows = stmt.query_map([], practitioner_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a practitioner together with their visits and everything under them.
    pub fn delete_practitioner(&mut self, id: PractitionerId) -> DbResult<CascadeReport> {
        self.delete_cascade(EntityKind::Practitioner, id.get())
    }

    fn require_practitioner(&self, id: PractitionerId) -> DbResult<Practitioner> {
        self.get_practitioner(id)?
            .ok_or_else(|| not_found(EntityKind::Practitioner, id.get()))
    }
}

fn practitioner_from_row(row: &Row<'_>) -> rusqlite::Result<Practitioner> {
    Ok(Practitioner {
        id: row.get(0)?,
        fields: PractitionerFields {
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            specialization: row.get(3)?,
            phone: row.get(4)?,
            email: row.get(5)?,
            license_number: row.get(6)?,
            hire_date: row.get(7)?,
            department: row.get(8)?,
        },
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use crate::db::DbError;

    #[test]
    fn test_create_and_list() {
        let mut db = Database::open_in_memory().unwrap();
        let created = db
            .create_practitioner(&practitioner_fields("house@example.org", "LIC-1"))
            .unwrap();

        let all = db.list_practitioners().unwrap();
        assert_eq!(all, vec![created.clone()]);
        assert_eq!(created.display_name(), "Dr. Gregory House");
        assert_eq!(created.fields.hire_date, Some(date(2004, 11, 16)));
    }

    #[test]
    fn test_duplicate_license_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        db.create_practitioner(&practitioner_fields("a@example.org", "LIC-1"))
            .unwrap();

        let err = db
            .create_practitioner(&practitioner_fields("b@example.org", "LIC-1"))
            .unwrap_err();
        match err {
            DbError::UniquenessViolation { field, value } => {
                assert_eq!(field, "practitioners.license_number");
                assert_eq!(value, "LIC-1");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        db.create_practitioner(&practitioner_fields("a@example.org", "LIC-1"))
            .unwrap();
        let err = db
            .create_practitioner(&practitioner_fields("a@example.org", "LIC-2"))
            .unwrap_err();
        assert!(matches!(err, DbError::UniquenessViolation { .. }));
    }

    #[test]
    fn test_update_rechecks_excluding_self() {
        let mut db = Database::open_in_memory().unwrap();
        let a = db
            .create_practitioner(&practitioner_fields("a@example.org", "LIC-1"))
            .unwrap();
        let b = db
            .create_practitioner(&practitioner_fields("b@example.org", "LIC-2"))
            .unwrap();

        let mut fields = a.fields.clone();
        fields.department = "Oncology".into();
        assert_eq!(
            db.update_practitioner(a.id, &fields).unwrap().fields.department,
            "Oncology"
        );

        let mut stolen = b.fields.clone();
        stolen.license_number = "LIC-1".into();
        assert!(matches!(
            db.update_practitioner(b.id, &stolen),
            Err(DbError::UniquenessViolation { .. })
        ));
    }
}
