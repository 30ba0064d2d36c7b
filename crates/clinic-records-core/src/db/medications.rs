//! Medication catalog database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::integrity::{ensure_found, ensure_unique, not_found};
use super::{CascadeReport, Database, DbResult, EntityKind};
use crate::models::{Medication, MedicationFields, MedicationId};

const COLUMNS: &str = "id, name, description, category, unit_price, created_at, updated_at";

impl Database {
    /// Add a medication to the catalog.
    pub fn create_medication(&mut self, fields: &MedicationFields) -> DbResult<Medication> {
        fields.validate()?;

        let tx = self.transaction()?;
        ensure_unique(&tx, EntityKind::Medication, "name", &fields.name, None)?;
        tx.execute(
            r#"
            INSERT INTO medications (name, description, category, unit_price)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                fields.name,
                fields.description,
                fields.category,
                fields.unit_price,
            ],
        )?;
        let id = MedicationId(tx.last_insert_rowid());
        tx.commit()?;

        self.require_medication(id)
    }

    /// Replace a medication's fields.
    pub fn update_medication(
        &mut self,
        id: MedicationId,
        fields: &MedicationFields,
    ) -> DbResult<Medication> {
        fields.validate()?;

        let tx = self.transaction()?;
        ensure_found(&tx, EntityKind::Medication, id.get())?;
        ensure_unique(&tx, EntityKind::Medication, "name", &fields.name, Some(id.get()))?;
        tx.execute(
            r#"
            UPDATE medications SET
                name = ?2,
                description = ?3,
                category = ?4,
                unit_price = ?5,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                id,
                fields.name,
                fields.description,
                fields.category,
                fields.unit_price,
            ],
        )?;
        tx.commit()?;

        self.require_medication(id)
    }

    /// Get a medication by ID.
    pub fn get_medication(&self, id: MedicationId) -> DbResult<Option<Medication>> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM medications WHERE id = ?"),
                [id],
                medication_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List the catalog by name.
    pub fn list_medications(&self) -> DbResult<Vec<Medication>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM medications ORDER BY name"))?;
        let rows = stmt.query_map([], medication_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Remove a medication and every prescription that references it.
    pub fn delete_medication(&mut self, id: MedicationId) -> DbResult<CascadeReport> {
        self.delete_cascade(EntityKind::Medication, id.get())
    }

    fn require_medication(&self, id: MedicationId) -> DbResult<Medication> {
        self.get_medication(id)?
            .ok_or_else(|| not_found(EntityKind::Medication, id.get()))
    }
}

fn medication_from_row(row: &Row<'_>) -> rusqlite::Result<Medication> {
    Ok(Medication {
        id: row.get(0)?,
        fields: MedicationFields {
            name: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            unit_price: row.get(4)?,
        },
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;
    use crate::models::Money;

    #[test]
    fn test_create_and_get() {
        let mut db = Database::open_in_memory().unwrap();
        let mut fields = MedicationFields::new("Amoxicillin 500mg", Money::new(12, 50));
        fields.category = Some("Antibiotic".into());
        let med = db.create_medication(&fields).unwrap();

        let retrieved = db.get_medication(med.id).unwrap().unwrap();
        assert_eq!(retrieved.fields.unit_price.to_string(), "12.50");
        assert_eq!(retrieved.fields.category, Some("Antibiotic".into()));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        db.create_medication(&MedicationFields::new("Ibuprofen", Money::new(3, 0)))
            .unwrap();
        let err = db
            .create_medication(&MedicationFields::new("Ibuprofen", Money::new(4, 0)))
            .unwrap_err();
        assert!(matches!(err, DbError::UniquenessViolation { .. }));
    }

    #[test]
    fn test_rename_and_reprice() {
        let mut db = Database::open_in_memory().unwrap();
        let med = db
            .create_medication(&MedicationFields::new("Ibuprofen", Money::new(3, 0)))
            .unwrap();

        let fields = MedicationFields::new("Ibuprofen 200mg", Money::new(3, 25));
        let updated = db.update_medication(med.id, &fields).unwrap();
        assert_eq!(updated.fields.name, "Ibuprofen 200mg");
        assert_eq!(updated.fields.unit_price, Money::from_cents(325));
    }

    #[test]
    fn test_negative_price_rejected_before_write() {
        let mut db = Database::open_in_memory().unwrap();
        let fields = MedicationFields::new("Ibuprofen", Money::from_cents(-100));
        assert!(matches!(db.create_medication(&fields), Err(DbError::Validation { .. })));
        assert!(db.list_medications().unwrap().is_empty());
    }
}
