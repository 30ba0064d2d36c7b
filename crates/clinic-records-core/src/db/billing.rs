//! Billing record database operations.
//!
//! `balance` is a STORED generated column, so every statement here that
//! touches `total_amount` or `paid_amount` recomputes it in the same write.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::integrity::{ensure_found, ensure_reference, ensure_unique, not_found};
use super::{CascadeReport, Database, DbError, DbResult, EntityKind};
use crate::models::{
    BillingFields, BillingRecord, BillingRecordId, BillingStatus, Money, PatientId, VisitId,
};

const COLUMNS: &str = "id, visit_id, total_amount, paid_amount, billing_date, due_date, status, \
                       payment_method, balance, created_at, updated_at";

/// A visit carries at most one bill.
fn ensure_visit_billable(
    conn: &Connection,
    visit_id: VisitId,
    exclude: Option<BillingRecordId>,
) -> DbResult<()> {
    ensure_reference(conn, EntityKind::Visit, visit_id.get())?;
    ensure_unique(
        conn,
        EntityKind::BillingRecord,
        "visit_id",
        &visit_id.to_string(),
        exclude.map(BillingRecordId::get),
    )
}

impl Database {
    /// Bill a visit.
    pub fn create_billing_record(&mut self, fields: &BillingFields) -> DbResult<BillingRecord> {
        fields.validate()?;

        let tx = self.transaction()?;
        ensure_visit_billable(&tx, fields.visit_id, None)?;
        tx.execute(
            r#"
            INSERT INTO billing_records (
                visit_id, total_amount, paid_amount, billing_date, due_date,
                status, payment_method
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                fields.visit_id,
                fields.total_amount,
                fields.paid_amount,
                fields.billing_date,
                fields.due_date,
                fields.status,
                fields.payment_method,
            ],
        )?;
        let id = BillingRecordId(tx.last_insert_rowid());
        tx.commit()?;

        tracing::debug!(
            billing_id = %id,
            visit_id = %fields.visit_id,
            total = %fields.total_amount,
            "Billing record created"
        );
        self.require_billing_record(id)
    }

    /// Replace a billing record's fields. The balance follows.
    pub fn update_billing_record(
        &mut self,
        id: BillingRecordId,
        fields: &BillingFields,
    ) -> DbResult<BillingRecord> {
        fields.validate()?;

        let tx = self.transaction()?;
        ensure_found(&tx, EntityKind::BillingRecord, id.get())?;
        ensure_visit_billable(&tx, fields.visit_id, Some(id))?;
        tx.execute(
            r#"
            UPDATE billing_records SET
                visit_id = ?2,
                total_amount = ?3,
                paid_amount = ?4,
                billing_date = ?5,
                due_date = ?6,
                status = ?7,
                payment_method = ?8,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                id,
                fields.visit_id,
                fields.total_amount,
                fields.paid_amount,
                fields.billing_date,
                fields.due_date,
                fields.status,
                fields.payment_method,
            ],
        )?;
        tx.commit()?;

        self.require_billing_record(id)
    }

    /// Add a payment to a bill.
    ///
    /// The increment happens inside the UPDATE, so concurrent payments on the
    /// same bill all land. Status is not changed and overpayment is accepted.
    pub fn record_payment(
        &mut self,
        id: BillingRecordId,
        amount: Money,
    ) -> DbResult<BillingRecord> {
        if !amount.is_positive() {
            return Err(DbError::Validation {
                field: "amount".into(),
                reason: format!("payment must be positive, got {}", amount),
            });
        }

        let tx = self.transaction()?;
        let rows_affected = tx.execute(
            r#"
            UPDATE billing_records SET
                paid_amount = paid_amount + ?2,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![id, amount],
        )?;
        if rows_affected == 0 {
            return Err(not_found(EntityKind::BillingRecord, id.get()));
        }
        let record = tx.query_row(
            &format!("SELECT {COLUMNS} FROM billing_records WHERE id = ?"),
            [id],
            billing_from_row,
        )?;
        tx.commit()?;

        tracing::info!(
            billing_id = %id,
            amount = %amount,
            paid = %record.fields.paid_amount,
            balance = %record.balance,
            "Payment recorded"
        );
        Ok(record)
    }

    /// Change only the status of a bill.
    pub fn set_billing_status(
        &mut self,
        id: BillingRecordId,
        status: BillingStatus,
    ) -> DbResult<BillingRecord> {
        let rows_affected = self.conn.execute(
            "UPDATE billing_records SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![id, status],
        )?;
        if rows_affected == 0 {
            return Err(not_found(EntityKind::BillingRecord, id.get()));
        }
        self.require_billing_record(id)
    }

    /// Get a billing record by ID.
    pub fn get_billing_record(&self, id: BillingRecordId) -> DbResult<Option<BillingRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM billing_records WHERE id = ?"),
                [id],
                billing_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// The bill for a visit, if one was issued.
    pub fn get_billing_for_visit(&self, visit_id: VisitId) -> DbResult<Option<BillingRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM billing_records WHERE visit_id = ?"),
                [visit_id],
                billing_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_billing_records(&self) -> DbResult<Vec<BillingRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM billing_records ORDER BY id"))?;
        let rows = stmt.query_map([], billing_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Every bill issued for a patient's visits.
    pub fn list_billing_records_for_patient(
        &self,
        patient_id: PatientId,
    ) -> DbResult<Vec<BillingRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT b.id, b.visit_id, b.total_amount, b.paid_amount, b.billing_date,
                   b.due_date, b.status, b.payment_method, b.balance,
                   b.created_at, b.updated_at
            FROM billing_records b
            JOIN visits v ON v.id = b.visit_id
            WHERE v.patient_id = ?
            ORDER BY b.billing_date, b.id
            "#,
        )?;
        let rows = stmt.query_map([patient_id], billing_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Bills with money still owed.
    pub fn list_outstanding_billing_records(&self) -> DbResult<Vec<BillingRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM billing_records WHERE balance > 0 ORDER BY due_date, id"
        ))?;
        let rows = stmt.query_map([], billing_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn delete_billing_record(&mut self, id: BillingRecordId) -> DbResult<CascadeReport> {
        self.delete_cascade(EntityKind::BillingRecord, id.get())
    }

    fn require_billing_record(&self, id: BillingRecordId) -> DbResult<BillingRecord> {
        self.get_billing_record(id)?
            .ok_or_else(|| not_found(EntityKind::BillingRecord, id.get()))
    }
}

fn billing_from_row(row: &Row<'_>) -> rusqlite::Result<BillingRecord> {
    Ok(BillingRecord {
        id: row.get(0)?,
        fields: BillingFields {
            visit_id: row.get(1)?,
            total_amount: row.get(2)?,
            paid_amount: row.get(3)?,
            billing_date: row.get(4)?,
            due_date: row.get(5)?,
            status: row.get(6)?,
            payment_method: row.get(7)?,
        },
        balance: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;

    #[test]
    fn test_balance_follows_payments() {
        let mut db = Database::open_in_memory().unwrap();
        let (_, _, visit) = seed_visit(&mut db);

        let mut fields = BillingFields::new(visit.id, Money::new(100, 0), date(2024, 3, 1));
        fields.paid_amount = Money::new(40, 0);
        let bill = db.create_billing_record(&fields).unwrap();
        assert_eq!(bill.balance.to_string(), "60.00");

        let bill = db.record_payment(bill.id, Money::new(60, 0)).unwrap();
        assert_eq!(bill.fields.paid_amount.to_string(), "100.00");
        assert_eq!(bill.balance, Money::ZERO);
        assert!(bill.is_settled());
        // Status is caller-managed
        assert_eq!(bill.fields.status, BillingStatus::Pending);
    }

    #[test]
    fn test_update_total_recomputes_balance() {
        let mut db = Database::open_in_memory().unwrap();
        let (_, _, visit) = seed_visit(&mut db);
        let bill = db
            .create_billing_record(&BillingFields::new(visit.id, Money::new(100, 0), date(2024, 3, 1)))
            .unwrap();

        let mut fields = bill.fields.clone();
        fields.total_amount = Money::new(150, 25);
        fields.status = BillingStatus::Overdue;
        let updated = db.update_billing_record(bill.id, &fields).unwrap();
        assert_eq!(updated.balance, Money::from_cents(15025));
        assert_eq!(updated.balance, updated.fields.expected_balance());
    }

    #[test]
    fn test_second_bill_for_visit_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let (_, _, visit) = seed_visit(&mut db);
        let fields = BillingFields::new(visit.id, Money::new(100, 0), date(2024, 3, 1));
        db.create_billing_record(&fields).unwrap();

        match db.create_billing_record(&fields).unwrap_err() {
            DbError::UniquenessViolation { field, .. } => {
                assert_eq!(field, "billing_records.visit_id")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(db.list_billing_records().unwrap().len(), 1);
    }

    #[test]
    fn test_non_positive_payment_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let (_, _, visit) = seed_visit(&mut db);
        let bill = db
            .create_billing_record(&BillingFields::new(visit.id, Money::new(10, 0), date(2024, 3, 1)))
            .unwrap();

        assert!(matches!(
            db.record_payment(bill.id, Money::ZERO),
            Err(DbError::Validation { .. })
        ));
        assert!(matches!(
            db.record_payment(BillingRecordId(99), Money::new(1, 0)),
            Err(DbError::NotFound { .. })
        ));
    }

    #[test]
    fn test_overpayment_goes_negative() {
        let mut db = Database::open_in_memory().unwrap();
        let (_, _, visit) = seed_visit(&mut db);
        let bill = db
            .create_billing_record(&BillingFields::new(visit.id, Money::new(10, 0), date(2024, 3, 1)))
            .unwrap();

        let bill = db.record_payment(bill.id, Money::new(12, 50)).unwrap();
        assert_eq!(bill.balance.to_string(), "-2.50");
        assert!(db.list_outstanding_billing_records().unwrap().is_empty());
    }

    #[test]
    fn test_lookup_by_visit_and_patient() {
        let mut db = Database::open_in_memory().unwrap();
        let (patient, _, visit) = seed_visit(&mut db);
        let bill = db
            .create_billing_record(&BillingFields::new(visit.id, Money::new(75, 0), date(2024, 3, 1)))
            .unwrap();

        assert_eq!(db.get_billing_for_visit(visit.id).unwrap(), Some(bill.clone()));
        assert_eq!(db.list_billing_records_for_patient(patient.id).unwrap(), vec![bill.clone()]);
        assert_eq!(db.list_outstanding_billing_records().unwrap(), vec![bill]);
    }

    #[test]
    fn test_status_set_independently() {
        let mut db = Database::open_in_memory().unwrap();
        let (_, _, visit) = seed_visit(&mut db);
        let bill = db
            .create_billing_record(&BillingFields::new(visit.id, Money::new(75, 0), date(2024, 3, 1)))
            .unwrap();

        let bill = db.set_billing_status(bill.id, BillingStatus::PartiallyPaid).unwrap();
        assert_eq!(bill.fields.status, BillingStatus::PartiallyPaid);
        assert_eq!(bill.balance, Money::new(75, 0));
    }
}
