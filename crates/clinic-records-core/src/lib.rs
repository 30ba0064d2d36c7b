//! Clinic Records Core Library
//!
//! Local record store for a clinic: patients, practitioners, the medication
//! catalog, visits and everything recorded against a visit.
//!
//! # Ownership
//!
//! ```text
//!   Patient ─────┐
//!                ├──► Visit ──┬──► Prescription ◄──── Medication
//!   Practitioner ┘            ├──► LabTest
//!                             └──► BillingRecord (one per visit)
//! ```
//!
//! Deleting a record removes everything it owns in the same transaction.
//! A billing record's `balance` is always `total_amount - paid_amount`.
//!
//! # Modules
//!
//! - [`db`]: SQLite store, cascading deletion, reset and summary
//! - [`models`]: Domain types (Patient, Visit, BillingRecord, etc.)
//! - [`config`]: Connection settings

pub mod config;
pub mod db;
pub mod models;

// Re-export commonly used types
pub use config::DatabaseConfig;
pub use db::{CascadeReport, Database, DbError, DbResult, EntityKind, StoreSummary};
pub use models::{
    BillingFields, BillingRecord, BillingStatus, Gender, LabTest, LabTestFields, LabTestStatus,
    Medication, MedicationFields, Money, Patient, PatientFields, Practitioner, PractitionerFields,
    Prescription, PrescriptionFields, Visit, VisitFields, VisitStatus,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};

use models::{
    BillingRecordId, LabTestId, MedicationId, PatientId, PractitionerId, PrescriptionId, VisitId,
};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicRecordsError {
    #[error("Invalid input: {message}")]
    Validation { message: String },

    #[error("Uniqueness violation: {message}")]
    UniquenessViolation { message: String },

    #[error("Reference error: {message}")]
    Reference { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Cascade failure: {message}")]
    CascadeFailure { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<DbError> for ClinicRecordsError {
    fn from(e: DbError) -> Self {
        let message = e.to_string();
        match e {
            DbError::Validation { .. } => ClinicRecordsError::Validation { message },
            DbError::UniquenessViolation { .. } => {
                ClinicRecordsError::UniquenessViolation { message }
            }
            DbError::Reference { .. } => ClinicRecordsError::Reference { message },
            DbError::NotFound { .. } => ClinicRecordsError::NotFound { message },
            DbError::CascadeFailure { .. } => ClinicRecordsError::CascadeFailure { message },
            DbError::Json(_) => ClinicRecordsError::Serialization { message },
            DbError::Sqlite(_) => ClinicRecordsError::Database { message },
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicRecordsError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicRecordsError::Database {
            message: format!("Lock poisoned: {}", e),
        }
    }
}

// =========================================================================
// Boundary parsing
// =========================================================================

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn invalid(field: &str, raw: &str, expected: &str) -> ClinicRecordsError {
    ClinicRecordsError::Validation {
        message: format!("{}: '{}' is not {}", field, raw, expected),
    }
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ClinicRecordsError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| invalid(field, raw, "a YYYY-MM-DD date"))
}

fn parse_optional_date(
    field: &str,
    raw: Option<String>,
) -> Result<Option<NaiveDate>, ClinicRecordsError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| parse_date(field, &s))
        .transpose()
}

fn parse_datetime(field: &str, raw: &str) -> Result<NaiveDateTime, ClinicRecordsError> {
    let raw_trimmed = raw.trim();
    [DATETIME_FORMAT, "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw_trimmed, fmt).ok())
        .ok_or_else(|| invalid(field, raw, "an ISO-8601 date-time"))
}

fn parse_money(field: &str, raw: &str) -> Result<Money, ClinicRecordsError> {
    Ok(Money::parse_field(field, raw)?)
}

fn parse_label<T: FromStr<Err = DbError>>(raw: &str) -> Result<T, ClinicRecordsError> {
    Ok(raw.parse()?)
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_datetime(at: NaiveDateTime) -> String {
    at.format(DATETIME_FORMAT).to_string()
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a record store at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<ClinicRecordsCore>, ClinicRecordsError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(ClinicRecordsCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Open a record store, overriding the connection settings.
#[uniffi::export]
pub fn open_database_with_settings(
    path: String,
    busy_timeout_ms: u64,
    wal: bool,
) -> Result<Arc<ClinicRecordsCore>, ClinicRecordsError> {
    let config = DatabaseConfig {
        busy_timeout_ms,
        wal,
    };
    let db = Database::open_with_config(&path, &config)?;
    Ok(Arc::new(ClinicRecordsCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory record store (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<ClinicRecordsCore>, ClinicRecordsError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(ClinicRecordsCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe record store wrapper for FFI.
#[derive(uniffi::Object)]
pub struct ClinicRecordsCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl ClinicRecordsCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    pub fn create_patient(&self, fields: FfiPatientFields) -> Result<FfiPatient, ClinicRecordsError> {
        let fields = PatientFields::try_from(fields)?;
        let mut db = self.db.lock()?;
        Ok(db.create_patient(&fields)?.into())
    }

    pub fn update_patient(
        &self,
        id: i64,
        fields: FfiPatientFields,
    ) -> Result<FfiPatient, ClinicRecordsError> {
        let fields = PatientFields::try_from(fields)?;
        let mut db = self.db.lock()?;
        Ok(db.update_patient(PatientId(id), &fields)?.into())
    }

    pub fn get_patient(&self, id: i64) -> Result<Option<FfiPatient>, ClinicRecordsError> {
        let db = self.db.lock()?;
        Ok(db.get_patient(PatientId(id))?.map(Into::into))
    }

    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, ClinicRecordsError> {
        let db = self.db.lock()?;
        Ok(db.list_patients()?.into_iter().map(Into::into).collect())
    }

    /// Delete a patient with all of their visits and visit records.
    pub fn delete_patient(&self, id: i64) -> Result<FfiCascadeReport, ClinicRecordsError> {
        let mut db = self.db.lock()?;
        Ok(db.delete_patient(PatientId(id))?.into())
    }

    // =========================================================================
    // Practitioner Operations
    // =========================================================================

    pub fn create_practitioner(
        &self,
        fields: FfiPractitionerFields,
    ) -> Result<FfiPractitioner, ClinicRecordsError> {
        let fields = PractitionerFields::try_from(fields)?;
        let mut db = self.db.lock()?;
        Ok(db.create_practitioner(&fields)?.into())
    }

    pub fn update_practitioner(
        &self,
        id: i64,
        fields: FfiPractitionerFields,
    ) -> Result<FfiPractitioner, ClinicRecordsError> {
        let fields = PractitionerFields::try_from(fields)?;
        let mut db = self.db.lock()?;
        Ok(db.update_practitioner(PractitionerId(id), &fields)?.into())
    }

    pub fn get_practitioner(&self, id: i64) -> Result<Option<FfiPractitioner>, ClinicRecordsError> {
        let db = self.db.lock()?;
        Ok(db.get_practitioner(PractitionerId(id))?.map(Into::into))
    }

    pub fn list_practitioners(&self) -> Result<Vec<FfiPractitioner>, ClinicRecordsError> {
        let db = self.db.lock()?;
        Ok(db.list_practitioners()?.into_iter().map(Into::into).collect())
    }

    pub fn delete_practitioner(&self, id: i64) -> Result<FfiCascadeReport, ClinicRecordsError> {
        let mut db = self.db.lock()?;
        Ok(db.delete_practitioner(PractitionerId(id))?.into())
    }

    // =========================================================================
    // Medication Operations
    // =========================================================================

    pub fn create_medication(
        &self,
        fields: FfiMedicationFields,
    ) -> Result<FfiMedication, ClinicRecordsError> {
        let fields = MedicationFields::try_from(fields)?;
        let mut db = self.db.lock()?;
        Ok(db.create_medication(&fields)?.into())
    }

    pub fn update_medication(
        &self,
        id: i64,
        fields: FfiMedicationFields,
    ) -> Result<FfiMedication, ClinicRecordsError> {
        let fields = MedicationFields::try_from(fields)?;
        let mut db = self.db.lock()?;
        Ok(db.update_medication(MedicationId(id), &fields)?.into())
    }

    pub fn get_medication(&self, id: i64) -> Result<Option<FfiMedication>, ClinicRecordsError> {
        let db = self.db.lock()?;
        Ok(db.get_medication(MedicationId(id))?.map(Into::into))
    }

    pub fn list_medications(&self) -> Result<Vec<FfiMedication>, ClinicRecordsError> {
        let db = self.db.lock()?;
        Ok(db.list_medications()?.into_iter().map(Into::into).collect())
    }

    /// Remove a medication and the prescriptions that reference it.
    pub fn delete_medication(&self, id: i64) -> Result<FfiCascadeReport, ClinicRecordsError> {
        let mut db = self.db.lock()?;
        Ok(db.delete_medication(MedicationId(id))?.into())
    }

    // =========================================================================
    // Visit Operations
    // =========================================================================

    pub fn create_visit(&self, fields: FfiVisitFields) -> Result<FfiVisit, ClinicRecordsError> {
        let fields = VisitFields::try_from(fields)?;
        let mut db = self.db.lock()?;
        Ok(db.create_visit(&fields)?.into())
    }

    pub fn update_visit(
        &self,
        id: i64,
        fields: FfiVisitFields,
    ) -> Result<FfiVisit, ClinicRecordsError> {
        let fields = VisitFields::try_from(fields)?;
        let mut db = self.db.lock()?;
        Ok(db.update_visit(VisitId(id), &fields)?.into())
    }

    pub fn set_visit_status(&self, id: i64, status: String) -> Result<FfiVisit, ClinicRecordsError> {
        let status: VisitStatus = parse_label(&status)?;
        let mut db = self.db.lock()?;
        Ok(db.set_visit_status(VisitId(id), status)?.into())
    }

    pub fn get_visit(&self, id: i64) -> Result<Option<FfiVisit>, ClinicRecordsError> {
        let db = self.db.lock()?;
        Ok(db.get_visit(VisitId(id))?.map(Into::into))
    }

    pub fn list_visits(&self) -> Result<Vec<FfiVisit>, ClinicRecordsError> {
        let db = self.db.lock()?;
        Ok(db.list_visits()?.into_iter().map(Into::into).collect())
    }

    pub fn list_visits_for_patient(&self, patient_id: i64) -> Result<Vec<FfiVisit>, ClinicRecordsError> {
        let db = self.db.lock()?;
        let visits = db.list_visits_for_patient(PatientId(patient_id))?;
        Ok(visits.into_iter().map(Into::into).collect())
    }

    pub fn list_visits_for_practitioner(
        &self,
        practitioner_id: i64,
    ) -> Result<Vec<FfiVisit>, ClinicRecordsError> {
        let db = self.db.lock()?;
        let visits = db.list_visits_for_practitioner(PractitionerId(practitioner_id))?;
        Ok(visits.into_iter().map(Into::into).collect())
    }

    pub fn delete_visit(&self, id: i64) -> Result<FfiCascadeReport, ClinicRecordsError> {
        let mut db = self.db.lock()?;
        Ok(db.delete_visit(VisitId(id))?.into())
    }

    // =========================================================================
    // Prescription Operations
    // =========================================================================

    pub fn create_prescription(
        &self,
        fields: FfiPrescriptionFields,
    ) -> Result<FfiPrescription, ClinicRecordsError> {
        let fields = PrescriptionFields::try_from(fields)?;
        let mut db = self.db.lock()?;
        Ok(db.create_prescription(&fields)?.into())
    }

    pub fn update_prescription(
        &self,
        id: i64,
        fields: FfiPrescriptionFields,
    ) -> Result<FfiPrescription, ClinicRecordsError> {
        let fields = PrescriptionFields::try_from(fields)?;
        let mut db = self.db.lock()?;
        Ok(db.update_prescription(PrescriptionId(id), &fields)?.into())
    }

    pub fn get_prescription(&self, id: i64) -> Result<Option<FfiPrescription>, ClinicRecordsError> {
        let db = self.db.lock()?;
        Ok(db.get_prescription(PrescriptionId(id))?.map(Into::into))
    }

    pub fn list_prescriptions_for_visit(
        &self,
        visit_id: i64,
    ) -> Result<Vec<FfiPrescription>, ClinicRecordsError> {
        let db = self.db.lock()?;
        let prescriptions = db.list_prescriptions_for_visit(VisitId(visit_id))?;
        Ok(prescriptions.into_iter().map(Into::into).collect())
    }

    pub fn delete_prescription(&self, id: i64) -> Result<FfiCascadeReport, ClinicRecordsError> {
        let mut db = self.db.lock()?;
        Ok(db.delete_prescription(PrescriptionId(id))?.into())
    }

    // =========================================================================
    // Lab Test Operations
    // =========================================================================

    pub fn create_lab_test(&self, fields: FfiLabTestFields) -> Result<FfiLabTest, ClinicRecordsError> {
        let fields = LabTestFields::try_from(fields)?;
        let mut db = self.db.lock()?;
        Ok(db.create_lab_test(&fields)?.into())
    }

    pub fn update_lab_test(
        &self,
        id: i64,
        fields: FfiLabTestFields,
    ) -> Result<FfiLabTest, ClinicRecordsError> {
        let fields = LabTestFields::try_from(fields)?;
        let mut db = self.db.lock()?;
        Ok(db.update_lab_test(LabTestId(id), &fields)?.into())
    }

    pub fn set_lab_test_status(
        &self,
        id: i64,
        status: String,
    ) -> Result<FfiLabTest, ClinicRecordsError> {
        let status: LabTestStatus = parse_label(&status)?;
        let mut db = self.db.lock()?;
        Ok(db.set_lab_test_status(LabTestId(id), status)?.into())
    }

    pub fn get_lab_test(&self, id: i64) -> Result<Option<FfiLabTest>, ClinicRecordsError> {
        let db = self.db.lock()?;
        Ok(db.get_lab_test(LabTestId(id))?.map(Into::into))
    }

    pub fn list_lab_tests_for_visit(&self, visit_id: i64) -> Result<Vec<FfiLabTest>, ClinicRecordsError> {
        let db = self.db.lock()?;
        let tests = db.list_lab_tests_for_visit(VisitId(visit_id))?;
        Ok(tests.into_iter().map(Into::into).collect())
    }

    pub fn delete_lab_test(&self, id: i64) -> Result<FfiCascadeReport, ClinicRecordsError> {
        let mut db = self.db.lock()?;
        Ok(db.delete_lab_test(LabTestId(id))?.into())
    }

    // =========================================================================
    // Billing Operations
    // =========================================================================

    pub fn create_billing_record(
        &self,
        fields: FfiBillingFields,
    ) -> Result<FfiBillingRecord, ClinicRecordsError> {
        let fields = BillingFields::try_from(fields)?;
        let mut db = self.db.lock()?;
        Ok(db.create_billing_record(&fields)?.into())
    }

    pub fn update_billing_record(
        &self,
        id: i64,
        fields: FfiBillingFields,
    ) -> Result<FfiBillingRecord, ClinicRecordsError> {
        let fields = BillingFields::try_from(fields)?;
        let mut db = self.db.lock()?;
        Ok(db.update_billing_record(BillingRecordId(id), &fields)?.into())
    }

    /// Add a payment, e.g. `"40.00"`, to a bill.
    pub fn record_payment(
        &self,
        id: i64,
        amount: String,
    ) -> Result<FfiBillingRecord, ClinicRecordsError> {
        let amount = parse_money("amount", &amount)?;
        let mut db = self.db.lock()?;
        Ok(db.record_payment(BillingRecordId(id), amount)?.into())
    }

    pub fn set_billing_status(
        &self,
        id: i64,
        status: String,
    ) -> Result<FfiBillingRecord, ClinicRecordsError> {
        let status: BillingStatus = parse_label(&status)?;
        let mut db = self.db.lock()?;
        Ok(db.set_billing_status(BillingRecordId(id), status)?.into())
    }

    pub fn get_billing_record(&self, id: i64) -> Result<Option<FfiBillingRecord>, ClinicRecordsError> {
        let db = self.db.lock()?;
        Ok(db.get_billing_record(BillingRecordId(id))?.map(Into::into))
    }

    pub fn get_billing_for_visit(
        &self,
        visit_id: i64,
    ) -> Result<Option<FfiBillingRecord>, ClinicRecordsError> {
        let db = self.db.lock()?;
        Ok(db.get_billing_for_visit(VisitId(visit_id))?.map(Into::into))
    }

    pub fn list_outstanding_billing_records(&self) -> Result<Vec<FfiBillingRecord>, ClinicRecordsError> {
        let db = self.db.lock()?;
        let bills = db.list_outstanding_billing_records()?;
        Ok(bills.into_iter().map(Into::into).collect())
    }

    pub fn delete_billing_record(&self, id: i64) -> Result<FfiCascadeReport, ClinicRecordsError> {
        let mut db = self.db.lock()?;
        Ok(db.delete_billing_record(BillingRecordId(id))?.into())
    }

    // =========================================================================
    // Store Operations
    // =========================================================================

    /// Drop and recreate every table.
    pub fn reset_store(&self) -> Result<(), ClinicRecordsError> {
        let mut db = self.db.lock()?;
        db.reset()?;
        Ok(())
    }

    pub fn schema_fingerprint(&self) -> Result<String, ClinicRecordsError> {
        let db = self.db.lock()?;
        Ok(db.schema_fingerprint()?)
    }

    /// Schema fingerprint and row counts as JSON.
    pub fn store_summary_json(&self) -> Result<String, ClinicRecordsError> {
        let db = self.db.lock()?;
        Ok(db.store_summary()?.to_json()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient fields. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientFields {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub gender: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
}

impl TryFrom<FfiPatientFields> for PatientFields {
    type Error = ClinicRecordsError;

    fn try_from(f: FfiPatientFields) -> Result<Self, Self::Error> {
        Ok(PatientFields {
            birth_date: parse_date("birth_date", &f.birth_date)?,
            gender: parse_label(&f.gender)?,
            first_name: f.first_name,
            last_name: f.last_name,
            address: f.address,
            city: f.city,
            state: f.state,
            zip_code: f.zip_code,
            phone: f.phone,
            email: f.email,
            insurance_provider: f.insurance_provider,
            insurance_number: f.insurance_number,
        })
    }
}

impl From<PatientFields> for FfiPatientFields {
    fn from(f: PatientFields) -> Self {
        Self {
            first_name: f.first_name,
            last_name: f.last_name,
            birth_date: format_date(f.birth_date),
            gender: f.gender.to_string(),
            address: f.address,
            city: f.city,
            state: f.state,
            zip_code: f.zip_code,
            phone: f.phone,
            email: f.email,
            insurance_provider: f.insurance_provider,
            insurance_number: f.insurance_number,
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: i64,
    pub fields: FfiPatientFields,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Patient> for FfiPatient {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id.get(),
            fields: p.fields.into(),
            created_at: format_datetime(p.created_at),
            updated_at: format_datetime(p.updated_at),
        }
    }
}

/// FFI-safe practitioner fields.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPractitionerFields {
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
    pub phone: String,
    pub email: String,
    pub license_number: String,
    pub hire_date: Option<String>,
    pub department: String,
}

impl TryFrom<FfiPractitionerFields> for PractitionerFields {
    type Error = ClinicRecordsError;

    fn try_from(f: FfiPractitionerFields) -> Result<Self, Self::Error> {
        Ok(PractitionerFields {
            hire_date: parse_optional_date("hire_date", f.hire_date)?,
            first_name: f.first_name,
            last_name: f.last_name,
            specialization: f.specialization,
            phone: f.phone,
            email: f.email,
            license_number: f.license_number,
            department: f.department,
        })
    }
}

impl From<PractitionerFields> for FfiPractitionerFields {
    fn from(f: PractitionerFields) -> Self {
        Self {
            first_name: f.first_name,
            last_name: f.last_name,
            specialization: f.specialization,
            phone: f.phone,
            email: f.email,
            license_number: f.license_number,
            hire_date: f.hire_date.map(format_date),
            department: f.department,
        }
    }
}

/// FFI-safe practitioner.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPractitioner {
    pub id: i64,
    pub fields: FfiPractitionerFields,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Practitioner> for FfiPractitioner {
    fn from(p: Practitioner) -> Self {
        Self {
            id: p.id.get(),
            fields: p.fields.into(),
            created_at: format_datetime(p.created_at),
            updated_at: format_datetime(p.updated_at),
        }
    }
}

/// FFI-safe medication fields. `unit_price` is a decimal string.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicationFields {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit_price: String,
}

impl TryFrom<FfiMedicationFields> for MedicationFields {
    type Error = ClinicRecordsError;

    fn try_from(f: FfiMedicationFields) -> Result<Self, Self::Error> {
        Ok(MedicationFields {
            unit_price: parse_money("unit_price", &f.unit_price)?,
            name: f.name,
            description: f.description,
            category: f.category,
        })
    }
}

impl From<MedicationFields> for FfiMedicationFields {
    fn from(f: MedicationFields) -> Self {
        Self {
            name: f.name,
            description: f.description,
            category: f.category,
            unit_price: f.unit_price.to_string(),
        }
    }
}

/// FFI-safe medication.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedication {
    pub id: i64,
    pub fields: FfiMedicationFields,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Medication> for FfiMedication {
    fn from(m: Medication) -> Self {
        Self {
            id: m.id.get(),
            fields: m.fields.into(),
            created_at: format_datetime(m.created_at),
            updated_at: format_datetime(m.updated_at),
        }
    }
}

/// FFI-safe visit fields. `visit_date` is `YYYY-MM-DDTHH:MM:SS`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVisitFields {
    pub patient_id: i64,
    pub practitioner_id: i64,
    pub visit_date: String,
    pub purpose: Option<String>,
    pub diagnosis: Option<String>,
    pub status: String,
}

impl TryFrom<FfiVisitFields> for VisitFields {
    type Error = ClinicRecordsError;

    fn try_from(f: FfiVisitFields) -> Result<Self, Self::Error> {
        Ok(VisitFields {
            patient_id: PatientId(f.patient_id),
            practitioner_id: PractitionerId(f.practitioner_id),
            visit_date: parse_datetime("visit_date", &f.visit_date)?,
            purpose: f.purpose,
            diagnosis: f.diagnosis,
            status: parse_label(&f.status)?,
        })
    }
}

impl From<VisitFields> for FfiVisitFields {
    fn from(f: VisitFields) -> Self {
        Self {
            patient_id: f.patient_id.get(),
            practitioner_id: f.practitioner_id.get(),
            visit_date: format_datetime(f.visit_date),
            purpose: f.purpose,
            diagnosis: f.diagnosis,
            status: f.status.to_string(),
        }
    }
}

/// FFI-safe visit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVisit {
    pub id: i64,
    pub fields: FfiVisitFields,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Visit> for FfiVisit {
    fn from(v: Visit) -> Self {
        Self {
            id: v.id.get(),
            fields: v.fields.into(),
            created_at: format_datetime(v.created_at),
            updated_at: format_datetime(v.updated_at),
        }
    }
}

/// FFI-safe prescription fields.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescriptionFields {
    pub visit_id: i64,
    pub medication_id: i64,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub instructions: Option<String>,
    pub prescribed_date: String,
}

impl TryFrom<FfiPrescriptionFields> for PrescriptionFields {
    type Error = ClinicRecordsError;

    fn try_from(f: FfiPrescriptionFields) -> Result<Self, Self::Error> {
        Ok(PrescriptionFields {
            visit_id: VisitId(f.visit_id),
            medication_id: MedicationId(f.medication_id),
            prescribed_date: parse_date("prescribed_date", &f.prescribed_date)?,
            dosage: f.dosage,
            frequency: f.frequency,
            duration: f.duration,
            instructions: f.instructions,
        })
    }
}

impl From<PrescriptionFields> for FfiPrescriptionFields {
    fn from(f: PrescriptionFields) -> Self {
        Self {
            visit_id: f.visit_id.get(),
            medication_id: f.medication_id.get(),
            dosage: f.dosage,
            frequency: f.frequency,
            duration: f.duration,
            instructions: f.instructions,
            prescribed_date: format_date(f.prescribed_date),
        }
    }
}

/// FFI-safe prescription.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescription {
    pub id: i64,
    pub fields: FfiPrescriptionFields,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Prescription> for FfiPrescription {
    fn from(p: Prescription) -> Self {
        Self {
            id: p.id.get(),
            fields: p.fields.into(),
            created_at: format_datetime(p.created_at),
            updated_at: format_datetime(p.updated_at),
        }
    }
}

/// FFI-safe lab test fields.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLabTestFields {
    pub visit_id: i64,
    pub test_name: String,
    pub test_date: String,
    pub results: Option<String>,
    pub status: String,
    pub cost: Option<String>,
    pub notes: Option<String>,
}

impl TryFrom<FfiLabTestFields> for LabTestFields {
    type Error = ClinicRecordsError;

    fn try_from(f: FfiLabTestFields) -> Result<Self, Self::Error> {
        Ok(LabTestFields {
            visit_id: VisitId(f.visit_id),
            test_date: parse_date("test_date", &f.test_date)?,
            status: parse_label(&f.status)?,
            cost: f.cost.map(|c| parse_money("cost", &c)).transpose()?,
            test_name: f.test_name,
            results: f.results,
            notes: f.notes,
        })
    }
}

impl From<LabTestFields> for FfiLabTestFields {
    fn from(f: LabTestFields) -> Self {
        Self {
            visit_id: f.visit_id.get(),
            test_name: f.test_name,
            test_date: format_date(f.test_date),
            results: f.results,
            status: f.status.to_string(),
            cost: f.cost.map(|c| c.to_string()),
            notes: f.notes,
        }
    }
}

/// FFI-safe lab test.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLabTest {
    pub id: i64,
    pub fields: FfiLabTestFields,
    pub created_at: String,
    pub updated_at: String,
}

impl From<LabTest> for FfiLabTest {
    fn from(t: LabTest) -> Self {
        Self {
            id: t.id.get(),
            fields: t.fields.into(),
            created_at: format_datetime(t.created_at),
            updated_at: format_datetime(t.updated_at),
        }
    }
}

/// FFI-safe billing fields. Amounts are decimal strings such as `"100.00"`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBillingFields {
    pub visit_id: i64,
    pub total_amount: String,
    pub paid_amount: String,
    pub billing_date: String,
    pub due_date: Option<String>,
    pub status: String,
    pub payment_method: Option<String>,
}

impl TryFrom<FfiBillingFields> for BillingFields {
    type Error = ClinicRecordsError;

    fn try_from(f: FfiBillingFields) -> Result<Self, Self::Error> {
        Ok(BillingFields {
            visit_id: VisitId(f.visit_id),
            total_amount: parse_money("total_amount", &f.total_amount)?,
            paid_amount: parse_money("paid_amount", &f.paid_amount)?,
            billing_date: parse_date("billing_date", &f.billing_date)?,
            due_date: parse_optional_date("due_date", f.due_date)?,
            status: parse_label(&f.status)?,
            payment_method: f.payment_method,
        })
    }
}

impl From<BillingFields> for FfiBillingFields {
    fn from(f: BillingFields) -> Self {
        Self {
            visit_id: f.visit_id.get(),
            total_amount: f.total_amount.to_string(),
            paid_amount: f.paid_amount.to_string(),
            billing_date: format_date(f.billing_date),
            due_date: f.due_date.map(format_date),
            status: f.status.to_string(),
            payment_method: f.payment_method,
        }
    }
}

/// FFI-safe billing record. `balance` is read-only.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBillingRecord {
    pub id: i64,
    pub fields: FfiBillingFields,
    pub balance: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BillingRecord> for FfiBillingRecord {
    fn from(b: BillingRecord) -> Self {
        Self {
            id: b.id.get(),
            fields: b.fields.into(),
            balance: b.balance.to_string(),
            created_at: format_datetime(b.created_at),
            updated_at: format_datetime(b.updated_at),
        }
    }
}

/// FFI-safe cascade report, keyed by entity label.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCascadeReport {
    pub root: String,
    pub root_id: i64,
    pub removed: HashMap<String, u64>,
    pub total: u64,
}

impl From<CascadeReport> for FfiCascadeReport {
    fn from(report: CascadeReport) -> Self {
        Self {
            root: report.root.label().to_string(),
            root_id: report.root_id,
            total: report.total() as u64,
            removed: report
                .removed
                .into_iter()
                .map(|(kind, count)| (kind.label().to_string(), count as u64))
                .collect(),
        }
    }
}
