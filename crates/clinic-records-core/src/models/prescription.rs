//! Prescription models.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::validate;
use super::{MedicationId, PrescriptionId, VisitId};
use crate::db::DbResult;

/// Caller-supplied prescription fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionFields {
    pub visit_id: VisitId,
    pub medication_id: MedicationId,
    /// e.g. "500mg"
    pub dosage: String,
    /// e.g. "twice daily"
    pub frequency: String,
    /// e.g. "10 days"
    pub duration: String,
    pub instructions: Option<String>,
    pub prescribed_date: NaiveDate,
}

/// A stored prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    pub id: PrescriptionId,
    #[serde(flatten)]
    pub fields: PrescriptionFields,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl PrescriptionFields {
    pub fn validate(&self) -> DbResult<()> {
        validate::required("dosage", &self.dosage, 50)?;
        validate::required("frequency", &self.frequency, 50)?;
        validate::required("duration", &self.duration, 50)?;
        Ok(())
    }
}
