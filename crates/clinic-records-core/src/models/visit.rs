//! Visit models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::validate;
use super::{PatientId, PractitionerId, VisitId, VisitStatus};
use crate::db::DbResult;

/// Caller-supplied visit fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitFields {
    pub patient_id: PatientId,
    pub practitioner_id: PractitionerId,
    pub visit_date: NaiveDateTime,
    pub purpose: Option<String>,
    pub diagnosis: Option<String>,
    pub status: VisitStatus,
}

/// A stored visit. Owns its prescriptions, lab tests and billing record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Visit {
    pub id: VisitId,
    #[serde(flatten)]
    pub fields: VisitFields,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl VisitFields {
    /// A scheduled visit with no purpose or diagnosis yet.
    pub fn scheduled(
        patient_id: PatientId,
        practitioner_id: PractitionerId,
        visit_date: NaiveDateTime,
    ) -> Self {
        Self {
            patient_id,
            practitioner_id,
            visit_date,
            purpose: None,
            diagnosis: None,
            status: VisitStatus::default(),
        }
    }

    pub fn validate(&self) -> DbResult<()> {
        validate::optional("purpose", self.purpose.as_deref(), 255)
    }
}
