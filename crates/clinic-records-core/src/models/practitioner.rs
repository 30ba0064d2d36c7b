//! Practitioner models.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::validate;
use super::PractitionerId;
use crate::db::DbResult;

/// Caller-supplied practitioner fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PractitionerFields {
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
    pub phone: String,
    /// Required and unique across practitioners
    pub email: String,
    /// Required and unique across practitioners
    pub license_number: String,
    pub hire_date: Option<NaiveDate>,
    pub department: String,
}

/// A stored practitioner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Practitioner {
    pub id: PractitionerId,
    #[serde(flatten)]
    pub fields: PractitionerFields,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl PractitionerFields {
    pub fn validate(&self) -> DbResult<()> {
        validate::required("first_name", &self.first_name, 50)?;
        validate::required("last_name", &self.last_name, 50)?;
        validate::required("specialization", &self.specialization, 100)?;
        validate::required("phone", &self.phone, 20)?;
        validate::required("email", &self.email, 100)?;
        validate::required("license_number", &self.license_number, 50)?;
        validate::required("department", &self.department, 100)?;
        Ok(())
    }
}

impl Practitioner {
    pub fn display_name(&self) -> String {
        format!("Dr. {} {}", self.fields.first_name, self.fields.last_name)
    }
}
