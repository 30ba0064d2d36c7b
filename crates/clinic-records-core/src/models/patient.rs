//! Patient models.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::validate;
use super::{Gender, PatientId};
use crate::db::DbResult;

/// Caller-supplied patient fields, used for both create and update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientFields {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub phone: String,
    /// Unique across patients when present; blank is treated as absent
    pub email: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
}

/// A stored patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: PatientId,
    #[serde(flatten)]
    pub fields: PatientFields,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl PatientFields {
    /// Create patient fields with the required values set.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birth_date: NaiveDate,
        gender: Gender,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            birth_date,
            gender,
            address: None,
            city: None,
            state: None,
            zip_code: None,
            phone: phone.into(),
            email: None,
            insurance_provider: None,
            insurance_number: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn validate(&self) -> DbResult<()> {
        validate::required("first_name", &self.first_name, 50)?;
        validate::required("last_name", &self.last_name, 50)?;
        validate::required("phone", &self.phone, 20)?;
        validate::optional("address", self.address.as_deref(), 255)?;
        validate::optional("city", self.city.as_deref(), 50)?;
        validate::optional("state", self.state.as_deref(), 50)?;
        validate::optional("zip_code", self.zip_code.as_deref(), 10)?;
        validate::optional("email", self.email.as_deref(), 100)?;
        validate::optional("insurance_provider", self.insurance_provider.as_deref(), 100)?;
        validate::optional("insurance_number", self.insurance_number.as_deref(), 50)?;
        Ok(())
    }

    /// Email as persisted (blank collapses to `None`).
    pub fn stored_email(&self) -> Option<&str> {
        validate::blank_to_none(&self.email)
    }
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.fields.first_name, self.fields.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;

    fn fields() -> PatientFields {
        PatientFields::new(
            "Ada",
            "Lovelace",
            NaiveDate::from_ymd_opt(1815, 12, 10).unwrap(),
            Gender::Female,
            "555-0100",
        )
    }

    #[test]
    fn test_valid_fields() {
        assert!(fields().validate().is_ok());
    }

    #[test]
    fn test_missing_last_name() {
        let mut f = fields();
        f.last_name = String::new();
        match f.validate().unwrap_err() {
            DbError::Validation { field, .. } => assert_eq!(field, "last_name"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zip_code_too_long() {
        let mut f = fields();
        f.zip_code = Some("12345-67890".into());
        assert!(f.validate().is_err());
    }

    #[test]
    fn test_blank_email_is_absent() {
        let f = fields().with_email("  ");
        assert_eq!(f.stored_email(), None);
        let f = fields().with_email("ada@example.com");
        assert_eq!(f.stored_email(), Some("ada@example.com"));
    }
}
