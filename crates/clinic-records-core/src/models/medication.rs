//! Medication catalog models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::validate;
use super::{MedicationId, Money};
use crate::db::DbResult;

/// Caller-supplied medication fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationFields {
    /// Unique catalog name
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Price per unit, never negative
    pub unit_price: Money,
}

/// A stored medication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub id: MedicationId,
    #[serde(flatten)]
    pub fields: MedicationFields,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl MedicationFields {
    pub fn new(name: impl Into<String>, unit_price: Money) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: None,
            unit_price,
        }
    }

    pub fn validate(&self) -> DbResult<()> {
        validate::required("name", &self.name, 100)?;
        validate::optional("category", self.category.as_deref(), 50)?;
        validate::non_negative("unit_price", self.unit_price)?;
        Ok(())
    }
}
