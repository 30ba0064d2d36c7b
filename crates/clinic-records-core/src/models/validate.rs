//! Field-level checks shared by the record types.

use crate::db::{DbError, DbResult};

use super::Money;

pub(crate) fn required(field: &str, value: &str, max_len: usize) -> DbResult<()> {
    if value.trim().is_empty() {
        return Err(DbError::Validation {
            field: field.into(),
            reason: "is required".into(),
        });
    }
    max_length(field, value, max_len)
}

pub(crate) fn optional(field: &str, value: Option<&str>, max_len: usize) -> DbResult<()> {
    match value {
        Some(v) => max_length(field, v, max_len),
        None => Ok(()),
    }
}

pub(crate) fn max_length(field: &str, value: &str, max_len: usize) -> DbResult<()> {
    let len = value.chars().count();
    if len > max_len {
        return Err(DbError::Validation {
            field: field.into(),
            reason: format!("length {} exceeds maximum of {}", len, max_len),
        });
    }
    Ok(())
}

pub(crate) fn non_negative(field: &str, amount: Money) -> DbResult<()> {
    if amount.is_negative() {
        return Err(DbError::Validation {
            field: field.into(),
            reason: format!("amount {} must not be negative", amount),
        });
    }
    Ok(())
}

/// Blank optional strings are stored as NULL.
pub(crate) fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
