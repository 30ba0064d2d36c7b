//! Billing record models.
//!
//! `balance` is derived: it lives only on [`BillingRecord`], which callers
//! never write, and is recomputed by the store whenever `total_amount` or
//! `paid_amount` changes.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::validate;
use super::{BillingRecordId, BillingStatus, Money, VisitId};
use crate::db::DbResult;

/// Caller-supplied billing fields. Balance is not among them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingFields {
    pub visit_id: VisitId,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub billing_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: BillingStatus,
    pub payment_method: Option<String>,
}

/// A stored billing record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingRecord {
    pub id: BillingRecordId,
    #[serde(flatten)]
    pub fields: BillingFields,
    /// `total_amount - paid_amount`, as computed by the store
    pub balance: Money,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl BillingFields {
    /// An unpaid bill for a visit.
    pub fn new(visit_id: VisitId, total_amount: Money, billing_date: NaiveDate) -> Self {
        Self {
            visit_id,
            total_amount,
            paid_amount: Money::ZERO,
            billing_date,
            due_date: None,
            status: BillingStatus::default(),
            payment_method: None,
        }
    }

    pub fn validate(&self) -> DbResult<()> {
        validate::non_negative("total_amount", self.total_amount)?;
        validate::non_negative("paid_amount", self.paid_amount)?;
        validate::optional("payment_method", self.payment_method.as_deref(), 50)?;
        Ok(())
    }

    /// The balance these fields would produce once stored.
    pub fn expected_balance(&self) -> Money {
        self.total_amount - self.paid_amount
    }
}

impl BillingRecord {
    pub fn is_settled(&self) -> bool {
        !self.balance.is_positive()
    }
}
