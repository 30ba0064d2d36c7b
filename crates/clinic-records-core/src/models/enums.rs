//! Closed label sets stored as TEXT.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::db::DbError;

/// Generates an enum with `as_str`, `FromStr` and SQL conversions.
///
/// Parsing an unknown label is a validation failure, not a storage error.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident ($field:literal) { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DbError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DbError::Validation {
                        field: $field.into(),
                        reason: format!(
                            "'{}' is not one of [{}]",
                            s,
                            Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
                        ),
                    }),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let s = value.as_str()?;
                s.parse().map_err(|e: DbError| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

str_enum!(
    /// Patient gender.
    Gender ("gender") {
        Male => "Male",
        Female => "Female",
        Other => "Other",
    }
);

str_enum!(
    /// Visit lifecycle status. Any status may follow any other.
    VisitStatus ("status") {
        Scheduled => "Scheduled",
        Completed => "Completed",
        Cancelled => "Cancelled",
    }
);

str_enum!(
    /// Lab test status.
    LabTestStatus ("status") {
        Pending => "Pending",
        Completed => "Completed",
        Cancelled => "Cancelled",
    }
);

str_enum!(
    /// Billing status. Caller-set; never derived from balance or due date.
    BillingStatus ("status") {
        Pending => "Pending",
        PartiallyPaid => "Partially Paid",
        Paid => "Paid",
        Overdue => "Overdue",
    }
);

impl Default for VisitStatus {
    fn default() -> Self {
        Self::Scheduled
    }
}

impl Default for LabTestStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for BillingStatus {
    fn default() -> Self {
        Self::Pending
    }
}
