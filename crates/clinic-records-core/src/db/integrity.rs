//! Reference and uniqueness checks run inside write transactions.
//!
//! These run under the same IMMEDIATE transaction as the write they guard, so
//! no other writer can invalidate a check before the insert lands.

use rusqlite::{params, Connection, OptionalExtension};

use super::{DbError, DbResult, EntityKind};

pub(crate) fn record_exists(conn: &Connection, kind: EntityKind, id: i64) -> DbResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?1", kind.table()),
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub(crate) fn not_found(kind: EntityKind, id: i64) -> DbError {
    DbError::NotFound {
        entity: kind.label().into(),
        id,
    }
}

/// A foreign reference must resolve.
pub(crate) fn ensure_reference(conn: &Connection, kind: EntityKind, id: i64) -> DbResult<()> {
    if record_exists(conn, kind, id)? {
        Ok(())
    } else {
        Err(DbError::Reference {
            entity: kind.label().into(),
            id,
        })
    }
}

/// The target of an update must exist.
pub(crate) fn ensure_found(conn: &Connection, kind: EntityKind, id: i64) -> DbResult<()> {
    if record_exists(conn, kind, id)? {
        Ok(())
    } else {
        Err(not_found(kind, id))
    }
}

/// No other row of `kind` may hold `value` in `column`. `exclude` skips the
/// row being updated.
pub(crate) fn ensure_unique(
    conn: &Connection,
    kind: EntityKind,
    column: &str,
    value: &str,
    exclude: Option<i64>,
) -> DbResult<()> {
    let clash: Option<i64> = conn
        .query_row(
            &format!(
                "SELECT id FROM {} WHERE {} = ?1 AND id IS NOT ?2 LIMIT 1",
                kind.table(),
                column
            ),
            params![value, exclude],
            |row| row.get(0),
        )
        .optional()?;

    match clash {
        Some(_) => Err(DbError::UniquenessViolation {
            field: format!("{}.{}", kind.table(), column),
            value: value.to_string(),
        }),
        None => Ok(()),
    }
}
