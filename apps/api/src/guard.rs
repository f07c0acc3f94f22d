//! Ownership-checked writes.
//!
//! Update and delete statements match on both the record id and the
//! viewer's id (`WHERE id = $1 AND user_id = $2 ... RETURNING`). A record
//! owned by someone else simply does not match, and the caller gets the
//! same `NotFound` as for a record that never existed.

use crate::errors::AppError;

/// Maps the `RETURNING` row of a guarded write to the caller-facing outcome.
pub fn found<T>(row: Option<T>, what: &str) -> Result<T, AppError> {
    row.ok_or_else(|| AppError::NotFound(format!("{what} not found")))
}
