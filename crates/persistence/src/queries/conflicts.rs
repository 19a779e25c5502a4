// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Conflict registry queries.

use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::data_models::{ConflictRow, conflict_from_row};
use crate::diesel_schema::conflicts;
use crate::error::PersistenceError;
use matricula_domain::Conflict;

/// Retrieves a conflict by ID.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the conflict does not exist.
pub fn get_conflict(
    conn: &mut SqliteConnection,
    conflict_id: i64,
) -> Result<Conflict, PersistenceError> {
    let row: ConflictRow = conflicts::table
        .filter(conflicts::conflict_id.eq(conflict_id))
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("conflict {conflict_id}")))?;

    conflict_from_row(&row)
}

/// Lists conflicts attached to a request, oldest detection first.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be reconstructed.
pub fn list_conflicts_for_request(
    conn: &mut SqliteConnection,
    request_id: i64,
) -> Result<Vec<Conflict>, PersistenceError> {
    let rows: Vec<ConflictRow> = conflicts::table
        .filter(conflicts::request_id.eq(request_id))
        .order(conflicts::detected_at.asc())
        .load(conn)?;

    rows.iter().map(conflict_from_row).collect()
}

/// Lists conflicts, optionally filtered by student and resolution state,
/// oldest detection first.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be reconstructed.
pub fn list_conflicts(
    conn: &mut SqliteConnection,
    student_id: Option<i64>,
    resolved: Option<bool>,
) -> Result<Vec<Conflict>, PersistenceError> {
    let mut query = conflicts::table.into_boxed();

    if let Some(student_id) = student_id {
        query = query.filter(conflicts::student_id.eq(student_id));
    }
    if let Some(resolved) = resolved {
        query = query.filter(conflicts::is_resolved.eq(i32::from(resolved)));
    }

    let rows: Vec<ConflictRow> = query.order(conflicts::detected_at.asc()).load(conn)?;

    rows.iter().map(conflict_from_row).collect()
}
