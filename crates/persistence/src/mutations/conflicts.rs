// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Conflict registry mutations.

use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::data_models::format_timestamp;
use crate::diesel_schema::conflicts;
use crate::error::PersistenceError;
use crate::sqlite::get_last_insert_rowid;
use matricula_domain::Conflict;

/// Inserts a conflict record.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_conflict(
    conn: &mut SqliteConnection,
    conflict: &Conflict,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(conflicts::table)
        .values((
            conflicts::category.eq(conflict.category.as_str()),
            conflicts::description.eq(conflict.description.clone()),
            conflicts::student_id.eq(conflict.student_id),
            conflicts::request_id.eq(conflict.request_id),
            conflicts::group_id.eq(conflict.group_id),
            conflicts::detected_at.eq(format_timestamp(conflict.detected_at)),
            conflicts::is_resolved.eq(i32::from(conflict.resolved)),
            conflicts::resolution_notes.eq(conflict.resolution_notes.clone()),
        ))
        .execute(conn)?;

    get_last_insert_rowid(conn)
}

/// Rewrites a conflict's descriptor fields in place.
///
/// The detection timestamp and resolution state are left untouched; use
/// [`resolve_conflict`] to change those.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the conflict does not exist.
pub fn update_conflict(
    conn: &mut SqliteConnection,
    conflict_id: i64,
    conflict: &Conflict,
) -> Result<(), PersistenceError> {
    let affected = diesel::update(
        conflicts::table.filter(conflicts::conflict_id.eq(conflict_id)),
    )
    .set((
        conflicts::category.eq(conflict.category.as_str()),
        conflicts::description.eq(conflict.description.clone()),
        conflicts::student_id.eq(conflict.student_id),
        conflicts::request_id.eq(conflict.request_id),
        conflicts::group_id.eq(conflict.group_id),
    ))
    .execute(conn)?;

    if affected == 0 {
        return Err(PersistenceError::NotFound(format!(
            "conflict {conflict_id}"
        )));
    }

    Ok(())
}

/// Deletes a conflict record.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the conflict does not exist.
pub fn delete_conflict(
    conn: &mut SqliteConnection,
    conflict_id: i64,
) -> Result<(), PersistenceError> {
    let affected =
        diesel::delete(conflicts::table.filter(conflicts::conflict_id.eq(conflict_id)))
            .execute(conn)?;

    if affected == 0 {
        return Err(PersistenceError::NotFound(format!(
            "conflict {conflict_id}"
        )));
    }

    Ok(())
}

/// Marks a conflict as resolved.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the conflict does not exist.
pub fn resolve_conflict(
    conn: &mut SqliteConnection,
    conflict_id: i64,
    resolution_notes: Option<&str>,
) -> Result<(), PersistenceError> {
    let affected = diesel::update(
        conflicts::table.filter(conflicts::conflict_id.eq(conflict_id)),
    )
    .set((
        conflicts::is_resolved.eq(1),
        conflicts::resolution_notes.eq(resolution_notes.map(ToString::to_string)),
    ))
    .execute(conn)?;

    if affected == 0 {
        return Err(PersistenceError::NotFound(format!(
            "conflict {conflict_id}"
        )));
    }

    Ok(())
}
