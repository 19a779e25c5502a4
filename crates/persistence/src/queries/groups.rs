// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Group and waitlist queries.

use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::data_models::{GroupRow, group_from_row};
use crate::diesel_schema::{class_groups, group_waitlist};
use crate::error::PersistenceError;
use matricula_domain::Group;

/// Loads a group's waitlist in FIFO order.
pub(crate) fn load_waitlist(
    conn: &mut SqliteConnection,
    group_id: i64,
) -> Result<Vec<i64>, PersistenceError> {
    Ok(group_waitlist::table
        .filter(group_waitlist::group_id.eq(group_id))
        .order(group_waitlist::waitlist_id.asc())
        .select(group_waitlist::student_id)
        .load::<i64>(conn)?)
}

/// Retrieves a group by ID, including its waitlist.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the group does not exist.
pub fn get_group(conn: &mut SqliteConnection, group_id: i64) -> Result<Group, PersistenceError> {
    let row: GroupRow = class_groups::table
        .filter(class_groups::group_id.eq(group_id))
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("group {group_id}")))?;

    let waitlist = load_waitlist(conn, group_id)?;
    group_from_row(&row, waitlist)
}

/// Lists all active groups for a period.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be reconstructed.
pub fn list_groups_for_period(
    conn: &mut SqliteConnection,
    period_id: i64,
) -> Result<Vec<Group>, PersistenceError> {
    let rows: Vec<GroupRow> = class_groups::table
        .filter(class_groups::period_id.eq(period_id))
        .filter(class_groups::is_active.eq(1))
        .order(class_groups::group_id.asc())
        .load(conn)?;

    let mut groups = Vec::with_capacity(rows.len());
    for row in &rows {
        let waitlist = load_waitlist(conn, row.group_id)?;
        groups.push(group_from_row(row, waitlist)?);
    }

    Ok(groups)
}

/// Returns a student's 1-indexed position on a group's waitlist, or `None`
/// if they are not on it.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn waitlist_position(
    conn: &mut SqliteConnection,
    group_id: i64,
    student_id: i64,
) -> Result<Option<usize>, PersistenceError> {
    let students = load_waitlist(conn, group_id)?;
    Ok(students
        .iter()
        .position(|candidate| *candidate == student_id)
        .map(|index| index + 1))
}
