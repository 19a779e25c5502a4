// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Group, seat counter, and waitlist mutations.
//!
//! Seat reservations and releases are single conditional UPDATE statements.
//! The condition carries the capacity invariant, so two concurrent
//! reservations for the last seat cannot both succeed.

use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;

use crate::diesel_schema::{class_groups, group_waitlist};
use crate::error::PersistenceError;
use crate::sqlite::get_last_insert_rowid;
use matricula_domain::Group;

/// Inserts a new group.
///
/// # Errors
///
/// Returns an error if the insert fails or the schedules cannot be
/// serialized.
pub fn insert_group(conn: &mut SqliteConnection, group: &Group) -> Result<i64, PersistenceError> {
    let schedules_json: String = serde_json::to_string(&group.schedules)?;

    diesel::insert_into(class_groups::table)
        .values((
            class_groups::course_id.eq(group.course_id),
            class_groups::period_id.eq(group.period_id),
            class_groups::instructor_id.eq(group.instructor_id),
            class_groups::capacity_max.eq(group.capacity_max),
            class_groups::current_enrollment.eq(group.current_enrollment),
            class_groups::schedules_json.eq(schedules_json),
            class_groups::is_active.eq(i32::from(group.active)),
        ))
        .execute(conn)?;

    get_last_insert_rowid(conn)
}

/// Reserves one seat in a group.
///
/// The enrollment counter is incremented only if a seat is available; the
/// check and the increment are one statement.
///
/// # Errors
///
/// Returns `PersistenceError::CapacityExhausted` if the group is full, or
/// `PersistenceError::NotFound` if the group does not exist.
pub fn reserve_seat(conn: &mut SqliteConnection, group_id: i64) -> Result<(), PersistenceError> {
    let affected = diesel::update(
        class_groups::table
            .filter(class_groups::group_id.eq(group_id))
            .filter(class_groups::current_enrollment.lt(class_groups::capacity_max)),
    )
    .set(class_groups::current_enrollment.eq(class_groups::current_enrollment + 1))
    .execute(conn)?;

    if affected == 0 {
        let exists: i64 = class_groups::table
            .filter(class_groups::group_id.eq(group_id))
            .count()
            .get_result(conn)?;
        if exists == 0 {
            return Err(PersistenceError::NotFound(format!("group {group_id}")));
        }
        return Err(PersistenceError::CapacityExhausted { group_id });
    }

    debug!(group_id, "Reserved seat");
    Ok(())
}

/// Releases one seat in a group.
///
/// The counter never goes below zero; releasing on an empty group is a
/// no-op.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the group does not exist.
pub fn release_seat(conn: &mut SqliteConnection, group_id: i64) -> Result<(), PersistenceError> {
    let affected = diesel::update(
        class_groups::table
            .filter(class_groups::group_id.eq(group_id))
            .filter(class_groups::current_enrollment.gt(0)),
    )
    .set(class_groups::current_enrollment.eq(class_groups::current_enrollment - 1))
    .execute(conn)?;

    if affected == 0 {
        let exists: i64 = class_groups::table
            .filter(class_groups::group_id.eq(group_id))
            .count()
            .get_result(conn)?;
        if exists == 0 {
            return Err(PersistenceError::NotFound(format!("group {group_id}")));
        }
    }

    debug!(group_id, "Released seat");
    Ok(())
}

/// Adds a student to a group's waitlist.
///
/// Joining is idempotent: a student already on the waitlist keeps their
/// position and `false` is returned.
///
/// # Errors
///
/// Returns an error if the group does not exist or the insert fails.
pub fn join_waitlist(
    conn: &mut SqliteConnection,
    group_id: i64,
    student_id: i64,
    joined_at: &str,
) -> Result<bool, PersistenceError> {
    let group_exists: i64 = class_groups::table
        .filter(class_groups::group_id.eq(group_id))
        .count()
        .get_result(conn)?;
    if group_exists == 0 {
        return Err(PersistenceError::NotFound(format!("group {group_id}")));
    }

    let already_listed: i64 = group_waitlist::table
        .filter(group_waitlist::group_id.eq(group_id))
        .filter(group_waitlist::student_id.eq(student_id))
        .count()
        .get_result(conn)?;
    if already_listed > 0 {
        return Ok(false);
    }

    diesel::insert_into(group_waitlist::table)
        .values((
            group_waitlist::group_id.eq(group_id),
            group_waitlist::student_id.eq(student_id),
            group_waitlist::joined_at.eq(joined_at),
        ))
        .execute(conn)?;

    Ok(true)
}

/// Removes a student from a group's waitlist.
///
/// Returns `false` if the student was not on the waitlist.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn leave_waitlist(
    conn: &mut SqliteConnection,
    group_id: i64,
    student_id: i64,
) -> Result<bool, PersistenceError> {
    let affected = diesel::delete(
        group_waitlist::table
            .filter(group_waitlist::group_id.eq(group_id))
            .filter(group_waitlist::student_id.eq(student_id)),
    )
    .execute(conn)?;

    Ok(affected > 0)
}
