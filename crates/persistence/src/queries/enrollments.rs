// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Enrollment queries.

use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::data_models::{EnrollmentRow, enrollment_from_row};
use crate::diesel_schema::{class_groups, enrollments};
use crate::error::PersistenceError;
use matricula_domain::{Enrollment, TimeSlot};

/// Retrieves an enrollment by ID.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the enrollment does not exist.
pub fn get_enrollment(
    conn: &mut SqliteConnection,
    enrollment_id: i64,
) -> Result<Enrollment, PersistenceError> {
    let row: EnrollmentRow = enrollments::table
        .filter(enrollments::enrollment_id.eq(enrollment_id))
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("enrollment {enrollment_id}")))?;

    Ok(enrollment_from_row(&row))
}

/// Lists a student's active enrollments.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_active_enrollments(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Vec<Enrollment>, PersistenceError> {
    let rows: Vec<EnrollmentRow> = enrollments::table
        .filter(enrollments::student_id.eq(student_id))
        .filter(enrollments::is_active.eq(1))
        .order(enrollments::enrollment_id.asc())
        .load(conn)?;

    Ok(rows.iter().map(enrollment_from_row).collect())
}

/// Collects the weekly slots from the groups a student is actively
/// enrolled in. This is the enrolled side fed to the overlap detector.
///
/// When a request names the enrollment being vacated, pass it as
/// `exclude_enrollment` so the slots the student is leaving behind do not
/// count against the candidate schedule.
///
/// # Errors
///
/// Returns an error if the query fails or a schedule cannot be
/// deserialized.
pub fn enrolled_slots(
    conn: &mut SqliteConnection,
    student_id: i64,
    exclude_enrollment: Option<i64>,
) -> Result<Vec<TimeSlot>, PersistenceError> {
    let mut query = enrollments::table
        .select(enrollments::group_id)
        .filter(enrollments::student_id.eq(student_id))
        .filter(enrollments::is_active.eq(1))
        .into_boxed();
    if let Some(enrollment_id) = exclude_enrollment {
        query = query.filter(enrollments::enrollment_id.ne(enrollment_id));
    }
    let group_ids: Vec<i64> = query.load(conn)?;

    let schedules: Vec<String> = class_groups::table
        .filter(class_groups::group_id.eq_any(group_ids))
        .select(class_groups::schedules_json)
        .load(conn)?;

    let mut slots = Vec::new();
    for schedules_json in &schedules {
        let mut group_slots: Vec<TimeSlot> = serde_json::from_str(schedules_json)?;
        slots.append(&mut group_slots);
    }

    Ok(slots)
}
