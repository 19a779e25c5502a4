// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Enrollment mutations.

use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::diesel_schema::enrollments;
use crate::error::PersistenceError;
use crate::sqlite::get_last_insert_rowid;
use matricula_domain::Enrollment;

/// Inserts a new enrollment.
///
/// Seeding an enrollment does not touch the group's seat counter; callers
/// reserve the seat separately so counter movement stays in one place.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_enrollment(
    conn: &mut SqliteConnection,
    enrollment: &Enrollment,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(enrollments::table)
        .values((
            enrollments::student_id.eq(enrollment.student_id),
            enrollments::group_id.eq(enrollment.group_id),
            enrollments::is_active.eq(i32::from(enrollment.active)),
        ))
        .execute(conn)?;

    get_last_insert_rowid(conn)
}
