// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Academic period mutations.

use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::info;

use crate::data_models::format_timestamp;
use crate::diesel_schema::academic_periods;
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;
use crate::sqlite::get_last_insert_rowid;
use matricula_audit::AuditEvent;
use matricula_domain::AcademicPeriod;

/// Inserts a new academic period.
///
/// New periods are always inserted inactive; activation is a separate,
/// audited operation.
///
/// # Errors
///
/// Returns an error if the insert fails (e.g., a period for the same year
/// and term already exists).
pub fn insert_period(
    conn: &mut SqliteConnection,
    period: &AcademicPeriod,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(academic_periods::table)
        .values((
            academic_periods::start_date.eq(format_timestamp(period.start)),
            academic_periods::end_date.eq(format_timestamp(period.end)),
            academic_periods::enrollment_window_start
                .eq(format_timestamp(period.enrollment_window_start)),
            academic_periods::request_deadline.eq(format_timestamp(period.request_deadline)),
            academic_periods::year.eq(i32::from(period.year)),
            academic_periods::term.eq(i32::from(period.term)),
            academic_periods::is_active.eq(0),
        ))
        .execute(conn)?;

    get_last_insert_rowid(conn)
}

/// Activates a period, deactivating whichever period was active before.
///
/// Both flag writes and the audit event are one transaction, so the
/// single-active-period invariant holds at every commit point.
///
/// # Arguments
///
/// * `conn` - The active database connection
/// * `period_id` - The period to activate
/// * `event` - The audit event recording the activation
/// * `recorded_at` - The event timestamp, already formatted for storage
///
/// # Returns
///
/// The event ID assigned to the audit event.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the period does not exist.
pub fn activate_period(
    conn: &mut SqliteConnection,
    period_id: i64,
    event: &AuditEvent,
    recorded_at: &str,
) -> Result<i64, PersistenceError> {
    conn.transaction(|conn| {
        diesel::update(academic_periods::table.filter(academic_periods::is_active.eq(1)))
            .set(academic_periods::is_active.eq(0))
            .execute(conn)?;

        let affected = diesel::update(
            academic_periods::table.filter(academic_periods::period_id.eq(period_id)),
        )
        .set(academic_periods::is_active.eq(1))
        .execute(conn)?;

        if affected == 0 {
            return Err(PersistenceError::NotFound(format!("period {period_id}")));
        }

        let event_id = persist_audit_event(conn, event, recorded_at)?;

        info!(period_id, "Activated academic period");

        Ok(event_id)
    })
}
