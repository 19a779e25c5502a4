// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Change request lifecycle persistence.
//!
//! Each lifecycle operation is persisted as one transaction: the request
//! write, the history append, any seat movement, and the audit event all
//! commit together or not at all.
//!
//! Request writes are guarded by the `updated_at` column: the UPDATE only
//! matches the row if it still carries the timestamp the caller read. A
//! guard miss surfaces as `ConcurrencyConflict` and the caller decides
//! whether to reload and retry.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::{debug, info};

use crate::data_models::format_timestamp;
use crate::diesel_schema::{change_requests, enrollments, request_history};
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;
use crate::mutations::groups::{release_seat, reserve_seat};
use crate::sqlite::get_last_insert_rowid;
use matricula::TransitionResult;
use matricula_domain::{ChangeRequest, HistoryEntry, RequestType};

/// IDs assigned when a request transition is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistRequestResult {
    /// The request ID (newly assigned for creations).
    pub request_id: i64,
    /// The audit event ID.
    pub event_id: i64,
}

fn insert_history_entry(
    conn: &mut SqliteConnection,
    request_id: i64,
    entry: &HistoryEntry,
) -> Result<(), PersistenceError> {
    let action_json: String = serde_json::to_string(&entry.action)?;

    diesel::insert_into(request_history::table)
        .values((
            request_history::request_id.eq(request_id),
            request_history::action_json.eq(action_json),
            request_history::recorded_at.eq(format_timestamp(entry.recorded_at)),
            request_history::notes.eq(entry.notes.clone()),
        ))
        .execute(conn)?;

    Ok(())
}

fn persisted_request_id(request: &ChangeRequest) -> Result<i64, PersistenceError> {
    request.request_id.ok_or_else(|| {
        PersistenceError::ReconstructionError(
            "request must have a request_id to be transitioned".to_string(),
        )
    })
}

fn priority_column(priority: u32) -> Result<i32, PersistenceError> {
    i32::try_from(priority)
        .map_err(|e| PersistenceError::SerializationError(format!("priority out of range: {e}")))
}

/// Applies the guarded request write shared by updates, state changes, and
/// approvals. Returns `ConcurrencyConflict` if the row moved on since the
/// caller read it.
fn guarded_request_write(
    conn: &mut SqliteConnection,
    request: &ChangeRequest,
    request_id: i64,
    expected_updated_at: DateTime<Utc>,
) -> Result<(), PersistenceError> {
    let affected = diesel::update(
        change_requests::table
            .filter(change_requests::request_id.eq(request_id))
            .filter(change_requests::updated_at.eq(format_timestamp(expected_updated_at))),
    )
    .set((
        change_requests::state.eq(request.state.as_str()),
        change_requests::destination_group_id.eq(request.destination_group_id),
        change_requests::destination_course_id.eq(request.destination_course_id),
        change_requests::priority.eq(priority_column(request.priority)?),
        change_requests::updated_at.eq(format_timestamp(request.updated_at)),
    ))
    .execute(conn)?;

    if affected == 0 {
        let exists: i64 = change_requests::table
            .filter(change_requests::request_id.eq(request_id))
            .count()
            .get_result(conn)?;
        if exists == 0 {
            return Err(PersistenceError::NotFound(format!("request {request_id}")));
        }
        return Err(PersistenceError::ConcurrencyConflict {
            resource: format!("request {request_id}"),
        });
    }

    Ok(())
}

/// Persists a newly created request with its history and audit event.
///
/// # Errors
///
/// Returns an error if any insert fails (e.g., a duplicate request code).
pub fn insert_request(
    conn: &mut SqliteConnection,
    result: &TransitionResult,
) -> Result<PersistRequestResult, PersistenceError> {
    let request = &result.request;

    conn.transaction(|conn| {
        diesel::insert_into(change_requests::table)
            .values((
                change_requests::code.eq(request.code.clone()),
                change_requests::request_type.eq(request.request_type.as_str()),
                change_requests::state.eq(request.state.as_str()),
                change_requests::student_id.eq(request.student_id),
                change_requests::origin_enrollment_id.eq(request.origin_enrollment_id),
                change_requests::destination_group_id.eq(request.destination_group_id),
                change_requests::destination_course_id.eq(request.destination_course_id),
                change_requests::period_id.eq(request.period_id),
                change_requests::priority.eq(priority_column(request.priority)?),
                change_requests::created_at.eq(format_timestamp(request.created_at)),
                change_requests::response_deadline.eq(format_timestamp(request.response_deadline)),
                change_requests::updated_at.eq(format_timestamp(request.updated_at)),
            ))
            .execute(conn)?;

        let request_id: i64 = get_last_insert_rowid(conn)?;

        for entry in &request.history {
            insert_history_entry(conn, request_id, entry)?;
        }

        let event_id = persist_audit_event(
            conn,
            &result.audit_event,
            &format_timestamp(request.created_at),
        )?;

        info!(request_id, code = %request.code, "Persisted new request");

        Ok(PersistRequestResult {
            request_id,
            event_id,
        })
    })
}

/// Persists an edit or a non-approval state change.
///
/// The write is guarded against concurrent modification and appends the
/// newest history entry alongside the audit event.
///
/// # Arguments
///
/// * `conn` - The active database connection
/// * `result` - The transitioned request plus its audit event
/// * `expected_updated_at` - The `updated_at` value the caller read before
///   running the transition
///
/// # Returns
///
/// The audit event ID.
///
/// # Errors
///
/// Returns `PersistenceError::ConcurrencyConflict` if the request changed
/// since it was read, or `PersistenceError::NotFound` if it was deleted.
pub fn persist_request_transition(
    conn: &mut SqliteConnection,
    result: &TransitionResult,
    expected_updated_at: DateTime<Utc>,
) -> Result<i64, PersistenceError> {
    let request = &result.request;
    let request_id = persisted_request_id(request)?;

    conn.transaction(|conn| {
        guarded_request_write(conn, request, request_id, expected_updated_at)?;

        if let Some(entry) = request.last_history_entry() {
            insert_history_entry(conn, request_id, entry)?;
        }

        let event_id = persist_audit_event(
            conn,
            &result.audit_event,
            &format_timestamp(request.updated_at),
        )?;

        debug!(request_id, state = %request.state, "Persisted request transition");

        Ok(event_id)
    })
}

/// Persists an approval: seat movement, the state write, the history
/// append, and the audit event commit as one transaction.
///
/// Seat movement depends on the request shape:
/// - A destination group gets one seat reserved (failing the whole
///   transaction if the group filled up since validation).
/// - An active origin enrollment has its seat released. For withdrawals the
///   enrollment is deactivated; otherwise it is repointed at the
///   destination group.
///
/// # Arguments
///
/// * `conn` - The active database connection
/// * `result` - The approved request plus its audit event
/// * `expected_updated_at` - The `updated_at` value the caller read before
///   running the transition
///
/// # Returns
///
/// The audit event ID.
///
/// # Errors
///
/// Returns `CapacityExhausted` if the destination filled up,
/// `ConcurrencyConflict` if the request changed since it was read, or
/// `NotFound` if a referenced row is missing.
pub fn approve_request(
    conn: &mut SqliteConnection,
    result: &TransitionResult,
    expected_updated_at: DateTime<Utc>,
) -> Result<i64, PersistenceError> {
    let request = &result.request;
    let request_id = persisted_request_id(request)?;

    conn.transaction(|conn| {
        guarded_request_write(conn, request, request_id, expected_updated_at)?;

        if let Some(destination_group_id) = request.destination_group_id {
            reserve_seat(conn, destination_group_id)?;
        }

        if let Some(enrollment_id) = request.origin_enrollment_id {
            let origin: (i64, i32) = enrollments::table
                .filter(enrollments::enrollment_id.eq(enrollment_id))
                .select((enrollments::group_id, enrollments::is_active))
                .first(conn)
                .optional()?
                .ok_or_else(|| {
                    PersistenceError::NotFound(format!("enrollment {enrollment_id}"))
                })?;

            let (origin_group_id, is_active) = origin;
            if is_active != 0 {
                release_seat(conn, origin_group_id)?;

                if request.request_type == RequestType::Withdrawal {
                    diesel::update(
                        enrollments::table.filter(enrollments::enrollment_id.eq(enrollment_id)),
                    )
                    .set(enrollments::is_active.eq(0))
                    .execute(conn)?;
                } else if let Some(destination_group_id) = request.destination_group_id {
                    diesel::update(
                        enrollments::table.filter(enrollments::enrollment_id.eq(enrollment_id)),
                    )
                    .set(enrollments::group_id.eq(destination_group_id))
                    .execute(conn)?;
                }
            }
        }

        if let Some(entry) = request.last_history_entry() {
            insert_history_entry(conn, request_id, entry)?;
        }

        let event_id = persist_audit_event(
            conn,
            &result.audit_event,
            &format_timestamp(request.updated_at),
        )?;

        info!(request_id, code = %request.code, "Approved request");

        Ok(event_id)
    })
}

/// Deletes a request and its history.
///
/// The lifecycle layer validates that only pending requests reach this
/// point. History rows are removed by the `ON DELETE CASCADE` constraint.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the request does not exist.
pub fn delete_request(
    conn: &mut SqliteConnection,
    request_id: i64,
) -> Result<(), PersistenceError> {
    let affected = diesel::delete(
        change_requests::table.filter(change_requests::request_id.eq(request_id)),
    )
    .execute(conn)?;

    if affected == 0 {
        return Err(PersistenceError::NotFound(format!("request {request_id}")));
    }

    info!(request_id, "Deleted request");
    Ok(())
}
