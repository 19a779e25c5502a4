// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Change request queries and reporting.
//!
//! Date-range filters compare stored timestamp text directly; the
//! fixed-width storage format makes lexicographic order chronological.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::data_models::{HistoryRow, RequestRow, format_timestamp, request_from_rows};
use crate::diesel_schema::{change_requests, request_history};
use crate::error::PersistenceError;
use matricula_domain::{ChangeRequest, RequestState};

fn load_history(
    conn: &mut SqliteConnection,
    request_id: i64,
) -> Result<Vec<HistoryRow>, PersistenceError> {
    Ok(request_history::table
        .filter(request_history::request_id.eq(request_id))
        .order(request_history::history_id.asc())
        .load(conn)?)
}

fn load_request(
    conn: &mut SqliteConnection,
    row: &RequestRow,
) -> Result<ChangeRequest, PersistenceError> {
    let history = load_history(conn, row.request_id)?;
    request_from_rows(row, &history)
}

fn load_requests(
    conn: &mut SqliteConnection,
    rows: &[RequestRow],
) -> Result<Vec<ChangeRequest>, PersistenceError> {
    let mut requests = Vec::with_capacity(rows.len());
    for row in rows {
        requests.push(load_request(conn, row)?);
    }
    Ok(requests)
}

/// Retrieves a request by ID, including its full history.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the request does not exist.
pub fn get_request(
    conn: &mut SqliteConnection,
    request_id: i64,
) -> Result<ChangeRequest, PersistenceError> {
    let row: RequestRow = change_requests::table
        .filter(change_requests::request_id.eq(request_id))
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("request {request_id}")))?;

    load_request(conn, &row)
}

/// Retrieves a request by its generated code.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if no request carries the code.
pub fn get_request_by_code(
    conn: &mut SqliteConnection,
    code: &str,
) -> Result<ChangeRequest, PersistenceError> {
    let row: RequestRow = change_requests::table
        .filter(change_requests::code.eq(code))
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("request {code}")))?;

    load_request(conn, &row)
}

/// Lists a student's requests, most recent first.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be reconstructed.
pub fn list_requests_for_student(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Vec<ChangeRequest>, PersistenceError> {
    let rows: Vec<RequestRow> = change_requests::table
        .filter(change_requests::student_id.eq(student_id))
        .order(change_requests::created_at.desc())
        .load(conn)?;

    load_requests(conn, &rows)
}

/// Lists requests in any of the given states, most urgent first (ascending
/// priority, ties broken oldest first).
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be reconstructed.
pub fn list_requests_in_states(
    conn: &mut SqliteConnection,
    states: &[RequestState],
) -> Result<Vec<ChangeRequest>, PersistenceError> {
    let state_names: Vec<&str> = states.iter().map(RequestState::as_str).collect();
    let rows: Vec<RequestRow> = change_requests::table
        .filter(change_requests::state.eq_any(state_names))
        .order((
            change_requests::priority.asc(),
            change_requests::created_at.asc(),
        ))
        .load(conn)?;

    load_requests(conn, &rows)
}

/// Lists a period's requests created within `[from, to]`, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be reconstructed.
pub fn list_requests_for_period(
    conn: &mut SqliteConnection,
    period_id: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<ChangeRequest>, PersistenceError> {
    let rows: Vec<RequestRow> = change_requests::table
        .filter(change_requests::period_id.eq(period_id))
        .filter(change_requests::created_at.ge(format_timestamp(from)))
        .filter(change_requests::created_at.le(format_timestamp(to)))
        .order(change_requests::created_at.asc())
        .load(conn)?;

    load_requests(conn, &rows)
}

/// Counts a period's requests per lifecycle state.
///
/// Every state appears in the result, including those with zero requests.
///
/// # Errors
///
/// Returns an error if a count query fails.
pub fn count_requests_by_state(
    conn: &mut SqliteConnection,
    period_id: i64,
) -> Result<Vec<(RequestState, i64)>, PersistenceError> {
    let mut counts = Vec::with_capacity(RequestState::ALL.len());
    for state in RequestState::ALL {
        let count: i64 = change_requests::table
            .filter(change_requests::period_id.eq(period_id))
            .filter(change_requests::state.eq(state.as_str()))
            .count()
            .get_result(conn)?;
        counts.push((state, count));
    }
    Ok(counts)
}
