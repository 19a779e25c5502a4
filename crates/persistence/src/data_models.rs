// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row types and conversions between stored rows and domain entities.
//!
//! Timestamps are stored as fixed-width UTC ISO 8601 text so lexicographic
//! comparison in SQL matches chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::PersistenceError;
use matricula_domain::{
    AcademicPeriod, ChangeRequest, Conflict, ConflictCategory, Enrollment, Group, HistoryAction,
    HistoryEntry, RequestState, RequestType, TimeSlot,
};

/// Serializable representation of an Actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorData {
    pub id: String,
    pub actor_type: String,
}

/// Serializable representation of a Cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CauseData {
    pub id: String,
    pub description: String,
}

/// Serializable representation of an Action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionData {
    pub name: String,
    pub details: Option<String>,
}

/// Serializable representation of a `StateSnapshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshotData {
    pub data: String,
}

#[derive(Debug, Clone, Queryable)]
pub struct PeriodRow {
    pub period_id: i64,
    pub start_date: String,
    pub end_date: String,
    pub enrollment_window_start: String,
    pub request_deadline: String,
    pub year: i32,
    pub term: i32,
    pub is_active: i32,
}

#[derive(Debug, Clone, Queryable)]
pub struct GroupRow {
    pub group_id: i64,
    pub course_id: i64,
    pub period_id: i64,
    pub instructor_id: i64,
    pub capacity_max: i32,
    pub current_enrollment: i32,
    pub schedules_json: String,
    pub is_active: i32,
}

#[derive(Debug, Clone, Queryable)]
pub struct EnrollmentRow {
    pub enrollment_id: i64,
    pub student_id: i64,
    pub group_id: i64,
    pub is_active: i32,
}

#[derive(Debug, Clone, Queryable)]
pub struct RequestRow {
    pub request_id: i64,
    pub code: String,
    pub request_type: String,
    pub state: String,
    pub student_id: i64,
    pub origin_enrollment_id: Option<i64>,
    pub destination_group_id: Option<i64>,
    pub destination_course_id: Option<i64>,
    pub period_id: i64,
    pub priority: i32,
    pub created_at: String,
    pub response_deadline: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Queryable)]
pub struct HistoryRow {
    pub history_id: i64,
    pub request_id: i64,
    pub action_json: String,
    pub recorded_at: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Queryable)]
pub struct ConflictRow {
    pub conflict_id: i64,
    pub category: String,
    pub description: String,
    pub student_id: i64,
    pub request_id: Option<i64>,
    pub group_id: Option<i64>,
    pub detected_at: String,
    pub is_resolved: i32,
    pub resolution_notes: Option<String>,
}

#[derive(Debug, Clone, Queryable)]
pub struct AuditEventRow {
    pub event_id: i64,
    pub actor_json: String,
    pub cause_json: String,
    pub action_json: String,
    pub before_snapshot_json: String,
    pub after_snapshot_json: String,
    pub period_id: Option<i64>,
    pub student_id: Option<i64>,
    pub created_at: String,
}

/// Formats a UTC instant as fixed-width ISO 8601 text for storage.
#[must_use]
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored ISO 8601 timestamp back into a UTC instant.
///
/// # Errors
///
/// Returns `PersistenceError::ReconstructionError` if the text is not a
/// valid ISO 8601 timestamp.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, PersistenceError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PersistenceError::ReconstructionError(format!("invalid timestamp {raw}: {e}")))
}

/// Reconstructs an `AcademicPeriod` from its stored row.
///
/// # Errors
///
/// Returns an error if timestamps cannot be parsed or the stored values
/// violate the period date invariants.
pub fn period_from_row(row: &PeriodRow) -> Result<AcademicPeriod, PersistenceError> {
    let year = u16::try_from(row.year)
        .map_err(|e| PersistenceError::ReconstructionError(format!("invalid year: {e}")))?;
    let term = u8::try_from(row.term)
        .map_err(|e| PersistenceError::ReconstructionError(format!("invalid term: {e}")))?;

    AcademicPeriod::with_id(
        row.period_id,
        parse_timestamp(&row.start_date)?,
        parse_timestamp(&row.end_date)?,
        parse_timestamp(&row.enrollment_window_start)?,
        parse_timestamp(&row.request_deadline)?,
        year,
        term,
        row.is_active != 0,
    )
    .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))
}

/// Reconstructs a `Group` from its stored row plus its waitlist.
///
/// # Errors
///
/// Returns an error if the schedule JSON cannot be deserialized or the
/// capacity counters violate the group invariants.
pub fn group_from_row(row: &GroupRow, waitlist: Vec<i64>) -> Result<Group, PersistenceError> {
    let schedules: Vec<TimeSlot> = serde_json::from_str(&row.schedules_json)?;

    Group::with_id(
        row.group_id,
        row.course_id,
        row.period_id,
        row.instructor_id,
        row.capacity_max,
        row.current_enrollment,
        schedules,
        waitlist,
        row.is_active != 0,
    )
    .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))
}

/// Reconstructs an `Enrollment` from its stored row.
#[must_use]
pub fn enrollment_from_row(row: &EnrollmentRow) -> Enrollment {
    Enrollment::with_id(
        row.enrollment_id,
        row.student_id,
        row.group_id,
        row.is_active != 0,
    )
}

/// Reconstructs a `ChangeRequest` from its stored row plus its history rows.
///
/// # Errors
///
/// Returns an error if enum strings, timestamps, or the history action JSON
/// cannot be parsed.
pub fn request_from_rows(
    row: &RequestRow,
    history_rows: &[HistoryRow],
) -> Result<ChangeRequest, PersistenceError> {
    let request_type = RequestType::from_str(&row.request_type)
        .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?;
    let state = RequestState::from_str(&row.state)
        .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?;
    let priority = u32::try_from(row.priority)
        .map_err(|e| PersistenceError::ReconstructionError(format!("invalid priority: {e}")))?;

    let mut history = Vec::with_capacity(history_rows.len());
    for entry in history_rows {
        let action: HistoryAction = serde_json::from_str(&entry.action_json)?;
        history.push(HistoryEntry::new(
            action,
            parse_timestamp(&entry.recorded_at)?,
            entry.notes.clone(),
        ));
    }

    Ok(ChangeRequest {
        request_id: Some(row.request_id),
        code: row.code.clone(),
        request_type,
        state,
        student_id: row.student_id,
        origin_enrollment_id: row.origin_enrollment_id,
        destination_group_id: row.destination_group_id,
        destination_course_id: row.destination_course_id,
        period_id: row.period_id,
        priority,
        created_at: parse_timestamp(&row.created_at)?,
        response_deadline: parse_timestamp(&row.response_deadline)?,
        updated_at: parse_timestamp(&row.updated_at)?,
        history,
    })
}

/// Reconstructs a `Conflict` from its stored row.
///
/// # Errors
///
/// Returns an error if the category string or timestamp cannot be parsed.
pub fn conflict_from_row(row: &ConflictRow) -> Result<Conflict, PersistenceError> {
    let category = ConflictCategory::from_str(&row.category)
        .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?;

    Ok(Conflict {
        conflict_id: Some(row.conflict_id),
        category,
        description: row.description.clone(),
        student_id: row.student_id,
        request_id: row.request_id,
        group_id: row.group_id,
        detected_at: parse_timestamp(&row.detected_at)?,
        resolved: row.is_resolved != 0,
        resolution_notes: row.resolution_notes.clone(),
    })
}
