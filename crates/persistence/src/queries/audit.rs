// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event retrieval.

use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::data_models::{ActionData, ActorData, AuditEventRow, CauseData, StateSnapshotData};
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;
use matricula_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};

fn event_from_row(row: &AuditEventRow) -> Result<AuditEvent, PersistenceError> {
    let actor: ActorData = serde_json::from_str(&row.actor_json)?;
    let cause: CauseData = serde_json::from_str(&row.cause_json)?;
    let action: ActionData = serde_json::from_str(&row.action_json)?;
    let before: StateSnapshotData = serde_json::from_str(&row.before_snapshot_json)?;
    let after: StateSnapshotData = serde_json::from_str(&row.after_snapshot_json)?;

    Ok(AuditEvent::new(
        Actor::new(actor.id, actor.actor_type),
        Cause::new(cause.id, cause.description),
        Action::new(action.name, action.details),
        StateSnapshot::new(before.data),
        StateSnapshot::new(after.data),
        row.period_id,
        row.student_id,
    ))
}

/// Retrieves an audit event by ID.
///
/// # Errors
///
/// Returns `PersistenceError::EventNotFound` if the event does not exist.
pub fn get_audit_event(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<AuditEvent, PersistenceError> {
    let row: AuditEventRow = audit_events::table
        .filter(audit_events::event_id.eq(event_id))
        .first(conn)
        .optional()?
        .ok_or(PersistenceError::EventNotFound(event_id))?;

    event_from_row(&row)
}

/// Lists all audit events scoped to a period, in insertion order.
///
/// # Errors
///
/// Returns an error if the query fails or an event cannot be deserialized.
pub fn list_events_for_period(
    conn: &mut SqliteConnection,
    period_id: i64,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    let rows: Vec<AuditEventRow> = audit_events::table
        .filter(audit_events::period_id.eq(period_id))
        .order(audit_events::event_id.asc())
        .load(conn)?;

    rows.iter().map(event_from_row).collect()
}

/// Lists all audit events scoped to a student, in insertion order.
///
/// # Errors
///
/// Returns an error if the query fails or an event cannot be deserialized.
pub fn list_events_for_student(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    let rows: Vec<AuditEventRow> = audit_events::table
        .filter(audit_events::student_id.eq(student_id))
        .order(audit_events::event_id.asc())
        .load(conn)?;

    rows.iter().map(event_from_row).collect()
}
