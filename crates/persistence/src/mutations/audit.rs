// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event persistence.

use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;

use crate::data_models::{ActionData, ActorData, CauseData, StateSnapshotData};
use crate::diesel_schema;
use crate::error::PersistenceError;
use crate::sqlite::get_last_insert_rowid;
use matricula_audit::AuditEvent;

/// Persists an audit event.
///
/// # Arguments
///
/// * `conn` - The active database connection
/// * `event` - The audit event to persist
/// * `recorded_at` - The event timestamp, already formatted for storage
///
/// # Returns
///
/// The event ID assigned by the database.
///
/// # Errors
///
/// Returns an error if persistence or serialization fails.
pub fn persist_audit_event(
    conn: &mut SqliteConnection,
    event: &AuditEvent,
    recorded_at: &str,
) -> Result<i64, PersistenceError> {
    let actor_data = ActorData {
        id: event.actor.id.clone(),
        actor_type: event.actor.actor_type.clone(),
    };

    let cause_data = CauseData {
        id: event.cause.id.clone(),
        description: event.cause.description.clone(),
    };

    let action_data = ActionData {
        name: event.action.name.clone(),
        details: event.action.details.clone(),
    };

    let before_data = StateSnapshotData {
        data: event.before.data.clone(),
    };

    let after_data = StateSnapshotData {
        data: event.after.data.clone(),
    };

    let actor_json: String = serde_json::to_string(&actor_data)?;
    let cause_json: String = serde_json::to_string(&cause_data)?;
    let action_json: String = serde_json::to_string(&action_data)?;
    let before_json: String = serde_json::to_string(&before_data)?;
    let after_json: String = serde_json::to_string(&after_data)?;

    diesel::insert_into(diesel_schema::audit_events::table)
        .values((
            diesel_schema::audit_events::actor_json.eq(actor_json),
            diesel_schema::audit_events::cause_json.eq(cause_json),
            diesel_schema::audit_events::action_json.eq(action_json),
            diesel_schema::audit_events::before_snapshot_json.eq(before_json),
            diesel_schema::audit_events::after_snapshot_json.eq(after_json),
            diesel_schema::audit_events::period_id.eq(event.period_id),
            diesel_schema::audit_events::student_id.eq(event.student_id),
            diesel_schema::audit_events::created_at.eq(recorded_at),
        ))
        .execute(conn)?;

    let event_id: i64 = get_last_insert_rowid(conn)?;

    debug!(event_id, action = %event.action.name, "Persisted audit event");

    Ok(event_id)
}
