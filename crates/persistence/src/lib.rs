// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the Matricula schedule-change system.
//!
//! This crate provides `SQLite` persistence, via Diesel with embedded
//! migrations, for academic periods, groups, enrollments, change requests,
//! conflicts, and audit events.
//!
//! ## Transaction Boundaries
//!
//! Multi-step lifecycle operations are persisted atomically:
//!
//! - Creating a request writes the request row, its creation history entry,
//!   and the audit event as one transaction.
//! - Approving a request moves seats (reserve destination, release origin),
//!   writes the state, appends history, and records the audit event as one
//!   transaction.
//! - Activating a period swaps the active flag off the previous period and
//!   onto the new one as one transaction.
//!
//! ## Concurrency
//!
//! Seat counters are mutated with single conditional UPDATE statements, so
//! the capacity invariant holds under concurrent writers. Request writes are
//! guarded by the `updated_at` column and surface
//! [`PersistenceError::ConcurrencyConflict`] when the row changed since it
//! was read.
//!
//! ## Testing
//!
//! Tests run against unique shared in-memory `SQLite` databases; no external
//! infrastructure is required.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use chrono::{DateTime, Utc};
use diesel::SqliteConnection;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use matricula::TransitionResult;
use matricula_audit::AuditEvent;
use matricula_domain::{
    AcademicPeriod, ChangeRequest, Conflict, Enrollment, Group, RequestState, TimeSlot,
};

mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;
mod sqlite;

#[cfg(test)]
mod tests;

pub use error::PersistenceError;
pub use mutations::PersistRequestResult;

use data_models::format_timestamp;

/// Atomic counter for generating unique in-memory database names.
///
/// This ensures deterministic test isolation by eliminating time-based collisions.
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persistence adapter for the schedule-change system.
pub struct Persistence {
    conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter,
    /// ensuring deterministic test isolation without time-based collisions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let db_name = format!("memdb_test_{db_id}");
        let shared_memory_url = format!("file:{db_name}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = sqlite::initialize_database(&shared_memory_url)?;
        sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = sqlite::initialize_database(path_str)?;

        // WAL mode for better read concurrency on file-based databases
        sqlite::enable_wal_mode(&mut conn)?;
        sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    // ========================================================================
    // Academic Periods
    // ========================================================================

    /// Inserts a new (inactive) academic period.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_period(&mut self, period: &AcademicPeriod) -> Result<i64, PersistenceError> {
        mutations::periods::insert_period(&mut self.conn, period)
    }

    /// Activates a period, deactivating the previously active one, and
    /// records the audit event — all in one transaction.
    ///
    /// # Returns
    ///
    /// The audit event ID.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the period does not exist.
    pub fn activate_period(
        &mut self,
        period_id: i64,
        event: &AuditEvent,
        recorded_at: DateTime<Utc>,
    ) -> Result<i64, PersistenceError> {
        mutations::periods::activate_period(
            &mut self.conn,
            period_id,
            event,
            &format_timestamp(recorded_at),
        )
    }

    /// Retrieves a period by ID.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the period does not exist.
    pub fn get_period(&mut self, period_id: i64) -> Result<AcademicPeriod, PersistenceError> {
        queries::periods::get_period(&mut self.conn, period_id)
    }

    /// Retrieves the active period, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn get_active_period(&mut self) -> Result<Option<AcademicPeriod>, PersistenceError> {
        queries::periods::get_active_period(&mut self.conn)
    }

    /// Lists all periods, newest year and term first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn list_periods(&mut self) -> Result<Vec<AcademicPeriod>, PersistenceError> {
        queries::periods::list_periods(&mut self.conn)
    }

    // ========================================================================
    // Groups & Waitlists
    // ========================================================================

    /// Inserts a new group.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_group(&mut self, group: &Group) -> Result<i64, PersistenceError> {
        mutations::groups::insert_group(&mut self.conn, group)
    }

    /// Retrieves a group by ID, including its waitlist.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the group does not exist.
    pub fn get_group(&mut self, group_id: i64) -> Result<Group, PersistenceError> {
        queries::groups::get_group(&mut self.conn, group_id)
    }

    /// Lists all active groups for a period.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn list_groups_for_period(
        &mut self,
        period_id: i64,
    ) -> Result<Vec<Group>, PersistenceError> {
        queries::groups::list_groups_for_period(&mut self.conn, period_id)
    }

    /// Reserves one seat in a group with a single conditional update.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::CapacityExhausted` if the group is full.
    pub fn reserve_seat(&mut self, group_id: i64) -> Result<(), PersistenceError> {
        mutations::groups::reserve_seat(&mut self.conn, group_id)
    }

    /// Releases one seat in a group; the counter never goes below zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn release_seat(&mut self, group_id: i64) -> Result<(), PersistenceError> {
        mutations::groups::release_seat(&mut self.conn, group_id)
    }

    /// Adds a student to a group's waitlist. Idempotent; returns `false` if
    /// the student was already listed.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the group does not exist.
    pub fn join_waitlist(
        &mut self,
        group_id: i64,
        student_id: i64,
        joined_at: DateTime<Utc>,
    ) -> Result<bool, PersistenceError> {
        mutations::groups::join_waitlist(
            &mut self.conn,
            group_id,
            student_id,
            &format_timestamp(joined_at),
        )
    }

    /// Removes a student from a group's waitlist. Returns `false` if they
    /// were not on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn leave_waitlist(
        &mut self,
        group_id: i64,
        student_id: i64,
    ) -> Result<bool, PersistenceError> {
        mutations::groups::leave_waitlist(&mut self.conn, group_id, student_id)
    }

    /// Returns a student's 1-indexed waitlist position, or `None` if they
    /// are not on the waitlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn waitlist_position(
        &mut self,
        group_id: i64,
        student_id: i64,
    ) -> Result<Option<usize>, PersistenceError> {
        queries::groups::waitlist_position(&mut self.conn, group_id, student_id)
    }

    // ========================================================================
    // Enrollments
    // ========================================================================

    /// Inserts a new enrollment.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_enrollment(&mut self, enrollment: &Enrollment) -> Result<i64, PersistenceError> {
        mutations::enrollments::insert_enrollment(&mut self.conn, enrollment)
    }

    /// Retrieves an enrollment by ID.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the enrollment does not exist.
    pub fn get_enrollment(&mut self, enrollment_id: i64) -> Result<Enrollment, PersistenceError> {
        queries::enrollments::get_enrollment(&mut self.conn, enrollment_id)
    }

    /// Lists a student's active enrollments.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn list_active_enrollments(
        &mut self,
        student_id: i64,
    ) -> Result<Vec<Enrollment>, PersistenceError> {
        queries::enrollments::list_active_enrollments(&mut self.conn, student_id)
    }

    /// Collects the weekly slots from the groups a student is actively
    /// enrolled in, optionally excluding the enrollment being vacated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn enrolled_slots(
        &mut self,
        student_id: i64,
        exclude_enrollment: Option<i64>,
    ) -> Result<Vec<TimeSlot>, PersistenceError> {
        queries::enrollments::enrolled_slots(&mut self.conn, student_id, exclude_enrollment)
    }

    // ========================================================================
    // Change Requests
    // ========================================================================

    /// Persists a newly created request with its history and audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn persist_new_request(
        &mut self,
        result: &TransitionResult,
    ) -> Result<PersistRequestResult, PersistenceError> {
        mutations::requests::insert_request(&mut self.conn, result)
    }

    /// Persists an edit or a non-approval state change, guarded against
    /// concurrent modification.
    ///
    /// # Arguments
    ///
    /// * `result` - The transitioned request plus its audit event
    /// * `expected_updated_at` - The `updated_at` value read before the
    ///   transition was computed
    ///
    /// # Returns
    ///
    /// The audit event ID.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::ConcurrencyConflict` if the request
    /// changed since it was read.
    pub fn persist_request_transition(
        &mut self,
        result: &TransitionResult,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<i64, PersistenceError> {
        mutations::requests::persist_request_transition(&mut self.conn, result, expected_updated_at)
    }

    /// Persists an approval: seat movement, the state write, the history
    /// append, and the audit event as one transaction.
    ///
    /// # Arguments
    ///
    /// * `result` - The approved request plus its audit event
    /// * `expected_updated_at` - The `updated_at` value read before the
    ///   transition was computed
    ///
    /// # Returns
    ///
    /// The audit event ID.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExhausted` if the destination filled up since
    /// validation, or `ConcurrencyConflict` if the request changed since it
    /// was read.
    pub fn approve_request(
        &mut self,
        result: &TransitionResult,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<i64, PersistenceError> {
        mutations::requests::approve_request(&mut self.conn, result, expected_updated_at)
    }

    /// Deletes a request and its history.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the request does not exist.
    pub fn delete_request(&mut self, request_id: i64) -> Result<(), PersistenceError> {
        mutations::requests::delete_request(&mut self.conn, request_id)
    }

    /// Retrieves a request by ID, including its full history.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the request does not exist.
    pub fn get_request(&mut self, request_id: i64) -> Result<ChangeRequest, PersistenceError> {
        queries::requests::get_request(&mut self.conn, request_id)
    }

    /// Retrieves a request by its generated code.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if no request carries the code.
    pub fn get_request_by_code(&mut self, code: &str) -> Result<ChangeRequest, PersistenceError> {
        queries::requests::get_request_by_code(&mut self.conn, code)
    }

    /// Lists a student's requests, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn list_requests_for_student(
        &mut self,
        student_id: i64,
    ) -> Result<Vec<ChangeRequest>, PersistenceError> {
        queries::requests::list_requests_for_student(&mut self.conn, student_id)
    }

    /// Lists requests in any of the given states, most urgent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn list_requests_in_states(
        &mut self,
        states: &[RequestState],
    ) -> Result<Vec<ChangeRequest>, PersistenceError> {
        queries::requests::list_requests_in_states(&mut self.conn, states)
    }

    /// Lists a period's requests created within `[from, to]`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn list_requests_for_period(
        &mut self,
        period_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ChangeRequest>, PersistenceError> {
        queries::requests::list_requests_for_period(&mut self.conn, period_id, from, to)
    }

    /// Counts a period's requests per lifecycle state, including zeroes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn count_requests_by_state(
        &mut self,
        period_id: i64,
    ) -> Result<Vec<(RequestState, i64)>, PersistenceError> {
        queries::requests::count_requests_by_state(&mut self.conn, period_id)
    }

    // ========================================================================
    // Conflicts
    // ========================================================================

    /// Inserts a conflict record.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_conflict(&mut self, conflict: &Conflict) -> Result<i64, PersistenceError> {
        mutations::conflicts::insert_conflict(&mut self.conn, conflict)
    }

    /// Rewrites a conflict's descriptor fields in place.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the conflict does not exist.
    pub fn update_conflict(
        &mut self,
        conflict_id: i64,
        conflict: &Conflict,
    ) -> Result<(), PersistenceError> {
        mutations::conflicts::update_conflict(&mut self.conn, conflict_id, conflict)
    }

    /// Deletes a conflict record.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the conflict does not exist.
    pub fn delete_conflict(&mut self, conflict_id: i64) -> Result<(), PersistenceError> {
        mutations::conflicts::delete_conflict(&mut self.conn, conflict_id)
    }

    /// Marks a conflict as resolved.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the conflict does not exist.
    pub fn resolve_conflict(
        &mut self,
        conflict_id: i64,
        resolution_notes: Option<&str>,
    ) -> Result<(), PersistenceError> {
        mutations::conflicts::resolve_conflict(&mut self.conn, conflict_id, resolution_notes)
    }

    /// Retrieves a conflict by ID.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the conflict does not exist.
    pub fn get_conflict(&mut self, conflict_id: i64) -> Result<Conflict, PersistenceError> {
        queries::conflicts::get_conflict(&mut self.conn, conflict_id)
    }

    /// Lists conflicts attached to a request, oldest detection first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn list_conflicts_for_request(
        &mut self,
        request_id: i64,
    ) -> Result<Vec<Conflict>, PersistenceError> {
        queries::conflicts::list_conflicts_for_request(&mut self.conn, request_id)
    }

    /// Lists conflicts, optionally filtered by student and resolution state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn list_conflicts(
        &mut self,
        student_id: Option<i64>,
        resolved: Option<bool>,
    ) -> Result<Vec<Conflict>, PersistenceError> {
        queries::conflicts::list_conflicts(&mut self.conn, student_id, resolved)
    }

    // ========================================================================
    // Audit Events
    // ========================================================================

    /// Persists an audit event.
    ///
    /// # Returns
    ///
    /// The event ID assigned by the database.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn persist_audit_event(
        &mut self,
        event: &AuditEvent,
        recorded_at: DateTime<Utc>,
    ) -> Result<i64, PersistenceError> {
        mutations::audit::persist_audit_event(&mut self.conn, event, &format_timestamp(recorded_at))
    }

    /// Retrieves an audit event by ID.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::EventNotFound` if the event does not exist.
    pub fn get_audit_event(&mut self, event_id: i64) -> Result<AuditEvent, PersistenceError> {
        queries::audit::get_audit_event(&mut self.conn, event_id)
    }

    /// Lists all audit events scoped to a period, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn list_events_for_period(
        &mut self,
        period_id: i64,
    ) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::audit::list_events_for_period(&mut self.conn, period_id)
    }

    /// Lists all audit events scoped to a student, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn list_events_for_student(
        &mut self,
        student_id: i64,
    ) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::audit::list_events_for_student(&mut self.conn, student_id)
    }
}
