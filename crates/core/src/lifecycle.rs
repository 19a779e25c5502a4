// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The request lifecycle engine.
//!
//! Functions here are pure: they take the loaded entities and the caller's
//! clock value, validate the operation, and return the mutated request plus
//! the audit event recording it. Nothing is persisted here; the caller hands
//! the result to the persistence layer, which makes seat movement and the
//! state write one atomic unit.

use chrono::{DateTime, Utc};

use crate::capacity;
use crate::codegen::generate_request_code;
use crate::error::CoreError;
use matricula_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use matricula_domain::{
    AcademicPeriod, ChangeRequest, Conflict, ConflictCategory, DomainError, Group, HistoryAction,
    HistoryEntry, RequestState, RequestType, TimeSlot, can_accept_requests,
    find_conflicting_pairs, validate_request_references, validate_state_transition,
};

/// Default number of business days staff have to respond to a request.
pub const DEFAULT_RESPONSE_BUSINESS_DAYS: u32 = 5;

/// Input data for creating a change request.
///
/// This is intent as data only; identifiers are resolved by the caller
/// before the lifecycle is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    /// The type of change requested.
    pub request_type: RequestType,
    /// The requesting student.
    pub student_id: i64,
    /// The origin enrollment being moved away from, if any.
    pub origin_enrollment_id: Option<i64>,
    /// The destination group, if any.
    pub destination_group_id: Option<i64>,
    /// The destination course, if any.
    pub destination_course_id: Option<i64>,
    /// Priority; lower values are more urgent.
    pub priority: u32,
    /// Free-text notes from the student.
    pub notes: Option<String>,
}

/// Mutable fields of a request that an update may change.
///
/// `None` leaves the field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestChanges {
    /// New destination group.
    pub destination_group_id: Option<i64>,
    /// New destination course.
    pub destination_course_id: Option<i64>,
    /// New priority.
    pub priority: Option<u32>,
    /// Notes recorded on the update history entry.
    pub notes: Option<String>,
}

/// The result of a successful lifecycle operation.
///
/// Operations are atomic: they either succeed completely or fail without
/// side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The request after the operation.
    pub request: ChangeRequest,
    /// The audit event recording this operation.
    pub audit_event: AuditEvent,
}

fn snapshot_of(request: &ChangeRequest) -> StateSnapshot {
    StateSnapshot::new(format!(
        "code={},state={},destination_group={:?}",
        request.code, request.state, request.destination_group_id
    ))
}

fn require_open_period(period: &AcademicPeriod, now: DateTime<Utc>) -> Result<i64, DomainError> {
    if !period.active {
        return Err(DomainError::PeriodClosed {
            reason: String::from("no active academic period"),
        });
    }
    if !can_accept_requests(period, now) {
        return Err(DomainError::PeriodClosed {
            reason: format!(
                "request deadline {} has passed",
                period.request_deadline
            ),
        });
    }
    period.period_id.ok_or(DomainError::NotFound {
        entity: "period",
        id: String::from("unpersisted"),
    })
}

fn require_destination_capacity(
    destination_group_id: Option<i64>,
    destination: Option<&Group>,
) -> Result<(), DomainError> {
    let Some(group_id) = destination_group_id else {
        return Ok(());
    };
    let Some(group) = destination else {
        return Err(DomainError::NotFound {
            entity: "group",
            id: group_id.to_string(),
        });
    };
    if !capacity::has_available_capacity(group) {
        return Err(DomainError::CapacityExceeded {
            group_id,
            capacity_max: group.capacity_max,
        });
    }
    Ok(())
}

/// Creates a change request.
///
/// Requires an active period whose request deadline has not passed, valid
/// references for the request type, and available capacity on the
/// destination group if one is named. Generates the request code, stamps
/// creation and update timestamps from the caller's clock, computes the
/// response deadline in business days, and seeds the history log with the
/// creation entry.
///
/// # Arguments
///
/// * `input` - The request intent
/// * `period` - The resolved active academic period
/// * `destination` - The destination group, loaded if `input` names one
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
/// * `now` - The caller's clock value
/// * `response_business_days` - Business days granted for the staff response
///
/// # Errors
///
/// Returns an error if:
/// - The period is inactive or past its request deadline
/// - The request references are inconsistent with its type
/// - The destination group is missing or full
pub fn create_request(
    input: NewRequest,
    period: &AcademicPeriod,
    destination: Option<&Group>,
    actor: Actor,
    cause: Cause,
    now: DateTime<Utc>,
    response_business_days: u32,
) -> Result<TransitionResult, CoreError> {
    let period_id = require_open_period(period, now)?;

    validate_request_references(
        input.request_type,
        input.origin_enrollment_id,
        input.destination_group_id,
        input.destination_course_id,
    )?;
    require_destination_capacity(input.destination_group_id, destination)?;

    if let Some(group) = destination
        && group.period_id != period_id
    {
        return Err(CoreError::DomainViolation(DomainError::BusinessRule {
            rule: "destination_period_mismatch",
            message: format!(
                "destination group belongs to period {}, not the active period {period_id}",
                group.period_id
            ),
        }));
    }

    let code = generate_request_code(now);
    let request = ChangeRequest {
        request_id: None,
        code,
        request_type: input.request_type,
        state: RequestState::Pending,
        student_id: input.student_id,
        origin_enrollment_id: input.origin_enrollment_id,
        destination_group_id: input.destination_group_id,
        destination_course_id: input.destination_course_id,
        period_id,
        priority: input.priority,
        created_at: now,
        response_deadline: matricula_domain::add_business_days(now, response_business_days),
        updated_at: now,
        history: vec![HistoryEntry::new(HistoryAction::Created, now, input.notes)],
    };

    let audit_event = AuditEvent::new(
        actor,
        cause,
        Action::new(
            String::from("CreateRequest"),
            Some(format!("Created {} request {}", request.request_type, request.code)),
        ),
        StateSnapshot::new(String::from("absent")),
        snapshot_of(&request),
        Some(period_id),
        Some(request.student_id),
    );

    Ok(TransitionResult {
        request,
        audit_event,
    })
}

/// Updates the mutable fields of a request.
///
/// Permitted only while the request is editable (Pending or `NeedsMoreInfo`).
/// If the destination group changes, capacity is re-validated on the new
/// target. Appends an update history entry and bumps the update timestamp.
///
/// # Arguments
///
/// * `request` - The request as currently persisted
/// * `changes` - The fields to change
/// * `new_destination` - The new destination group, loaded if `changes` names one
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
/// * `now` - The caller's clock value
///
/// # Errors
///
/// Returns an error if:
/// - The request is not in an editable state
/// - The new destination group is missing or full
pub fn update_request(
    request: &ChangeRequest,
    changes: RequestChanges,
    new_destination: Option<&Group>,
    actor: Actor,
    cause: Cause,
    now: DateTime<Utc>,
) -> Result<TransitionResult, CoreError> {
    if !request.state.allows_editing() {
        return Err(CoreError::DomainViolation(DomainError::BusinessRule {
            rule: "editing_locked",
            message: format!("request in state {} cannot be edited", request.state),
        }));
    }

    let destination_changed = changes
        .destination_group_id
        .is_some_and(|new_id| Some(new_id) != request.destination_group_id);
    if destination_changed {
        require_destination_capacity(changes.destination_group_id, new_destination)?;
    }

    let before = snapshot_of(request);
    let mut updated = request.clone();
    if let Some(group_id) = changes.destination_group_id {
        updated.destination_group_id = Some(group_id);
    }
    if let Some(course_id) = changes.destination_course_id {
        updated.destination_course_id = Some(course_id);
    }
    if let Some(priority) = changes.priority {
        updated.priority = priority;
    }
    updated
        .history
        .push(HistoryEntry::new(HistoryAction::Updated, now, changes.notes));
    updated.updated_at = now;

    let audit_event = AuditEvent::new(
        actor,
        cause,
        Action::new(
            String::from("UpdateRequest"),
            Some(format!("Updated request {}", updated.code)),
        ),
        before,
        snapshot_of(&updated),
        Some(updated.period_id),
        Some(updated.student_id),
    );

    Ok(TransitionResult {
        request: updated,
        audit_event,
    })
}

/// Transitions a request to a new lifecycle state.
///
/// The transition must appear in the transition table; no-op transitions are
/// rejected. On transition to Approved, the active period must still accept
/// requests and the destination group must still have capacity — the caller
/// then executes the seat movement and this state write as one persistent
/// transaction.
///
/// # Arguments
///
/// * `request` - The request as currently persisted
/// * `new_state` - The target state
/// * `notes` - Notes recorded on the history entry
/// * `period` - The request's period, required for approval
/// * `destination` - The destination group, required for approval when one is named
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
/// * `now` - The caller's clock value
///
/// # Errors
///
/// Returns an error if:
/// - The transition is a no-op or not present in the table
/// - Approval is requested but the period no longer accepts requests
/// - Approval is requested but the destination group is missing or full
#[allow(clippy::too_many_arguments)]
pub fn change_request_state(
    request: &ChangeRequest,
    new_state: RequestState,
    notes: Option<String>,
    period: Option<&AcademicPeriod>,
    destination: Option<&Group>,
    actor: Actor,
    cause: Cause,
    now: DateTime<Utc>,
) -> Result<TransitionResult, CoreError> {
    validate_state_transition(request.state, new_state)?;

    if new_state == RequestState::Approved {
        let Some(period) = period else {
            return Err(CoreError::DomainViolation(DomainError::NotFound {
                entity: "period",
                id: request.period_id.to_string(),
            }));
        };
        require_open_period(period, now)?;
        require_destination_capacity(request.destination_group_id, destination)?;
    }

    let before = snapshot_of(request);
    let mut updated = request.clone();
    updated.state = new_state;
    updated.history.push(HistoryEntry::new(
        HistoryAction::StateChange {
            from: request.state,
            to: new_state,
        },
        now,
        notes,
    ));
    updated.updated_at = now;

    let audit_event = AuditEvent::new(
        actor,
        cause,
        Action::new(
            String::from("ChangeRequestState"),
            Some(format!(
                "Request {} moved from {} to {new_state}",
                updated.code, request.state
            )),
        ),
        before,
        snapshot_of(&updated),
        Some(updated.period_id),
        Some(updated.student_id),
    );

    Ok(TransitionResult {
        request: updated,
        audit_event,
    })
}

/// Validates that a request may be deleted.
///
/// Deletion is a hard remove and is permitted only in the Pending state.
///
/// # Errors
///
/// Returns `DomainError::BusinessRule` if the request is not Pending.
pub fn validate_delete(request: &ChangeRequest) -> Result<(), CoreError> {
    if request.state != RequestState::Pending {
        return Err(CoreError::DomainViolation(DomainError::BusinessRule {
            rule: "delete_requires_pending",
            message: format!("request in state {} cannot be deleted", request.state),
        }));
    }
    Ok(())
}

/// Runs the overlap detector for a candidate destination group and converts
/// the findings into conflict records for the registry.
///
/// # Arguments
///
/// * `enrolled_slots` - Slots from the student's currently active enrollments
/// * `destination` - The candidate destination group
/// * `student_id` - The affected student
/// * `request_id` - The associated request, once persisted
/// * `now` - The detection timestamp from the caller's clock
#[must_use]
pub fn detect_schedule_conflicts(
    enrolled_slots: &[TimeSlot],
    destination: &Group,
    student_id: i64,
    request_id: Option<i64>,
    now: DateTime<Utc>,
) -> Vec<Conflict> {
    find_conflicting_pairs(enrolled_slots, &destination.schedules)
        .into_iter()
        .map(|pair| {
            Conflict::new(
                ConflictCategory::ScheduleOverlap,
                format!(
                    "{} {}-{} in {} overlaps {} {}-{} in {}",
                    pair.enrolled.weekday,
                    pair.enrolled.start_time,
                    pair.enrolled.end_time,
                    pair.enrolled.room,
                    pair.candidate.weekday,
                    pair.candidate.start_time,
                    pair.candidate.end_time,
                    pair.candidate.room,
                ),
                student_id,
                request_id,
                destination.group_id,
                now,
            )
        })
        .collect()
}
