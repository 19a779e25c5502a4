// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.
//!
//! State-changing handlers load the entities the lifecycle needs, apply the
//! pure transition, and hand the result to the persistence layer, which
//! commits it together with the audit event. Writes that lose an optimistic
//! concurrency race are retried once with a fresh read before the error
//! surfaces to the caller.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use matricula::{
    Clock, DEFAULT_RESPONSE_BUSINESS_DAYS, NewRequest, RequestChanges,
    change_request_state as lifecycle_change_state, create_request as lifecycle_create,
    detect_schedule_conflicts, is_near_capacity, occupancy_percentage,
    update_request as lifecycle_update, validate_delete as lifecycle_validate_delete,
};
use matricula_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use matricula_domain::{
    AcademicPeriod, Conflict, ConflictCategory, Enrollment, Group, RequestState, RequestType,
    SessionType, TimeSlot, Weekday,
};
use matricula_persistence::{Persistence, PersistenceError};

use crate::error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
use crate::priority_policy::PriorityPolicy;
use crate::request_response::{
    ActivatePeriodResponse, ChangeStateRequest, ChangeStateResponse, ConflictInfo,
    CreateEnrollmentRequest, CreateGroupRequest, CreatePeriodRequest, CreateRequestRequest,
    CreateRequestResponse, DeleteRequestResponse, EnrollmentInfo, GroupInfo, JoinWaitlistResponse,
    LeaveWaitlistResponse, PeriodInfo, RegisterConflictRequest, RequestInfo,
    ResolveConflictRequest, StateCountInfo, TimeSlotInfo, UpdateConflictRequest,
    UpdateRequestRequest, WaitlistRequest, WaitlistPositionResponse,
};

fn group_info(group: &Group) -> GroupInfo {
    GroupInfo {
        group_id: group.group_id,
        course_id: group.course_id,
        period_id: group.period_id,
        instructor_id: group.instructor_id,
        capacity_max: group.capacity_max,
        current_enrollment: group.current_enrollment,
        occupancy_percentage: occupancy_percentage(group),
        near_capacity: is_near_capacity(group),
        schedules: group.schedules.iter().map(TimeSlotInfo::from).collect(),
        waitlist: group.waitlist.clone(),
        active: group.active,
    }
}

fn period_info(period: &AcademicPeriod) -> PeriodInfo {
    PeriodInfo {
        period_id: period.period_id,
        start: period.start,
        end: period.end,
        enrollment_window_start: period.enrollment_window_start,
        request_deadline: period.request_deadline,
        year: period.year,
        term: period.term,
        active: period.active,
    }
}

/// Resolves the active academic period.
///
/// # Errors
///
/// Returns `ApiError::DomainRuleViolation` with rule `period_open` if no
/// period is active.
fn require_active_period(persistence: &mut Persistence) -> Result<AcademicPeriod, ApiError> {
    persistence
        .get_active_period()
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::DomainRuleViolation {
            rule: String::from("period_open"),
            message: String::from("no active academic period"),
        })
}

/// Loads a destination group when one is named.
///
/// A missing group maps to `None` so the lifecycle validation reports it as
/// the domain-level `NotFound` rather than a raw persistence error.
fn load_destination(
    persistence: &mut Persistence,
    group_id: Option<i64>,
) -> Result<Option<Group>, ApiError> {
    let Some(id) = group_id else {
        return Ok(None);
    };
    match persistence.get_group(id) {
        Ok(group) => Ok(Some(group)),
        Err(PersistenceError::NotFound(_)) => Ok(None),
        Err(e) => Err(translate_persistence_error(e)),
    }
}

// ============================================================================
// Request Lifecycle Handlers
// ============================================================================

/// Creates a schedule-change request.
///
/// This handler:
/// - Validates the priority against the priority policy
/// - Requires an active period with an open request deadline
/// - Applies the lifecycle creation over the loaded destination group
/// - Persists the request, its history seed, and the audit event atomically
/// - Runs the schedule-overlap detector against the student's active
///   enrollments and records findings in the conflict registry
///
/// Detected conflicts never block creation; they are returned for review.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `request` - The creation request
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
/// * `clock` - The time source
///
/// # Errors
///
/// Returns an error if:
/// - The priority falls outside the policy band
/// - No period is active or its request deadline has passed
/// - The destination group is missing or full
pub fn create_request(
    persistence: &mut Persistence,
    request: CreateRequestRequest,
    actor: Actor,
    cause: Cause,
    clock: &dyn Clock,
) -> Result<CreateRequestResponse, ApiError> {
    PriorityPolicy::default().validate(request.priority)?;
    let request_type: RequestType =
        RequestType::from_str(&request.request_type).map_err(translate_domain_error)?;

    let now = clock.now();
    let period = require_active_period(persistence)?;
    let destination = load_destination(persistence, request.destination_group_id)?;

    let input = NewRequest {
        request_type,
        student_id: request.student_id,
        origin_enrollment_id: request.origin_enrollment_id,
        destination_group_id: request.destination_group_id,
        destination_course_id: request.destination_course_id,
        priority: request.priority,
        notes: request.notes,
    };
    let result = lifecycle_create(
        input,
        &period,
        destination.as_ref(),
        actor,
        cause,
        now,
        DEFAULT_RESPONSE_BUSINESS_DAYS,
    )
    .map_err(translate_core_error)?;

    let ids = persistence
        .persist_new_request(&result)
        .map_err(translate_persistence_error)?;

    let mut conflicts: Vec<ConflictInfo> = Vec::new();
    if let Some(destination) = destination.as_ref() {
        // The enrollment being vacated no longer counts against the
        // candidate schedule.
        let enrolled = persistence
            .enrolled_slots(request.student_id, request.origin_enrollment_id)
            .map_err(translate_persistence_error)?;
        for conflict in detect_schedule_conflicts(
            &enrolled,
            destination,
            request.student_id,
            Some(ids.request_id),
            now,
        ) {
            let conflict_id = persistence
                .insert_conflict(&conflict)
                .map_err(translate_persistence_error)?;
            warn!(
                request_id = ids.request_id,
                conflict_id, "Schedule conflict detected at creation"
            );
            let mut conflict_info = ConflictInfo::from(&conflict);
            conflict_info.conflict_id = Some(conflict_id);
            conflicts.push(conflict_info);
        }
    }

    let persisted = persistence
        .get_request(ids.request_id)
        .map_err(translate_persistence_error)?;
    info!(request_id = ids.request_id, code = %persisted.code, "Created change request");

    Ok(CreateRequestResponse {
        message: format!("Created request {}", persisted.code),
        request: RequestInfo::from(&persisted),
        conflicts,
    })
}

fn try_update(
    persistence: &mut Persistence,
    request_id: i64,
    changes: UpdateRequestRequest,
    actor: Actor,
    cause: Cause,
    clock: &dyn Clock,
) -> Result<RequestInfo, ApiError> {
    let stored = persistence
        .get_request(request_id)
        .map_err(translate_persistence_error)?;
    let new_destination = load_destination(persistence, changes.destination_group_id)?;

    let result = lifecycle_update(
        &stored,
        RequestChanges {
            destination_group_id: changes.destination_group_id,
            destination_course_id: changes.destination_course_id,
            priority: changes.priority,
            notes: changes.notes,
        },
        new_destination.as_ref(),
        actor,
        cause,
        clock.now(),
    )
    .map_err(translate_core_error)?;

    persistence
        .persist_request_transition(&result, stored.updated_at)
        .map_err(translate_persistence_error)?;
    info!(request_id, "Updated change request");

    Ok(RequestInfo::from(&result.request))
}

/// Edits a request in an editable state.
///
/// The guarded write is retried once with a fresh read if a concurrent
/// writer got there first.
///
/// # Errors
///
/// Returns an error if the request does not exist, is not editable, a new
/// destination group is missing or full, or both write attempts lose the
/// concurrency race.
pub fn update_request(
    persistence: &mut Persistence,
    request_id: i64,
    changes: UpdateRequestRequest,
    actor: Actor,
    cause: Cause,
    clock: &dyn Clock,
) -> Result<RequestInfo, ApiError> {
    if let Some(priority) = changes.priority {
        PriorityPolicy::default().validate(priority)?;
    }

    match try_update(
        persistence,
        request_id,
        changes.clone(),
        actor.clone(),
        cause.clone(),
        clock,
    ) {
        Err(ApiError::ConcurrentModification { .. }) => {
            try_update(persistence, request_id, changes, actor, cause, clock)
        }
        other => other,
    }
}

fn try_change_state(
    persistence: &mut Persistence,
    request_id: i64,
    new_state: RequestState,
    notes: Option<String>,
    actor: Actor,
    cause: Cause,
    clock: &dyn Clock,
) -> Result<ChangeStateResponse, ApiError> {
    let stored = persistence
        .get_request(request_id)
        .map_err(translate_persistence_error)?;

    let approving = new_state == RequestState::Approved;
    let period = if approving {
        Some(require_active_period(persistence)?)
    } else {
        None
    };
    let destination = if approving {
        load_destination(persistence, stored.destination_group_id)?
    } else {
        None
    };

    let result = lifecycle_change_state(
        &stored,
        new_state,
        notes,
        period.as_ref(),
        destination.as_ref(),
        actor,
        cause,
        clock.now(),
    )
    .map_err(translate_core_error)?;

    if approving {
        persistence
            .approve_request(&result, stored.updated_at)
            .map_err(translate_persistence_error)?;
    } else {
        persistence
            .persist_request_transition(&result, stored.updated_at)
            .map_err(translate_persistence_error)?;
    }
    info!(request_id, state = %new_state, "Changed request state");

    Ok(ChangeStateResponse {
        message: format!("Request {} is now {new_state}", result.request.code),
        request: RequestInfo::from(&result.request),
    })
}

/// Transitions a request to a new state.
///
/// Approval re-validates the period window and destination capacity, then
/// commits the state write, the seat movement, the history append, and the
/// audit event as one transaction. A write that loses the optimistic
/// concurrency race is retried once with a fresh read.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `request_id` - The request to transition
/// * `request` - The target state and optional notes
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
/// * `clock` - The time source
///
/// # Errors
///
/// Returns an error if the request does not exist, the transition is not in
/// the state machine table, approval validation fails, or both write
/// attempts lose the concurrency race.
pub fn change_request_state(
    persistence: &mut Persistence,
    request_id: i64,
    request: ChangeStateRequest,
    actor: Actor,
    cause: Cause,
    clock: &dyn Clock,
) -> Result<ChangeStateResponse, ApiError> {
    let new_state: RequestState =
        RequestState::from_str(&request.new_state).map_err(translate_domain_error)?;

    match try_change_state(
        persistence,
        request_id,
        new_state,
        request.notes.clone(),
        actor.clone(),
        cause.clone(),
        clock,
    ) {
        Err(ApiError::ConcurrentModification { .. }) => try_change_state(
            persistence,
            request_id,
            new_state,
            request.notes,
            actor,
            cause,
            clock,
        ),
        other => other,
    }
}

/// Deletes a pending request.
///
/// Only `PENDING` requests may be deleted. History rows go with the
/// request; the deletion itself is recorded as an audit event.
///
/// # Errors
///
/// Returns an error if the request does not exist or has left `PENDING`.
pub fn delete_request(
    persistence: &mut Persistence,
    request_id: i64,
    actor: Actor,
    cause: Cause,
    clock: &dyn Clock,
) -> Result<DeleteRequestResponse, ApiError> {
    let stored = persistence
        .get_request(request_id)
        .map_err(translate_persistence_error)?;
    lifecycle_validate_delete(&stored).map_err(translate_core_error)?;

    persistence
        .delete_request(request_id)
        .map_err(translate_persistence_error)?;

    let event = AuditEvent::new(
        actor,
        cause,
        Action::new(String::from("DeleteRequest"), Some(stored.code.clone())),
        StateSnapshot::new(format!("code={},state={}", stored.code, stored.state)),
        StateSnapshot::new(String::from("deleted")),
        Some(stored.period_id),
        Some(stored.student_id),
    );
    persistence
        .persist_audit_event(&event, clock.now())
        .map_err(translate_persistence_error)?;
    info!(request_id, code = %stored.code, "Deleted change request");

    Ok(DeleteRequestResponse {
        request_id,
        message: format!("Deleted request {}", stored.code),
    })
}

// ============================================================================
// Request Query Handlers
// ============================================================================

/// Retrieves a request with its full history.
///
/// # Errors
///
/// Returns `ApiError::ResourceNotFound` if the request does not exist.
pub fn get_request(persistence: &mut Persistence, request_id: i64) -> Result<RequestInfo, ApiError> {
    let request = persistence
        .get_request(request_id)
        .map_err(translate_persistence_error)?;
    Ok(RequestInfo::from(&request))
}

/// Retrieves a request by its human-facing code.
///
/// # Errors
///
/// Returns `ApiError::ResourceNotFound` if no request carries the code.
pub fn get_request_by_code(
    persistence: &mut Persistence,
    code: &str,
) -> Result<RequestInfo, ApiError> {
    let request = persistence
        .get_request_by_code(code)
        .map_err(translate_persistence_error)?;
    Ok(RequestInfo::from(&request))
}

/// Lists a student's requests, most recent first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_requests_for_student(
    persistence: &mut Persistence,
    student_id: i64,
) -> Result<Vec<RequestInfo>, ApiError> {
    let requests = persistence
        .list_requests_for_student(student_id)
        .map_err(translate_persistence_error)?;
    Ok(requests.iter().map(RequestInfo::from).collect())
}

/// Lists the review queue for one or more states: priority ascending,
/// oldest first.
///
/// `states` is a comma-separated list, e.g. `"Pending,UnderReview"`.
///
/// # Errors
///
/// Returns an error if any state string is invalid or the query fails.
pub fn list_requests_in_states(
    persistence: &mut Persistence,
    states: &str,
) -> Result<Vec<RequestInfo>, ApiError> {
    let states: Vec<RequestState> = states
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(RequestState::from_str)
        .collect::<Result<_, _>>()
        .map_err(translate_domain_error)?;
    if states.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("state"),
            message: String::from("at least one state is required"),
        });
    }
    let requests = persistence
        .list_requests_in_states(&states)
        .map_err(translate_persistence_error)?;
    Ok(requests.iter().map(RequestInfo::from).collect())
}

/// Lists a period's requests within an optional creation-date range.
///
/// An open bound defaults to the corresponding edge of the period itself.
///
/// # Errors
///
/// Returns an error if the period does not exist or the query fails.
pub fn list_requests_for_period(
    persistence: &mut Persistence,
    period_id: i64,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<Vec<RequestInfo>, ApiError> {
    let period = persistence
        .get_period(period_id)
        .map_err(translate_persistence_error)?;
    let requests = persistence
        .list_requests_for_period(
            period_id,
            from.unwrap_or(period.start),
            to.unwrap_or(period.end),
        )
        .map_err(translate_persistence_error)?;
    Ok(requests.iter().map(RequestInfo::from).collect())
}

/// Counts a period's requests per state, including zero counts.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_requests_by_state(
    persistence: &mut Persistence,
    period_id: i64,
) -> Result<Vec<StateCountInfo>, ApiError> {
    let counts = persistence
        .count_requests_by_state(period_id)
        .map_err(translate_persistence_error)?;
    Ok(counts
        .into_iter()
        .map(|(state, count)| StateCountInfo {
            state: state.to_string(),
            count,
        })
        .collect())
}

// ============================================================================
// Conflict Registry Handlers
// ============================================================================

/// Checks that the request and group a conflict descriptor names exist.
fn validate_conflict_references(
    persistence: &mut Persistence,
    request_id: Option<i64>,
    group_id: Option<i64>,
) -> Result<(), ApiError> {
    if let Some(request_id) = request_id {
        persistence
            .get_request(request_id)
            .map_err(translate_persistence_error)?;
    }
    if let Some(group_id) = group_id {
        persistence
            .get_group(group_id)
            .map_err(translate_persistence_error)?;
    }
    Ok(())
}

/// Registers a conflict manually.
///
/// The detection timestamp comes from the injected clock and the entry
/// starts unresolved.
///
/// # Errors
///
/// Returns an error if the category string is invalid, a referenced
/// request or group does not exist, or the insert fails.
pub fn register_conflict(
    persistence: &mut Persistence,
    request: RegisterConflictRequest,
    clock: &dyn Clock,
) -> Result<ConflictInfo, ApiError> {
    let category: ConflictCategory =
        ConflictCategory::from_str(&request.category).map_err(translate_domain_error)?;
    validate_conflict_references(persistence, request.request_id, request.group_id)?;

    let conflict = Conflict::new(
        category,
        request.description,
        request.student_id,
        request.request_id,
        request.group_id,
        clock.now(),
    );
    let conflict_id = persistence
        .insert_conflict(&conflict)
        .map_err(translate_persistence_error)?;
    info!(conflict_id, student_id = request.student_id, "Registered conflict");

    let persisted = persistence
        .get_conflict(conflict_id)
        .map_err(translate_persistence_error)?;
    Ok(ConflictInfo::from(&persisted))
}

/// Rewrites a conflict's descriptor fields.
///
/// The detection timestamp and resolution state are untouched; use
/// [`resolve_conflict`] for those.
///
/// # Errors
///
/// Returns an error if the conflict does not exist, the category string is
/// invalid, or a referenced request or group does not exist.
pub fn update_conflict(
    persistence: &mut Persistence,
    conflict_id: i64,
    request: UpdateConflictRequest,
) -> Result<ConflictInfo, ApiError> {
    let category: ConflictCategory =
        ConflictCategory::from_str(&request.category).map_err(translate_domain_error)?;
    validate_conflict_references(persistence, request.request_id, request.group_id)?;

    let stored = persistence
        .get_conflict(conflict_id)
        .map_err(translate_persistence_error)?;
    let descriptor = Conflict {
        category,
        description: request.description,
        student_id: request.student_id,
        request_id: request.request_id,
        group_id: request.group_id,
        ..stored
    };
    persistence
        .update_conflict(conflict_id, &descriptor)
        .map_err(translate_persistence_error)?;
    info!(conflict_id, "Updated conflict");

    let persisted = persistence
        .get_conflict(conflict_id)
        .map_err(translate_persistence_error)?;
    Ok(ConflictInfo::from(&persisted))
}

/// Deletes a conflict from the registry.
///
/// # Errors
///
/// Returns `ApiError::ResourceNotFound` if the conflict does not exist.
pub fn delete_conflict(persistence: &mut Persistence, conflict_id: i64) -> Result<(), ApiError> {
    persistence
        .delete_conflict(conflict_id)
        .map_err(translate_persistence_error)?;
    info!(conflict_id, "Deleted conflict");
    Ok(())
}

/// Marks a conflict as resolved.
///
/// # Errors
///
/// Returns `ApiError::ResourceNotFound` if the conflict does not exist.
pub fn resolve_conflict(
    persistence: &mut Persistence,
    conflict_id: i64,
    request: ResolveConflictRequest,
) -> Result<ConflictInfo, ApiError> {
    persistence
        .resolve_conflict(conflict_id, request.resolution_notes.as_deref())
        .map_err(translate_persistence_error)?;
    info!(conflict_id, "Resolved conflict");

    let persisted = persistence
        .get_conflict(conflict_id)
        .map_err(translate_persistence_error)?;
    Ok(ConflictInfo::from(&persisted))
}

/// Retrieves a conflict by ID.
///
/// # Errors
///
/// Returns `ApiError::ResourceNotFound` if the conflict does not exist.
pub fn get_conflict(
    persistence: &mut Persistence,
    conflict_id: i64,
) -> Result<ConflictInfo, ApiError> {
    let conflict = persistence
        .get_conflict(conflict_id)
        .map_err(translate_persistence_error)?;
    Ok(ConflictInfo::from(&conflict))
}

/// Lists the conflicts attached to a request.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_conflicts_for_request(
    persistence: &mut Persistence,
    request_id: i64,
) -> Result<Vec<ConflictInfo>, ApiError> {
    let conflicts = persistence
        .list_conflicts_for_request(request_id)
        .map_err(translate_persistence_error)?;
    Ok(conflicts.iter().map(ConflictInfo::from).collect())
}

/// Lists conflicts, optionally filtered by student and resolution state.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_conflicts(
    persistence: &mut Persistence,
    student_id: Option<i64>,
    resolved: Option<bool>,
) -> Result<Vec<ConflictInfo>, ApiError> {
    let conflicts = persistence
        .list_conflicts(student_id, resolved)
        .map_err(translate_persistence_error)?;
    Ok(conflicts.iter().map(ConflictInfo::from).collect())
}

// ============================================================================
// Waitlist Handlers
// ============================================================================

/// Joins a group's waitlist.
///
/// Joining is idempotent: a student already waitlisted keeps their position
/// and `newly_joined` comes back `false`.
///
/// # Errors
///
/// Returns `ApiError::ResourceNotFound` if the group does not exist.
pub fn join_waitlist(
    persistence: &mut Persistence,
    group_id: i64,
    request: WaitlistRequest,
    clock: &dyn Clock,
) -> Result<JoinWaitlistResponse, ApiError> {
    let newly_joined = persistence
        .join_waitlist(group_id, request.student_id, clock.now())
        .map_err(translate_persistence_error)?;
    let position = persistence
        .waitlist_position(group_id, request.student_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::Internal {
            message: format!(
                "student {} missing from waitlist after join",
                request.student_id
            ),
        })?;
    info!(group_id, student_id = request.student_id, position, "Joined waitlist");

    Ok(JoinWaitlistResponse {
        group_id,
        student_id: request.student_id,
        position,
        newly_joined,
    })
}

/// Leaves a group's waitlist.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn leave_waitlist(
    persistence: &mut Persistence,
    group_id: i64,
    request: WaitlistRequest,
) -> Result<LeaveWaitlistResponse, ApiError> {
    let removed = persistence
        .leave_waitlist(group_id, request.student_id)
        .map_err(translate_persistence_error)?;
    if removed {
        info!(group_id, student_id = request.student_id, "Left waitlist");
    }

    Ok(LeaveWaitlistResponse {
        group_id,
        student_id: request.student_id,
        removed,
    })
}

/// Queries a student's 1-indexed waitlist position.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn waitlist_position(
    persistence: &mut Persistence,
    group_id: i64,
    student_id: i64,
) -> Result<WaitlistPositionResponse, ApiError> {
    let position = persistence
        .waitlist_position(group_id, student_id)
        .map_err(translate_persistence_error)?;

    Ok(WaitlistPositionResponse {
        group_id,
        student_id,
        position,
    })
}

// ============================================================================
// Period Handlers
// ============================================================================

/// Creates an academic period. New periods start inactive.
///
/// # Errors
///
/// Returns an error if the dates are inconsistent or the year/term pair
/// already exists.
pub fn create_period(
    persistence: &mut Persistence,
    request: CreatePeriodRequest,
) -> Result<PeriodInfo, ApiError> {
    let period = AcademicPeriod::new(
        request.start,
        request.end,
        request.enrollment_window_start,
        request.request_deadline,
        request.year,
        request.term,
    )
    .map_err(translate_domain_error)?;

    let period_id = persistence
        .insert_period(&period)
        .map_err(translate_persistence_error)?;
    info!(period_id, year = request.year, term = request.term, "Created academic period");

    let persisted = persistence
        .get_period(period_id)
        .map_err(translate_persistence_error)?;
    Ok(period_info(&persisted))
}

/// Activates a period, deactivating the previously active one in the same
/// transaction so at most one period is ever active.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `period_id` - The period to activate
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
/// * `clock` - The time source
///
/// # Errors
///
/// Returns `ApiError::ResourceNotFound` if the period does not exist; the
/// previously active period stays active in that case.
pub fn activate_period(
    persistence: &mut Persistence,
    period_id: i64,
    actor: Actor,
    cause: Cause,
    clock: &dyn Clock,
) -> Result<ActivatePeriodResponse, ApiError> {
    let previous = persistence
        .get_active_period()
        .map_err(translate_persistence_error)?;
    let before = previous.as_ref().and_then(|p| p.period_id).map_or_else(
        || String::from("active_period=none"),
        |id| format!("active_period={id}"),
    );

    let event = AuditEvent::new(
        actor,
        cause,
        Action::new(String::from("ActivatePeriod"), Some(period_id.to_string())),
        StateSnapshot::new(before),
        StateSnapshot::new(format!("active_period={period_id}")),
        Some(period_id),
        None,
    );
    persistence
        .activate_period(period_id, &event, clock.now())
        .map_err(translate_persistence_error)?;
    info!(period_id, "Activated academic period");

    Ok(ActivatePeriodResponse {
        period_id,
        message: format!("Period {period_id} is now active"),
    })
}

/// Retrieves the active period, if one is set.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_active_period(persistence: &mut Persistence) -> Result<Option<PeriodInfo>, ApiError> {
    let period = persistence
        .get_active_period()
        .map_err(translate_persistence_error)?;
    Ok(period.as_ref().map(period_info))
}

/// Lists all periods, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_periods(persistence: &mut Persistence) -> Result<Vec<PeriodInfo>, ApiError> {
    let periods = persistence
        .list_periods()
        .map_err(translate_persistence_error)?;
    Ok(periods.iter().map(period_info).collect())
}

// ============================================================================
// Group and Enrollment Handlers
// ============================================================================

/// Creates a class group with an empty enrollment counter.
///
/// # Errors
///
/// Returns an error if a schedule slot or the capacity is invalid, or the
/// owning period does not exist.
pub fn create_group(
    persistence: &mut Persistence,
    request: CreateGroupRequest,
) -> Result<GroupInfo, ApiError> {
    let mut schedules: Vec<TimeSlot> = Vec::with_capacity(request.schedules.len());
    for slot in &request.schedules {
        let weekday: Weekday = Weekday::from_str(&slot.weekday).map_err(translate_domain_error)?;
        let session_type: SessionType =
            SessionType::from_str(&slot.session_type).map_err(translate_domain_error)?;
        schedules.push(
            TimeSlot::new(
                weekday,
                slot.start_time,
                slot.end_time,
                &slot.room,
                session_type,
            )
            .map_err(translate_domain_error)?,
        );
    }

    let group = Group::new(
        request.course_id,
        request.period_id,
        request.instructor_id,
        request.capacity_max,
        0,
        schedules,
    )
    .map_err(translate_domain_error)?;

    let group_id = persistence
        .insert_group(&group)
        .map_err(translate_persistence_error)?;
    info!(group_id, course_id = request.course_id, "Created class group");

    let persisted = persistence
        .get_group(group_id)
        .map_err(translate_persistence_error)?;
    Ok(group_info(&persisted))
}

/// Retrieves a group with occupancy reporting.
///
/// # Errors
///
/// Returns `ApiError::ResourceNotFound` if the group does not exist.
pub fn get_group(persistence: &mut Persistence, group_id: i64) -> Result<GroupInfo, ApiError> {
    let group = persistence
        .get_group(group_id)
        .map_err(translate_persistence_error)?;
    Ok(group_info(&group))
}

/// Lists a period's active groups with occupancy reporting.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_groups_for_period(
    persistence: &mut Persistence,
    period_id: i64,
) -> Result<Vec<GroupInfo>, ApiError> {
    let groups = persistence
        .list_groups_for_period(period_id)
        .map_err(translate_persistence_error)?;
    Ok(groups.iter().map(group_info).collect())
}

/// Enrolls a student in a group.
///
/// This seeds the enrollment row only; the group's seat counter moves
/// through the capacity operations.
///
/// # Errors
///
/// Returns an error if the group does not exist.
pub fn create_enrollment(
    persistence: &mut Persistence,
    request: CreateEnrollmentRequest,
) -> Result<EnrollmentInfo, ApiError> {
    let enrollment = Enrollment::new(request.student_id, request.group_id);
    let enrollment_id = persistence
        .insert_enrollment(&enrollment)
        .map_err(translate_persistence_error)?;
    info!(enrollment_id, student_id = request.student_id, "Created enrollment");

    let persisted = persistence
        .get_enrollment(enrollment_id)
        .map_err(translate_persistence_error)?;
    Ok(EnrollmentInfo::from(&persisted))
}

/// Retrieves an enrollment by ID.
///
/// # Errors
///
/// Returns `ApiError::ResourceNotFound` if the enrollment does not exist.
pub fn get_enrollment(
    persistence: &mut Persistence,
    enrollment_id: i64,
) -> Result<EnrollmentInfo, ApiError> {
    let enrollment = persistence
        .get_enrollment(enrollment_id)
        .map_err(translate_persistence_error)?;
    Ok(EnrollmentInfo::from(&enrollment))
}
