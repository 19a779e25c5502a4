// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Field-level validation helpers shared by constructors and the API layer.

use crate::error::DomainError;
use crate::types::{RequestState, RequestType};
use chrono::{DateTime, Utc};

/// Validates a group's capacity counters.
///
/// # Errors
///
/// Returns `DomainError::InvalidCapacity` if `max < 0` or
/// `current` is outside `[0, max]`.
pub const fn validate_group_capacity(current: i32, max: i32) -> Result<(), DomainError> {
    if max < 0 || current < 0 || current > max {
        return Err(DomainError::InvalidCapacity { current, max });
    }
    Ok(())
}

/// Validates an academic period's date ordering.
///
/// # Errors
///
/// Returns `DomainError::InvalidPeriodDates` if `start >= end` or the
/// request deadline falls outside `[start, end]`.
pub fn validate_period_dates(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    request_deadline: DateTime<Utc>,
) -> Result<(), DomainError> {
    if start >= end {
        return Err(DomainError::InvalidPeriodDates {
            reason: format!("start {start} must be before end {end}"),
        });
    }
    if request_deadline < start || request_deadline > end {
        return Err(DomainError::InvalidPeriodDates {
            reason: format!("request deadline {request_deadline} must fall within the period"),
        });
    }
    Ok(())
}

/// Validates that a request's references are consistent with its type.
///
/// Group and course changes must name a destination; withdrawals must name
/// an origin enrollment.
///
/// # Errors
///
/// Returns `DomainError::BusinessRule` on a missing reference.
pub fn validate_request_references(
    request_type: RequestType,
    origin_enrollment_id: Option<i64>,
    destination_group_id: Option<i64>,
    destination_course_id: Option<i64>,
) -> Result<(), DomainError> {
    match request_type {
        RequestType::GroupChange => {
            if destination_group_id.is_none() {
                return Err(DomainError::BusinessRule {
                    rule: "destination_required",
                    message: String::from("a group change must name a destination group"),
                });
            }
        }
        RequestType::CourseChange => {
            if destination_course_id.is_none() {
                return Err(DomainError::BusinessRule {
                    rule: "destination_required",
                    message: String::from("a course change must name a destination course"),
                });
            }
        }
        RequestType::Withdrawal => {
            if origin_enrollment_id.is_none() {
                return Err(DomainError::BusinessRule {
                    rule: "origin_required",
                    message: String::from("a withdrawal must name the enrollment being dropped"),
                });
            }
        }
        RequestType::ScheduleAdjustment => {}
    }
    Ok(())
}

/// Validates a requested state transition against the transition table.
///
/// # Errors
///
/// Returns `DomainError::BusinessRule` for a no-op transition and
/// `DomainError::InvalidStateTransition` for a transition not present in
/// the table.
pub fn validate_state_transition(
    current: RequestState,
    target: RequestState,
) -> Result<(), DomainError> {
    if current == target {
        return Err(DomainError::BusinessRule {
            rule: "no_op_transition",
            message: format!("request is already in state {current}"),
        });
    }
    if !current.can_transition_to(target) {
        return Err(DomainError::InvalidStateTransition {
            from: current,
            to: target,
        });
    }
    Ok(())
}
