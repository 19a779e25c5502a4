// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::RequestState;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A referenced entity does not exist.
    NotFound {
        /// The kind of entity (e.g., "group", "request", "period").
        entity: &'static str,
        /// The identifier that failed to resolve.
        id: String,
    },
    /// Valid-shaped input violates a domain rule.
    BusinessRule {
        /// The rule that was violated.
        rule: &'static str,
        /// A human-readable description of the violation.
        message: String,
    },
    /// The destination group has no available seats.
    CapacityExceeded {
        /// The group that is full.
        group_id: i64,
        /// The group's maximum capacity.
        capacity_max: i32,
    },
    /// No active academic period, or its request deadline has passed.
    PeriodClosed {
        /// A description of why the period rejected the operation.
        reason: String,
    },
    /// Malformed time-slot data reached the overlap detector.
    InvalidSchedule {
        /// A description of the validation failure.
        reason: String,
    },
    /// An atomic update lost a race against a concurrent writer.
    ConcurrencyConflict {
        /// The resource that was contended.
        resource: String,
    },
    /// A request state transition not present in the transition table.
    InvalidStateTransition {
        /// The current state.
        from: RequestState,
        /// The requested state.
        to: RequestState,
    },
    /// Request state string could not be parsed.
    InvalidRequestState(String),
    /// Request type string could not be parsed.
    InvalidRequestType(String),
    /// Weekday string could not be parsed.
    InvalidWeekday(String),
    /// Session type string could not be parsed.
    InvalidSessionType(String),
    /// Conflict category string could not be parsed.
    InvalidConflictCategory(String),
    /// Group capacity fields are inconsistent.
    InvalidCapacity {
        /// The current enrollment count.
        current: i32,
        /// The maximum capacity.
        max: i32,
    },
    /// Academic period date fields are inconsistent.
    InvalidPeriodDates {
        /// A description of the inconsistency.
        reason: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} '{id}' not found"),
            Self::BusinessRule { rule, message } => {
                write!(f, "Business rule '{rule}' violated: {message}")
            }
            Self::CapacityExceeded {
                group_id,
                capacity_max,
            } => {
                write!(
                    f,
                    "Group {group_id} is at capacity ({capacity_max} seats)"
                )
            }
            Self::PeriodClosed { reason } => write!(f, "Period closed: {reason}"),
            Self::InvalidSchedule { reason } => write!(f, "Invalid schedule: {reason}"),
            Self::ConcurrencyConflict { resource } => {
                write!(f, "Concurrent update lost on {resource}")
            }
            Self::InvalidStateTransition { from, to } => {
                write!(f, "Transition from {from} to {to} is not allowed")
            }
            Self::InvalidRequestState(s) => write!(f, "Invalid request state: {s}"),
            Self::InvalidRequestType(s) => write!(f, "Invalid request type: {s}"),
            Self::InvalidWeekday(s) => write!(f, "Invalid weekday: {s}"),
            Self::InvalidSessionType(s) => write!(f, "Invalid session type: {s}"),
            Self::InvalidConflictCategory(s) => {
                write!(f, "Invalid conflict category: {s}")
            }
            Self::InvalidCapacity { current, max } => {
                write!(
                    f,
                    "Invalid capacity: current enrollment {current} with maximum {max}"
                )
            }
            Self::InvalidPeriodDates { reason } => {
                write!(f, "Invalid period dates: {reason}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
