// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use crate::priority_policy::PriorityPolicyError;
use matricula::CoreError;
use matricula_domain::DomainError;
use matricula_persistence::PersistenceError;

/// API-level errors.
///
/// These are distinct from domain/core/persistence errors and represent the
/// API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The destination group has no available seats.
    CapacityUnavailable {
        /// The group that is full.
        group_id: i64,
        /// A human-readable description of the capacity failure.
        message: String,
    },
    /// A concurrent writer won the race for the same row.
    ConcurrentModification {
        /// The resource that was contended.
        resource: String,
    },
    /// Priority policy violation.
    PriorityPolicyViolation {
        /// A human-readable description of the policy violation.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::CapacityUnavailable { group_id, message } => {
                write!(f, "Group {group_id} has no available capacity: {message}")
            }
            Self::ConcurrentModification { resource } => {
                write!(f, "Concurrent modification of {resource}")
            }
            Self::PriorityPolicyViolation { message } => {
                write!(f, "Priority policy violation: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<PriorityPolicyError> for ApiError {
    fn from(err: PriorityPolicyError) -> Self {
        Self::PriorityPolicyViolation {
            message: err.to_string(),
        }
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked
/// directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::NotFound { entity, id } => ApiError::ResourceNotFound {
            resource_type: String::from(entity),
            message: format!("{entity} '{id}' does not exist"),
        },
        DomainError::BusinessRule { rule, message } => ApiError::DomainRuleViolation {
            rule: String::from(rule),
            message,
        },
        DomainError::CapacityExceeded {
            group_id,
            capacity_max,
        } => ApiError::CapacityUnavailable {
            group_id,
            message: format!("all {capacity_max} seats are taken"),
        },
        DomainError::PeriodClosed { reason } => ApiError::DomainRuleViolation {
            rule: String::from("period_open"),
            message: reason,
        },
        DomainError::InvalidSchedule { reason } => ApiError::InvalidInput {
            field: String::from("schedule"),
            message: reason,
        },
        DomainError::ConcurrencyConflict { resource } => {
            ApiError::ConcurrentModification { resource }
        }
        DomainError::InvalidStateTransition { from, to } => ApiError::DomainRuleViolation {
            rule: String::from("state_transition"),
            message: format!("transition from {from} to {to} is not allowed"),
        },
        DomainError::InvalidRequestState(s) => ApiError::InvalidInput {
            field: String::from("state"),
            message: format!("invalid request state: {s}"),
        },
        DomainError::InvalidRequestType(s) => ApiError::InvalidInput {
            field: String::from("request_type"),
            message: format!("invalid request type: {s}"),
        },
        DomainError::InvalidWeekday(s) => ApiError::InvalidInput {
            field: String::from("weekday"),
            message: format!("invalid weekday: {s}"),
        },
        DomainError::InvalidSessionType(s) => ApiError::InvalidInput {
            field: String::from("session_type"),
            message: format!("invalid session type: {s}"),
        },
        DomainError::InvalidConflictCategory(s) => ApiError::InvalidInput {
            field: String::from("category"),
            message: format!("invalid conflict category: {s}"),
        },
        DomainError::InvalidCapacity { current, max } => ApiError::InvalidInput {
            field: String::from("capacity"),
            message: format!("current enrollment {current} with maximum {max}"),
        },
        DomainError::InvalidPeriodDates { reason } => ApiError::InvalidInput {
            field: String::from("period_dates"),
            message: reason,
        },
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked
/// directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
    }
}

/// Translates a persistence error into an API error.
///
/// Infrastructure failures collapse into `Internal`; the caller-relevant
/// categories (missing rows, lost races, full groups) keep their identity.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::NotFound(message) => ApiError::ResourceNotFound {
            resource_type: String::from("Record"),
            message,
        },
        PersistenceError::EventNotFound(event_id) => ApiError::ResourceNotFound {
            resource_type: String::from("Audit event"),
            message: format!("audit event {event_id} does not exist"),
        },
        PersistenceError::CapacityExhausted { group_id } => ApiError::CapacityUnavailable {
            group_id,
            message: String::from("the group filled up"),
        },
        PersistenceError::ConcurrencyConflict { resource } => {
            ApiError::ConcurrentModification { resource }
        }
        other => ApiError::Internal {
            message: other.to_string(),
        },
    }
}
