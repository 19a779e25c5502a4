// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Domain types and rule validation for the Matricula schedule-change system.
//!
//! This crate holds the pure parts of the core: the weekly schedule overlap
//! detector, the period window guard, business-day deadline arithmetic, the
//! request lifecycle transition table, and the entity types they operate on.
//! Nothing here touches a clock, a database, or the network.

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

mod business_days;
mod error;
mod overlap;
mod period_window;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use business_days::{add_business_days, is_weekend};
pub use error::DomainError;
pub use overlap::{ConflictingPair, find_conflicting_pairs, slots_conflict};
pub use period_window::{can_accept_requests, is_within_period};
pub use types::{
    AcademicPeriod, ChangeRequest, Conflict, ConflictCategory, Enrollment, Group, HistoryAction,
    HistoryEntry, RequestState, RequestType, SessionType, TimeSlot, Weekday,
};
pub use validation::{
    validate_group_capacity, validate_period_dates, validate_request_references,
    validate_state_transition,
};
