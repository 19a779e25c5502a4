// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Capacity ledger operations over a group snapshot.
//!
//! These functions express the capacity rules on in-memory `Group` values.
//! They are used for pre-checks and reporting; the authoritative seat
//! mutation during approval is the persistence layer's single conditional
//! update, which enforces the same rules against the stored row.
//!
//! ## Invariants
//!
//! - `0 <= current_enrollment <= capacity_max` after every operation
//! - Releasing a seat at zero is a no-op, never an error
//! - The waitlist is FIFO by join order and holds no duplicates

use matricula_domain::{DomainError, Group};
use num_traits::cast::ToPrimitive;

/// The occupancy percentage at or above which a group counts as near capacity.
pub const NEAR_CAPACITY_THRESHOLD: f64 = 90.0;

/// Returns whether the group has at least one free seat.
#[must_use]
pub const fn has_available_capacity(group: &Group) -> bool {
    group.current_enrollment < group.capacity_max
}

/// Reserves one seat on the group snapshot.
///
/// # Errors
///
/// Returns `DomainError::CapacityExceeded` if the group is full; the
/// snapshot is left untouched.
pub fn reserve_seat(group: &mut Group) -> Result<(), DomainError> {
    if !has_available_capacity(group) {
        return Err(DomainError::CapacityExceeded {
            group_id: group.group_id.unwrap_or_default(),
            capacity_max: group.capacity_max,
        });
    }
    group.current_enrollment += 1;
    Ok(())
}

/// Releases one seat on the group snapshot, floored at zero.
///
/// Releasing when the counter is already zero is a no-op.
pub fn release_seat(group: &mut Group) {
    if group.current_enrollment > 0 {
        group.current_enrollment -= 1;
    }
}

/// Returns the occupancy percentage in `[0, 100]`.
///
/// A group with zero capacity reports 0 rather than dividing by zero.
#[must_use]
pub fn occupancy_percentage(group: &Group) -> f64 {
    if group.capacity_max <= 0 {
        return 0.0;
    }
    let current = group.current_enrollment.to_f64().unwrap_or(0.0);
    let max = group.capacity_max.to_f64().unwrap_or(1.0);
    current / max * 100.0
}

/// Returns whether the group's occupancy is at or above the near-capacity
/// threshold.
#[must_use]
pub fn is_near_capacity(group: &Group) -> bool {
    occupancy_percentage(group) >= NEAR_CAPACITY_THRESHOLD
}

/// Appends a student to the group's waitlist if not already present.
///
/// Idempotent: joining twice yields one entry. Returns whether the waitlist
/// changed.
pub fn join_waitlist(group: &mut Group, student_id: i64) -> bool {
    if group.waitlist.contains(&student_id) {
        return false;
    }
    group.waitlist.push(student_id);
    true
}

/// Removes a student from the group's waitlist if present.
///
/// Returns whether the waitlist changed; removing an absent student is a
/// no-op.
pub fn leave_waitlist(group: &mut Group, student_id: i64) -> bool {
    let before = group.waitlist.len();
    group.waitlist.retain(|id| *id != student_id);
    group.waitlist.len() != before
}

/// Returns the 1-indexed waitlist position of a student, or `None` if the
/// student is not waitlisted.
#[must_use]
pub fn waitlist_position(group: &Group, student_id: i64) -> Option<usize> {
    group
        .waitlist
        .iter()
        .position(|id| *id == student_id)
        .map(|idx| idx + 1)
}
