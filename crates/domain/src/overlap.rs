// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Schedule overlap detection.
//!
//! Two slots conflict iff they fall on the same weekday and their half-open
//! time intervals `[start, end)` intersect.
//!
//! ## Invariants
//!
//! - `slots_conflict(a, b) == slots_conflict(b, a)`
//! - Back-to-back slots (`a.end == b.start`) never conflict
//! - Identical time ranges on different weekdays never conflict
//! - Pair reports are deterministically ordered for identical inputs

use crate::types::TimeSlot;

/// A pair of conflicting slots: one from the student's current enrollments
/// and one from the candidate destination group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictingPair {
    /// The slot from the student's currently active enrollments.
    pub enrolled: TimeSlot,
    /// The slot from the candidate destination group.
    pub candidate: TimeSlot,
}

/// Returns whether two weekly slots conflict.
///
/// Slots conflict iff they share a weekday and `start_a < end_b && start_b < end_a`.
/// The boundary case `end_a == start_b` does not conflict.
#[must_use]
pub fn slots_conflict(a: &TimeSlot, b: &TimeSlot) -> bool {
    a.weekday == b.weekday && a.start_time < b.end_time && b.start_time < a.end_time
}

/// Returns every conflicting pair between a student's active slots and a
/// candidate group's slots.
///
/// The result is sorted by weekday, then the enrolled slot's start time,
/// then the candidate slot's start time, so identical inputs always produce
/// identical output.
///
/// # Arguments
///
/// * `enrolled` - Slots from the student's currently active enrollments
/// * `candidate` - Slots of the candidate destination group
#[must_use]
pub fn find_conflicting_pairs(enrolled: &[TimeSlot], candidate: &[TimeSlot]) -> Vec<ConflictingPair> {
    let mut pairs: Vec<ConflictingPair> = Vec::new();
    for existing in enrolled {
        for incoming in candidate {
            if slots_conflict(existing, incoming) {
                pairs.push(ConflictingPair {
                    enrolled: existing.clone(),
                    candidate: incoming.clone(),
                });
            }
        }
    }
    pairs.sort_by(|a, b| {
        a.enrolled
            .weekday
            .index()
            .cmp(&b.enrolled.weekday.index())
            .then(a.enrolled.start_time.cmp(&b.enrolled.start_time))
            .then(a.candidate.start_time.cmp(&b.candidate.start_time))
    });
    pairs
}
