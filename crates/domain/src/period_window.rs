// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Academic period window predicates.
//!
//! Both predicates are pure functions of their inputs. The clock value is
//! always passed in, never read internally, so every lifecycle decision that
//! depends on time is deterministically testable.

use crate::types::AcademicPeriod;
use chrono::{DateTime, Utc};

/// Returns whether an instant falls within a period's open dates.
///
/// The bounds are inclusive: `period.start <= instant <= period.end`.
#[must_use]
pub fn is_within_period(instant: DateTime<Utc>, period: &AcademicPeriod) -> bool {
    period.start <= instant && instant <= period.end
}

/// Returns whether a period still accepts new change requests.
///
/// True iff `now <= period.request_deadline`.
#[must_use]
pub fn can_accept_requests(period: &AcademicPeriod, now: DateTime<Utc>) -> bool {
    now <= period.request_deadline
}
