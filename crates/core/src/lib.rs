// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod capacity;
mod clock;
mod codegen;
mod error;
mod lifecycle;

#[cfg(test)]
mod tests;

// Re-export public types and functions
pub use capacity::{
    NEAR_CAPACITY_THRESHOLD, has_available_capacity, is_near_capacity, join_waitlist,
    leave_waitlist, occupancy_percentage, release_seat, reserve_seat, waitlist_position,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use codegen::{REQUEST_CODE_PREFIX, REQUEST_CODE_SUFFIX_LEN, generate_request_code};
pub use error::CoreError;
pub use lifecycle::{
    DEFAULT_RESPONSE_BUSINESS_DAYS, NewRequest, RequestChanges, TransitionResult,
    change_request_state, create_request, detect_schedule_conflicts, update_request,
    validate_delete,
};
