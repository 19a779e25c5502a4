// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Business-day arithmetic for response deadlines.
//!
//! Counting skips Saturdays and Sundays only. No holiday calendar is
//! consulted.

use chrono::{DateTime, Datelike, Duration, Utc};

/// Returns whether an instant falls on a Saturday or Sunday.
#[must_use]
pub fn is_weekend(instant: DateTime<Utc>) -> bool {
    matches!(
        instant.weekday(),
        chrono::Weekday::Sat | chrono::Weekday::Sun
    )
}

/// Adds `days` business days to `start`, skipping weekends.
///
/// Each step advances one calendar day; days landing on a weekend do not
/// count toward the total. The time of day is preserved.
///
/// # Arguments
///
/// * `start` - The instant to count from
/// * `days` - The number of business days to add
#[must_use]
pub fn add_business_days(start: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    let mut current = start;
    let mut remaining = days;
    while remaining > 0 {
        current += Duration::days(1);
        if !is_weekend(current) {
            remaining -= 1;
        }
    }
    current
}
