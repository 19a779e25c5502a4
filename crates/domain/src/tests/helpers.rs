// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::{AcademicPeriod, SessionType, TimeSlot, Weekday};
use chrono::{DateTime, NaiveTime, TimeZone, Utc};

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn instant(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

pub fn slot(weekday: Weekday, start_hour: u32, end_hour: u32) -> TimeSlot {
    TimeSlot::new(
        weekday,
        time(start_hour, 0),
        time(end_hour, 0),
        "A-101",
        SessionType::Lecture,
    )
    .unwrap()
}

pub fn create_test_period() -> AcademicPeriod {
    AcademicPeriod::with_id(
        1,
        instant(2026, 1, 12, 0),
        instant(2026, 5, 29, 23),
        instant(2026, 1, 5, 0),
        instant(2026, 2, 27, 23),
        2026,
        1,
        true,
    )
    .unwrap()
}
