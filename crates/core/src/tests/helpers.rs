// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Clock, FixedClock, NewRequest};
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use matricula_audit::{Actor, Cause};
use matricula_domain::{AcademicPeriod, Group, RequestType, SessionType, TimeSlot, Weekday};

pub fn instant(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

/// A Tuesday morning well inside the test period's request window.
pub fn create_test_now() -> DateTime<Utc> {
    instant(2026, 2, 3, 10)
}

pub fn create_test_clock() -> FixedClock {
    FixedClock::new(create_test_now())
}

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("staff-7"), String::from("staff"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Student request"))
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

pub fn slot(weekday: Weekday, start_hour: u32, end_hour: u32) -> TimeSlot {
    TimeSlot::new(
        weekday,
        NaiveTime::from_hms_opt(start_hour, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(end_hour, 0, 0).unwrap(),
        "B-204",
        SessionType::Lecture,
    )
    .unwrap()
}

pub fn create_test_group(group_id: i64, capacity_max: i32, current: i32) -> Group {
    Group::with_id(
        group_id,
        10,
        1,
        7,
        capacity_max,
        current,
        vec![slot(Weekday::Monday, 8, 10)],
        Vec::new(),
        true,
    )
    .unwrap()
}

pub fn create_test_new_request(destination_group_id: Option<i64>) -> NewRequest {
    NewRequest {
        request_type: RequestType::GroupChange,
        student_id: 100,
        origin_enrollment_id: Some(55),
        destination_group_id,
        destination_course_id: None,
        priority: 3,
        notes: Some(String::from("Schedule clash with work")),
    }
}

pub fn now_from_clock() -> DateTime<Utc> {
    create_test_clock().now()
}
