// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};

use matricula::FixedClock;
use matricula_audit::{Actor, Cause};
use matricula_persistence::Persistence;

use crate::handlers;
use crate::request_response::{
    CreateEnrollmentRequest, CreateGroupRequest, CreatePeriodRequest, CreateRequestRequest,
    TimeSlotInfo,
};

pub fn instant(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

/// A Tuesday morning well inside the test period's request window.
pub fn create_test_clock() -> FixedClock {
    FixedClock::new(instant(2026, 2, 3, 10))
}

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("staff-7"), String::from("staff"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("API request"))
}

pub fn slot_info(weekday: &str, start_hour: u32, end_hour: u32) -> TimeSlotInfo {
    TimeSlotInfo {
        weekday: weekday.to_string(),
        start_time: NaiveTime::from_hms_opt(start_hour, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(end_hour, 0, 0).unwrap(),
        room: String::from("B-204"),
        session_type: String::from("Lecture"),
    }
}

/// Creates a fresh database with one activated 2026/term-1 period.
pub fn setup() -> (Persistence, i64) {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let period = handlers::create_period(
        &mut persistence,
        CreatePeriodRequest {
            start: instant(2026, 1, 12, 0),
            end: instant(2026, 5, 29, 23),
            enrollment_window_start: instant(2026, 1, 5, 0),
            request_deadline: instant(2026, 2, 27, 23),
            year: 2026,
            term: 1,
        },
    )
    .unwrap();
    let period_id = period.period_id.unwrap();
    handlers::activate_period(
        &mut persistence,
        period_id,
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    )
    .unwrap();
    (persistence, period_id)
}

/// Creates a group with the given capacity and occupies `current` seats.
pub fn seed_group(
    persistence: &mut Persistence,
    period_id: i64,
    capacity_max: i32,
    current: i32,
) -> i64 {
    seed_group_with_slots(
        persistence,
        period_id,
        capacity_max,
        current,
        vec![slot_info("Monday", 8, 10)],
    )
}

/// Creates a group with an explicit weekly schedule.
pub fn seed_group_with_slots(
    persistence: &mut Persistence,
    period_id: i64,
    capacity_max: i32,
    current: i32,
    schedules: Vec<TimeSlotInfo>,
) -> i64 {
    let group = handlers::create_group(
        persistence,
        CreateGroupRequest {
            course_id: 10,
            period_id,
            instructor_id: 7,
            capacity_max,
            schedules,
        },
    )
    .unwrap();
    let group_id = group.group_id.unwrap();
    for _ in 0..current {
        persistence.reserve_seat(group_id).unwrap();
    }
    group_id
}

/// Enrolls a student in a group and occupies their seat.
pub fn seed_enrolled_student(
    persistence: &mut Persistence,
    group_id: i64,
    student_id: i64,
) -> i64 {
    let enrollment = handlers::create_enrollment(
        persistence,
        CreateEnrollmentRequest {
            student_id,
            group_id,
        },
    )
    .unwrap();
    persistence.reserve_seat(group_id).unwrap();
    enrollment.enrollment_id.unwrap()
}

/// A valid group-change creation payload for student 100.
pub fn create_request_payload(destination_group_id: i64) -> CreateRequestRequest {
    CreateRequestRequest {
        request_type: String::from("GroupChange"),
        student_id: 100,
        origin_enrollment_id: None,
        destination_group_id: Some(destination_group_id),
        destination_course_id: None,
        priority: 3,
        notes: Some(String::from("Schedule clash with work")),
    }
}
