// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

mod audit_tests;
mod period_tests;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};

use crate::Persistence;
use matricula::{DEFAULT_RESPONSE_BUSINESS_DAYS, NewRequest, TransitionResult, create_request};
use matricula_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use matricula_domain::{
    AcademicPeriod, Enrollment, Group, RequestType, SessionType, TimeSlot, Weekday,
};

pub fn instant(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

/// A Tuesday morning well inside the test period's request window.
pub fn create_test_now() -> DateTime<Utc> {
    instant(2026, 2, 3, 10)
}

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("test-actor"), String::from("system"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("test-cause"), String::from("Test operation"))
}

pub fn create_test_event() -> AuditEvent {
    AuditEvent::new(
        create_test_actor(),
        create_test_cause(),
        Action::new(String::from("TestAction"), None),
        StateSnapshot::new(String::from("before")),
        StateSnapshot::new(String::from("after")),
        Some(1),
        Some(100),
    )
}

pub fn create_test_period(year: u16, term: u8) -> AcademicPeriod {
    AcademicPeriod::new(
        instant(2026, 1, 12, 0),
        instant(2026, 5, 29, 23),
        instant(2026, 1, 5, 0),
        instant(2026, 2, 27, 23),
        year,
        term,
    )
    .unwrap()
}

pub fn slot(weekday: Weekday, start_hour: u32, end_hour: u32) -> TimeSlot {
    TimeSlot::new(
        weekday,
        NaiveTime::from_hms_opt(start_hour, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(end_hour, 0, 0).unwrap(),
        "C-110",
        SessionType::Lecture,
    )
    .unwrap()
}

/// Inserts a period and activates it, returning its ID.
pub fn seed_active_period(persistence: &mut Persistence) -> i64 {
    let period_id = persistence
        .insert_period(&create_test_period(2026, 1))
        .unwrap();
    persistence
        .activate_period(period_id, &create_test_event(), create_test_now())
        .unwrap();
    period_id
}

pub fn seed_group(
    persistence: &mut Persistence,
    period_id: i64,
    capacity_max: i32,
    current_enrollment: i32,
) -> i64 {
    let group = Group::new(
        10,
        period_id,
        7,
        capacity_max,
        current_enrollment,
        vec![slot(Weekday::Monday, 8, 10)],
    )
    .unwrap();
    persistence.insert_group(&group).unwrap()
}

pub fn seed_enrollment(persistence: &mut Persistence, student_id: i64, group_id: i64) -> i64 {
    persistence
        .insert_enrollment(&Enrollment::new(student_id, group_id))
        .unwrap()
}

/// Runs the lifecycle creation against seeded rows and returns the result
/// ready for persistence.
pub fn create_request_result(
    persistence: &mut Persistence,
    period_id: i64,
    destination_group_id: Option<i64>,
    origin_enrollment_id: Option<i64>,
    student_id: i64,
) -> TransitionResult {
    let period = persistence.get_period(period_id).unwrap();
    let destination = destination_group_id.map(|id| persistence.get_group(id).unwrap());

    create_request(
        NewRequest {
            request_type: RequestType::GroupChange,
            student_id,
            origin_enrollment_id,
            destination_group_id,
            destination_course_id: None,
            priority: 3,
            notes: Some(String::from("Test request")),
        },
        &period,
        destination.as_ref(),
        create_test_actor(),
        create_test_cause(),
        create_test_now(),
        DEFAULT_RESPONSE_BUSINESS_DAYS,
    )
    .unwrap()
}
