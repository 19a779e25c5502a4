// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for audit event persistence.

use crate::{Persistence, PersistenceError};
use matricula_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};

use super::{create_test_event, create_test_now, instant};

#[test]
fn test_persist_and_get_round_trips_all_fields() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    let event = AuditEvent::new(
        Actor::new(String::from("staff-7"), String::from("staff")),
        Cause::new(String::from("req-456"), String::from("Review queue")),
        Action::new(
            String::from("ChangeRequestState"),
            Some(String::from("Pending -> UnderReview")),
        ),
        StateSnapshot::new(String::from("state=Pending")),
        StateSnapshot::new(String::from("state=UnderReview")),
        Some(1),
        Some(100),
    );
    let event_id = persistence
        .persist_audit_event(&event, create_test_now())
        .unwrap();

    let loaded = persistence.get_audit_event(event_id).unwrap();
    assert_eq!(loaded.actor.id, "staff-7");
    assert_eq!(loaded.actor.actor_type, "staff");
    assert_eq!(loaded.cause.id, "req-456");
    assert_eq!(loaded.cause.description, "Review queue");
    assert_eq!(loaded.action.name, "ChangeRequestState");
    assert_eq!(
        loaded.action.details.as_deref(),
        Some("Pending -> UnderReview")
    );
    assert_eq!(loaded.before.data, "state=Pending");
    assert_eq!(loaded.after.data, "state=UnderReview");
    assert_eq!(loaded.period_id, Some(1));
    assert_eq!(loaded.student_id, Some(100));
}

#[test]
fn test_get_missing_event_is_not_found() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    assert!(matches!(
        persistence.get_audit_event(999),
        Err(PersistenceError::EventNotFound(999))
    ));
}

#[test]
fn test_events_without_scope_are_persisted() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    let mut event = create_test_event();
    event.period_id = None;
    event.student_id = None;
    let event_id = persistence
        .persist_audit_event(&event, create_test_now())
        .unwrap();

    let loaded = persistence.get_audit_event(event_id).unwrap();
    assert_eq!(loaded.period_id, None);
    assert_eq!(loaded.student_id, None);
}

#[test]
fn test_list_events_filters_by_period() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    let mut in_period = create_test_event();
    in_period.period_id = Some(1);
    let mut other_period = create_test_event();
    other_period.period_id = Some(2);

    persistence
        .persist_audit_event(&in_period, create_test_now())
        .unwrap();
    persistence
        .persist_audit_event(&other_period, create_test_now())
        .unwrap();

    let events = persistence.list_events_for_period(1).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].period_id, Some(1));
}

#[test]
fn test_list_events_for_student_preserves_insertion_order() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    let mut first = create_test_event();
    first.action = Action::new(String::from("CreateRequest"), None);
    let mut second = create_test_event();
    second.action = Action::new(String::from("UpdateRequest"), None);

    persistence
        .persist_audit_event(&first, instant(2026, 2, 3, 10))
        .unwrap();
    persistence
        .persist_audit_event(&second, instant(2026, 2, 4, 10))
        .unwrap();

    let events = persistence.list_events_for_student(100).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].action.name, "CreateRequest");
    assert_eq!(events[1].action.name, "UpdateRequest");
}
