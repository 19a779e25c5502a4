// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use matricula::FixedClock;
use matricula_persistence::{Persistence, PersistenceError};

use crate::error::{ApiError, translate_persistence_error};
use crate::handlers;
use crate::request_response::{
    ChangeStateRequest, CreateRequestRequest, UpdateRequestRequest,
};
use crate::tests::helpers::{
    create_request_payload, create_test_actor, create_test_cause, create_test_clock, instant,
    seed_enrolled_student, seed_group, seed_group_with_slots, setup, slot_info,
};

#[test]
fn test_create_request_to_full_group_is_rejected() {
    let (mut persistence, period_id) = setup();
    let group_id = seed_group(&mut persistence, period_id, 30, 30);

    let result = handlers::create_request(
        &mut persistence,
        create_request_payload(group_id),
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    );

    assert!(matches!(
        result,
        Err(ApiError::CapacityUnavailable { group_id: id, .. }) if id == group_id
    ));
}

#[test]
fn test_create_request_in_open_group_starts_pending() {
    let (mut persistence, period_id) = setup();
    let group_id = seed_group(&mut persistence, period_id, 30, 20);

    let response = handlers::create_request(
        &mut persistence,
        create_request_payload(group_id),
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    )
    .unwrap();

    assert_eq!(response.request.state, "Pending");
    assert_eq!(response.request.student_id, 100);
    assert_eq!(response.request.destination_group_id, Some(group_id));
    assert_eq!(response.request.history.len(), 1);
    assert_eq!(response.request.history[0].action, "CREATED");
    assert!(response.conflicts.is_empty());
    assert!(response.message.contains(&response.request.code));
}

#[test]
fn test_approval_moves_the_student_between_groups() {
    let (mut persistence, period_id) = setup();
    let origin_id = seed_group(&mut persistence, period_id, 30, 4);
    let enrollment_id = seed_enrolled_student(&mut persistence, origin_id, 100);
    let destination_id = seed_group_with_slots(
        &mut persistence,
        period_id,
        30,
        20,
        vec![slot_info("Wednesday", 8, 10)],
    );

    let mut payload = create_request_payload(destination_id);
    payload.origin_enrollment_id = Some(enrollment_id);
    let created = handlers::create_request(
        &mut persistence,
        payload,
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    )
    .unwrap();
    assert!(created.conflicts.is_empty());
    let request_id = created.request.request_id.unwrap();

    handlers::change_request_state(
        &mut persistence,
        request_id,
        ChangeStateRequest {
            new_state: String::from("UnderReview"),
            notes: None,
        },
        create_test_actor(),
        create_test_cause(),
        &FixedClock::new(instant(2026, 2, 4, 9)),
    )
    .unwrap();

    let approved = handlers::change_request_state(
        &mut persistence,
        request_id,
        ChangeStateRequest {
            new_state: String::from("Approved"),
            notes: Some(String::from("Seat available")),
        },
        create_test_actor(),
        create_test_cause(),
        &FixedClock::new(instant(2026, 2, 5, 14)),
    )
    .unwrap();

    assert_eq!(approved.request.state, "Approved");
    assert_eq!(approved.request.history.len(), 3);
    assert_eq!(
        approved.request.history[2].action,
        "STATE:Approved (from UnderReview)"
    );

    let destination = handlers::get_group(&mut persistence, destination_id).unwrap();
    assert_eq!(destination.current_enrollment, 21);
    let origin = handlers::get_group(&mut persistence, origin_id).unwrap();
    assert_eq!(origin.current_enrollment, 4);

    let enrollment = handlers::get_enrollment(&mut persistence, enrollment_id).unwrap();
    assert_eq!(enrollment.group_id, destination_id);
    assert!(enrollment.active);
}

#[test]
fn test_create_request_detects_schedule_overlap() {
    let (mut persistence, period_id) = setup();
    let enrolled_group = seed_group_with_slots(
        &mut persistence,
        period_id,
        30,
        0,
        vec![slot_info("Monday", 8, 10)],
    );
    seed_enrolled_student(&mut persistence, enrolled_group, 100);
    let destination_id = seed_group_with_slots(
        &mut persistence,
        period_id,
        30,
        5,
        vec![slot_info("Monday", 9, 11)],
    );

    let response = handlers::create_request(
        &mut persistence,
        create_request_payload(destination_id),
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    )
    .unwrap();

    assert_eq!(response.conflicts.len(), 1);
    let conflict = &response.conflicts[0];
    assert_eq!(conflict.category, "ScheduleOverlap");
    assert_eq!(conflict.student_id, 100);
    assert_eq!(conflict.request_id, response.request.request_id);
    assert!(!conflict.resolved);

    let registered =
        handlers::list_conflicts(&mut persistence, Some(100), Some(false)).unwrap();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].conflict_id, conflict.conflict_id);
}

#[test]
fn test_overlap_with_the_vacated_enrollment_does_not_count() {
    let (mut persistence, period_id) = setup();
    let origin_group = seed_group_with_slots(
        &mut persistence,
        period_id,
        30,
        0,
        vec![slot_info("Monday", 8, 10)],
    );
    let enrollment_id = seed_enrolled_student(&mut persistence, origin_group, 100);
    // Clashes with the slot the student is leaving, and nothing else.
    let destination_id = seed_group_with_slots(
        &mut persistence,
        period_id,
        30,
        5,
        vec![slot_info("Monday", 9, 11)],
    );

    let mut payload = create_request_payload(destination_id);
    payload.origin_enrollment_id = Some(enrollment_id);
    let response = handlers::create_request(
        &mut persistence,
        payload,
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    )
    .unwrap();

    assert!(response.conflicts.is_empty());
    assert!(handlers::list_conflicts(&mut persistence, Some(100), None)
        .unwrap()
        .is_empty());
}

#[test]
fn test_create_request_on_a_different_day_is_clean() {
    let (mut persistence, period_id) = setup();
    let enrolled_group = seed_group_with_slots(
        &mut persistence,
        period_id,
        30,
        0,
        vec![slot_info("Monday", 8, 10)],
    );
    seed_enrolled_student(&mut persistence, enrolled_group, 100);
    let destination_id = seed_group_with_slots(
        &mut persistence,
        period_id,
        30,
        5,
        vec![slot_info("Tuesday", 9, 11)],
    );

    let response = handlers::create_request(
        &mut persistence,
        create_request_payload(destination_id),
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    )
    .unwrap();

    assert!(response.conflicts.is_empty());
    assert!(handlers::list_conflicts(&mut persistence, Some(100), None)
        .unwrap()
        .is_empty());
}

#[test]
fn test_create_request_without_active_period_is_rejected() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    let result = handlers::create_request(
        &mut persistence,
        create_request_payload(1),
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    );

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { rule, .. }) if rule == "period_open"
    ));
}

#[test]
fn test_create_request_after_deadline_is_rejected() {
    let (mut persistence, period_id) = setup();
    let group_id = seed_group(&mut persistence, period_id, 30, 5);

    let result = handlers::create_request(
        &mut persistence,
        create_request_payload(group_id),
        create_test_actor(),
        create_test_cause(),
        &FixedClock::new(instant(2026, 3, 15, 10)),
    );

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { rule, .. }) if rule == "period_open"
    ));
}

#[test]
fn test_create_request_priority_outside_band_is_rejected() {
    let (mut persistence, period_id) = setup();
    let group_id = seed_group(&mut persistence, period_id, 30, 5);

    let mut payload = create_request_payload(group_id);
    payload.priority = 11;
    let result = handlers::create_request(
        &mut persistence,
        payload,
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    );

    assert!(matches!(
        result,
        Err(ApiError::PriorityPolicyViolation { .. })
    ));
}

#[test]
fn test_create_request_with_priority_zero_is_most_urgent() {
    let (mut persistence, period_id) = setup();
    let group_id = seed_group(&mut persistence, period_id, 30, 5);

    let mut payload = create_request_payload(group_id);
    payload.priority = 0;
    let response = handlers::create_request(
        &mut persistence,
        payload,
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    )
    .unwrap();

    assert_eq!(response.request.priority, 0);
    assert_eq!(response.request.state, "Pending");
}

#[test]
fn test_create_request_with_unknown_type_is_rejected() {
    let (mut persistence, period_id) = setup();
    let group_id = seed_group(&mut persistence, period_id, 30, 5);

    let mut payload = create_request_payload(group_id);
    payload.request_type = String::from("Transfer");
    let result = handlers::create_request(
        &mut persistence,
        payload,
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    );

    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { field, .. }) if field == "request_type"
    ));
}

#[test]
fn test_create_request_to_missing_group_is_rejected() {
    let (mut persistence, _) = setup();

    let result = handlers::create_request(
        &mut persistence,
        create_request_payload(999),
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    );

    assert!(matches!(
        result,
        Err(ApiError::ResourceNotFound { resource_type, .. }) if resource_type == "group"
    ));
}

#[test]
fn test_get_request_by_code_round_trip() {
    let (mut persistence, period_id) = setup();
    let group_id = seed_group(&mut persistence, period_id, 30, 5);
    let created = handlers::create_request(
        &mut persistence,
        create_request_payload(group_id),
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    )
    .unwrap();

    let fetched =
        handlers::get_request_by_code(&mut persistence, &created.request.code).unwrap();

    assert_eq!(fetched, created.request);
}

#[test]
fn test_list_requests_for_student_is_newest_first() {
    let (mut persistence, period_id) = setup();
    let group_id = seed_group(&mut persistence, period_id, 30, 0);

    let mut codes = Vec::new();
    for day in [3, 4, 5] {
        let response = handlers::create_request(
            &mut persistence,
            create_request_payload(group_id),
            create_test_actor(),
            create_test_cause(),
            &FixedClock::new(instant(2026, 2, day, 10)),
        )
        .unwrap();
        codes.push(response.request.code);
    }

    let listed = handlers::list_requests_for_student(&mut persistence, 100).unwrap();

    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].code, codes[2]);
    assert_eq!(listed[2].code, codes[0]);
}

#[test]
fn test_list_requests_in_state_orders_the_review_queue() {
    let (mut persistence, period_id) = setup();
    let group_id = seed_group(&mut persistence, period_id, 30, 0);

    for (student_id, priority) in [(100, 5), (200, 1), (300, 3)] {
        let mut payload = create_request_payload(group_id);
        payload.student_id = student_id;
        payload.priority = priority;
        handlers::create_request(
            &mut persistence,
            payload,
            create_test_actor(),
            create_test_cause(),
            &create_test_clock(),
        )
        .unwrap();
    }

    let queue = handlers::list_requests_in_states(&mut persistence, "Pending").unwrap();

    let priorities: Vec<u32> = queue.iter().map(|r| r.priority).collect();
    assert_eq!(priorities, vec![1, 3, 5]);
}

#[test]
fn test_list_requests_accepts_multiple_states() {
    let (mut persistence, period_id) = setup();
    let group_id = seed_group(&mut persistence, period_id, 30, 0);

    let mut request_ids = Vec::new();
    for (student_id, priority) in [(100, 5), (200, 1), (300, 3)] {
        let mut payload = create_request_payload(group_id);
        payload.student_id = student_id;
        payload.priority = priority;
        let response = handlers::create_request(
            &mut persistence,
            payload,
            create_test_actor(),
            create_test_cause(),
            &create_test_clock(),
        )
        .unwrap();
        request_ids.push(response.request.request_id.unwrap());
    }
    handlers::change_request_state(
        &mut persistence,
        request_ids[1],
        ChangeStateRequest {
            new_state: String::from("UnderReview"),
            notes: None,
        },
        create_test_actor(),
        create_test_cause(),
        &FixedClock::new(instant(2026, 2, 4, 9)),
    )
    .unwrap();

    let combined =
        handlers::list_requests_in_states(&mut persistence, "Pending, UnderReview").unwrap();
    let priorities: Vec<u32> = combined.iter().map(|r| r.priority).collect();
    assert_eq!(priorities, vec![1, 3, 5]);

    let pending = handlers::list_requests_in_states(&mut persistence, "Pending").unwrap();
    assert_eq!(pending.len(), 2);

    assert!(matches!(
        handlers::list_requests_in_states(&mut persistence, "Pending,Granted"),
        Err(ApiError::InvalidInput { field, .. }) if field == "state"
    ));
    assert!(matches!(
        handlers::list_requests_in_states(&mut persistence, ""),
        Err(ApiError::InvalidInput { field, .. }) if field == "state"
    ));
}

#[test]
fn test_count_requests_by_state_includes_zero_states() {
    let (mut persistence, period_id) = setup();
    let group_id = seed_group(&mut persistence, period_id, 30, 5);
    handlers::create_request(
        &mut persistence,
        create_request_payload(group_id),
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    )
    .unwrap();

    let counts = handlers::count_requests_by_state(&mut persistence, period_id).unwrap();

    assert_eq!(counts.len(), 5);
    let count_for = |state: &str| {
        counts
            .iter()
            .find(|c| c.state == state)
            .map(|c| c.count)
            .unwrap()
    };
    assert_eq!(count_for("Pending"), 1);
    assert_eq!(count_for("Approved"), 0);
    assert_eq!(count_for("Rejected"), 0);
}

#[test]
fn test_list_requests_for_period_defaults_open_bounds() {
    let (mut persistence, period_id) = setup();
    let group_id = seed_group(&mut persistence, period_id, 30, 0);

    for day in [3, 10] {
        handlers::create_request(
            &mut persistence,
            create_request_payload(group_id),
            create_test_actor(),
            create_test_cause(),
            &FixedClock::new(instant(2026, 2, day, 10)),
        )
        .unwrap();
    }

    let all = handlers::list_requests_for_period(&mut persistence, period_id, None, None)
        .unwrap();
    assert_eq!(all.len(), 2);

    let early = handlers::list_requests_for_period(
        &mut persistence,
        period_id,
        None,
        Some(instant(2026, 2, 5, 0)),
    )
    .unwrap();
    assert_eq!(early.len(), 1);
    assert_eq!(early[0].created_at, instant(2026, 2, 3, 10));
}

#[test]
fn test_update_request_appends_a_history_entry() {
    let (mut persistence, period_id) = setup();
    let group_id = seed_group(&mut persistence, period_id, 30, 5);
    let created = handlers::create_request(
        &mut persistence,
        create_request_payload(group_id),
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    )
    .unwrap();

    let updated = handlers::update_request(
        &mut persistence,
        created.request.request_id.unwrap(),
        UpdateRequestRequest {
            priority: Some(7),
            notes: Some(String::from("Lowered urgency")),
            ..UpdateRequestRequest::default()
        },
        create_test_actor(),
        create_test_cause(),
        &FixedClock::new(instant(2026, 2, 4, 9)),
    )
    .unwrap();

    assert_eq!(updated.priority, 7);
    assert_eq!(updated.history.len(), 2);
    assert_eq!(updated.history[1].action, "UPDATED");
    assert_eq!(updated.history[1].notes.as_deref(), Some("Lowered urgency"));
}

#[test]
fn test_delete_pending_request_removes_it() {
    let (mut persistence, period_id) = setup();
    let group_id = seed_group(&mut persistence, period_id, 30, 5);
    let created = handlers::create_request(
        &mut persistence,
        create_request_payload(group_id),
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    )
    .unwrap();
    let request_id = created.request.request_id.unwrap();

    let response = handlers::delete_request(
        &mut persistence,
        request_id,
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    )
    .unwrap();

    assert_eq!(response.request_id, request_id);
    assert!(response.message.contains(&created.request.code));
    assert!(matches!(
        handlers::get_request(&mut persistence, request_id),
        Err(ApiError::ResourceNotFound { .. })
    ));
}

#[test]
fn test_delete_pending_request_keeps_detected_conflicts_as_ledger_entries() {
    let (mut persistence, period_id) = setup();
    let enrolled_group = seed_group_with_slots(
        &mut persistence,
        period_id,
        30,
        0,
        vec![slot_info("Monday", 8, 10)],
    );
    seed_enrolled_student(&mut persistence, enrolled_group, 100);
    let destination_id = seed_group_with_slots(
        &mut persistence,
        period_id,
        30,
        5,
        vec![slot_info("Monday", 9, 11)],
    );

    let created = handlers::create_request(
        &mut persistence,
        create_request_payload(destination_id),
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    )
    .unwrap();
    assert_eq!(created.conflicts.len(), 1);
    let request_id = created.request.request_id.unwrap();

    handlers::delete_request(
        &mut persistence,
        request_id,
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    )
    .unwrap();

    // The conflict outlives the request, with the reference cleared.
    let remaining = handlers::list_conflicts(&mut persistence, Some(100), None).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].request_id, None);
    assert!(
        handlers::list_conflicts_for_request(&mut persistence, request_id)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_group_occupancy_reporting() {
    let (mut persistence, period_id) = setup();
    let near_full = seed_group(&mut persistence, period_id, 10, 9);
    let half_full = seed_group(&mut persistence, period_id, 10, 5);

    let near = handlers::get_group(&mut persistence, near_full).unwrap();
    assert!((near.occupancy_percentage - 90.0).abs() < f64::EPSILON);
    assert!(near.near_capacity);

    let half = handlers::get_group(&mut persistence, half_full).unwrap();
    assert!((half.occupancy_percentage - 50.0).abs() < f64::EPSILON);
    assert!(!half.near_capacity);
}

#[test]
fn test_lost_concurrency_race_surfaces_as_concurrent_modification() {
    let translated = translate_persistence_error(PersistenceError::ConcurrencyConflict {
        resource: String::from("request 7"),
    });

    assert_eq!(
        translated,
        ApiError::ConcurrentModification {
            resource: String::from("request 7"),
        }
    );
}

#[test]
fn test_withdrawal_without_origin_is_rejected() {
    let (mut persistence, _) = setup();

    let result = handlers::create_request(
        &mut persistence,
        CreateRequestRequest {
            request_type: String::from("Withdrawal"),
            student_id: 100,
            origin_enrollment_id: None,
            destination_group_id: None,
            destination_course_id: None,
            priority: 3,
            notes: None,
        },
        create_test_actor(),
        create_test_cause(),
        &create_test_clock(),
    );

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { rule, .. }) if rule == "origin_required"
    ));
}
