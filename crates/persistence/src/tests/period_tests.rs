// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for academic period persistence.

use crate::{Persistence, PersistenceError};

use super::{create_test_event, create_test_now, create_test_period, instant};

#[test]
fn test_insert_and_get_round_trips_all_fields() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    let period_id = persistence
        .insert_period(&create_test_period(2026, 1))
        .unwrap();
    let loaded = persistence.get_period(period_id).unwrap();

    assert_eq!(loaded.period_id, Some(period_id));
    assert_eq!(loaded.start, instant(2026, 1, 12, 0));
    assert_eq!(loaded.end, instant(2026, 5, 29, 23));
    assert_eq!(loaded.request_deadline, instant(2026, 2, 27, 23));
    assert_eq!(loaded.year, 2026);
    assert_eq!(loaded.term, 1);
    assert!(!loaded.active);
}

#[test]
fn test_activate_period_swaps_active_flag() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    let first = persistence
        .insert_period(&create_test_period(2026, 1))
        .unwrap();
    let second = persistence
        .insert_period(&create_test_period(2026, 2))
        .unwrap();

    persistence
        .activate_period(first, &create_test_event(), create_test_now())
        .unwrap();
    persistence
        .activate_period(second, &create_test_event(), create_test_now())
        .unwrap();

    assert!(!persistence.get_period(first).unwrap().active);
    assert!(persistence.get_period(second).unwrap().active);

    let active = persistence.get_active_period().unwrap().unwrap();
    assert_eq!(active.period_id, Some(second));
}

#[test]
fn test_activate_missing_period_fails_without_deactivating_current() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    let period_id = persistence
        .insert_period(&create_test_period(2026, 1))
        .unwrap();
    persistence
        .activate_period(period_id, &create_test_event(), create_test_now())
        .unwrap();

    let result = persistence.activate_period(999, &create_test_event(), create_test_now());

    assert!(matches!(result, Err(PersistenceError::NotFound(_))));
    // Transaction rollback keeps the current period active.
    assert!(persistence.get_period(period_id).unwrap().active);
}

#[test]
fn test_activation_records_audit_event() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    let period_id = persistence
        .insert_period(&create_test_period(2026, 1))
        .unwrap();
    let event_id = persistence
        .activate_period(period_id, &create_test_event(), create_test_now())
        .unwrap();

    let event = persistence.get_audit_event(event_id).unwrap();
    assert_eq!(event.action.name, "TestAction");
}

#[test]
fn test_duplicate_year_and_term_is_rejected() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    persistence
        .insert_period(&create_test_period(2026, 1))
        .unwrap();
    let result = persistence.insert_period(&create_test_period(2026, 1));

    assert!(result.is_err());
}

#[test]
fn test_list_periods_orders_newest_first() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    persistence
        .insert_period(&create_test_period(2025, 2))
        .unwrap();
    persistence
        .insert_period(&create_test_period(2026, 1))
        .unwrap();

    let periods = persistence.list_periods().unwrap();
    assert_eq!(periods.len(), 2);
    assert_eq!(periods[0].year, 2026);
    assert_eq!(periods[1].year, 2025);
}
