//! Integration tests for the session expiration coordinator.

use focusapp_core::environment::Clock;
use focusapp_core::expiration::{
    ExpirationConfig, ExpirationOptions, SessionExpirationCoordinator,
};
use focusapp_core::storage::{ACCESS_KEY, REFRESH_KEY, USERNAME_KEY};
use focusapp_testing::{FailingStorage, ManualClock, RecordingStorage, test_clock};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct Fixture {
    coordinator: Arc<SessionExpirationCoordinator>,
    storage: Arc<RecordingStorage>,
    clock: ManualClock,
    calls: Arc<AtomicUsize>,
}

fn setup() -> Fixture {
    let storage = Arc::new(RecordingStorage::with_session("A1", "R1", "alice"));
    let clock = ManualClock::new(test_clock().now());
    let coordinator = SessionExpirationCoordinator::create(
        storage.clone(),
        Arc::new(clock.clone()),
        ExpirationConfig::default(),
    );

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    coordinator.set_expiration_callback(Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    Fixture {
        coordinator,
        storage,
        clock,
        calls,
    }
}

#[test]
fn test_teardown_clears_tokens_and_fires_callback() {
    let f = setup();

    assert!(f.coordinator.handle_expiration(ExpirationOptions::default()));

    assert_eq!(f.calls.load(Ordering::SeqCst), 1);
    assert_eq!(f.storage.value(ACCESS_KEY), None);
    assert_eq!(f.storage.value(REFRESH_KEY), None);
    assert_eq!(f.storage.value(USERNAME_KEY), None);
    assert!(f.coordinator.is_processing());
}

#[test]
fn test_burst_of_unauthorized_responses_tears_down_once() {
    let f = setup();

    let handled = (0..25)
        .filter(|_| f.coordinator.check_and_handle_unauthorized(401))
        .count();

    assert_eq!(handled, 1);
    assert_eq!(f.storage.access_removals(), 1);
    assert_eq!(f.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_tasks_tear_down_once() {
    let f = setup();

    let mut handles = vec![];
    for _ in 0..50 {
        let coordinator = Arc::clone(&f.coordinator);
        handles.push(tokio::spawn(async move {
            coordinator.check_and_handle_unauthorized(401)
        }));
    }

    let mut handled = 0;
    for handle in handles {
        if handle.await.unwrap() {
            handled += 1;
        }
    }

    assert_eq!(handled, 1);
    assert_eq!(f.storage.access_removals(), 1);
    assert_eq!(f.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_second_unauthorized_100ms_later_is_suppressed() {
    let f = setup();

    assert!(f.coordinator.check_and_handle_unauthorized(401));
    f.clock.advance(Duration::from_millis(100));
    assert!(!f.coordinator.check_and_handle_unauthorized(401));

    assert_eq!(f.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_flag_resets_after_suppression_window() {
    let f = setup();

    assert!(f.coordinator.check_and_handle_unauthorized(401));

    f.clock.advance(Duration::from_millis(499));
    assert!(f.coordinator.is_processing());
    assert!(!f.coordinator.check_and_handle_unauthorized(401));

    f.clock.advance(Duration::from_millis(1));
    assert!(!f.coordinator.is_processing());
    assert!(f.coordinator.check_and_handle_unauthorized(401));

    assert_eq!(f.calls.load(Ordering::SeqCst), 2);
    assert_eq!(f.storage.access_removals(), 2);
}

#[test]
fn test_non_unauthorized_status_is_ignored() {
    let f = setup();

    for status in [200, 204, 400, 403, 404, 500] {
        assert!(!f.coordinator.check_and_handle_unauthorized(status));
    }

    assert_eq!(f.calls.load(Ordering::SeqCst), 0);
    assert_eq!(f.storage.value(ACCESS_KEY).as_deref(), Some("A1"));
    assert!(!f.coordinator.is_processing());
}

#[test]
fn test_last_registered_callback_wins() {
    let f = setup();

    let second = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&second);
    f.coordinator.set_expiration_callback(Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    f.coordinator.handle_expiration(ExpirationOptions::silent());

    assert_eq!(f.calls.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn test_teardown_without_callback_still_clears_storage() {
    let storage = Arc::new(RecordingStorage::with_session("A1", "R1", "alice"));
    let coordinator = SessionExpirationCoordinator::create(
        storage.clone(),
        Arc::new(test_clock()),
        ExpirationConfig::default(),
    );

    assert!(!coordinator.has_callback());
    assert!(coordinator.handle_expiration(ExpirationOptions::default()));
    assert!(storage.entries().is_empty());
}

#[test]
fn test_callback_may_reenter_coordinator() {
    let storage = Arc::new(RecordingStorage::with_session("A1", "R1", "alice"));
    let coordinator = SessionExpirationCoordinator::create(
        storage,
        Arc::new(test_clock()),
        ExpirationConfig::default(),
    );

    let reentered = Arc::new(AtomicUsize::new(0));
    let weak = Arc::downgrade(&coordinator);
    let counter = Arc::clone(&reentered);
    coordinator.set_expiration_callback(Arc::new(move || {
        if let Some(coordinator) = weak.upgrade() {
            // Nested detection during teardown is suppressed, not deadlocked
            if !coordinator.check_and_handle_unauthorized(401) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }
    }));

    assert!(coordinator.check_and_handle_unauthorized(401));
    assert_eq!(reentered.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dispose_makes_coordinator_inert() {
    let f = setup();

    f.coordinator.dispose();

    assert!(!f.coordinator.has_callback());
    assert!(!f.coordinator.check_and_handle_unauthorized(401));
    assert_eq!(f.calls.load(Ordering::SeqCst), 0);
    assert_eq!(f.storage.value(ACCESS_KEY).as_deref(), Some("A1"));
}

#[test]
fn test_custom_suppression_window() {
    let storage = Arc::new(RecordingStorage::new());
    let clock = ManualClock::new(test_clock().now());
    let coordinator = SessionExpirationCoordinator::create(
        storage,
        Arc::new(clock.clone()),
        ExpirationConfig::default().with_suppression_window(Duration::from_secs(2)),
    );

    assert!(coordinator.check_and_handle_unauthorized(401));
    clock.advance(Duration::from_millis(1500));
    assert!(!coordinator.check_and_handle_unauthorized(401));
    clock.advance(Duration::from_millis(500));
    assert!(coordinator.check_and_handle_unauthorized(401));
}

#[test]
fn test_clock_going_backwards_stays_suppressed() {
    let f = setup();
    let start = f.clock.now();

    assert!(f.coordinator.check_and_handle_unauthorized(401));
    f.clock.set(start - chrono::TimeDelta::seconds(10));

    assert!(!f.coordinator.check_and_handle_unauthorized(401));
}

#[test]
fn test_storage_failure_still_runs_callback() {
    let storage = Arc::new(
        FailingStorage::with_session("A1", "R1", "alice").fail_remove(ACCESS_KEY),
    );
    let coordinator = SessionExpirationCoordinator::create(
        storage.clone(),
        Arc::new(test_clock()),
        ExpirationConfig::default(),
    );
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    coordinator.set_expiration_callback(Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    assert!(coordinator.check_and_handle_unauthorized(401));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(coordinator.is_processing());
    // Removal continued past the failing key
    assert_eq!(storage.value(REFRESH_KEY), None);
    assert_eq!(storage.value(USERNAME_KEY), None);
}
