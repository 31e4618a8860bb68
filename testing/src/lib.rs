//! # FocusApp Testing
//!
//! Testing utilities and helpers for the FocusApp client crates.
//!
//! This crate provides:
//! - Mock implementations of the environment traits (`Clock`, `Navigator`)
//! - A token storage that records how often the session was cleared
//! - A token storage with per-key write and removal failures
//! - JSON fixtures matching the backend's response shapes
//!
//! ## Example
//!
//! ```
//! use focusapp_testing::{ManualClock, test_clock};
//! use focusapp_core::environment::Clock;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new(test_clock().now());
//! let before = clock.now();
//! clock.advance(Duration::from_millis(500));
//! assert_eq!((clock.now() - before).num_milliseconds(), 500);
//! ```

use chrono::{DateTime, Utc};
use focusapp_core::environment::{Clock, Navigator};
use focusapp_core::storage::{ACCESS_KEY, MemoryStorage, StorageError, TokenStorage};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{
        lock, Arc, Clock, DateTime, MemoryStorage, Mutex, Navigator, StorageError, TokenStorage,
        Utc, ACCESS_KEY,
    };
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use focusapp_testing::mocks::FixedClock;
    /// use focusapp_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to.
    ///
    /// Clones share the same time, so a test can keep one handle and give
    /// another to the code under test.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock starting at `time`.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward.
        ///
        /// # Panics
        ///
        /// Panics if `by` does not fit in a `chrono::TimeDelta`.
        #[allow(clippy::expect_used)]
        pub fn advance(&self, by: Duration) {
            let delta = chrono::TimeDelta::from_std(by).expect("duration out of range");
            *lock(&self.time) += delta;
        }

        /// Jump to an absolute time.
        pub fn set(&self, time: DateTime<Utc>) {
            *lock(&self.time) = time;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *lock(&self.time)
        }
    }

    /// In-memory storage that counts session clears.
    ///
    /// Every teardown path removes the `access` key, so the number of
    /// `access` removals is the number of teardowns that reached storage.
    #[derive(Debug, Default)]
    pub struct RecordingStorage {
        inner: MemoryStorage,
        access_removals: AtomicUsize,
        writes: AtomicUsize,
    }

    impl RecordingStorage {
        /// Create an empty storage.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a storage that already holds a persisted session.
        #[must_use]
        pub fn with_session(access: &str, refresh: &str, username: &str) -> Self {
            let storage = Self::new();
            let _ = storage.inner.set("access", access);
            let _ = storage.inner.set("refresh", refresh);
            let _ = storage.inner.set("username", username);
            storage
        }

        /// How many times the `access` key was removed.
        #[must_use]
        pub fn access_removals(&self) -> usize {
            self.access_removals.load(Ordering::SeqCst)
        }

        /// How many `set` calls were made.
        #[must_use]
        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        /// Snapshot of every stored key.
        #[must_use]
        pub fn entries(&self) -> BTreeMap<String, String> {
            self.inner.entries()
        }

        /// Shorthand for reading a key in assertions.
        #[must_use]
        pub fn value(&self, key: &str) -> Option<String> {
            self.inner.get(key).ok().flatten()
        }
    }

    impl TokenStorage for RecordingStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            if key == ACCESS_KEY {
                self.access_removals.fetch_add(1, Ordering::SeqCst);
            }
            self.inner.remove(key)
        }
    }

    /// In-memory storage whose writes and removals can be made to fail per key.
    ///
    /// Failures are switched on and off through `&self`, so a test can change
    /// them while the storage is shared behind an `Arc`.
    #[derive(Debug, Default)]
    pub struct FailingStorage {
        inner: MemoryStorage,
        failing_sets: Mutex<BTreeSet<String>>,
        failing_removes: Mutex<BTreeSet<String>>,
    }

    impl FailingStorage {
        /// Create an empty storage that does not fail yet.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a storage that already holds a persisted session.
        #[must_use]
        pub fn with_session(access: &str, refresh: &str, username: &str) -> Self {
            let storage = Self::new();
            let _ = storage.inner.set("access", access);
            let _ = storage.inner.set("refresh", refresh);
            let _ = storage.inner.set("username", username);
            storage
        }

        /// Make every `set` of `key` fail.
        #[must_use]
        pub fn fail_set(self, key: &str) -> Self {
            lock(&self.failing_sets).insert(key.to_string());
            self
        }

        /// Make every `remove` of `key` fail.
        #[must_use]
        pub fn fail_remove(self, key: &str) -> Self {
            lock(&self.failing_removes).insert(key.to_string());
            self
        }

        /// Stop failing.
        pub fn heal(&self) {
            lock(&self.failing_sets).clear();
            lock(&self.failing_removes).clear();
        }

        /// Shorthand for reading a key in assertions.
        #[must_use]
        pub fn value(&self, key: &str) -> Option<String> {
            self.inner.get(key).ok().flatten()
        }

        /// Snapshot of every stored key.
        #[must_use]
        pub fn entries(&self) -> BTreeMap<String, String> {
            self.inner.entries()
        }

        fn injected(operation: &str, key: &str) -> StorageError {
            StorageError::Io {
                path: PathBuf::from(key),
                message: format!("injected {operation} failure"),
            }
        }
    }

    impl TokenStorage for FailingStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if lock(&self.failing_sets).contains(key) {
                return Err(Self::injected("write", key));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            if lock(&self.failing_removes).contains(key) {
                return Err(Self::injected("remove", key));
            }
            self.inner.remove(key)
        }
    }

    /// Navigator that records redirects instead of performing them.
    #[derive(Debug)]
    pub struct RecordingNavigator {
        route: Mutex<String>,
        redirects: Mutex<Vec<String>>,
    }

    impl RecordingNavigator {
        /// Create a navigator positioned on `route`.
        #[must_use]
        pub fn on(route: impl Into<String>) -> Self {
            Self {
                route: Mutex::new(route.into()),
                redirects: Mutex::new(Vec::new()),
            }
        }

        /// Move to another route without recording a redirect.
        pub fn visit(&self, route: impl Into<String>) {
            *lock(&self.route) = route.into();
        }

        /// Every redirect performed so far.
        #[must_use]
        pub fn redirects(&self) -> Vec<String> {
            lock(&self.redirects).clone()
        }
    }

    impl Default for RecordingNavigator {
        fn default() -> Self {
            Self::on("/")
        }
    }

    impl Navigator for RecordingNavigator {
        fn current_route(&self) -> String {
            lock(&self.route).clone()
        }

        fn redirect(&self, route: &str) {
            lock(&self.redirects).push(route.to_string());
            *lock(&self.route) = route.to_string();
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// JSON bodies shaped like the backend's responses.
pub mod fixtures {
    use serde_json::{Value, json};

    /// `users/token/` success body.
    #[must_use]
    pub fn token_body(access: &str, refresh: &str) -> Value {
        json!({ "access": access, "refresh": refresh })
    }

    /// `users/me/` success body.
    #[must_use]
    pub fn identity_body(id: i64, username: &str) -> Value {
        json!({ "success": true, "data": { "id": id, "username": username } })
    }

    /// A single notification as serialized by the backend.
    #[must_use]
    pub fn notification(id: i64, is_read: bool) -> Value {
        json!({
            "id": id,
            "recipient": "alice",
            "actor": { "id": 2, "username": "bob", "profile_pic": null },
            "type": "comment",
            "target_id": 100 + id,
            "target_type": "postcomment",
            "is_read": is_read,
            "created_at": "2025-01-01T00:00:00Z",
            "message": "bob ha comentado tu publicación."
        })
    }

    /// `notifications/` success body; `unread` lists which ids are unread.
    #[must_use]
    pub fn notification_list(ids: &[i64], unread: &[i64]) -> Value {
        let data: Vec<Value> = ids
            .iter()
            .map(|id| notification(*id, !unread.contains(id)))
            .collect();
        json!({ "success": true, "data": data })
    }

    /// `notifications/count/` success body.
    #[must_use]
    pub fn unread_count_body(count: u64) -> Value {
        json!({ "success": true, "unread_count": count })
    }

    /// `{success: true}` acknowledgement.
    #[must_use]
    pub fn ack() -> Value {
        json!({ "success": true, "message": "ok" })
    }
}

/// Test helpers.
pub mod helpers {
    /// Install a tracing subscriber that writes through the test harness.
    ///
    /// Safe to call from every test; only the first call installs.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use mocks::{
    FailingStorage, FixedClock, ManualClock, RecordingNavigator, RecordingStorage, test_clock,
};

#[cfg(test)]
mod tests {
    use super::*;
    use focusapp_core::storage::SessionPersistence;
    use std::time::Duration;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(test_clock().now());
        let other = clock.clone();
        clock.advance(Duration::from_secs(2));
        assert_eq!((other.now() - test_clock().now()).num_seconds(), 2);
    }

    #[test]
    fn test_recording_storage_counts_clears() {
        let storage = RecordingStorage::with_session("A1", "R1", "alice");
        storage.clear_session().unwrap();
        storage.clear_session().unwrap();
        assert_eq!(storage.access_removals(), 2);
        assert!(storage.entries().is_empty());
    }

    #[test]
    fn test_recording_navigator() {
        let navigator = RecordingNavigator::on("/perfil");
        navigator.redirect("/login");
        assert_eq!(navigator.current_route(), "/login");
        assert_eq!(navigator.redirects(), vec!["/login".to_string()]);
    }
}
