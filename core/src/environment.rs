//! Environment module - Dependency injection traits
//!
//! All side effects that are not HTTP calls (reading the time, moving the user
//! to another page) are abstracted behind traits and injected by the
//! application root. Tests swap in the deterministic versions from
//! `focusapp-testing`.

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```
/// use focusapp_core::environment::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let before = clock.now();
/// assert!(clock.now() >= before);
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Navigation surface of the embedding application.
///
/// The session layer only ever needs to know where the user currently is and
/// to perform a hard redirect (for example to the login page after a forced
/// logout).
pub trait Navigator: Send + Sync {
    /// Route the user is currently on (e.g. `"/perfil"`).
    fn current_route(&self) -> String;

    /// Hard redirect to `route`, discarding in-page state.
    fn redirect(&self, route: &str);
}
