//! Session expiration coordination.
//!
//! Every network call in the client can discover that the session died (any
//! `401`). When several in-flight requests fail at once, each of them reports
//! it; the coordinator makes sure the teardown (clear persisted tokens, run the
//! registered forced-logout callback) happens exactly once per episode.
//!
//! # Suppression window
//!
//! After a teardown the coordinator ignores further detections for
//! [`ExpirationConfig::suppression_window`] (500ms by default). The window is
//! measured with the injected [`Clock`], so the "processing" flag resets by
//! itself without a timer task.
//!
//! ```text
//! t=0ms    401 (notifications)  ──► teardown, callback fires
//! t=3ms    401 (profile)        ──► suppressed
//! t=100ms  401 (retry)          ──► suppressed
//! t=500ms                        ──► window closes
//! t=900ms  401 (new session)    ──► teardown, callback fires
//! ```

use crate::environment::Clock;
use crate::storage::{SessionPersistence, TokenStorage};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// HTTP status code that signals an invalid session.
pub const UNAUTHORIZED: u16 = 401;

/// Forced-logout handler registered by the session layer.
pub type ExpirationCallback = Arc<dyn Fn() + Send + Sync>;

/// Coordinator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationConfig {
    /// How long further detections are ignored after a teardown.
    ///
    /// Default: 500ms
    pub suppression_window: Duration,
}

impl ExpirationConfig {
    /// Create a configuration with the given suppression window.
    #[must_use]
    pub const fn new(suppression_window: Duration) -> Self {
        Self { suppression_window }
    }

    /// Set the suppression window.
    #[must_use]
    pub const fn with_suppression_window(mut self, window: Duration) -> Self {
        self.suppression_window = window;
        self
    }
}

impl Default for ExpirationConfig {
    fn default() -> Self {
        Self {
            suppression_window: Duration::from_millis(500),
        }
    }
}

/// Options for a single expiration report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpirationOptions {
    /// Do not log the expiration.
    pub silent: bool,
}

impl ExpirationOptions {
    /// Options for a report that should not be logged.
    #[must_use]
    pub const fn silent() -> Self {
        Self { silent: true }
    }
}

#[derive(Default)]
struct CoordinatorState {
    callback: Option<ExpirationCallback>,
    processing_since: Option<DateTime<Utc>>,
    disposed: bool,
}

impl CoordinatorState {
    fn is_processing(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.processing_since.is_some_and(|since| {
            // A clock that went backwards counts as still inside the window
            (now - since).to_std().map_or(true, |elapsed| elapsed < window)
        })
    }
}

/// Single point of truth for "the current session just became invalid".
///
/// Owned by the application root (see [`create`](Self::create)) and shared by
/// reference with every interceptor that can observe a `401`.
pub struct SessionExpirationCoordinator {
    storage: Arc<dyn TokenStorage>,
    clock: Arc<dyn Clock>,
    config: ExpirationConfig,
    state: Mutex<CoordinatorState>,
}

impl fmt::Debug for SessionExpirationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("SessionExpirationCoordinator")
            .field("config", &self.config)
            .field("has_callback", &state.callback.is_some())
            .field("processing_since", &state.processing_since)
            .field("disposed", &state.disposed)
            .finish_non_exhaustive()
    }
}

impl SessionExpirationCoordinator {
    /// Create a coordinator that clears `storage` on expiration.
    #[must_use]
    pub fn create(
        storage: Arc<dyn TokenStorage>,
        clock: Arc<dyn Clock>,
        config: ExpirationConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            storage,
            clock,
            config,
            state: Mutex::new(CoordinatorState::default()),
        })
    }

    /// Register the forced-logout handler.
    ///
    /// Only one handler exists at a time; registering again replaces the
    /// previous one (last registration wins).
    pub fn set_expiration_callback(&self, callback: ExpirationCallback) {
        let mut state = self.lock();
        if state.callback.is_some() {
            tracing::debug!("Replacing session expiration callback");
        }
        state.callback = Some(callback);
    }

    /// Whether a handler is registered.
    #[must_use]
    pub fn has_callback(&self) -> bool {
        self.lock().callback.is_some()
    }

    /// Whether a teardown happened within the suppression window.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.lock()
            .is_processing(self.clock.now(), self.config.suppression_window)
    }

    /// Tear the session down, unless a teardown is already in progress.
    ///
    /// Clears the persisted tokens, then invokes the registered callback (if
    /// any). Returns `true` when this call performed the teardown, `false`
    /// when it was suppressed or the coordinator has been disposed.
    ///
    /// Never fails: storage errors are logged and the callback still runs.
    pub fn handle_expiration(&self, options: ExpirationOptions) -> bool {
        let callback = {
            let mut state = self.lock();
            if state.disposed {
                return false;
            }

            let now = self.clock.now();
            if state.is_processing(now, self.config.suppression_window) {
                metrics::counter!("focusapp_session_expirations_suppressed_total").increment(1);
                tracing::debug!("Session expiration already being processed, ignoring");
                return false;
            }

            state.processing_since = Some(now);
            state.callback.clone()
        };

        if !options.silent {
            tracing::warn!("Session expired");
        }
        metrics::counter!("focusapp_session_expirations_total").increment(1);

        if let Err(e) = self.storage.clear_session() {
            tracing::error!(error = %e, "Failed to clear persisted session tokens");
        }

        // Invoked outside the lock: the handler may call back into us
        if let Some(callback) = callback {
            callback();
        }

        true
    }

    /// Delegate to [`handle_expiration`](Self::handle_expiration) when
    /// `status` is `401`; otherwise do nothing.
    ///
    /// Returns whether an expiration was handled.
    pub fn check_and_handle_unauthorized(&self, status: u16) -> bool {
        self.check_and_handle_unauthorized_with(status, ExpirationOptions::default())
    }

    /// Same as [`check_and_handle_unauthorized`](Self::check_and_handle_unauthorized)
    /// with explicit options.
    pub fn check_and_handle_unauthorized_with(
        &self,
        status: u16,
        options: ExpirationOptions,
    ) -> bool {
        status == UNAUTHORIZED && self.handle_expiration(options)
    }

    /// Drop the registered handler and stop reacting to detections.
    ///
    /// Called by the application root on shutdown.
    pub fn dispose(&self) {
        let mut state = self.lock();
        state.callback = None;
        state.processing_since = None;
        state.disposed = true;
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
