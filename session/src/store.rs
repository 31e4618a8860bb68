//! The session store.
//!
//! [`SessionStore`] owns the in-memory session and is the only writer of the
//! persisted tokens besides the expiration coordinator. State changes are
//! published on a `tokio::sync::watch` channel; the UI (or the notification
//! poller) subscribes with [`SessionStore::subscribe`].

use crate::config::SessionConfig;
use crate::state::{Session, SessionPhase, SessionSnapshot};
use focusapp_api::{ApiClient, ApiError};
use focusapp_core::environment::Navigator;
use focusapp_core::expiration::SessionExpirationCoordinator;
use focusapp_core::model::{Credentials, NewAccount, TokenPair, UserSummary};
use focusapp_core::storage::{SessionPersistence, TokenStorage};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Authenticated-identity lifecycle.
pub struct SessionStore {
    api: ApiClient,
    storage: Arc<dyn TokenStorage>,
    coordinator: Arc<SessionExpirationCoordinator>,
    navigator: Arc<dyn Navigator>,
    config: SessionConfig,
    state: Arc<watch::Sender<SessionSnapshot>>,
    // Bumped whenever `is_logging_out` is set or force-cleared, so a pending
    // delayed reset from an older logout does not clobber a newer one.
    logout_epoch: Arc<AtomicU64>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("config", &self.config)
            .field("snapshot", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a store in the loading state.
    ///
    /// Call [`register_as_expiration_target`](Self::register_as_expiration_target)
    /// and then [`initialize`](Self::initialize) at startup.
    #[must_use]
    pub fn new(
        api: ApiClient,
        storage: Arc<dyn TokenStorage>,
        coordinator: Arc<SessionExpirationCoordinator>,
        navigator: Arc<dyn Navigator>,
        config: SessionConfig,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(SessionSnapshot::default());

        Arc::new(Self {
            api,
            storage,
            coordinator,
            navigator,
            config,
            state: Arc::new(state),
            logout_epoch: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Receive every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Access token of the current session.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.state.borrow().access_token().map(ToString::to_string)
    }

    /// Identity of the current session.
    #[must_use]
    pub fn identity(&self) -> Option<UserSummary> {
        self.state.borrow().identity().cloned()
    }

    /// Store configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Restore the persisted session, if any.
    ///
    /// With both tokens persisted, the identity is fetched with the access
    /// token. Failure to fetch it invalidates the session: tokens are cleared
    /// and the store stays unauthenticated. `loading` is `false` afterwards in
    /// every case.
    ///
    /// Returns whether a session was restored.
    pub async fn initialize(&self) -> bool {
        let tokens = match self.storage.load_tokens() {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted session");
                None
            }
        };

        let Some(tokens) = tokens else {
            self.state.send_modify(|state| state.loading = false);
            return false;
        };

        match self.api.current_user(&tokens.access).await {
            Ok(identity) => {
                tracing::info!(user_id = identity.id, "Session restored");
                self.state.send_modify(|state| {
                    state.phase = SessionPhase::Authenticated;
                    state.session = Some(Session::new(tokens, Some(identity)));
                    state.loading = false;
                });
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Persisted session is no longer valid");
                self.clear_persisted();
                self.state.send_modify(|state| {
                    state.phase = SessionPhase::Unauthenticated;
                    state.session = None;
                    state.loading = false;
                });
                false
            }
        }
    }

    /// Log in with `credentials`.
    ///
    /// On success the tokens and username are persisted and the identity is
    /// fetched. A failed identity fetch does not fail the login; the session
    /// then has no identity. Any other failure leaves the state as it was.
    ///
    /// Returns whether the login succeeded.
    pub async fn login(&self, credentials: &Credentials) -> bool {
        let previous = self.state.borrow().phase;
        self.state
            .send_modify(|state| state.phase = SessionPhase::Authenticating);

        let tokens = match self.api.obtain_tokens(credentials).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::info!(username = %credentials.username, error = %e, "Login rejected");
                self.abort_login(previous);
                return false;
            }
        };

        if let Err(e) = self.storage.persist_session(&tokens, &credentials.username) {
            tracing::error!(error = %e, "Failed to persist session");
            self.abort_login(previous);
            return false;
        }

        let identity = match self.api.current_user(&tokens.access).await {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::warn!(error = %e, "Logged in but identity fetch failed");
                None
            }
        };

        tracing::info!(username = %credentials.username, "Logged in");
        self.state.send_modify(|state| {
            state.phase = SessionPhase::Authenticated;
            state.session = Some(Session::new(tokens, identity));
            state.loading = false;
        });
        true
    }

    /// Log out.
    ///
    /// Sets `is_logging_out`, then revokes the refresh token server-side. If
    /// revocation fails the session is kept, `is_logging_out` is reset and
    /// `false` is returned. Otherwise the persisted tokens are cleared; the
    /// in-memory identity stays until [`clear_user`](Self::clear_user).
    pub async fn logout(&self) -> bool {
        self.logout_epoch.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|state| {
            state.is_logging_out = true;
            if state.session.is_some() {
                state.phase = SessionPhase::LoggingOut;
            }
        });

        if let Some(tokens) = self.current_tokens() {
            if let Err(e) = self.api.revoke_session(&tokens).await {
                tracing::warn!(error = %e, "Logout failed, keeping session");
                self.logout_epoch.fetch_add(1, Ordering::SeqCst);
                self.state.send_modify(|state| {
                    state.is_logging_out = false;
                    if state.session.is_some() {
                        state.phase = SessionPhase::Authenticated;
                    }
                });
                return false;
            }
        } else {
            tracing::debug!("No refresh token, skipping server-side logout");
        }

        self.clear_persisted();
        tracing::info!("Logged out");
        true
    }

    /// Drop the in-memory identity.
    ///
    /// `is_logging_out` is reset after the configured delay.
    pub fn clear_user(&self) {
        self.state.send_modify(|state| {
            state.phase = SessionPhase::Unauthenticated;
            state.session = None;
            state.loading = false;
        });

        let epoch = self.logout_epoch.load(Ordering::SeqCst);
        let logout_epoch = Arc::clone(&self.logout_epoch);
        let state = Arc::clone(&self.state);
        schedule_after(self.config.logging_out_reset_delay, move || {
            if logout_epoch.load(Ordering::SeqCst) == epoch {
                state.send_if_modified(|snapshot| {
                    std::mem::replace(&mut snapshot.is_logging_out, false)
                });
            }
        });
    }

    /// Register this store as the coordinator's forced-logout handler.
    ///
    /// The coordinator only holds a weak reference; once the store is dropped
    /// the handler does nothing.
    pub fn register_as_expiration_target(self: &Arc<Self>) {
        let store = Arc::downgrade(self);
        self.coordinator.set_expiration_callback(Arc::new(move || {
            if let Some(store) = store.upgrade() {
                store.force_teardown();
            }
        }));
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns the API error, with the backend's validation messages for a
    /// rejected form.
    pub async fn register(&self, account: &NewAccount) -> Result<UserSummary, ApiError> {
        let created = self.api.register_account(account).await?;
        tracing::info!(user_id = created.id, username = %created.username, "Account registered");
        Ok(created)
    }

    /// Hard teardown run by the coordinator on expiration.
    fn force_teardown(&self) {
        self.clear_persisted();
        self.logout_epoch.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|state| {
            state.phase = SessionPhase::Unauthenticated;
            state.session = None;
            state.loading = false;
            state.is_logging_out = false;
        });

        let route = self.navigator.current_route();
        if self.config.is_public_route(&route) {
            tracing::debug!(route = %route, "Session expired on a public route, not redirecting");
            return;
        }

        tracing::info!(from = %route, "Session expired, redirecting to login");
        let navigator = Arc::clone(&self.navigator);
        let login_route = self.config.login_route.clone();
        schedule_after(self.config.redirect_delay, move || {
            navigator.redirect(&login_route);
        });
    }

    fn abort_login(&self, previous: SessionPhase) {
        self.state.send_if_modified(|state| {
            if state.phase == SessionPhase::Authenticating {
                state.phase = previous;
                true
            } else {
                false
            }
        });
    }

    fn current_tokens(&self) -> Option<TokenPair> {
        if let Some(session) = &self.state.borrow().session {
            return Some(session.tokens());
        }

        match self.storage.load_tokens() {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted session");
                None
            }
        }
    }

    fn clear_persisted(&self) {
        if let Err(e) = self.storage.clear_session() {
            tracing::error!(error = %e, "Failed to clear persisted session");
        }
    }
}

/// Run `task` after `delay` on the current runtime, or right away without one.
fn schedule_after(delay: Duration, task: impl FnOnce() + Send + 'static) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                tokio::time::sleep(delay).await;
                task();
            });
        }
        Err(_) => task(),
    }
}
