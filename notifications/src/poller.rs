//! Notification poller.
//!
//! Caches the notification list and unread badge count. Full fetches are
//! guarded twice: only one may be in flight, and a new one may only start once
//! the throttle window has elapsed since the last completed fetch.

use crate::config::PollerConfig;
use crate::state::PollerSnapshot;
use focusapp_api::{ApiClient, ApiError};
use focusapp_core::environment::Clock;
use focusapp_core::model::NotificationItem;
use focusapp_session::SessionSnapshot;
use futures::Stream;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;

const LOAD_FAILED: &str = "Error al cargar las notificaciones";

/// Result of a full fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// List replaced.
    Fetched {
        /// Notifications received
        total: usize,
        /// Unread among them
        unread: u64,
    },
    /// Rejected by the throttle window.
    Throttled {
        /// Whole seconds until a fetch is allowed
        remaining_secs: u64,
    },
    /// Rejected because another fetch is running.
    InFlight,
    /// No stored access token.
    SignedOut,
    /// Request failed; the cached list is kept.
    Failed(String),
    /// The poller was reset while the request was running.
    Discarded,
}

/// Result of the explicit refresh action, with the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// List refreshed.
    Refreshed,
    /// Another fetch is running.
    Busy,
    /// Throttled.
    Cooldown {
        /// Whole seconds until a refresh is allowed
        remaining_secs: u64,
    },
    /// Refresh failed.
    Failed,
    /// Not signed in.
    SignedOut,
}

impl RefreshOutcome {
    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Refreshed => "Notificaciones actualizadas".to_string(),
            Self::Busy => "Ya hay una petición en curso, esperando respuesta...".to_string(),
            Self::Cooldown { remaining_secs } => {
                format!("Espera {remaining_secs} segundos antes de la próxima actualización")
            }
            Self::Failed => LOAD_FAILED.to_string(),
            Self::SignedOut => "Inicia sesión para ver tus notificaciones".to_string(),
        }
    }
}

impl From<FetchOutcome> for RefreshOutcome {
    fn from(outcome: FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Fetched { .. } => Self::Refreshed,
            FetchOutcome::Throttled { remaining_secs } => Self::Cooldown { remaining_secs },
            FetchOutcome::InFlight => Self::Busy,
            FetchOutcome::Failed(_) => Self::Failed,
            FetchOutcome::SignedOut | FetchOutcome::Discarded => Self::SignedOut,
        }
    }
}

/// Throttled notification cache.
pub struct NotificationPoller {
    api: ApiClient,
    clock: Arc<dyn Clock>,
    config: PollerConfig,
    state: watch::Sender<PollerSnapshot>,
    // Bumped by `reset` under the state lock; responses started under an
    // older generation are dropped.
    generation: AtomicU64,
}

impl fmt::Debug for NotificationPoller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationPoller")
            .field("config", &self.config)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl NotificationPoller {
    /// Create an empty poller.
    #[must_use]
    pub fn new(api: ApiClient, clock: Arc<dyn Clock>, config: PollerConfig) -> Arc<Self> {
        let (state, _) = watch::channel(PollerSnapshot::default());

        Arc::new(Self {
            api,
            clock,
            config,
            state,
            generation: AtomicU64::new(0),
        })
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> PollerSnapshot {
        self.state.borrow().clone()
    }

    /// Receive every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PollerSnapshot> {
        self.state.subscribe()
    }

    /// Poller configuration.
    #[must_use]
    pub const fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Whether a full fetch may start now.
    #[must_use]
    pub fn can_fetch(&self) -> bool {
        self.state
            .borrow()
            .throttle
            .can_fetch(self.clock.now(), self.config.throttle_window)
    }

    /// Whole seconds until a full fetch is allowed by the throttle window.
    #[must_use]
    pub fn seconds_until_next_fetch(&self) -> u64 {
        self.state
            .borrow()
            .throttle
            .seconds_until_next_fetch(self.clock.now(), self.config.throttle_window)
    }

    /// Countdown for the refresh button, emitted every tick.
    ///
    /// The first value is emitted immediately. The stream ends once the poller
    /// is dropped.
    pub fn cooldown_ticks(self: &Arc<Self>) -> Pin<Box<dyn Stream<Item = u64> + Send>> {
        let poller = Arc::downgrade(self);
        let period = self.config.cooldown_tick;

        Box::pin(async_stream::stream! {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let remaining = match poller.upgrade() {
                    Some(poller) => poller.seconds_until_next_fetch(),
                    None => break,
                };
                yield remaining;
            }
        })
    }

    /// Refresh the unread badge count.
    ///
    /// Failures are not reported: the count drops to zero if no full fetch
    /// has succeeded yet, and is kept otherwise. Returns the resulting count.
    pub async fn refresh_unread_count(&self) -> u64 {
        let generation = self.generation.load(Ordering::SeqCst);
        let result = self.api.unread_count().await;

        if let Err(e) = &result {
            tracing::debug!(error = %e, "Unread count unavailable");
        }

        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            match result {
                Ok(count) => state.unread_count = count,
                Err(_) if !state.has_fetched => state.unread_count = 0,
                Err(_) => return false,
            }
            true
        });

        self.state.borrow().unread_count
    }

    /// Fetch the full list, subject to the in-flight guard and throttle window.
    pub async fn fetch_all(&self) -> FetchOutcome {
        self.fetch_guarded(true).await
    }

    /// Hovering the bell: fetch only when allowed, otherwise do nothing.
    pub async fn on_hover(&self) -> Option<FetchOutcome> {
        if self.can_fetch() {
            Some(self.fetch_all().await)
        } else {
            let in_flight = self.state.borrow().throttle.in_flight;
            tracing::debug!(
                in_flight,
                remaining_secs = self.seconds_until_next_fetch(),
                "Skipping hover fetch"
            );
            None
        }
    }

    /// Clicking the bell: fetch when nothing is cached yet.
    ///
    /// The throttle window does not apply here; the in-flight guard does.
    pub async fn on_click(&self) -> Option<FetchOutcome> {
        if self.state.borrow().notifications.is_empty() {
            Some(self.fetch_guarded(false).await)
        } else {
            None
        }
    }

    /// Explicit refresh button.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.fetch_all().await.into()
    }

    /// Mark one notification read.
    ///
    /// The local change is applied first and is kept even if the server call
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns the API error of the server call.
    pub async fn mark_as_read(&self, id: i64) -> Result<(), ApiError> {
        self.state.send_if_modified(|state| {
            let Some(item) = state
                .notifications
                .iter_mut()
                .find(|item| item.id == id && !item.is_read)
            else {
                return false;
            };
            item.is_read = true;
            state.unread_count = state.unread_count.saturating_sub(1);
            true
        });

        self.api.mark_notification_read(id).await.inspect_err(|e| {
            tracing::warn!(id, error = %e, "Failed to mark notification as read");
        })
    }

    /// Mark every notification read.
    ///
    /// No request is made when nothing is unread. Like
    /// [`mark_as_read`](Self::mark_as_read), the local change is not rolled
    /// back on failure.
    ///
    /// # Errors
    ///
    /// Returns the API error of the server call.
    pub async fn mark_all_as_read(&self) -> Result<(), ApiError> {
        let changed = self.state.send_if_modified(|state| {
            let has_unread = state.unread_count > 0 || state.unread().next().is_some();
            if has_unread {
                for item in &mut state.notifications {
                    item.is_read = true;
                }
                state.unread_count = 0;
            }
            has_unread
        });

        if !changed {
            tracing::debug!("No unread notifications");
            return Ok(());
        }

        self.api.mark_all_notifications_read().await.inspect_err(|e| {
            tracing::warn!(error = %e, "Failed to mark all notifications as read");
        })
    }

    /// Mark `id` read and return the route it links to.
    ///
    /// # Errors
    ///
    /// Returns the API error when marking an unread notification fails.
    pub async fn open(&self, id: i64) -> Result<Option<String>, ApiError> {
        let item = self
            .state
            .borrow()
            .notifications
            .iter()
            .find(|item| item.id == id)
            .cloned();

        let Some(item) = item else {
            return Ok(None);
        };

        if !item.is_read {
            self.mark_as_read(id).await?;
        }
        Ok(item.target_route())
    }

    /// Unread notifications, straight from the server.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn unread_notifications(&self) -> Result<Vec<NotificationItem>, ApiError> {
        self.api.unread_notifications().await
    }

    /// Forget everything, as after the session ends.
    ///
    /// Responses to requests started before the reset are discarded.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = PollerSnapshot::default();
        });
    }

    /// Follow the session: fetch the unread count once per new access token,
    /// and reset when the session ends. Nothing happens while logging out.
    ///
    /// The task ends when the session store or the poller is dropped.
    pub fn watch_session(
        self: &Arc<Self>,
        mut session: watch::Receiver<SessionSnapshot>,
    ) -> JoinHandle<()> {
        let poller = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut current: Option<String> = None;
            loop {
                let (token, logging_out) = {
                    let snapshot = session.borrow_and_update();
                    (
                        snapshot.access_token().map(ToString::to_string),
                        snapshot.is_logging_out,
                    )
                };

                if !logging_out && token != current {
                    let Some(poller) = poller.upgrade() else {
                        break;
                    };
                    if token.is_some() {
                        poller.refresh_unread_count().await;
                    } else {
                        poller.reset();
                    }
                    current = token;
                }

                if session.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    async fn fetch_guarded(&self, respect_throttle: bool) -> FetchOutcome {
        let now = self.clock.now();
        let window = self.config.throttle_window;
        let generation = self.generation.load(Ordering::SeqCst);

        let mut rejected = None;
        self.state.send_if_modified(|state| {
            if state.throttle.in_flight {
                rejected = Some(FetchOutcome::InFlight);
                return false;
            }
            if respect_throttle && !state.throttle.can_fetch(now, window) {
                rejected = Some(FetchOutcome::Throttled {
                    remaining_secs: state.throttle.seconds_until_next_fetch(now, window),
                });
                return false;
            }
            state.throttle.in_flight = true;
            state.error = None;
            true
        });

        if let Some(outcome) = rejected {
            metrics::counter!("focusapp_notification_fetches_throttled_total").increment(1);
            tracing::debug!(?outcome, "Notification fetch skipped");
            return outcome;
        }

        metrics::counter!("focusapp_notification_fetches_total").increment(1);
        let result = self.api.notifications().await;
        let completed_at = self.clock.now();

        let mut outcome = FetchOutcome::Discarded;
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            state.throttle.in_flight = false;
            outcome = match result {
                Ok(items) => {
                    let unread = items.iter().filter(|item| !item.is_read).count() as u64;
                    let total = items.len();
                    state.notifications = items;
                    state.unread_count = unread;
                    state.throttle.last_fetch = Some(completed_at);
                    state.has_fetched = true;
                    FetchOutcome::Fetched { total, unread }
                }
                Err(ApiError::MissingToken) => FetchOutcome::SignedOut,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load notifications");
                    state.error = Some(LOAD_FAILED.to_string());
                    FetchOutcome::Failed(e.to_string())
                }
            };
            true
        });

        outcome
    }
}
