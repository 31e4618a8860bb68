//! Poller state.

use chrono::{DateTime, TimeDelta, Utc};
use focusapp_core::model::NotificationItem;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Throttle and in-flight guard for full fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleState {
    /// When the last successful full fetch completed.
    pub last_fetch: Option<DateTime<Utc>>,
    /// Whether a full fetch is running.
    pub in_flight: bool,
}

impl ThrottleState {
    /// Whether a fetch may start at `now`.
    ///
    /// False while one is in flight, and for the whole `window` after the last
    /// completed fetch. True again exactly when the window has elapsed.
    #[must_use]
    pub fn can_fetch(&self, now: DateTime<Utc>, window: Duration) -> bool {
        !self.in_flight && self.remaining(now, window).is_zero()
    }

    /// Time left before the window after the last fetch has elapsed.
    ///
    /// A clock that moved backwards counts as no time elapsed.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>, window: Duration) -> Duration {
        let Some(last_fetch) = self.last_fetch else {
            return Duration::ZERO;
        };

        let elapsed = (now - last_fetch).max(TimeDelta::zero());
        elapsed
            .to_std()
            .map_or(window, |elapsed| window.saturating_sub(elapsed))
    }

    /// [`remaining`](Self::remaining) rounded up to whole seconds.
    #[must_use]
    pub fn seconds_until_next_fetch(&self, now: DateTime<Utc>, window: Duration) -> u64 {
        let remaining = self.remaining(now, window);
        let seconds = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            seconds + 1
        } else {
            seconds
        }
    }
}

/// Observable state of the notification poller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerSnapshot {
    /// Cached notifications from the last successful full fetch.
    pub notifications: Vec<NotificationItem>,
    /// Unread badge count.
    pub unread_count: u64,
    /// Throttle guard.
    pub throttle: ThrottleState,
    /// Message of the last failed fetch, cleared when a new one starts.
    pub error: Option<String>,
    /// Whether a full fetch ever succeeded since the last reset.
    pub has_fetched: bool,
}

impl PollerSnapshot {
    /// Whether a full fetch is running.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.throttle.in_flight
    }

    /// Unread items among the cached notifications.
    pub fn unread(&self) -> impl Iterator<Item = &NotificationItem> {
        self.notifications.iter().filter(|n| !n.is_read)
    }
}
