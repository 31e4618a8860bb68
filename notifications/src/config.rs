//! Poller configuration.

use std::time::Duration;

/// Notification poller configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Minimum time between two completed full fetches.
    ///
    /// Default: 5 seconds
    pub throttle_window: Duration,

    /// Period of [`cooldown_ticks`](crate::NotificationPoller::cooldown_ticks).
    ///
    /// Default: 1 second
    pub cooldown_tick: Duration,
}

impl PollerConfig {
    /// Create configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the throttle window.
    #[must_use]
    pub const fn with_throttle_window(mut self, window: Duration) -> Self {
        self.throttle_window = window;
        self
    }

    /// Set the cooldown tick period.
    #[must_use]
    pub const fn with_cooldown_tick(mut self, period: Duration) -> Self {
        self.cooldown_tick = period;
        self
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            throttle_window: Duration::from_secs(5),
            cooldown_tick: Duration::from_secs(1),
        }
    }
}
