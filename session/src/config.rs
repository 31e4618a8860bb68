//! Session store configuration.

use std::time::Duration;

/// Session store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Delay between [`clear_user`](crate::SessionStore::clear_user) and the
    /// reset of `is_logging_out`, so a "logging out" message can render before
    /// route guards run again.
    ///
    /// Default: 1 second
    pub logging_out_reset_delay: Duration,

    /// Delay before the forced redirect to the login page after an expired
    /// session.
    ///
    /// Default: 1.5 seconds
    pub redirect_delay: Duration,

    /// Login page route.
    ///
    /// Default: `/login`
    pub login_route: String,

    /// Route authenticated users are sent to from public pages.
    ///
    /// Default: `/`
    pub home_route: String,

    /// Routes that never trigger a forced redirect.
    ///
    /// Default: `/`, `/login`, `/register`
    pub public_routes: Vec<String>,
}

impl SessionConfig {
    /// Create configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `is_logging_out` reset delay.
    #[must_use]
    pub const fn with_logging_out_reset_delay(mut self, delay: Duration) -> Self {
        self.logging_out_reset_delay = delay;
        self
    }

    /// Set the forced redirect delay.
    #[must_use]
    pub const fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    /// Set the login route.
    #[must_use]
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    /// Replace the public routes.
    #[must_use]
    pub fn with_public_routes<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_routes = routes.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `route` is public. Case and a trailing `/` are ignored.
    #[must_use]
    pub fn is_public_route(&self, route: &str) -> bool {
        let route = normalize_route(route);
        self.public_routes
            .iter()
            .any(|public| normalize_route(public).eq_ignore_ascii_case(route))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            logging_out_reset_delay: Duration::from_secs(1),
            redirect_delay: Duration::from_millis(1500),
            login_route: "/login".to_string(),
            home_route: "/".to_string(),
            public_routes: vec!["/".to_string(), "/login".to_string(), "/register".to_string()],
        }
    }
}

fn normalize_route(route: &str) -> &str {
    let trimmed = route.trim();
    if trimmed.len() > 1 {
        trimmed.strip_suffix('/').unwrap_or(trimmed)
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_public_routes() {
        let config = SessionConfig::default();

        assert!(config.is_public_route("/"));
        assert!(config.is_public_route("/login"));
        assert!(config.is_public_route("/Login"));
        assert!(config.is_public_route("/register/"));
        assert!(!config.is_public_route("/profile"));
        assert!(!config.is_public_route("/posts/3/"));
    }

    #[test]
    fn test_custom_public_routes() {
        let config = SessionConfig::new().with_public_routes(["/welcome/"]);

        assert!(config.is_public_route("/welcome"));
        assert!(!config.is_public_route("/login"));
    }
}
