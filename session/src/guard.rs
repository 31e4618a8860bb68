//! Route guards.
//!
//! Pure decisions over a [`SessionSnapshot`]; the UI layer performs the
//! navigation.

use crate::config::SessionConfig;
use crate::state::SessionSnapshot;

/// What to do with a navigation to a guarded route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    /// The store is still initializing; show a placeholder.
    Loading,
    /// Render the route.
    Render,
    /// Navigate elsewhere instead.
    Redirect(String),
}

impl RouteAccess {
    /// Decision for a route that requires a session.
    #[must_use]
    pub fn private_route(snapshot: &SessionSnapshot, config: &SessionConfig) -> Self {
        if snapshot.loading {
            Self::Loading
        } else if snapshot.is_authenticated() {
            Self::Render
        } else {
            Self::Redirect(config.login_route.clone())
        }
    }

    /// Decision for login/registration pages, which signed-in users skip.
    #[must_use]
    pub fn public_route(snapshot: &SessionSnapshot, config: &SessionConfig) -> Self {
        if snapshot.loading {
            Self::Loading
        } else if snapshot.is_authenticated() {
            Self::Redirect(config.home_route.clone())
        } else {
            Self::Render
        }
    }
}
