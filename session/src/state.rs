//! Session state types.
//!
//! The store publishes a [`SessionSnapshot`] on every transition.

use focusapp_core::model::{TokenPair, UserSummary};
use serde::{Deserialize, Serialize};

/// Where the session lifecycle currently stands.
///
/// `Unauthenticated → Authenticating → Authenticated → LoggingOut →
/// Unauthenticated`, plus the forced `Authenticated → Unauthenticated` edge
/// taken on expiration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No session.
    #[default]
    Unauthenticated,
    /// Credentials posted, waiting for tokens.
    Authenticating,
    /// Tokens held.
    Authenticated,
    /// Revocation in progress or identity awaiting [`clear_user`](crate::SessionStore::clear_user).
    LoggingOut,
}

/// Authenticated session held in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token.
    pub access_token: String,
    /// Token sent on logout.
    pub refresh_token: String,
    /// Identity, `None` if the identity fetch after login failed.
    pub identity: Option<UserSummary>,
}

impl Session {
    /// Build a session from a token pair.
    #[must_use]
    pub fn new(tokens: TokenPair, identity: Option<UserSummary>) -> Self {
        Self {
            access_token: tokens.access,
            refresh_token: tokens.refresh,
            identity,
        }
    }

    /// The session's tokens.
    #[must_use]
    pub fn tokens(&self) -> TokenPair {
        TokenPair::new(self.access_token.clone(), self.refresh_token.clone())
    }
}

/// Observable state of the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// Current session, if any.
    pub session: Option<Session>,
    /// `true` until [`initialize`](crate::SessionStore::initialize) resolves.
    pub loading: bool,
    /// Set for the duration of a logout and shortly after it.
    pub is_logging_out: bool,
}

impl SessionSnapshot {
    /// Whether a session is held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Current access token.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    /// Current identity.
    #[must_use]
    pub fn identity(&self) -> Option<&UserSummary> {
        self.session.as_ref().and_then(|s| s.identity.as_ref())
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Unauthenticated,
            session: None,
            loading: true,
            is_logging_out: false,
        }
    }
}
