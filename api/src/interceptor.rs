//! Response interceptors.
//!
//! The client exposes two calling conventions, and each gets its own hook:
//!
//! - [`FetchHook`] sees the status of every raw response returned by
//!   [`ApiClient::fetch`](crate::ApiClient::fetch). At most one is installed
//!   per client, so re-initializing never wraps the transport twice.
//! - [`ErrorInterceptor`] sees every error produced by
//!   [`ApiClient::send_json`](crate::ApiClient::send_json) before the error is
//!   returned, unchanged, to the caller.
//!
//! Both expiration shims below are thin adapters over the shared
//! [`SessionExpirationCoordinator`]; the coordinator's suppression window is
//! what makes it safe to run them side by side.

use crate::client::ApiClient;
use crate::error::ApiError;
use focusapp_core::expiration::{ExpirationOptions, SessionExpirationCoordinator};
use std::sync::Arc;

/// Observer of raw responses (low-level convention).
pub trait FetchHook: Send + Sync {
    /// Called after every response, whatever its status.
    fn after_fetch(&self, status: u16);
}

/// Observer of failed calls (high-level convention).
///
/// Interceptors observe only; the error is always re-raised to the caller.
pub trait ErrorInterceptor: Send + Sync {
    /// Called for every error before it reaches the caller.
    fn on_error(&self, error: &ApiError);
}

/// Forwards raw response statuses to the expiration coordinator.
#[derive(Debug, Clone)]
pub struct ExpirationFetchHook {
    coordinator: Arc<SessionExpirationCoordinator>,
}

impl ExpirationFetchHook {
    /// Create a hook bound to `coordinator`.
    #[must_use]
    pub const fn new(coordinator: Arc<SessionExpirationCoordinator>) -> Self {
        Self { coordinator }
    }
}

impl FetchHook for ExpirationFetchHook {
    fn after_fetch(&self, status: u16) {
        self.coordinator.check_and_handle_unauthorized(status);
    }
}

/// Forwards error statuses to the expiration coordinator.
#[derive(Debug, Clone)]
pub struct ExpirationErrorInterceptor {
    coordinator: Arc<SessionExpirationCoordinator>,
}

impl ExpirationErrorInterceptor {
    /// Create an interceptor bound to `coordinator`.
    #[must_use]
    pub const fn new(coordinator: Arc<SessionExpirationCoordinator>) -> Self {
        Self { coordinator }
    }
}

impl ErrorInterceptor for ExpirationErrorInterceptor {
    fn on_error(&self, error: &ApiError) {
        if error.is_unauthorized() {
            self.coordinator.handle_expiration(ExpirationOptions::default());
        }
    }
}

/// Wire both conventions of `client` to `coordinator`.
///
/// Returns `false` if a fetch hook was already installed; nothing is added
/// in that case.
pub fn install_expiration_interceptors(
    client: &ApiClient,
    coordinator: &Arc<SessionExpirationCoordinator>,
) -> bool {
    if !client.install_fetch_interceptor(Arc::new(ExpirationFetchHook::new(Arc::clone(
        coordinator,
    )))) {
        tracing::debug!("Expiration interceptors already installed");
        return false;
    }

    client.add_error_interceptor(Arc::new(ExpirationErrorInterceptor::new(Arc::clone(
        coordinator,
    ))));
    true
}
