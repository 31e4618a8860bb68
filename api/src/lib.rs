//! # FocusApp API Client
//!
//! REST client for the FocusApp backend, with the hooks that feed HTTP `401`
//! responses into the shared [`SessionExpirationCoordinator`].
//!
//! ## Example
//!
//! ```no_run
//! use focusapp_api::{ApiClient, ClientConfig, install_expiration_interceptors};
//! use focusapp_core::{
//!     Credentials, ExpirationConfig, MemoryStorage, SessionExpirationCoordinator, SystemClock,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = Arc::new(MemoryStorage::new());
//!     let client = ApiClient::new(ClientConfig::from_env()?, storage.clone())?;
//!
//!     let coordinator = SessionExpirationCoordinator::create(
//!         storage,
//!         Arc::new(SystemClock),
//!         ExpirationConfig::default(),
//!     );
//!     install_expiration_interceptors(&client, &coordinator);
//!
//!     let tokens = client
//!         .obtain_tokens(&Credentials::new("alice", "secret"))
//!         .await?;
//!     let me = client.current_user(&tokens.access).await?;
//!     println!("Signed in as {}", me.username);
//!     Ok(())
//! }
//! ```
//!
//! ## Calling conventions
//!
//! - [`ApiClient::fetch`] returns raw responses; account endpoints use it.
//! - [`ApiClient::send_json`] decodes JSON and turns failures into
//!   [`ApiError`]s; notification endpoints use it.
//!
//! [`SessionExpirationCoordinator`]: focusapp_core::SessionExpirationCoordinator

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod notifications;
pub mod responses;

// Re-export main types for convenience
pub use client::{ApiClient, ApiRequest, RequestAuth};
pub use config::ClientConfig;
pub use error::ApiError;
pub use interceptor::{
    ErrorInterceptor, ExpirationErrorInterceptor, ExpirationFetchHook, FetchHook,
    install_expiration_interceptors,
};
pub use responses::{Ack, Envelope, TokenResponse, UnreadCountResponse};
