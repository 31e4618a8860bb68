//! # FocusApp Session
//!
//! Session lifecycle for the FocusApp client: restoring a persisted session,
//! login, logout and the forced teardown run when any request comes back
//! `401`.
//!
//! ## Wiring
//!
//! ```no_run
//! use focusapp_api::{ApiClient, ClientConfig, install_expiration_interceptors};
//! use focusapp_core::{
//!     Credentials, ExpirationConfig, FileStorage, Navigator, SessionExpirationCoordinator,
//!     SystemClock,
//! };
//! use focusapp_session::{SessionConfig, SessionStore};
//! use std::sync::Arc;
//!
//! struct Router;
//!
//! impl Navigator for Router {
//!     fn current_route(&self) -> String {
//!         "/".to_string()
//!     }
//!     fn redirect(&self, route: &str) {
//!         println!("-> {route}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = Arc::new(FileStorage::new("session.json"));
//!     let api = ApiClient::new(ClientConfig::from_env()?, storage.clone())?;
//!     let coordinator = SessionExpirationCoordinator::create(
//!         storage.clone(),
//!         Arc::new(SystemClock),
//!         ExpirationConfig::default(),
//!     );
//!     install_expiration_interceptors(&api, &coordinator);
//!
//!     let store = SessionStore::new(
//!         api,
//!         storage,
//!         coordinator,
//!         Arc::new(Router),
//!         SessionConfig::default(),
//!     );
//!     store.register_as_expiration_target();
//!
//!     if !store.initialize().await {
//!         store.login(&Credentials::new("alice", "secret")).await;
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod guard;
pub mod state;
pub mod store;

pub use config::SessionConfig;
pub use guard::RouteAccess;
pub use state::{Session, SessionPhase, SessionSnapshot};
pub use store::SessionStore;
