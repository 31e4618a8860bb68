//! # FocusApp Core
//!
//! Domain types and process-wide plumbing shared by every FocusApp client crate.
//!
//! This crate provides:
//!
//! - **Model**: the wire types the client depends on (`UserSummary`,
//!   `NotificationItem`, `TokenPair`, ...)
//! - **Storage**: the persisted key-value store that holds the session tokens
//! - **Expiration**: the coordinator that collapses concurrent `401` detections
//!   into a single forced logout
//! - **Environment**: injected dependencies (`Clock`, `Navigator`) so that time
//!   and navigation stay testable
//!
//! ## Example
//!
//! ```
//! use focusapp_core::environment::SystemClock;
//! use focusapp_core::expiration::{ExpirationConfig, SessionExpirationCoordinator};
//! use focusapp_core::storage::MemoryStorage;
//! use std::sync::Arc;
//!
//! let coordinator = SessionExpirationCoordinator::create(
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(SystemClock),
//!     ExpirationConfig::default(),
//! );
//!
//! coordinator.set_expiration_callback(Arc::new(|| println!("session expired")));
//! assert!(coordinator.check_and_handle_unauthorized(401));
//! // A second detection inside the suppression window is ignored
//! assert!(!coordinator.check_and_handle_unauthorized(401));
//! ```

pub mod environment;
pub mod expiration;
pub mod model;
pub mod storage;

// Re-export main types for convenience
pub use chrono::{DateTime, Utc};
pub use environment::{Clock, Navigator, SystemClock};
pub use expiration::{
    ExpirationCallback, ExpirationConfig, ExpirationOptions, SessionExpirationCoordinator,
    UNAUTHORIZED,
};
pub use model::{
    Credentials, NewAccount, NotificationActor, NotificationItem, TokenPair, UserSummary,
};
pub use storage::{
    FileStorage, MemoryStorage, SessionPersistence, StorageError, TokenStorage, ACCESS_KEY,
    REFRESH_KEY, USERNAME_KEY,
};
