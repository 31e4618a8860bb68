//! # FocusApp Notifications
//!
//! Cache of the signed-in user's notifications with a request de-duplication
//! guard and a cool-down between full refreshes.
//!
//! ```no_run
//! use focusapp_api::{ApiClient, ClientConfig};
//! use focusapp_core::{MemoryStorage, SystemClock};
//! use focusapp_notifications::{NotificationPoller, PollerConfig};
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let api = ApiClient::new(ClientConfig::from_env()?, Arc::new(MemoryStorage::new()))?;
//! let poller = NotificationPoller::new(api, Arc::new(SystemClock), PollerConfig::default());
//!
//! println!("{:?}", poller.fetch_all().await);
//! println!("{}", poller.refresh().await.message());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod format;
pub mod poller;
pub mod state;

pub use config::PollerConfig;
pub use format::format_relative;
pub use poller::{FetchOutcome, NotificationPoller, RefreshOutcome};
pub use state::{PollerSnapshot, ThrottleState};
