//! # taskpulse-client
//!
//! I/O side of the TaskPulse dashboard client.
//!
//! This crate provides:
//! - [`EventChannel`]: the authenticated WebSocket carrying task events
//! - [`NotificationCenter`]: the loop reconciling events into notifications
//! - [`ApiClient`]: REST calls for users and tasks
//! - [`Session`]: login-to-logout composition of the above
//! - [`AuthCache`]: the last login kept on disk for the CLI
//!
//! ## Example
//!
//! ```ignore
//! use taskpulse_client::{ClientConfig, Session};
//!
//! let config = ClientConfig::from_env()?;
//! let mut session = Session::login(config, "alice@example.com", "secret").await?;
//!
//! let mut updates = session.notifications().subscribe();
//! while updates.changed().await.is_ok() {
//!     let snapshot = updates.borrow().clone();
//!     println!("{} unread", snapshot.unread_count);
//! }
//!
//! session.logout().await;
//! ```

pub mod api;
pub mod auth_cache;
pub mod center;
pub mod channel;
pub mod config;
pub mod session;

// Re-export core types
pub use taskpulse_core::*;

pub use api::ApiClient;
pub use auth_cache::AuthCache;
pub use center::{NotificationCenter, NotificationHandle, NotificationSnapshot};
pub use channel::{ChannelStatus, EventChannel};
pub use config::{ClientConfig, Environment};
pub use session::Session;
