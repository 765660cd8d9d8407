//! # taskpulse-core
//!
//! Core types and state machines for the TaskPulse task dashboard client.
//!
//! This crate provides the pieces that need no I/O:
//! - data models for notifications, task events, tasks and users
//! - the [`NotificationStore`] with its incrementally maintained unread count
//! - the [`Reconciler`] turning task events into notifications
//! - the [`ExpiryQueue`] driving automatic notification removal
//! - dashboard task filtering and form validation

pub mod defaults;
pub mod error;
pub mod expiry;
pub mod filter;
pub mod models;
pub mod reconciler;
pub mod store;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use expiry::{ExpiryPolicy, ExpiryQueue};
pub use filter::{TaskFilter, TaskForm, TaskTab};
pub use models::*;
pub use reconciler::Reconciler;
pub use store::NotificationStore;
pub use uuid_utils::{is_v7, new_v7};
