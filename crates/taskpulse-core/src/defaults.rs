//! Centralized default constants for TaskPulse.
//!
//! **This module is the single source of truth** for shared default values.
//! Configuration loaders fall back to these when an environment variable is
//! absent or unparseable.

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Delay after insertion before a notification is removed automatically.
pub const NOTIFICATION_EXPIRY_MS: u64 = 5_000;

/// Whether marking a notification read cancels its pending expiry.
pub const NOTIFICATION_CANCEL_ON_READ: bool = false;

/// Title used for manual success notifications.
pub const NOTIFICATION_SUCCESS_TITLE: &str = "Success";

/// Title used for manual error notifications.
pub const NOTIFICATION_ERROR_TITLE: &str = "Error";

// =============================================================================
// EVENT CHANNEL
// =============================================================================

/// Capacity of the bounded queue between the event channel and the
/// notification center. Events beyond this are dropped.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Capacity of the notification center's command queue.
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

/// Path of the event endpoint relative to the API base URL.
pub const EVENTS_PATH: &str = "/events";

// =============================================================================
// BACKEND
// =============================================================================

/// API base URL used in development.
pub const DEV_API_URL: &str = "http://localhost:5000";

/// API base URL used in production.
pub const PROD_API_URL: &str = "https://task-manager-lovat-six.vercel.app";

/// REST request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
