//! UUID v7 utilities for notification identifiers.
//!
//! Notification ids are UUIDv7: unique for the session and, as a side
//! effect, roughly time-ordered. Nothing relies on that ordering; the store
//! orders records by insertion.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
///
/// # Example
///
/// ```
/// use taskpulse_core::uuid_utils::{is_v7, new_v7};
///
/// let id = new_v7();
/// assert!(is_v7(&id));
/// ```
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Check if a UUID is version 7.
#[inline]
pub fn is_v7(uuid: &Uuid) -> bool {
    uuid.get_version_num() == 7
}
