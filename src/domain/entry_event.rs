//! Notification event emitted after an entry is persisted.
//!
//! [`EntryAddedEvent`] is the payload placed on the fan-out exchange. It is
//! a point-in-time snapshot of the entry and is never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntryId, GuestbookEntry};

/// Immutable snapshot of a newly added entry, as carried on the wire.
///
/// Serialized as JSON with camelCase keys; `createdAt` is rendered as an
/// RFC 3339 string rather than a numeric epoch so any consumer can read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryAddedEvent {
    /// Id of the entry that was added.
    pub id: EntryId,
    /// Author label.
    pub name: String,
    /// Message body.
    pub message: String,
    /// Entry creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl EntryAddedEvent {
    /// Event type discriminator used in logs and WebSocket frames.
    pub const EVENT_TYPE: &'static str = "entry_added";
}

impl From<&GuestbookEntry> for EntryAddedEvent {
    fn from(entry: &GuestbookEntry) -> Self {
        Self {
            id: entry.id().clone(),
            name: entry.name().to_string(),
            message: entry.message().to_string(),
            created_at: entry.created_at(),
        }
    }
}
