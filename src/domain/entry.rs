//! The guestbook entry aggregate.

use chrono::{DateTime, Utc};

use super::{EntryClock, EntryId};

/// One guestbook submission.
///
/// Entries are append-only: every field is fixed at construction and there
/// is no mutator. The id and creation timestamp are assigned before the
/// entry is handed to a store or turned into an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestbookEntry {
    id: EntryId,
    name: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl GuestbookEntry {
    /// Creates a new entry with a fresh id and the next timestamp from
    /// `clock`.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>, clock: &EntryClock) -> Self {
        Self {
            id: EntryId::generate(),
            name: name.into(),
            message: message.into(),
            created_at: clock.now(),
        }
    }

    /// Rebuilds an entry from already-assigned fields.
    ///
    /// Only storage backends should need this, when reading entries back.
    #[must_use]
    pub fn from_parts(
        id: EntryId,
        name: String,
        message: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            message,
            created_at,
        }
    }

    /// Unique entry identifier.
    #[must_use]
    pub fn id(&self) -> &EntryId {
        &self.id
    }

    /// Author label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Message body.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
