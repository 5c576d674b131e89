//! Type-safe guestbook entry identifier.
//!
//! [`EntryId`] is a newtype around the canonical textual form of a UUID v4.
//! Keeping the textual form (rather than a parsed [`uuid::Uuid`]) makes the
//! conversion to and from the `TEXT` primary key column total, and lets any
//! client-supplied string be looked up without a parse step.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a guestbook entry.
///
/// Generated once by [`EntryId::generate`] when an entry is created and
/// immutable thereafter. Used as the key in every store backend and echoed
/// in every notification event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Generates a new random identifier (UUID v4, hyphenated).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wraps an existing identifier string as-is.
    ///
    /// Used when rehydrating stored rows and for lookups by id.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<uuid::Uuid> for EntryId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid.to_string())
    }
}

impl From<EntryId> for String {
    fn from(id: EntryId) -> Self {
        id.0
    }
}
