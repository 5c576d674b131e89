//! Field-for-field translation between [`GuestbookEntry`] and
//! [`GuestbookEntryRow`].
//!
//! The conversions are pure and total. [`EntryMapper`] lifts them over
//! `Option` so an absent input maps to an absent output in both directions.

use crate::domain::{EntryId, GuestbookEntry};

use super::models::GuestbookEntryRow;

impl From<&GuestbookEntry> for GuestbookEntryRow {
    fn from(entry: &GuestbookEntry) -> Self {
        Self {
            id: entry.id().as_str().to_string(),
            name: entry.name().to_string(),
            message: entry.message().to_string(),
            created_at: entry.created_at(),
        }
    }
}

impl From<GuestbookEntryRow> for GuestbookEntry {
    fn from(row: GuestbookEntryRow) -> Self {
        Self::from_parts(
            EntryId::from_string(row.id),
            row.name,
            row.message,
            row.created_at,
        )
    }
}

/// Stateless domain <-> row mapper.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryMapper;

impl EntryMapper {
    /// Maps a domain entry to its row; `None` stays `None`.
    #[must_use]
    pub fn to_row(entry: Option<&GuestbookEntry>) -> Option<GuestbookEntryRow> {
        entry.map(GuestbookEntryRow::from)
    }

    /// Maps a row back to a domain entry; `None` stays `None`.
    #[must_use]
    pub fn to_domain(row: Option<GuestbookEntryRow>) -> Option<GuestbookEntry> {
        row.map(GuestbookEntry::from)
    }
}
