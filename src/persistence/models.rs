//! Database row model for the `guestbook_entries` table.

use chrono::{DateTime, Utc};

/// A row of the `guestbook_entries` table.
///
/// One row per entry; `id` is the primary key.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct GuestbookEntryRow {
    /// Entry identifier (primary key).
    pub id: String,
    /// Author label.
    pub name: String,
    /// Message body.
    pub message: String,
    /// Creation timestamp (`TIMESTAMPTZ`).
    pub created_at: DateTime<Utc>,
}
