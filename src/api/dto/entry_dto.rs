//! Guestbook entry request and response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::GuestbookEntry;

/// Request body for `POST /api/v1/guestbook`.
///
/// Absent and `null` fields both read as empty, so the service reports them
/// as validation failures instead of the extractor rejecting the body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateEntryRequest {
    /// Author display name.
    #[serde(default)]
    #[schema(example = "Ada")]
    pub name: Option<String>,
    /// Entry body.
    #[serde(default)]
    #[schema(example = "Hello from the guestbook!")]
    pub message: Option<String>,
}

impl CreateEntryRequest {
    /// Author name, empty when absent.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Entry body, empty when absent.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

/// A stored guestbook entry as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    /// Entry identifier.
    pub id: String,
    /// Author display name.
    pub name: String,
    /// Entry body.
    pub message: String,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

impl From<&GuestbookEntry> for EntryResponse {
    fn from(entry: &GuestbookEntry) -> Self {
        Self {
            id: entry.id().to_string(),
            name: entry.name().to_string(),
            message: entry.message().to_string(),
            created_at: entry.created_at(),
        }
    }
}
