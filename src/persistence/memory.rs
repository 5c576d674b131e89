//! Process-local entry store.
//!
//! [`MemoryEntryStore`] keeps entries in a `HashMap` behind a
//! [`tokio::sync::RwLock`], plus an insertion-order index so `find_all`
//! returns entries in the order they were first saved. Reads run
//! concurrently; writes are short and serialized. Entries are lost when the
//! process exits.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::EntryStore;
use crate::config::StoreBackend;
use crate::domain::{EntryId, GuestbookEntry};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Entries {
    by_id: HashMap<EntryId, GuestbookEntry>,
    order: Vec<EntryId>,
}

/// In-memory [`EntryStore`].
///
/// Saving an id that is already present replaces the stored value and keeps
/// its original position.
#[derive(Debug, Default)]
pub struct MemoryEntryStore {
    entries: RwLock<Entries>,
}

impl MemoryEntryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.order.len()
    }

    /// Returns `true` if nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.order.is_empty()
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn save(&self, entry: GuestbookEntry) -> Result<GuestbookEntry, StoreError> {
        let mut entries = self.entries.write().await;
        if entries
            .by_id
            .insert(entry.id().clone(), entry.clone())
            .is_none()
        {
            entries.order.push(entry.id().clone());
        }
        Ok(entry)
    }

    async fn find_all(&self) -> Result<Vec<GuestbookEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .order
            .iter()
            .filter_map(|id| entries.by_id.get(id).cloned())
            .collect())
    }

    async fn find_by_id(&self, id: &EntryId) -> Result<Option<GuestbookEntry>, StoreError> {
        Ok(self.entries.read().await.by_id.get(id).cloned())
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }
}
