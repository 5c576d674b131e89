//! Persistence layer: the entry store seam and its backends.
//!
//! [`EntryStore`] is the only way the service touches storage. Exactly one
//! backend is chosen from configuration at startup and injected as an
//! `Arc<dyn EntryStore>`; both backends satisfy the same contract.

pub mod mapper;
pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{GuestbookConfig, StoreBackend};
use crate::domain::{EntryId, GuestbookEntry};
use crate::error::StoreError;

pub use mapper::EntryMapper;
pub use memory::MemoryEntryStore;
pub use models::GuestbookEntryRow;
pub use postgres::PostgresEntryStore;

/// Storage contract for guestbook entries.
///
/// Implementations must be safe to call concurrently. They never retry;
/// an I/O failure is returned to the caller as a [`StoreError`].
#[async_trait]
pub trait EntryStore: Send + Sync + fmt::Debug {
    /// Writes a fully populated entry and returns the stored copy, which is
    /// field-equal to the input.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend cannot write the entry.
    async fn save(&self, entry: GuestbookEntry) -> Result<GuestbookEntry, StoreError>;

    /// Returns every stored entry in the backend's own stable order.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend cannot be read.
    async fn find_all(&self) -> Result<Vec<GuestbookEntry>, StoreError>;

    /// Looks up one entry. A missing id is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend cannot be read.
    async fn find_by_id(&self, id: &EntryId) -> Result<Option<GuestbookEntry>, StoreError>;

    /// Which backend this is.
    fn backend(&self) -> StoreBackend;
}

/// Builds the store selected by `config.store_backend`.
///
/// # Errors
///
/// Returns a [`StoreError`] if the durable store cannot be reached or its
/// schema is missing.
pub async fn connect_store(config: &GuestbookConfig) -> Result<Arc<dyn EntryStore>, StoreError> {
    let store: Arc<dyn EntryStore> = match config.store_backend {
        StoreBackend::Memory => Arc::new(MemoryEntryStore::new()),
        StoreBackend::Postgres => Arc::new(PostgresEntryStore::connect(&config.database).await?),
    };
    tracing::info!(backend = %store.backend(), "entry store ready");
    Ok(store)
}
