//! Guestbook service: validate, persist, then publish.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{EntryClock, EntryId, GuestbookEntry};
use crate::error::{BrokerError, GuestbookError, StoreError};
use crate::messaging::EntryEventPublisher;
use crate::persistence::EntryStore;

/// Orchestration layer for guestbook writes and reads.
///
/// Every write follows the same strictly sequential pipeline:
/// validate → construct → persist → publish → return. A failure at any
/// stage aborts the remaining stages and is returned unchanged; nothing is
/// retried.
///
/// # Consistency
///
/// - An event is only published for an entry the store accepted.
/// - Persist and publish are not atomic. If publishing fails after the store
///   accepted the entry, the entry stays stored and the caller receives
///   [`GuestbookError::Publish`] carrying it.
#[derive(Debug)]
pub struct GuestbookService {
    store: Arc<dyn EntryStore>,
    publisher: EntryEventPublisher,
    clock: EntryClock,
    store_timeout: Duration,
    publish_timeout: Duration,
}

impl GuestbookService {
    /// Creates a new `GuestbookService`.
    ///
    /// `store_timeout` and `publish_timeout` bound each individual store and
    /// publish call.
    #[must_use]
    pub fn new(
        store: Arc<dyn EntryStore>,
        publisher: EntryEventPublisher,
        store_timeout: Duration,
        publish_timeout: Duration,
    ) -> Self {
        Self {
            store,
            publisher,
            clock: EntryClock::new(),
            store_timeout,
            publish_timeout,
        }
    }

    /// Returns a reference to the inner store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn EntryStore> {
        &self.store
    }

    /// Records a new entry and broadcasts its notification.
    ///
    /// # Errors
    ///
    /// - [`GuestbookError::Validation`] if `name` or `message` is blank;
    ///   nothing is stored or published.
    /// - [`GuestbookError::Store`] if the store fails or times out; nothing
    ///   is published.
    /// - [`GuestbookError::Publish`] if the entry was stored but the
    ///   notification could not be sent.
    pub async fn create_entry(
        &self,
        name: &str,
        message: &str,
    ) -> Result<GuestbookEntry, GuestbookError> {
        validate_field("name", name)?;
        validate_field("message", message)?;

        let entry = GuestbookEntry::new(name, message, &self.clock);
        let id = entry.id().clone();

        let persisted = self.with_store_timeout(self.store.save(entry)).await?;
        tracing::debug!(%id, "entry persisted");

        let published = match tokio::time::timeout(
            self.publish_timeout,
            self.publisher.publish_entry_added(&persisted),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(BrokerError::Timeout(self.publish_timeout)),
        };

        if let Err(source) = published {
            tracing::warn!(%id, error = %source, "entry persisted but notification failed");
            return Err(GuestbookError::Publish {
                entry: Box::new(persisted),
                source,
            });
        }

        tracing::info!(%id, name = %persisted.name(), "guestbook entry created");
        Ok(persisted)
    }

    /// Returns every stored entry.
    ///
    /// # Errors
    ///
    /// Returns [`GuestbookError::Store`] if the store fails or times out.
    pub async fn get_all_entries(&self) -> Result<Vec<GuestbookEntry>, GuestbookError> {
        Ok(self.with_store_timeout(self.store.find_all()).await?)
    }

    /// Looks up one entry; `Ok(None)` when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`GuestbookError::Store`] if the store fails or times out.
    pub async fn find_entry(&self, id: &EntryId) -> Result<Option<GuestbookEntry>, GuestbookError> {
        Ok(self.with_store_timeout(self.store.find_by_id(id)).await?)
    }

    async fn with_store_timeout<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.store_timeout, call)
            .await
            .unwrap_or(Err(StoreError::Timeout(self.store_timeout)))
    }
}

fn validate_field(field: &str, value: &str) -> Result<(), GuestbookError> {
    if value.trim().is_empty() {
        return Err(GuestbookError::Validation(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}
