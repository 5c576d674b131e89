//! Entry notification publisher.

use std::sync::Arc;

use super::MessageBroker;
use crate::domain::{EntryAddedEvent, GuestbookEntry};
use crate::error::BrokerError;

/// Turns persisted entries into [`EntryAddedEvent`]s and hands them to the
/// fan-out exchange.
///
/// Fire-and-forget: a successful publish means the broker took the message.
/// Whether any subscriber exists or processed it is not observed here.
#[derive(Debug, Clone)]
pub struct EntryEventPublisher {
    broker: Arc<dyn MessageBroker>,
    exchange: String,
    routing_key: String,
}

impl EntryEventPublisher {
    /// Creates a publisher targeting `exchange` with a fixed `routing_key`.
    #[must_use]
    pub fn new(
        broker: Arc<dyn MessageBroker>,
        exchange: impl Into<String>,
        routing_key: impl Into<String>,
    ) -> Self {
        Self {
            broker,
            exchange: exchange.into(),
            routing_key: routing_key.into(),
        }
    }

    /// Exchange this publisher sends to.
    #[must_use]
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// Publishes an `entry_added` event for `entry`.
    ///
    /// # Errors
    ///
    /// Returns a [`BrokerError`] if the event cannot be serialized or the
    /// broker refuses the send.
    pub async fn publish_entry_added(&self, entry: &GuestbookEntry) -> Result<(), BrokerError> {
        let event = EntryAddedEvent::from(entry);
        let payload = serde_json::to_vec(&event)?;
        self.broker
            .publish(&self.exchange, &self.routing_key, payload)
            .await?;
        tracing::debug!(id = %event.id, exchange = %self.exchange, "entry added event published");
        Ok(())
    }
}
