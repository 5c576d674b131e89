//! Entry notification subscriber.
//!
//! [`EntryEventSubscriber::bind`] binds one transient queue to the fan-out
//! exchange and drives it from a background task. Each delivery is decoded
//! into an [`EntryAddedEvent`], handed to an [`EntryAddedHandler`], and then
//! acknowledged. There is no redelivery: a payload that cannot be decoded or
//! a handler that fails is logged and the delivery is acknowledged anyway.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use super::{MessageBroker, QueueConsumer};
use crate::domain::EntryAddedEvent;
use crate::error::BrokerError;

/// Processes entry notifications delivered to a subscriber queue.
#[async_trait]
pub trait EntryAddedHandler: Send + Sync + fmt::Debug {
    /// Handles one event.
    ///
    /// # Errors
    ///
    /// Any error is logged by the subscriber; the delivery is still
    /// acknowledged.
    async fn on_entry_added(&self, event: EntryAddedEvent) -> anyhow::Result<()>;
}

/// Handler that records each event in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

#[async_trait]
impl EntryAddedHandler for LoggingHandler {
    async fn on_entry_added(&self, event: EntryAddedEvent) -> anyhow::Result<()> {
        tracing::info!(
            id = %event.id,
            name = %event.name,
            message = %event.message,
            created_at = %event.created_at,
            "received entry added event"
        );
        Ok(())
    }
}

/// Binds subscriber queues.
#[derive(Debug, Clone, Copy)]
pub struct EntryEventSubscriber;

impl EntryEventSubscriber {
    /// Binds a transient queue named after `queue_prefix` to `exchange` and
    /// starts delivering its events to `handler`.
    ///
    /// The queue is bound before this returns, so every event published
    /// afterwards reaches `handler`.
    ///
    /// # Errors
    ///
    /// Returns a [`BrokerError`] if the queue cannot be bound.
    pub async fn bind(
        broker: &dyn MessageBroker,
        exchange: &str,
        queue_prefix: &str,
        handler: Arc<dyn EntryAddedHandler>,
    ) -> Result<SubscriberHandle, BrokerError> {
        let consumer = broker.bind_transient_queue(exchange, queue_prefix).await?;
        let queue_name = consumer.queue_name().to_string();
        tracing::info!(exchange, queue = %queue_name, "entry subscriber bound");

        let task = tokio::spawn(consume(consumer, handler));
        Ok(SubscriberHandle { queue_name, task })
    }
}

/// Handle to a running subscriber.
///
/// Dropping the handle detaches the subscriber; it keeps running until the
/// broker closes its queue. Call [`SubscriberHandle::shutdown`] to stop it
/// and release the queue.
#[derive(Debug)]
pub struct SubscriberHandle {
    queue_name: String,
    task: JoinHandle<()>,
}

impl SubscriberHandle {
    /// Name of the bound queue.
    #[must_use]
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Returns `true` once the subscriber has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the subscriber and releases its queue.
    pub async fn shutdown(self) {
        self.task.abort();
        let _ = self.task.await;
        tracing::info!(queue = %self.queue_name, "entry subscriber stopped");
    }
}

async fn consume(mut consumer: Box<dyn QueueConsumer>, handler: Arc<dyn EntryAddedHandler>) {
    while let Some(delivery) = consumer.recv().await {
        match serde_json::from_slice::<EntryAddedEvent>(&delivery.payload) {
            Ok(event) => {
                let id = event.id.clone();
                if let Err(e) = handler.on_entry_added(event).await {
                    tracing::warn!(%id, error = %e, "entry added handler failed");
                }
            }
            Err(e) => {
                tracing::warn!(
                    queue = %consumer.queue_name(),
                    error = %e,
                    "dropping undecodable delivery"
                );
            }
        }

        if let Err(e) = consumer.ack(&delivery).await {
            tracing::warn!(queue = %consumer.queue_name(), error = %e, "ack failed, stopping subscriber");
            break;
        }
    }
    tracing::debug!(queue = %consumer.queue_name(), "subscriber queue closed");
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;
    use crate::domain::{EntryClock, GuestbookEntry};
    use crate::messaging::InProcessBroker;

    #[derive(Debug)]
    struct Forward(mpsc::UnboundedSender<EntryAddedEvent>);

    #[async_trait]
    impl EntryAddedHandler for Forward {
        async fn on_entry_added(&self, event: EntryAddedEvent) -> anyhow::Result<()> {
            self.0.send(event)?;
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Failing;

    #[async_trait]
    impl EntryAddedHandler for Failing {
        async fn on_entry_added(&self, _event: EntryAddedEvent) -> anyhow::Result<()> {
            anyhow::bail!("handler exploded")
        }
    }

    async fn broker() -> Arc<InProcessBroker> {
        let broker = Arc::new(InProcessBroker::new(16));
        let _ = broker.declare_fanout_exchange("gb").await;
        broker
    }

    async fn publish(broker: &InProcessBroker, entry: &GuestbookEntry) {
        let Ok(payload) = serde_json::to_vec(&EntryAddedEvent::from(entry)) else {
            panic!("serialize failed");
        };
        let _ = broker.publish("gb", "rk", payload).await;
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<EntryAddedEvent>) -> Option<EntryAddedEvent> {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn handler_receives_published_events() {
        let broker = broker().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let Ok(handle) =
            EntryEventSubscriber::bind(&*broker, "gb", "sub", Arc::new(Forward(tx))).await
        else {
            panic!("bind failed");
        };
        assert!(handle.queue_name().starts_with("sub."));

        let entry = GuestbookEntry::new("Ada", "hello", &EntryClock::new());
        publish(&broker, &entry).await;

        let Some(event) = next(&mut rx).await else {
            panic!("no event received");
        };
        assert_eq!(event, EntryAddedEvent::from(&entry));
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn independent_subscribers_each_get_a_copy() {
        let broker = broker().await;
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let _h1 = EntryEventSubscriber::bind(&*broker, "gb", "a", Arc::new(Forward(tx1))).await;
        let _h2 = EntryEventSubscriber::bind(&*broker, "gb", "b", Arc::new(Forward(tx2))).await;

        let entry = GuestbookEntry::new("Ada", "hello", &EntryClock::new());
        publish(&broker, &entry).await;

        assert_eq!(next(&mut rx1).await.map(|e| e.id), Some(entry.id().clone()));
        assert_eq!(next(&mut rx2).await.map(|e| e.id), Some(entry.id().clone()));
    }

    #[tokio::test]
    async fn undecodable_payload_is_skipped() {
        let broker = broker().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _h = EntryEventSubscriber::bind(&*broker, "gb", "sub", Arc::new(Forward(tx))).await;

        let _ = broker.publish("gb", "rk", b"not json".to_vec()).await;
        let entry = GuestbookEntry::new("Ada", "hello", &EntryClock::new());
        publish(&broker, &entry).await;

        assert_eq!(next(&mut rx).await.map(|e| e.id), Some(entry.id().clone()));
    }

    #[tokio::test]
    async fn failing_handler_keeps_subscriber_alive() {
        let broker = broker().await;
        let Ok(handle) =
            EntryEventSubscriber::bind(&*broker, "gb", "sub", Arc::new(Failing)).await
        else {
            panic!("bind failed");
        };

        let entry = GuestbookEntry::new("Ada", "hello", &EntryClock::new());
        publish(&broker, &entry).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!handle.is_finished());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_releases_queue() {
        let broker = broker().await;
        let Ok(handle) =
            EntryEventSubscriber::bind(&*broker, "gb", "sub", Arc::new(LoggingHandler)).await
        else {
            panic!("bind failed");
        };
        assert_eq!(broker.bound_queue_count("gb").await, 1);

        handle.shutdown().await;
        assert_eq!(broker.bound_queue_count("gb").await, 0);
    }

    #[tokio::test]
    async fn subscriber_stops_when_broker_shuts_down() {
        let broker = broker().await;
        let Ok(handle) =
            EntryEventSubscriber::bind(&*broker, "gb", "sub", Arc::new(LoggingHandler)).await
        else {
            panic!("bind failed");
        };

        broker.shutdown().await;
        let _ = tokio::time::timeout(Duration::from_secs(2), async {
            while !handle.is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(handle.is_finished());
    }
}
