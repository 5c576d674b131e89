//! Messaging layer: the fan-out fabric, the entry publisher, and the
//! subscriber that consumes from it.
//!
//! [`MessageBroker`] models an exchange/queue broker with fan-out
//! semantics: every queue bound to an exchange receives a copy of every
//! message published after the bind. Queues are transient; they carry no
//! history and disappear when their consumer is dropped.
//!
//! ```text
//! GuestbookService ──► EntryEventPublisher ──► MessageBroker (fan-out exchange)
//!                                                 │
//!                              ┌──────────────────┼──────────────────┐
//!                              ▼                  ▼                  ▼
//!                        transient queue    transient queue    transient queue
//!                     (EntryEventSubscriber)  (WebSocket client)      ...
//! ```

#[cfg(feature = "amqp")]
pub mod amqp;
pub mod in_process;
pub mod publisher;
pub mod subscriber;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{BrokerBackend, MessagingConfig};
use crate::error::BrokerError;

#[cfg(feature = "amqp")]
pub use amqp::{AmqpBroker, AmqpQueue};
pub use in_process::InProcessBroker;
pub use publisher::EntryEventPublisher;
pub use subscriber::{EntryAddedHandler, EntryEventSubscriber, LoggingHandler, SubscriberHandle};

/// A message received from a bound queue.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Exchange the message was published to.
    pub exchange: String,
    /// Routing key supplied by the publisher.
    pub routing_key: String,
    /// Serialized message body.
    pub payload: Vec<u8>,
    /// Per-queue delivery counter used for acknowledgement.
    pub delivery_tag: u64,
}

/// Exchange/queue messaging fabric with fan-out delivery.
#[async_trait]
pub trait MessageBroker: Send + Sync + fmt::Debug {
    /// Declares a fan-out exchange. Declaring an existing exchange is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`BrokerError`] if the broker cannot be reached.
    async fn declare_fanout_exchange(&self, exchange: &str) -> Result<(), BrokerError>;

    /// Hands a message to the exchange.
    ///
    /// Success means the broker accepted the message, not that any queue
    /// received it; publishing with no bound queues succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`BrokerError`] if the exchange does not exist or the
    /// broker refuses or cannot take the message.
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
    ) -> Result<(), BrokerError>;

    /// Creates a transient queue named after `queue_prefix`, binds it to
    /// `exchange`, and returns its consumer.
    ///
    /// The queue receives every message published after this call returns.
    /// It is removed when the consumer is dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`BrokerError`] if the exchange does not exist or the
    /// broker cannot be reached.
    async fn bind_transient_queue(
        &self,
        exchange: &str,
        queue_prefix: &str,
    ) -> Result<Box<dyn QueueConsumer>, BrokerError>;
}

/// Consumer side of one transient queue.
#[async_trait]
pub trait QueueConsumer: Send + fmt::Debug {
    /// Name of the bound queue.
    fn queue_name(&self) -> &str;

    /// Waits for the next delivery. Returns `None` once the queue is closed.
    async fn recv(&mut self) -> Option<Delivery>;

    /// Acknowledges a delivery obtained from [`QueueConsumer::recv`].
    ///
    /// # Errors
    ///
    /// Returns a [`BrokerError`] if the acknowledgement cannot be sent.
    async fn ack(&mut self, delivery: &Delivery) -> Result<(), BrokerError>;
}

/// Builds the broker selected by `config.backend` and declares the
/// configured exchange.
///
/// # Errors
///
/// Returns a [`BrokerError`] if the broker cannot be reached or the
/// exchange cannot be declared.
pub async fn connect_broker(
    config: &MessagingConfig,
) -> Result<Arc<dyn MessageBroker>, BrokerError> {
    let broker: Arc<dyn MessageBroker> = match config.backend {
        BrokerBackend::InProcess => Arc::new(InProcessBroker::new(config.channel_capacity)),
        #[cfg(feature = "amqp")]
        BrokerBackend::Amqp => Arc::new(AmqpBroker::connect(&config.amqp_url).await?),
        #[cfg(not(feature = "amqp"))]
        BrokerBackend::Amqp => {
            return Err(BrokerError::Unreachable(
                "built without the `amqp` feature".to_string(),
            ));
        }
    };

    broker.declare_fanout_exchange(&config.exchange).await?;
    tracing::info!(
        backend = ?config.backend,
        exchange = %config.exchange,
        "message broker ready"
    );
    Ok(broker)
}
