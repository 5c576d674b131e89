//! RabbitMQ broker over AMQP 0.9.1 (`lapin`).
//!
//! The exchange is declared as a durable fan-out exchange. Each bound queue
//! is server-side `exclusive + auto_delete` and non-durable, so it exists
//! only while its consumer is connected. Publishing waits for the broker's
//! publisher confirm; a nack is reported as [`BrokerError::Rejected`].

use std::fmt;

use async_trait::async_trait;
use futures_util::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, ConfirmSelectOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::protocol::{AMQPErrorKind, AMQPSoftError};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer, ExchangeKind};

use super::{Delivery, MessageBroker, QueueConsumer};
use crate::error::BrokerError;

/// [`MessageBroker`] backed by a RabbitMQ connection.
pub struct AmqpBroker {
    connection: Connection,
    publish_channel: Channel,
}

impl fmt::Debug for AmqpBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmqpBroker").finish_non_exhaustive()
    }
}

impl AmqpBroker {
    /// Connects to `uri` and opens a confirm-mode publishing channel.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Amqp`] if the connection or channel cannot be
    /// opened.
    pub async fn connect(uri: &str) -> Result<Self, BrokerError> {
        let connection = Connection::connect(uri, ConnectionProperties::default()).await?;
        let publish_channel = connection.create_channel().await?;
        publish_channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;
        tracing::info!("connected to amqp broker");
        Ok(Self {
            connection,
            publish_channel,
        })
    }

    /// Returns `true` if the server currently holds a queue named `name`.
    ///
    /// Uses a passive declare on a short-lived channel of this connection, so
    /// exclusive queues owned by this broker are visible.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Amqp`] for any failure other than the server
    /// reporting the queue as not found.
    pub async fn queue_exists(&self, name: &str) -> Result<bool, BrokerError> {
        let channel = self.connection.create_channel().await?;
        let declared = channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    passive: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await;

        match declared {
            Ok(_) => {
                channel.close(200, "queue check done").await?;
                Ok(true)
            }
            // The server closes the channel on a failed passive declare.
            Err(lapin::Error::ProtocolError(e))
                if matches!(e.kind(), AMQPErrorKind::Soft(AMQPSoftError::NOTFOUND)) =>
            {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl MessageBroker for AmqpBroker {
    async fn declare_fanout_exchange(&self, exchange: &str) -> Result<(), BrokerError> {
        self.publish_channel
            .exchange_declare(
                exchange,
                ExchangeKind::Fanout,
                ExchangeDeclareOptions {
                    durable: true,
                    ..ExchangeDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(())
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
    ) -> Result<(), BrokerError> {
        let confirm = self
            .publish_channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_content_type("application/json".into()),
            )
            .await?
            .await?;

        if confirm.is_nack() {
            return Err(BrokerError::Rejected(format!(
                "exchange {exchange} nacked the message"
            )));
        }
        Ok(())
    }

    async fn bind_transient_queue(
        &self,
        exchange: &str,
        queue_prefix: &str,
    ) -> Result<Box<dyn QueueConsumer>, BrokerError> {
        // Delivery tags are per channel, so each consumer gets its own.
        let channel = self.connection.create_channel().await?;
        let name = format!("{queue_prefix}.{}", uuid::Uuid::new_v4());

        channel
            .queue_declare(
                &name,
                QueueDeclareOptions {
                    durable: false,
                    exclusive: true,
                    auto_delete: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;
        channel
            .queue_bind(
                &name,
                exchange,
                "",
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;
        let consumer = channel
            .basic_consume(
                &name,
                &format!("{name}.consumer"),
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        tracing::debug!(exchange, queue = %name, "amqp queue bound");
        Ok(Box::new(AmqpQueue {
            name,
            channel,
            consumer,
        }))
    }
}

/// Consumer for a transient queue on an [`AmqpBroker`].
///
/// Dropping it closes its channel, which cancels the consumer and lets the
/// server delete the auto-delete queue.
pub struct AmqpQueue {
    name: String,
    channel: Channel,
    consumer: Consumer,
}

impl fmt::Debug for AmqpQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmqpQueue")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Drop for AmqpQueue {
    fn drop(&mut self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let channel = self.channel.clone();
        let name = std::mem::take(&mut self.name);
        runtime.spawn(async move {
            if let Err(e) = channel.close(200, "consumer dropped").await {
                tracing::debug!(queue = %name, error = %e, "amqp channel close failed");
            }
        });
    }
}

#[async_trait]
impl QueueConsumer for AmqpQueue {
    fn queue_name(&self) -> &str {
        &self.name
    }

    async fn recv(&mut self) -> Option<Delivery> {
        match self.consumer.next().await {
            Some(Ok(delivery)) => Some(Delivery {
                exchange: delivery.exchange.as_str().to_string(),
                routing_key: delivery.routing_key.as_str().to_string(),
                payload: delivery.data,
                delivery_tag: delivery.delivery_tag,
            }),
            Some(Err(e)) => {
                tracing::warn!(queue = %self.name, error = %e, "amqp consumer failed");
                None
            }
            None => None,
        }
    }

    async fn ack(&mut self, delivery: &Delivery) -> Result<(), BrokerError> {
        self.channel
            .basic_ack(delivery.delivery_tag, BasicAckOptions::default())
            .await?;
        Ok(())
    }
}
