//! In-process fan-out broker.
//!
//! [`InProcessBroker`] keeps one [`tokio::sync::broadcast`] channel per
//! declared exchange. Binding a queue subscribes a new receiver, so each
//! queue sees every message sent after it was bound and nothing before.
//! When a receiver falls more than the channel capacity behind, the oldest
//! messages are dropped for that receiver only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};

use super::{Delivery, MessageBroker, QueueConsumer};
use crate::error::BrokerError;

/// Fan-out broker living inside this process.
#[derive(Debug)]
pub struct InProcessBroker {
    exchanges: RwLock<HashMap<String, broadcast::Sender<Delivery>>>,
    capacity: usize,
    closed: AtomicBool,
    next_queue: AtomicU64,
}

impl InProcessBroker {
    /// Creates a broker whose queues buffer up to `capacity` messages.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            exchanges: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            closed: AtomicBool::new(false),
            next_queue: AtomicU64::new(1),
        }
    }

    /// Returns the number of queues currently bound to `exchange`.
    pub async fn bound_queue_count(&self, exchange: &str) -> usize {
        self.exchanges
            .read()
            .await
            .get(exchange)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Shuts the broker down.
    ///
    /// Later calls fail with [`BrokerError::Unreachable`]. Bound queues
    /// deliver what they already hold and then close.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        self.exchanges.write().await.clear();
        tracing::info!("in-process broker shut down");
    }

    fn ensure_open(&self) -> Result<(), BrokerError> {
        if self.closed.load(Ordering::Acquire) {
            Err(BrokerError::Unreachable("broker is shut down".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MessageBroker for InProcessBroker {
    async fn declare_fanout_exchange(&self, exchange: &str) -> Result<(), BrokerError> {
        self.ensure_open()?;
        let mut exchanges = self.exchanges.write().await;
        if !exchanges.contains_key(exchange) {
            let (sender, _) = broadcast::channel(self.capacity);
            exchanges.insert(exchange.to_string(), sender);
            tracing::debug!(exchange, "fan-out exchange declared");
        }
        Ok(())
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
    ) -> Result<(), BrokerError> {
        self.ensure_open()?;
        let exchanges = self.exchanges.read().await;
        let sender = exchanges
            .get(exchange)
            .ok_or_else(|| BrokerError::ExchangeNotFound(exchange.to_string()))?;

        // No bound queue is not an error: the message is simply dropped.
        let queues = sender
            .send(Delivery {
                exchange: exchange.to_string(),
                routing_key: routing_key.to_string(),
                payload,
                delivery_tag: 0,
            })
            .unwrap_or(0);
        tracing::trace!(exchange, queues, "message fanned out");
        Ok(())
    }

    async fn bind_transient_queue(
        &self,
        exchange: &str,
        queue_prefix: &str,
    ) -> Result<Box<dyn QueueConsumer>, BrokerError> {
        self.ensure_open()?;
        let exchanges = self.exchanges.read().await;
        let sender = exchanges
            .get(exchange)
            .ok_or_else(|| BrokerError::ExchangeNotFound(exchange.to_string()))?;

        let seq = self.next_queue.fetch_add(1, Ordering::Relaxed);
        let name = format!("{queue_prefix}.{seq}");
        tracing::debug!(exchange, queue = %name, "transient queue bound");

        Ok(Box::new(InProcessQueue {
            name,
            receiver: sender.subscribe(),
            delivered: 0,
        }))
    }
}

/// Consumer for a queue bound on an [`InProcessBroker`].
#[derive(Debug)]
pub struct InProcessQueue {
    name: String,
    receiver: broadcast::Receiver<Delivery>,
    delivered: u64,
}

#[async_trait]
impl QueueConsumer for InProcessQueue {
    fn queue_name(&self) -> &str {
        &self.name
    }

    async fn recv(&mut self) -> Option<Delivery> {
        loop {
            match self.receiver.recv().await {
                Ok(mut delivery) => {
                    self.delivered = self.delivered.saturating_add(1);
                    delivery.delivery_tag = self.delivered;
                    return Some(delivery);
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(queue = %self.name, lagged = n, "queue lagged behind exchange, messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    async fn ack(&mut self, _delivery: &Delivery) -> Result<(), BrokerError> {
        Ok(())
    }
}
