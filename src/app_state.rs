//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::MessagingConfig;
use crate::messaging::MessageBroker;
use crate::service::GuestbookService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Guestbook service for reads and the write path.
    pub guestbook_service: Arc<GuestbookService>,
    /// Broker that WebSocket sessions bind their queues on.
    pub broker: Arc<dyn MessageBroker>,
    /// Exchange and queue naming for subscriber sessions.
    pub messaging: Arc<MessagingConfig>,
}
