//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// The subscriber queue is bound before the upgrade completes, so the
/// client receives every entry created after the handshake succeeds.
/// Responds `503 Service Unavailable` if the queue cannot be bound.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let queue_prefix = format!("{}.ws", state.messaging.queue_prefix);
    let consumer = match state
        .broker
        .bind_transient_queue(&state.messaging.exchange, &queue_prefix)
        .await
    {
        Ok(consumer) => consumer,
        Err(e) => {
            tracing::warn!(error = %e, "ws subscriber queue could not be bound");
            return (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response();
        }
    };

    ws.on_upgrade(move |socket| run_connection(socket, consumer))
}
