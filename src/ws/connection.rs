//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection: answers
//! client commands and forwards every delivery from the connection's queue.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::messages::{WsCommand, WsMessage, WsMessageType};
use crate::domain::EntryAddedEvent;
use crate::messaging::QueueConsumer;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and answers them.
/// - Forwards each `entry_added` delivery from `consumer` to the client and
///   acknowledges it.
///
/// Returns when the client disconnects or the queue closes; the queue is
/// released when `consumer` drops.
pub async fn run_connection(socket: WebSocket, mut consumer: Box<dyn QueueConsumer>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let queue = consumer.queue_name().to_string();
    tracing::debug!(%queue, "ws connection opened");

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_text_message(&text)
                            && ws_tx.send(Message::text(reply)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    _ => {}
                }
            }
            delivery = consumer.recv() => {
                let Some(delivery) = delivery else {
                    break;
                };
                match serde_json::from_slice::<EntryAddedEvent>(&delivery.payload) {
                    Ok(event) => {
                        let json = serde_json::to_string(&WsMessage::entry_added(&event))
                            .unwrap_or_default();
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(%queue, error = %e, "dropping undecodable delivery");
                    }
                }
                if let Err(e) = consumer.ack(&delivery).await {
                    tracing::warn!(%queue, error = %e, "ack failed, closing ws connection");
                    break;
                }
            }
        }
    }

    tracing::debug!(%queue, "ws connection closed");
}

/// Handles a text message from the client, returning an optional JSON response.
fn handle_text_message(text: &str) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error(String::new(), 400, "malformed JSON"))
            .ok();
    };

    if msg.msg_type != WsMessageType::Command {
        return serde_json::to_string(&WsMessage::error(msg.id, 400, "expected a command"))
            .ok();
    }

    let reply = match serde_json::from_value::<WsCommand>(msg.payload) {
        Ok(WsCommand::Ping) => WsMessage::response(msg.id, serde_json::json!({ "pong": true })),
        Err(_) => WsMessage::error(msg.id, 404, "unknown command"),
    };
    serde_json::to_string(&reply).ok()
}
