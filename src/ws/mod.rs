//! WebSocket layer: live entry notifications.
//!
//! Each connection to `/ws` binds its own transient queue on the fan-out
//! exchange, so every open socket receives every entry created after it
//! connected. Disconnecting drops the queue.

pub mod connection;
pub mod handler;
pub mod messages;
