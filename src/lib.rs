//! # guestbook-gateway
//!
//! Guestbook write service: validates new entries, persists them through a
//! swappable store, and broadcasts an `entry_added` notification to every
//! subscriber bound to a fan-out exchange.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/) ◄────────────────┐
//!     │                                     │ transient queue per socket
//!     ├── GuestbookService (service/)       │
//!     │     validate → persist → publish    │
//!     │                                     │
//!     ├── EntryStore (persistence/)         │
//!     │     memory │ PostgreSQL             │
//!     │                                     │
//!     └── MessageBroker (messaging/) ───────┘
//!           in-process │ AMQP fan-out exchange
//! ```
//!
//! The write path never rolls back: an entry that was stored stays stored
//! even if its notification fails, and the caller is told so through
//! [`error::GuestbookError::Publish`].

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod messaging;
pub mod persistence;
pub mod service;
pub mod ws;
