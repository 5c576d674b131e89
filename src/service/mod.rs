//! Service layer: the write orchestrator.
//!
//! [`GuestbookService`] validates input, persists through the
//! [`crate::persistence::EntryStore`], and publishes through the
//! [`crate::messaging::EntryEventPublisher`].

pub mod guestbook_service;

pub use guestbook_service::GuestbookService;
