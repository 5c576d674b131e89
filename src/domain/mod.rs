//! Domain layer: the entry aggregate, its identity, and the notification
//! event derived from it.

pub mod clock;
pub mod entry;
pub mod entry_event;
pub mod entry_id;

pub use clock::EntryClock;
pub use entry::GuestbookEntry;
pub use entry_event::EntryAddedEvent;
pub use entry_id::EntryId;
