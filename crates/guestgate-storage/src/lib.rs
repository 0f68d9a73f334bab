//! Storage layer for the GuestGate door terminal.
//!
//! This crate provides SQLite-backed persistence for events and their guest
//! lists, the [`GuestListStore`] interface the door terminal queries, and the
//! organizer-side [`Roster`] service.
//!
//! # Architecture
//!
//! - [`Database`] - The guest list file, migrated on open, with its
//!   organizer and door views
//! - [`EventRepository`], [`GuestRepository`] - Data access traits
//! - [`GuestListStore`] / [`SqliteGuestList`] - The four remote calls of the
//!   door terminal, with `Send` futures
//! - [`Roster`] - Event creation and editing, guest add/import/delete,
//!   listing and door counters
//! - [`transaction`] - Transaction-aware bulk inserts for imports
//!
//! # Examples
//!
//! ```no_run
//! use guestgate_storage::{Database, DatabaseConfig, GuestListStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open(DatabaseConfig::new("guestgate.db")).await?;
//!
//! let roster = db.roster();
//! let event = roster.create_event("Fiesta", None, "4821").await?;
//! roster.add_guest(event.id, "Ana", "Pérez", "1.234.567-8").await?;
//!
//! let store = db.guest_list();
//! let guests = store.find_guests_by_prefix(event.id, "123", 12).await?;
//! assert_eq!(guests.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Security Considerations
//!
//! Only PIN fingerprints are stored. All queries use bound parameters.
//! CI uniqueness within an event is a roster-level check, not a database
//! constraint; exact lookups on a duplicated CI return the oldest row.

pub mod connection;
pub mod error;
pub mod import;
pub mod messages;
pub mod models;
pub mod repositories;
pub mod roster;
pub mod store;
pub mod transaction;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use messages::RosterMessages;
pub use models::{Event, Guest, RosterStats};
pub use repositories::{
    EventRepository, GuestRepository, SqliteEventRepository, SqliteGuestRepository,
};
pub use roster::{ImportSummary, Roster};
pub use store::{GuestListStore, SqliteGuestList};
