//! The door terminal's view of the guest list.
//!
//! [`GuestListStore`] is the only remote surface the terminal talks to: four
//! calls, all keyed by the loaded event. The futures are `Send` so the
//! terminal can run them as spawned tasks and keep handling keystrokes while
//! a lookup is in flight.

use crate::error::StorageResult;
use crate::models::{Event, Guest};
use crate::repositories::{
    EventRepository, GuestRepository, SqliteEventRepository, SqliteGuestRepository,
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::future::Future;
use tracing::debug;

/// Remote guest list operations used by the door terminal.
pub trait GuestListStore: Send + Sync + 'static {
    /// Event with this public door code, if any
    fn find_event_by_code(
        &self,
        code: &str,
    ) -> impl Future<Output = StorageResult<Option<Event>>> + Send;

    /// Up to `limit` guests of the event whose CI starts with `prefix`,
    /// CI ascending
    fn find_guests_by_prefix(
        &self,
        event_id: i64,
        prefix: &str,
        limit: usize,
    ) -> impl Future<Output = StorageResult<Vec<Guest>>> + Send;

    /// Guest of the event with exactly this CI, if any
    fn find_guest_by_exact_ci(
        &self,
        event_id: i64,
        ci: &str,
    ) -> impl Future<Output = StorageResult<Option<Guest>>> + Send;

    /// Record the check-in and return the record as persisted
    fn mark_checked_in(
        &self,
        guest_id: i64,
        at: DateTime<Utc>,
    ) -> impl Future<Output = StorageResult<Guest>> + Send;
}

/// SQLite-backed [`GuestListStore`].
#[derive(Debug, Clone)]
pub struct SqliteGuestList {
    events: SqliteEventRepository,
    guests: SqliteGuestRepository,
}

impl SqliteGuestList {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            events: SqliteEventRepository::new(pool.clone()),
            guests: SqliteGuestRepository::new(pool),
        }
    }
}

impl GuestListStore for SqliteGuestList {
    async fn find_event_by_code(&self, code: &str) -> StorageResult<Option<Event>> {
        self.events.find_by_code(code).await
    }

    async fn find_guests_by_prefix(
        &self,
        event_id: i64,
        prefix: &str,
        limit: usize,
    ) -> StorageResult<Vec<Guest>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.guests.find_by_prefix(event_id, prefix, limit).await
    }

    async fn find_guest_by_exact_ci(&self, event_id: i64, ci: &str) -> StorageResult<Option<Guest>> {
        self.guests.find_by_exact_ci(event_id, ci).await
    }

    async fn mark_checked_in(&self, guest_id: i64, at: DateTime<Utc>) -> StorageResult<Guest> {
        let guest = self.guests.mark_checked_in(guest_id, at).await?;
        debug!(guest_id, "Persisted check-in");
        Ok(guest)
    }
}
