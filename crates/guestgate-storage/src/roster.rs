//! Organizer-side roster administration.
//!
//! [`Roster`] validates organizer input, then writes through the
//! repositories. It owns the rules the database does not enforce: PIN length,
//! required names, CI uniqueness within an event, event code retries and the
//! import dedup.

use crate::error::{StorageError, StorageResult};
use crate::import::{dedup_rows, parse_roster};
use crate::messages::RosterMessages;
use crate::models::{Event, Guest, RosterStats};
use crate::repositories::{
    EventRepository, GuestRepository, SqliteEventRepository, SqliteGuestRepository,
};
use crate::transaction;
use chrono::{NaiveDate, Utc};
use guestgate_core::constants::{EVENT_CODE_MAX_ATTEMPTS, IMPORT_CHUNK_SIZE};
use guestgate_core::{Ci, EventCode, Pin, normalize_digits};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Result of a roster import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Valid rows found in the file
    pub parsed: usize,
    /// Rows actually inserted after dedup
    pub inserted: usize,
}

impl ImportSummary {
    /// Rows skipped because their CI was already present
    pub fn skipped(&self) -> usize {
        self.parsed - self.inserted
    }
}

/// Roster administration service.
#[derive(Debug, Clone)]
pub struct Roster {
    pool: SqlitePool,
    events: SqliteEventRepository,
    guests: SqliteGuestRepository,
}

impl Roster {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            events: SqliteEventRepository::new(pool.clone()),
            guests: SqliteGuestRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create an event with a freshly generated door code.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Validation`] for an empty name or a PIN that is not
    ///   4-8 digits
    /// - [`StorageError::Duplicate`] if every generated code collided
    pub async fn create_event(
        &self,
        name: &str,
        event_date: Option<NaiveDate>,
        pin: &str,
    ) -> StorageResult<Event> {
        let name = required(name, RosterMessages::EVENT_NAME_REQUIRED)?;
        let pin = Pin::parse(pin)
            .map_err(|_| StorageError::Validation(RosterMessages::PIN_LENGTH.to_string()))?;

        let mut event = Event {
            id: 0,
            name,
            event_date,
            event_code: String::new(),
            door_pin_hash: pin.fingerprint().into_inner(),
            created_at: Utc::now(),
        };

        for attempt in 1..=EVENT_CODE_MAX_ATTEMPTS {
            event.event_code = EventCode::generate().as_str().to_string();

            match self.events.create(&event).await {
                Ok(id) => {
                    event.id = id;
                    info!(event_id = id, code = %event.event_code, "Created event");
                    return Ok(event);
                }
                Err(StorageError::Duplicate(_)) => {
                    debug!(attempt, "Event code collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            attempts = EVENT_CODE_MAX_ATTEMPTS,
            "Could not allocate an event code"
        );
        Err(StorageError::Duplicate(
            RosterMessages::EVENT_CODE_EXHAUSTED.to_string(),
        ))
    }

    /// Edit name and date, and replace the PIN fingerprint when a new PIN is
    /// given. A PIN with no digits at all counts as "keep the current one".
    pub async fn update_event(
        &self,
        id: i64,
        name: &str,
        event_date: Option<NaiveDate>,
        new_pin: Option<&str>,
    ) -> StorageResult<Event> {
        let name = required(name, RosterMessages::EVENT_NAME_REQUIRED)?;

        let mut event = self
            .events
            .find_by_id(id)
            .await?
            .ok_or_else(|| StorageError::not_found("Event", "id", id))?;

        event.name = name;
        event.event_date = event_date;

        if let Some(raw) = new_pin.filter(|raw| !normalize_digits(raw).is_empty()) {
            let pin = Pin::parse(raw)
                .map_err(|_| StorageError::Validation(RosterMessages::PIN_LENGTH.to_string()))?;
            event.door_pin_hash = pin.fingerprint().into_inner();
            info!(event_id = id, "Door PIN replaced");
        }

        self.events.update(&event).await?;
        Ok(event)
    }

    pub async fn list_events(&self) -> StorageResult<Vec<Event>> {
        self.events.list_all().await
    }

    pub async fn find_event_by_code(&self, code: &str) -> StorageResult<Event> {
        let code = EventCode::parse(code)?;
        self.events
            .find_by_code(code.as_str())
            .await?
            .ok_or_else(|| StorageError::not_found("Event", "event_code", code))
    }

    /// Add one guest after checking the CI is not registered yet.
    pub async fn add_guest(
        &self,
        event_id: i64,
        first_name: &str,
        last_name: &str,
        ci: &str,
    ) -> StorageResult<Guest> {
        let first_name = required(first_name, RosterMessages::GUEST_NAMES_REQUIRED)?;
        let last_name = required(last_name, RosterMessages::GUEST_NAMES_REQUIRED)?;
        let ci = Ci::parse(ci)
            .map_err(|_| StorageError::Validation(RosterMessages::CI_LENGTH.to_string()))?;

        self.require_event(event_id).await?;

        if self.guests.exists_by_ci(event_id, ci.as_str()).await? {
            return Err(StorageError::Duplicate(
                RosterMessages::CI_ALREADY_REGISTERED.to_string(),
            ));
        }

        let mut guest = Guest {
            id: 0,
            event_id,
            first_name,
            last_name,
            ci: ci.into_inner(),
            checked_in_at: None,
            created_at: Utc::now(),
        };
        guest.id = self.guests.create(&guest).await?;

        debug!(event_id, guest_id = guest.id, "Added guest");
        Ok(guest)
    }

    /// Import a roster file into the event.
    ///
    /// All new rows are inserted in one transaction, in chunks of
    /// [`IMPORT_CHUNK_SIZE`].
    ///
    /// # Errors
    ///
    /// [`StorageError::Validation`] when the file has no valid rows, or when
    /// every row was already registered.
    pub async fn import_csv(&self, event_id: i64, text: &str) -> StorageResult<ImportSummary> {
        let rows = parse_roster(text);
        if rows.is_empty() {
            return Err(StorageError::Validation(
                RosterMessages::IMPORT_NO_ROWS.to_string(),
            ));
        }
        let parsed = rows.len();

        self.require_event(event_id).await?;

        let existing = self.guests.existing_cis(event_id).await?;
        let fresh = dedup_rows(rows, &existing);
        if fresh.is_empty() {
            return Err(StorageError::Validation(
                RosterMessages::IMPORT_ALL_PRESENT.to_string(),
            ));
        }

        let now = Utc::now();
        let guests: Vec<Guest> = fresh
            .into_iter()
            .map(|row| Guest {
                id: 0,
                event_id,
                first_name: row.first_name,
                last_name: row.last_name,
                ci: row.ci.into_inner(),
                checked_in_at: None,
                created_at: now,
            })
            .collect();

        let mut tx = self.pool.begin().await?;
        let inserted = transaction::insert_guests(&mut tx, &guests, IMPORT_CHUNK_SIZE).await?;
        tx.commit().await?;

        let summary = ImportSummary {
            parsed,
            inserted: usize::try_from(inserted).unwrap_or(guests.len()),
        };
        info!(
            event_id,
            parsed = summary.parsed,
            inserted = summary.inserted,
            "Imported roster"
        );
        Ok(summary)
    }

    /// Guests of the event, newest first, narrowed by `filter`.
    ///
    /// The filter matches the full name case-insensitively, or the CI when
    /// the filter contains digits. An empty filter returns everyone.
    pub async fn list_guests(&self, event_id: i64, filter: &str) -> StorageResult<Vec<Guest>> {
        let guests = self.guests.list_by_event(event_id).await?;

        let needle = filter.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(guests);
        }
        let digits = normalize_digits(&needle);

        Ok(guests
            .into_iter()
            .filter(|guest| {
                guest.full_name().to_lowercase().contains(&needle)
                    || (!digits.is_empty() && guest.ci.contains(&digits))
            })
            .collect())
    }

    pub async fn stats(&self, event_id: i64) -> StorageResult<RosterStats> {
        self.guests.stats(event_id).await
    }

    pub async fn delete_guest(&self, guest_id: i64) -> StorageResult<()> {
        self.guests.delete(guest_id).await?;
        info!(guest_id, "Deleted guest");
        Ok(())
    }

    async fn require_event(&self, event_id: i64) -> StorageResult<()> {
        match self.events.find_by_id(event_id).await? {
            Some(_) => Ok(()),
            None => Err(StorageError::not_found("Event", "id", event_id)),
        }
    }
}

fn required(value: &str, message: &str) -> StorageResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StorageError::Validation(message.to_string()));
    }
    Ok(value.to_string())
}
