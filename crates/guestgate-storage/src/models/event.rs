use chrono::{DateTime, NaiveDate, Utc};
use guestgate_core::PinFingerprint;
use serde::{Deserialize, Serialize};

/// Event entity: one guest list, reachable at the door by its public code.
///
/// # Fields
///
/// * `id` - Auto-increment primary key
/// * `name` - Display name, required
/// * `event_date` - Optional calendar date
/// * `event_code` - Short public code used in the door terminal address
/// * `door_pin_hash` - Fingerprint of the door PIN (never the plaintext)
/// * `created_at` - Record creation timestamp
///
/// # Invariants
///
/// `door_pin_hash` is set when the event is created and only ever replaced
/// wholesale when the organizer sets a new PIN.
///
/// # Examples
///
/// ```
/// use guestgate_storage::models::Event;
/// use guestgate_core::fingerprint;
/// use chrono::Utc;
///
/// let event = Event {
///     id: 1,
///     name: "Fiesta de fin de año".to_string(),
///     event_date: None,
///     event_code: "AB12CD".to_string(),
///     door_pin_hash: fingerprint("4821").into_inner(),
///     created_at: Utc::now(),
/// };
///
/// assert_eq!(event.pin_fingerprint(), fingerprint("4821"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: i64,

    pub name: String,

    pub event_date: Option<NaiveDate>,

    pub event_code: String,

    /// Fingerprint of the door PIN.
    #[serde(skip_serializing)]
    pub door_pin_hash: String,

    pub created_at: DateTime<Utc>,
}

impl Event {
    /// The stored PIN fingerprint.
    pub fn pin_fingerprint(&self) -> PinFingerprint {
        PinFingerprint::from_stored(self.door_pin_hash.clone())
    }

    /// Date rendered for the door screen, or a placeholder when unset.
    pub fn display_date(&self) -> String {
        match self.event_date {
            Some(date) => date.format("%d/%m/%Y").to_string(),
            None => "Sin fecha".to_string(),
        }
    }
}
