use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Guest entity: one person on an event's list.
///
/// `ci` is stored normalized (digits only). A guest is checked in exactly
/// when `checked_in_at` is set; the field is written once and never cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Guest {
    pub id: i64,

    pub event_id: i64,

    pub first_name: String,

    pub last_name: String,

    /// Normalized CI, 7 or 8 digits
    pub ci: String,

    /// When the guest entered, if they did
    pub checked_in_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Guest {
    #[must_use]
    pub fn is_checked_in(&self) -> bool {
        self.checked_in_at.is_some()
    }

    /// "First Last", as shown on the door screen.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Door counters for one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterStats {
    pub total: i64,
    pub entered: i64,
    pub pending: i64,
}

impl RosterStats {
    pub fn new(total: i64, entered: i64) -> Self {
        Self {
            total,
            entered,
            pending: total - entered,
        }
    }
}
