//! Stale-result guard for prefix lookups.
//!
//! Prefix lookups are never cancelled once dispatched. Instead every
//! committed query is tagged with the next value of a counter, and a
//! response is applied only if its tag is still the current value when it
//! arrives. Anything older is dropped silently.
//!
//! The counter only moves forward, including across event loads, so a tag
//! issued for one event can never match after another event is loaded.
//!
//! # Examples
//!
//! ```
//! use guestgate_terminal::StaleGuard;
//!
//! let mut guard = StaleGuard::new();
//! let first = guard.issue();
//! let second = guard.issue();
//!
//! assert!(!guard.is_current(first));
//! assert!(guard.is_current(second));
//!
//! guard.invalidate();
//! assert!(!guard.is_current(second));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag carried by a prefix lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceTag(u64);

impl SequenceTag {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SequenceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic counter deciding which prefix response may paint suggestions.
#[derive(Debug, Default)]
pub struct StaleGuard {
    current: u64,
}

impl StaleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counter and return the tag for a new lookup.
    pub fn issue(&mut self) -> SequenceTag {
        self.current = self.current.wrapping_add(1);
        SequenceTag(self.current)
    }

    /// Advance the counter without issuing a tag, making every outstanding
    /// lookup stale.
    pub fn invalidate(&mut self) {
        self.current = self.current.wrapping_add(1);
    }

    pub fn is_current(&self, tag: SequenceTag) -> bool {
        tag.0 == self.current
    }

    pub fn current(&self) -> SequenceTag {
        SequenceTag(self.current)
    }
}
