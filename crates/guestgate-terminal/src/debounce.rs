//! Debounced query scheduler.
//!
//! Each keystroke value is normalized to digits and restarts the settle
//! window. When the window elapses with no further input the value is
//! committed exactly once. The scheduler never sleeps itself: it only
//! tracks the deadline, and the terminal loop waits on it with
//! `tokio::time::sleep_until`. Time is passed in so the logic is testable
//! with any clock.

use guestgate_core::normalize_digits;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Pending {
    value: String,
    deadline: Instant,
}

/// Settle-window debouncer for the CI field.
#[derive(Debug, Clone)]
pub struct QueryDebouncer {
    window: Duration,
    pending: Option<Pending>,
}

impl QueryDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Record a keystroke value, replacing any pending one.
    ///
    /// Returns the normalized value.
    pub fn input(&mut self, raw: &str, now: Instant) -> String {
        let value = normalize_digits(raw);
        self.pending = Some(Pending {
            value: value.clone(),
            deadline: now + self.window,
        });
        value
    }

    /// When the pending value will be committed, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Commit the pending value if its window has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<String> {
        if self.pending.as_ref().is_some_and(|p| p.deadline <= now) {
            self.pending.take().map(|p| p.value)
        } else {
            None
        }
    }

    /// Drop the pending value without committing it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(250);

    #[test]
    fn test_commits_after_quiet_window() {
        let start = Instant::now();
        let mut debouncer = QueryDebouncer::new(WINDOW);

        assert_eq!(debouncer.input("1.23", start), "123");
        assert_eq!(debouncer.take_due(start + Duration::from_millis(249)), None);
        assert_eq!(
            debouncer.take_due(start + WINDOW),
            Some("123".to_string())
        );

        // Emitted once only
        assert_eq!(debouncer.take_due(start + WINDOW * 2), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_new_keystroke_restarts_window() {
        let start = Instant::now();
        let mut debouncer = QueryDebouncer::new(WINDOW);

        debouncer.input("123", start);
        let second = start + Duration::from_millis(100);
        debouncer.input("1234", second);

        assert_eq!(debouncer.deadline(), Some(second + WINDOW));
        assert_eq!(debouncer.take_due(start + WINDOW), None);
        assert_eq!(
            debouncer.take_due(second + WINDOW),
            Some("1234".to_string())
        );
    }

    #[test]
    fn test_cancel_drops_pending_value() {
        let start = Instant::now();
        let mut debouncer = QueryDebouncer::new(WINDOW);

        debouncer.input("123", start);
        debouncer.cancel();

        assert_eq!(debouncer.deadline(), None);
        assert_eq!(debouncer.take_due(start + WINDOW), None);
    }

    #[test]
    fn test_zero_window_commits_immediately() {
        let start = Instant::now();
        let mut debouncer = QueryDebouncer::new(Duration::ZERO);

        debouncer.input("98", start);
        assert_eq!(debouncer.take_due(start), Some("98".to_string()));
    }
}
