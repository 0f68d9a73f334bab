//! Door terminal timing and lookup configuration.

use guestgate_core::constants::{
    CI_MAX_LENGTH, DEFAULT_CHECKED_IN_DISPLAY_MS, DEFAULT_SETTLE_WINDOW_MS,
    DEFAULT_SUGGESTION_LIMIT, MIN_PREFIX_LENGTH,
};
use guestgate_core::{Error, Result};
use std::time::Duration;

/// Configuration for a [`DoorTerminal`](crate::DoorTerminal).
///
/// # Examples
///
/// ```
/// use guestgate_terminal::TerminalConfig;
/// use std::time::Duration;
///
/// let config = TerminalConfig::default()
///     .with_settle_window(Duration::from_millis(150))
///     .with_suggestion_limit(8);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalConfig {
    /// Quiet time after the last keystroke before a prefix query is committed
    pub settle_window: Duration,

    /// How long a completed check-in stays on screen
    pub checked_in_display: Duration,

    /// Maximum number of suggestions requested per prefix query
    pub suggestion_limit: usize,

    /// Shortest normalized prefix that triggers a lookup
    pub min_prefix_len: usize,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            settle_window: Duration::from_millis(DEFAULT_SETTLE_WINDOW_MS),
            checked_in_display: Duration::from_millis(DEFAULT_CHECKED_IN_DISPLAY_MS),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            min_prefix_len: MIN_PREFIX_LENGTH,
        }
    }
}

impl TerminalConfig {
    pub fn with_settle_window(mut self, window: Duration) -> Self {
        self.settle_window = window;
        self
    }

    pub fn with_checked_in_display(mut self, display: Duration) -> Self {
        self.checked_in_display = display;
        self
    }

    pub fn with_suggestion_limit(mut self, limit: usize) -> Self {
        self.suggestion_limit = limit;
        self
    }

    pub fn with_min_prefix_len(mut self, len: usize) -> Self {
        self.min_prefix_len = len;
        self
    }

    /// Check the configuration for values the terminal cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the suggestion limit is zero, the
    /// minimum prefix is zero or longer than a CI, or the check-in display
    /// window is zero. A zero settle window is allowed and commits every
    /// keystroke.
    pub fn validate(&self) -> Result<()> {
        if self.suggestion_limit == 0 {
            return Err(Error::Config("suggestion_limit must be positive".into()));
        }
        if self.min_prefix_len == 0 || self.min_prefix_len > CI_MAX_LENGTH {
            return Err(Error::Config(format!(
                "min_prefix_len must be between 1 and {CI_MAX_LENGTH}"
            )));
        }
        if self.checked_in_display.is_zero() {
            return Err(Error::Config("checked_in_display must be positive".into()));
        }
        Ok(())
    }
}
