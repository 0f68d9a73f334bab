use thiserror::Error;

/// Errors surfaced by the door terminal.
///
/// Every variant is recoverable: the operator fixes the input or presses the
/// action again. Stale prefix responses are not errors and never show up here.
#[derive(Error, Debug)]
pub enum Error {
    // Local input errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authentication failed: PIN does not match")]
    Authentication,

    // Lookup outcomes
    #[error("Not found: {what}")]
    NotFound { what: String },

    // Store errors
    #[error("Remote store error: {message}")]
    Remote { message: String },

    // Check-in idempotency
    #[error("Check-in already recorded or in progress for CI {ci}")]
    AlreadyCheckedIn { ci: String, in_flight: bool },

    // Session errors
    #[error("Gate is locked")]
    GateLocked,

    #[error("No event loaded")]
    NoEventLoaded,

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Guest {guest_id} is not among the visible suggestions")]
    SuggestionNotVisible { guest_id: i64 },

    #[error("Terminal closed")]
    TerminalClosed,

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a new remote store error.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Create a new invalid state transition error.
    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Whether pressing the same action again may succeed without changing
    /// the input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
