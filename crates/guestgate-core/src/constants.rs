//! Core constants for the door terminal.
//!
//! This module centralizes the input limits and timing windows shared by the
//! gate, the search engine and the roster administration code. Keeping them in
//! one place guarantees that the organizer side (which stores PINs and CIs) and
//! the door side (which validates them) agree on the same rules.
//!
//! # Usage
//!
//! ```
//! use guestgate_core::constants::*;
//! use std::time::Duration;
//!
//! fn pin_length_ok(pin: &str) -> bool {
//!     (PIN_MIN_LENGTH..=PIN_MAX_LENGTH).contains(&pin.len())
//! }
//!
//! assert!(pin_length_ok("4821"));
//! assert!(!pin_length_ok("123"));
//!
//! let settle = Duration::from_millis(DEFAULT_SETTLE_WINDOW_MS);
//! assert_eq!(settle.as_millis(), 250);
//! ```

// ============================================================================
// PIN Constraints
// ============================================================================

/// Minimum number of digits in a door PIN (after normalization).
///
/// # Value: 4 digits
pub const PIN_MIN_LENGTH: usize = 4;

/// Maximum number of digits in a door PIN (after normalization).
///
/// # Value: 8 digits
pub const PIN_MAX_LENGTH: usize = 8;

// ============================================================================
// CI (national identity number) Constraints
// ============================================================================

/// Minimum number of digits in a CI.
///
/// # Value: 7 digits
pub const CI_MIN_LENGTH: usize = 7;

/// Maximum number of digits in a CI.
///
/// # Value: 8 digits
pub const CI_MAX_LENGTH: usize = 8;

/// Minimum number of digits typed before prefix suggestions are requested.
///
/// Shorter prefixes match too much of a typical guest list to be useful
/// and would put the most load on the store.
///
/// # Value: 3 digits
pub const MIN_PREFIX_LENGTH: usize = 3;

// ============================================================================
// Event Codes
// ============================================================================

/// Length of generated public event codes.
///
/// # Value: 6 characters
///
/// # Examples
///
/// ```
/// use guestgate_core::constants::EVENT_CODE_LENGTH;
/// use guestgate_core::EventCode;
///
/// assert_eq!(EventCode::generate().as_str().len(), EVENT_CODE_LENGTH);
/// ```
pub const EVENT_CODE_LENGTH: usize = 6;

/// Maximum accepted length for an event code typed by hand.
pub const MAX_EVENT_CODE_LENGTH: usize = 32;

/// Alphabet used for generated event codes.
///
/// Excludes `0`, `O`, `1` and `I` so codes can be read aloud at the door.
/// The alphabet has exactly 32 symbols, so mapping a random byte with `% 32`
/// introduces no bias.
pub const EVENT_CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of attempts made to insert an event with a fresh code before
/// giving up on repeated collisions.
pub const EVENT_CODE_MAX_ATTEMPTS: usize = 5;

// ============================================================================
// Timing
// ============================================================================

/// Default quiet period before a typed CI prefix is committed (milliseconds).
///
/// Each keystroke restarts the window; only the value left standing after
/// this long without input is sent to the store.
///
/// # Value: 250ms
pub const DEFAULT_SETTLE_WINDOW_MS: u64 = 250;

/// Default time a successful check-in stays on screen (milliseconds).
///
/// After this window the search area resets so the next guest can be served.
///
/// # Value: 2000ms (2 seconds)
pub const DEFAULT_CHECKED_IN_DISPLAY_MS: u64 = 2000;

// ============================================================================
// Store Limits
// ============================================================================

/// Default maximum number of suggestions fetched per prefix lookup.
///
/// # Value: 12
pub const DEFAULT_SUGGESTION_LIMIT: usize = 12;

/// Number of guest rows inserted per statement during CSV import.
///
/// # Value: 500
pub const IMPORT_CHUNK_SIZE: usize = 500;
