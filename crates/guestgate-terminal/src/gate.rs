//! PIN gate state machine.
//!
//! The gate decides whether the door terminal may search the guest list at
//! all. It starts `Locked` whenever an event is loaded and opens when the
//! operator enters a PIN whose fingerprint matches the event's stored one.
//!
//! # States
//!
//! - `Locked`: only PIN entry is possible
//! - `Unlocked`: guest lookup and check-in are available
//!
//! # Valid Transitions
//!
//! - Locked → Unlocked (matching PIN)
//! - Unlocked → Locked (a different event is loaded)
//!
//! There is no relock timer: once open, the gate stays open until the next
//! event load.
//!
//! # Examples
//!
//! ```
//! use guestgate_core::fingerprint;
//! use guestgate_terminal::{Gate, GateState};
//!
//! let stored = fingerprint("4821");
//! let mut gate = Gate::new();
//!
//! assert!(gate.submit("1111", &stored).is_err());
//! assert_eq!(gate.state(), GateState::Locked);
//!
//! gate.submit("48-21", &stored).unwrap();
//! assert_eq!(gate.state(), GateState::Unlocked);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use guestgate_core::{Error, Pin, PinFingerprint, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Maximum number of gate transitions kept in history.
const MAX_HISTORY_SIZE: usize = 100;

/// Gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Locked,
    Unlocked,
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            GateState::Locked => "Locked",
            GateState::Unlocked => "Unlocked",
        };
        write!(f, "{}", state_str)
    }
}

impl GateState {
    /// Check if transition to target state is valid from this state.
    pub fn can_transition_to(&self, target: &GateState) -> bool {
        matches!(
            (self, target),
            (GateState::Locked, GateState::Unlocked) | (GateState::Unlocked, GateState::Locked)
        )
    }
}

/// A recorded gate transition.
#[derive(Debug, Clone)]
pub struct GateTransition {
    pub from: GateState,
    pub to: GateState,
    pub timestamp: Instant,
}

/// Result of a PIN submission that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unlock {
    /// The gate was locked and is now open
    Opened,
    /// The gate was already open; nothing changed
    AlreadyOpen,
}

/// PIN gate with a bounded transition history.
#[derive(Debug)]
pub struct Gate {
    state: GateState,
    history: VecDeque<GateTransition>,
}

impl Gate {
    /// Create a locked gate.
    pub fn new() -> Self {
        Self {
            state: GateState::Locked,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == GateState::Unlocked
    }

    /// Transitions, oldest first.
    pub fn history(&self) -> &VecDeque<GateTransition> {
        &self.history
    }

    /// Try to open the gate with a PIN attempt.
    ///
    /// Submitting while already open succeeds without looking at the PIN.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the normalized PIN is not 4-8 digits
    /// - [`Error::Authentication`] if its fingerprint does not match
    ///
    /// The gate stays locked in both cases.
    pub fn submit(&mut self, raw_pin: &str, stored: &PinFingerprint) -> Result<Unlock> {
        if self.is_unlocked() {
            return Ok(Unlock::AlreadyOpen);
        }

        let pin = Pin::parse(raw_pin)?;
        if !stored.matches(&pin) {
            warn!("PIN rejected");
            return Err(Error::Authentication);
        }

        self.transition_to(GateState::Unlocked)?;
        Ok(Unlock::Opened)
    }

    /// Lock the gate. Used when a different event is loaded.
    pub fn lock(&mut self) {
        if self.state != GateState::Locked {
            // Unlocked -> Locked is always valid
            let _ = self.transition_to(GateState::Locked);
        }
    }

    fn transition_to(&mut self, new_state: GateState) -> Result<()> {
        if !self.state.can_transition_to(&new_state) {
            return Err(Error::invalid_transition(self.state, new_state));
        }

        debug!(from = %self.state, to = %new_state, "Gate transition");
        self.history.push_back(GateTransition {
            from: self.state,
            to: new_state,
            timestamp: Instant::now(),
        });
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.state = new_state;
        Ok(())
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}
