//! Guest lookup and check-in state machine.
//!
//! This module tracks what the door screen shows below the CI field: nothing
//! yet, a search in flight, the guest that was found, a "not on the list"
//! result, a check-in in flight, or a completed check-in.
//!
//! # States
//!
//! - `Idle`: waiting for a CI
//! - `Searching`: exact CI lookup in flight
//! - `Found`: a guest is displayed and can be checked in
//! - `NotFound`: the CI is not on the list
//! - `CheckingIn`: check-in update in flight
//! - `CheckedIn`: check-in persisted, displayed until the reset
//!
//! # Valid Transitions
//!
//! - Idle / Found / NotFound / CheckedIn / Searching → Searching
//! - Searching → Found / NotFound / Idle (lookup failed)
//! - Found → CheckingIn → CheckedIn, or back to Found when the update fails
//! - Idle / Searching / Found / NotFound / CheckedIn → Found (suggestion picked)
//! - Found / NotFound / CheckedIn → Idle (query edited, display reset)
//!
//! Nothing leaves `CheckingIn` except its own completion, so a check-in in
//! flight can never be orphaned.
//!
//! # Examples
//!
//! ```
//! use guestgate_terminal::{LookupMachine, LookupPhase, LookupState};
//!
//! let mut machine = LookupMachine::new();
//! machine.transition_to(LookupState::Searching).unwrap();
//! machine.transition_to(LookupState::NotFound).unwrap();
//!
//! assert_eq!(machine.phase(), LookupPhase::NotFound);
//! assert!(!machine.phase().can_transition_to(&LookupPhase::CheckingIn));
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use guestgate_core::{Error, Result};
use guestgate_storage::Guest;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maximum number of lookup transitions kept in history.
///
/// A full door cycle (search, found, check in, checked in, reset) is five
/// transitions, so this covers the last twenty guests.
const MAX_HISTORY_SIZE: usize = 100;

/// Lookup state with the guest it concerns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "guest", rename_all = "snake_case")]
pub enum LookupState {
    #[default]
    Idle,
    Searching,
    Found(Guest),
    NotFound,
    CheckingIn(Guest),
    CheckedIn(Guest),
}

/// Lookup state without payload, for transition rules and history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupPhase {
    Idle,
    Searching,
    Found,
    NotFound,
    CheckingIn,
    CheckedIn,
}

impl fmt::Display for LookupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase_str = match self {
            LookupPhase::Idle => "Idle",
            LookupPhase::Searching => "Searching",
            LookupPhase::Found => "Found",
            LookupPhase::NotFound => "NotFound",
            LookupPhase::CheckingIn => "CheckingIn",
            LookupPhase::CheckedIn => "CheckedIn",
        };
        write!(f, "{}", phase_str)
    }
}

impl LookupPhase {
    /// Check if transition to target phase is valid from this phase.
    ///
    /// # Examples
    ///
    /// ```
    /// use guestgate_terminal::LookupPhase;
    ///
    /// assert!(LookupPhase::Found.can_transition_to(&LookupPhase::CheckingIn));
    /// assert!(!LookupPhase::NotFound.can_transition_to(&LookupPhase::CheckingIn));
    /// assert!(!LookupPhase::CheckingIn.can_transition_to(&LookupPhase::Searching));
    /// ```
    pub fn can_transition_to(&self, target: &LookupPhase) -> bool {
        use LookupPhase::*;

        matches!(
            (self, target),
            // Exact search
            (Idle | Searching | Found | NotFound | CheckedIn, Searching)
            | (Searching, Found | NotFound | Idle)
            // Check-in
            | (Found, CheckingIn)
            | (CheckingIn, CheckedIn | Found)
            // Suggestion picked
            | (Idle | Found | NotFound | CheckedIn, Found)
            // Query edited or display reset
            | (Found | NotFound | CheckedIn, Idle)
        )
    }
}

impl LookupState {
    pub fn phase(&self) -> LookupPhase {
        match self {
            LookupState::Idle => LookupPhase::Idle,
            LookupState::Searching => LookupPhase::Searching,
            LookupState::Found(_) => LookupPhase::Found,
            LookupState::NotFound => LookupPhase::NotFound,
            LookupState::CheckingIn(_) => LookupPhase::CheckingIn,
            LookupState::CheckedIn(_) => LookupPhase::CheckedIn,
        }
    }

    /// The guest this state is about, if any.
    pub fn guest(&self) -> Option<&Guest> {
        match self {
            LookupState::Found(guest)
            | LookupState::CheckingIn(guest)
            | LookupState::CheckedIn(guest) => Some(guest),
            _ => None,
        }
    }
}

/// A recorded lookup transition.
#[derive(Debug, Clone)]
pub struct LookupTransition {
    pub from: LookupPhase,
    pub to: LookupPhase,
    pub timestamp: Instant,
}

/// Lookup state machine with a bounded transition history.
#[derive(Debug, Default)]
pub struct LookupMachine {
    state: LookupState,
    history: VecDeque<LookupTransition>,
}

impl LookupMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LookupState {
        &self.state
    }

    pub fn phase(&self) -> LookupPhase {
        self.state.phase()
    }

    pub fn history(&self) -> &VecDeque<LookupTransition> {
        &self.history
    }

    /// Move to `new_state` if the phase change is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] and leaves the state
    /// untouched when the rules forbid the move.
    pub fn transition_to(&mut self, new_state: LookupState) -> Result<()> {
        let from = self.phase();
        let to = new_state.phase();

        if !from.can_transition_to(&to) {
            return Err(Error::invalid_transition(from, to));
        }

        self.perform_state_change(new_state);
        Ok(())
    }

    /// Force the machine back to `Idle`, whatever the current state.
    ///
    /// Used when a new event is loaded.
    pub fn reset(&mut self) {
        if self.phase() != LookupPhase::Idle {
            self.perform_state_change(LookupState::Idle);
        }
    }

    fn perform_state_change(&mut self, new_state: LookupState) {
        let transition = LookupTransition {
            from: self.phase(),
            to: new_state.phase(),
            timestamp: Instant::now(),
        };
        debug!(from = %transition.from, to = %transition.to, "Lookup transition");

        self.state = new_state;
        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}
