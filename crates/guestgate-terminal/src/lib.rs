//! Door terminal for GuestGate.
//!
//! The terminal is what door staff use at the venue entrance: load the event
//! by its public code, unlock the gate with the door PIN, type a guest's CI
//! and check them in.
//!
//! # Layout
//!
//! - [`gate`]: PIN gate state machine
//! - [`debounce`]: settle-window scheduler for the CI field
//! - [`guard`]: stale-result guard for prefix lookups
//! - [`lookup`]: lookup and check-in state machine
//! - [`session`]: the owned session record combining all of the above
//! - [`terminal`]: the async loop driving a session against a store
//!
//! Everything up to [`session`] is synchronous and takes the current time as
//! a parameter. Only [`terminal`] spawns tasks or sleeps.

pub mod config;
pub mod debounce;
pub mod gate;
pub mod guard;
pub mod lookup;
pub mod messages;
pub mod session;
pub mod terminal;

pub use config::TerminalConfig;
pub use debounce::QueryDebouncer;
pub use gate::{Gate, GateState, Unlock};
pub use guard::{SequenceTag, StaleGuard};
pub use lookup::{LookupMachine, LookupPhase, LookupState};
pub use messages::DisplayMessages;
pub use session::{DoorSession, EventSummary, TerminalSnapshot};
pub use terminal::{DoorTerminal, TerminalHandle};
