//! The door terminal's session record.
//!
//! [`DoorSession`] owns everything one door screen knows: the loaded event,
//! the gate, the CI field with its debouncer, the suggestion list and its
//! stale-result guard, and the lookup state machine with its messages.
//!
//! The session never awaits. Operator actions return a request describing
//! the store call to make; the caller runs it, converts any storage error
//! into a terminal [`Error`], and hands the outcome back through the
//! matching `apply_*` method together with the tag or ticket from the
//! request. Outcomes whose tag or ticket is no longer current are
//! dropped, which is how superseded lookups and results from a previous
//! event are kept off the screen.
//!
//! # Examples
//!
//! ```
//! use guestgate_terminal::{DoorSession, TerminalConfig};
//!
//! let mut session = DoorSession::new(TerminalConfig::default());
//! let request = session.begin_load("ab12cd").unwrap();
//! assert_eq!(request.code.as_str(), "AB12CD");
//! assert!(session.snapshot().loading_event);
//! ```

use crate::config::TerminalConfig;
use crate::debounce::QueryDebouncer;
use crate::gate::{Gate, GateState, Unlock};
use crate::guard::{SequenceTag, StaleGuard};
use crate::lookup::{LookupMachine, LookupPhase, LookupState};
use crate::messages::DisplayMessages;
use chrono::{DateTime, NaiveDate, Utc};
use guestgate_core::{Ci, Error, EventCode, Result};
use guestgate_storage::{Event, Guest};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Identifies one exact search or check-in of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LookupTicket {
    epoch: u64,
    seq: u64,
}

/// Store call for [`DoorSession::begin_load`].
#[derive(Debug, Clone)]
pub struct EventRequest {
    pub epoch: u64,
    pub code: EventCode,
}

/// Store call for a committed prefix query.
#[derive(Debug, Clone)]
pub struct PrefixRequest {
    pub tag: SequenceTag,
    pub event_id: i64,
    pub prefix: String,
    pub limit: usize,
}

/// Store call for [`DoorSession::submit_exact_search`].
#[derive(Debug, Clone)]
pub struct ExactRequest {
    pub ticket: LookupTicket,
    pub event_id: i64,
    pub ci: Ci,
}

/// Store call for [`DoorSession::check_in`].
#[derive(Debug, Clone)]
pub struct CheckInRequest {
    pub ticket: LookupTicket,
    pub guest_id: i64,
    pub at: DateTime<Utc>,
}

/// Public part of the loaded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub id: i64,
    pub name: String,
    pub event_code: String,
    pub event_date: Option<NaiveDate>,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            name: event.name.clone(),
            event_code: event.event_code.clone(),
            event_date: event.event_date,
        }
    }
}

/// Everything the door screen renders, at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalSnapshot {
    pub gate: GateState,
    pub event: Option<EventSummary>,
    pub loading_event: bool,
    pub event_message: Option<String>,
    /// Length of the last rejected PIN attempt, for a masked field
    pub pin_digits: usize,
    pub pin_message: Option<String>,
    pub query: String,
    pub lookup: LookupPhase,
    pub guest: Option<Guest>,
    pub suggestions: Vec<Guest>,
    pub suggestions_loading: bool,
    pub suggestions_visible: bool,
    pub search_message: Option<String>,
    pub check_message: Option<String>,
}

/// One door terminal's state. See the module docs for the request/apply
/// protocol.
#[derive(Debug)]
pub struct DoorSession {
    config: TerminalConfig,

    // Event
    epoch: u64,
    event: Option<Event>,
    loading_event: bool,
    event_message: Option<&'static str>,

    // Gate
    gate: Gate,
    pin_digits: usize,
    pin_message: Option<&'static str>,

    // Suggestions
    query: String,
    debouncer: QueryDebouncer,
    guard: StaleGuard,
    suggestions: Vec<Guest>,
    suggestions_loading: bool,

    // Lookup
    lookup: LookupMachine,
    lookup_seq: u64,
    search_message: Option<&'static str>,
    check_message: Option<&'static str>,
    reset_at: Option<(Instant, LookupTicket)>,
}

impl DoorSession {
    pub fn new(config: TerminalConfig) -> Self {
        Self {
            debouncer: QueryDebouncer::new(config.settle_window),
            config,
            epoch: 0,
            event: None,
            loading_event: false,
            event_message: None,
            gate: Gate::new(),
            pin_digits: 0,
            pin_message: None,
            query: String::new(),
            guard: StaleGuard::new(),
            suggestions: Vec::new(),
            suggestions_loading: false,
            lookup: LookupMachine::new(),
            lookup_seq: 0,
            search_message: None,
            check_message: None,
            reset_at: None,
        }
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn event(&self) -> Option<&Event> {
        self.event.as_ref()
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn lookup(&self) -> &LookupMachine {
        &self.lookup
    }

    pub fn suggestions(&self) -> &[Guest] {
        &self.suggestions
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    // ---- Event ------------------------------------------------------------

    /// Discard the whole session and start loading the event behind `code`.
    ///
    /// The gate locks and all search state is cleared even when the code
    /// turns out to be malformed.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for a malformed code; no store call is needed.
    pub fn begin_load(&mut self, code: &str) -> Result<EventRequest> {
        self.epoch += 1;
        self.event = None;
        self.loading_event = false;
        self.event_message = None;
        self.gate.lock();
        self.pin_digits = 0;
        self.pin_message = None;
        self.reset_search();

        let code = EventCode::parse(code).inspect_err(|_| {
            self.event_message = Some(DisplayMessages::EVENT_CODE_INVALID);
        })?;

        self.loading_event = true;
        debug!(epoch = self.epoch, code = %code, "Loading event");
        Ok(EventRequest {
            epoch: self.epoch,
            code,
        })
    }

    /// Apply the outcome of an event lookup. Returns whether it was applied.
    pub fn apply_event(&mut self, epoch: u64, result: Result<Option<Event>>) -> bool {
        if epoch != self.epoch {
            trace!(epoch, current = self.epoch, "Dropping event from earlier load");
            return false;
        }

        self.loading_event = false;
        match result {
            Ok(Some(event)) => {
                info!(event_id = event.id, code = %event.event_code, "Event loaded");
                self.event = Some(event);
            }
            Ok(None) => {
                self.event_message = Some(DisplayMessages::EVENT_NOT_FOUND);
            }
            Err(e) => {
                warn!(error = %e, "Event lookup failed");
                self.event_message = Some(DisplayMessages::EVENT_LOOKUP_FAILED);
            }
        }
        true
    }

    // ---- Gate -------------------------------------------------------------

    /// Try to unlock the gate with a PIN attempt.
    ///
    /// Succeeds without effect when the gate is already open.
    ///
    /// # Errors
    ///
    /// - [`Error::NoEventLoaded`] before an event is loaded
    /// - [`Error::Validation`] if the PIN is not 4-8 digits
    /// - [`Error::Authentication`] if it does not match the event
    pub fn submit_pin(&mut self, raw: &str) -> Result<()> {
        let stored = self
            .event
            .as_ref()
            .map(Event::pin_fingerprint)
            .ok_or(Error::NoEventLoaded)?;

        self.pin_digits = 0;
        self.pin_message = None;

        match self.gate.submit(raw, &stored) {
            Ok(Unlock::Opened) => {
                info!(event_id = self.event.as_ref().map(|e| e.id), "Gate unlocked");
                Ok(())
            }
            Ok(Unlock::AlreadyOpen) => Ok(()),
            Err(e) => {
                self.pin_digits = raw.bytes().filter(u8::is_ascii_digit).count();
                self.pin_message = Some(match e {
                    Error::Authentication => DisplayMessages::PIN_WRONG,
                    _ => DisplayMessages::PIN_INVALID,
                });
                Err(e)
            }
        }
    }

    // ---- Query and suggestions -------------------------------------------

    /// Record a keystroke in the CI field.
    ///
    /// Editing clears a displayed result (`Found`, `NotFound`, `CheckedIn`
    /// go back to `Idle`) and the search and check-in messages. It never
    /// interrupts a search or check-in in flight.
    pub fn set_query_text(&mut self, raw: &str, now: Instant) {
        self.query = self.debouncer.input(raw, now);
        self.search_message = None;
        self.check_message = None;

        if matches!(
            self.lookup.phase(),
            LookupPhase::Found | LookupPhase::NotFound | LookupPhase::CheckedIn
        ) {
            self.reset_at = None;
            // Found / NotFound / CheckedIn -> Idle is always valid
            let _ = self.lookup.transition_to(LookupState::Idle);
        }
    }

    /// When the pending keystroke should be committed.
    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Commit the pending query if its settle window elapsed.
    ///
    /// Returns the prefix lookup to run, or `None` when nothing was due or
    /// the emission was suppressed (gate locked, no event, prefix too
    /// short). A suppressed emission clears the suggestions and makes any
    /// lookup still in flight stale.
    pub fn fire_debounce(&mut self, now: Instant) -> Option<PrefixRequest> {
        let value = self.debouncer.take_due(now)?;

        let event_id = match &self.event {
            Some(event)
                if self.gate.is_unlocked() && value.len() >= self.config.min_prefix_len =>
            {
                event.id
            }
            _ => {
                self.clear_suggestions();
                return None;
            }
        };

        let tag = self.guard.issue();
        self.suggestions_loading = true;
        debug!(%tag, prefix_len = value.len(), "Dispatching prefix lookup");

        Some(PrefixRequest {
            tag,
            event_id,
            prefix: value,
            limit: self.config.suggestion_limit,
        })
    }

    /// Apply a prefix lookup outcome if its tag is still current. Returns
    /// whether it was applied.
    ///
    /// A failed lookup keeps the previous suggestions.
    pub fn apply_prefix(&mut self, tag: SequenceTag, result: Result<Vec<Guest>>) -> bool {
        if !self.guard.is_current(tag) {
            trace!(%tag, current = %self.guard.current(), "Dropping stale prefix response");
            return false;
        }

        self.suggestions_loading = false;
        match result {
            Ok(guests) => self.suggestions = guests,
            Err(e) => warn!(%tag, error = %e, "Prefix lookup failed"),
        }
        true
    }

    // ---- Lookup -----------------------------------------------------------

    /// Start an exact CI lookup.
    ///
    /// # Errors
    ///
    /// - [`Error::NoEventLoaded`] / [`Error::GateLocked`]
    /// - [`Error::Validation`] if the CI is not 7 or 8 digits; the state is
    ///   left as it was
    /// - [`Error::InvalidStateTransition`] while a check-in is in flight
    pub fn submit_exact_search(&mut self, raw_ci: &str) -> Result<ExactRequest> {
        let event_id = self.require_unlocked()?;

        let ci = Ci::parse(raw_ci).inspect_err(|_| {
            self.search_message = Some(DisplayMessages::CI_INVALID);
        })?;

        self.lookup.transition_to(LookupState::Searching)?;

        self.query = ci.as_str().to_string();
        self.debouncer.cancel();
        self.guard.invalidate();
        self.suggestions_loading = false;
        self.search_message = None;
        self.check_message = None;
        self.reset_at = None;

        let ticket = self.next_ticket();
        debug!(event_id, "Dispatching exact lookup");
        Ok(ExactRequest {
            ticket,
            event_id,
            ci,
        })
    }

    /// Apply an exact lookup outcome. Returns whether it was applied.
    pub fn apply_exact(
        &mut self,
        ticket: LookupTicket,
        result: Result<Option<Guest>>,
    ) -> bool {
        if ticket != self.ticket() || self.lookup.phase() != LookupPhase::Searching {
            trace!(?ticket, "Dropping superseded exact lookup");
            return false;
        }

        let next = match result {
            Ok(Some(guest)) => {
                self.clear_suggestions();
                LookupState::Found(guest)
            }
            Ok(None) => {
                self.search_message = Some(DisplayMessages::GUEST_NOT_ON_LIST);
                LookupState::NotFound
            }
            Err(e) => {
                warn!(error = %e, "Exact lookup failed");
                self.search_message = Some(DisplayMessages::SEARCH_FAILED);
                LookupState::Idle
            }
        };

        // Searching -> Found / NotFound / Idle are always valid
        let _ = self.lookup.transition_to(next);
        true
    }

    /// Show a visible suggestion as the found guest, without a store call.
    ///
    /// # Errors
    ///
    /// - [`Error::NoEventLoaded`] / [`Error::GateLocked`]
    /// - [`Error::SuggestionNotVisible`] if the list is hidden or the guest
    ///   is not in it
    /// - [`Error::InvalidStateTransition`] while a check-in is in flight
    pub fn pick_suggestion(&mut self, guest_id: i64) -> Result<()> {
        self.require_unlocked()?;

        if !self.suggestions_visible() {
            return Err(Error::SuggestionNotVisible { guest_id });
        }

        let guest = self
            .suggestions
            .iter()
            .find(|g| g.id == guest_id)
            .cloned()
            .ok_or(Error::SuggestionNotVisible { guest_id })?;

        let ci = guest.ci.clone();
        self.lookup.transition_to(LookupState::Found(guest))?;

        self.query = ci;
        self.debouncer.cancel();
        self.clear_suggestions();
        self.search_message = None;
        self.check_message = None;
        self.reset_at = None;
        // A search still in flight must not replace the picked guest
        self.next_ticket();
        Ok(())
    }

    /// Start checking in the displayed guest.
    ///
    /// # Errors
    ///
    /// - [`Error::NoEventLoaded`] / [`Error::GateLocked`]
    /// - [`Error::AlreadyCheckedIn`] if the guest already has a check-in
    ///   (`in_flight: false`) or one is being recorded (`in_flight: true`);
    ///   no store call is made
    /// - [`Error::InvalidStateTransition`] when no guest is displayed
    pub fn check_in(&mut self, now: DateTime<Utc>) -> Result<CheckInRequest> {
        self.require_unlocked()?;

        let guest = match self.lookup.state() {
            LookupState::CheckingIn(guest) => {
                return Err(Error::AlreadyCheckedIn {
                    ci: guest.ci.clone(),
                    in_flight: true,
                });
            }
            LookupState::Found(guest) | LookupState::CheckedIn(guest)
                if guest.is_checked_in() =>
            {
                let ci = guest.ci.clone();
                self.check_message = Some(DisplayMessages::ALREADY_CHECKED_IN);
                return Err(Error::AlreadyCheckedIn {
                    ci,
                    in_flight: false,
                });
            }
            LookupState::Found(guest) => guest.clone(),
            other => {
                return Err(Error::invalid_transition(
                    other.phase(),
                    LookupPhase::CheckingIn,
                ));
            }
        };

        let guest_id = guest.id;
        self.lookup.transition_to(LookupState::CheckingIn(guest))?;
        self.check_message = None;

        let ticket = self.next_ticket();
        debug!(guest_id, "Dispatching check-in");
        Ok(CheckInRequest {
            ticket,
            guest_id,
            at: now,
        })
    }

    /// Apply a check-in outcome. Returns whether it was applied.
    ///
    /// On success the persisted record is displayed and the search state is
    /// scheduled to reset after the display window. On failure the guest is
    /// shown again, unchanged, so the operator can retry.
    pub fn apply_check_in(
        &mut self,
        ticket: LookupTicket,
        result: Result<Guest>,
        now: Instant,
    ) -> bool {
        let original = match self.lookup.state() {
            LookupState::CheckingIn(guest) if ticket == self.ticket() => guest.clone(),
            _ => {
                trace!(?ticket, "Dropping superseded check-in");
                return false;
            }
        };

        match result {
            Ok(persisted) => {
                info!(guest_id = persisted.id, "Guest checked in");
                // CheckingIn -> CheckedIn is always valid
                let _ = self.lookup.transition_to(LookupState::CheckedIn(persisted));
                self.check_message = Some(DisplayMessages::CHECK_IN_DONE);
                self.reset_at = Some((now + self.config.checked_in_display, ticket));
            }
            Err(e) => {
                warn!(guest_id = original.id, error = %e, "Check-in failed");
                let _ = self.lookup.transition_to(LookupState::Found(original));
                self.check_message = Some(DisplayMessages::CHECK_IN_FAILED);
            }
        }
        true
    }

    /// When the displayed check-in should be cleared.
    pub fn reset_deadline(&self) -> Option<Instant> {
        self.reset_at.map(|(at, _)| at)
    }

    /// Clear the search state if the check-in display window elapsed and the
    /// same check-in is still on screen. Returns whether it reset.
    pub fn fire_reset(&mut self, now: Instant) -> bool {
        let Some((at, ticket)) = self.reset_at else {
            return false;
        };
        if at > now {
            return false;
        }
        self.reset_at = None;

        if ticket != self.ticket() || self.lookup.phase() != LookupPhase::CheckedIn {
            return false;
        }

        self.reset_search();
        debug!("Ready for next guest");
        true
    }

    // ---- Snapshot ---------------------------------------------------------

    pub fn snapshot(&self) -> TerminalSnapshot {
        TerminalSnapshot {
            gate: self.gate.state(),
            event: self.event.as_ref().map(EventSummary::from),
            loading_event: self.loading_event,
            event_message: self.event_message.map(str::to_string),
            pin_digits: self.pin_digits,
            pin_message: self.pin_message.map(str::to_string),
            query: self.query.clone(),
            lookup: self.lookup.phase(),
            guest: self.lookup.state().guest().cloned(),
            suggestions: self.suggestions.clone(),
            suggestions_loading: self.suggestions_loading,
            suggestions_visible: self.suggestions_visible(),
            search_message: self.search_message.map(str::to_string),
            check_message: self.check_message.map(str::to_string),
        }
    }

    /// Whether the suggestion list belongs on screen: the gate is open, the
    /// query is long enough and it is not simply the displayed guest's CI.
    pub fn suggestions_visible(&self) -> bool {
        self.event.is_some()
            && self.gate.is_unlocked()
            && self.query.len() >= self.config.min_prefix_len
            && self
                .lookup
                .state()
                .guest()
                .is_none_or(|guest| guest.ci != self.query)
    }

    // ---- Internals --------------------------------------------------------

    fn require_unlocked(&self) -> Result<i64> {
        let event = self.event.as_ref().ok_or(Error::NoEventLoaded)?;
        if !self.gate.is_unlocked() {
            return Err(Error::GateLocked);
        }
        Ok(event.id)
    }

    fn ticket(&self) -> LookupTicket {
        LookupTicket {
            epoch: self.epoch,
            seq: self.lookup_seq,
        }
    }

    fn next_ticket(&mut self) -> LookupTicket {
        self.lookup_seq += 1;
        self.ticket()
    }

    fn clear_suggestions(&mut self) {
        self.guard.invalidate();
        self.suggestions.clear();
        self.suggestions_loading = false;
    }

    /// Back to an empty CI field with nothing displayed. The gate is not
    /// touched.
    fn reset_search(&mut self) {
        self.query.clear();
        self.debouncer.cancel();
        self.clear_suggestions();
        self.lookup.reset();
        self.next_ticket();
        self.search_message = None;
        self.check_message = None;
        self.reset_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guestgate_core::fingerprint;
    use std::time::Duration;

    const EVENT_ID: i64 = 7;

    fn event() -> Event {
        Event {
            id: EVENT_ID,
            name: "Fiesta".to_string(),
            event_date: None,
            event_code: "AB12CD".to_string(),
            door_pin_hash: fingerprint("4821").into_inner(),
            created_at: Utc::now(),
        }
    }

    fn guest(id: i64, ci: &str) -> Guest {
        Guest {
            id,
            event_id: EVENT_ID,
            first_name: "Ana".to_string(),
            last_name: "Pérez".to_string(),
            ci: ci.to_string(),
            checked_in_at: None,
            created_at: Utc::now(),
        }
    }

    fn loaded() -> DoorSession {
        let mut session = DoorSession::new(TerminalConfig::default());
        let request = session.begin_load("AB12CD").unwrap();
        assert!(session.apply_event(request.epoch, Ok(Some(event()))));
        session
    }

    fn unlocked() -> DoorSession {
        let mut session = loaded();
        session.submit_pin("4821").unwrap();
        session
    }

    fn found(session: &mut DoorSession, g: Guest) {
        let request = session.submit_exact_search(&g.ci).unwrap();
        assert!(session.apply_exact(request.ticket, Ok(Some(g))));
    }

    fn type_and_commit(session: &mut DoorSession, raw: &str, now: Instant) -> Option<PrefixRequest> {
        session.set_query_text(raw, now);
        session.fire_debounce(now + session.config().settle_window)
    }

    #[test]
    fn test_load_event_messages() {
        let mut session = DoorSession::new(TerminalConfig::default());

        let request = session.begin_load("zz99zz").unwrap();
        session.apply_event(request.epoch, Ok(None));
        assert_eq!(
            session.snapshot().event_message.as_deref(),
            Some(DisplayMessages::EVENT_NOT_FOUND)
        );

        let request = session.begin_load("zz99zz").unwrap();
        session.apply_event(request.epoch, Err(Error::remote("down")));
        let snapshot = session.snapshot();
        assert_eq!(
            snapshot.event_message.as_deref(),
            Some(DisplayMessages::EVENT_LOOKUP_FAILED)
        );
        assert!(!snapshot.loading_event);

        assert!(matches!(
            session.begin_load("no code!"),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_event_from_earlier_load_is_dropped() {
        let mut session = DoorSession::new(TerminalConfig::default());
        let first = session.begin_load("AAAAAA").unwrap();
        let second = session.begin_load("BBBBBB").unwrap();

        assert!(!session.apply_event(first.epoch, Ok(Some(event()))));
        assert!(session.event().is_none());
        assert!(session.snapshot().loading_event);

        assert!(session.apply_event(second.epoch, Ok(Some(event()))));
        assert!(session.event().is_some());
    }

    #[test]
    fn test_pin_flow() {
        let mut session = DoorSession::new(TerminalConfig::default());
        assert!(matches!(
            session.submit_pin("4821"),
            Err(Error::NoEventLoaded)
        ));

        let mut session = loaded();
        assert!(matches!(
            session.submit_pin("12"),
            Err(Error::Validation { .. })
        ));
        assert_eq!(
            session.snapshot().pin_message.as_deref(),
            Some(DisplayMessages::PIN_INVALID)
        );

        assert!(matches!(
            session.submit_pin("1111"),
            Err(Error::Authentication)
        ));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.pin_message.as_deref(), Some(DisplayMessages::PIN_WRONG));
        assert_eq!(snapshot.pin_digits, 4);
        assert_eq!(snapshot.gate, GateState::Locked);

        session.submit_pin("48 21").unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.gate, GateState::Unlocked);
        assert_eq!(snapshot.pin_digits, 0);
        assert_eq!(snapshot.pin_message, None);

        // Already open: no-op
        session.submit_pin("0").unwrap();
        assert_eq!(session.gate().history().len(), 1);
    }

    #[test]
    fn test_rejected_pin_is_not_kept() {
        let mut session = loaded();
        assert!(matches!(
            session.submit_pin("91-82-73-64"),
            Err(Error::Authentication)
        ));
        assert!(matches!(
            session.submit_pin("123"),
            Err(Error::Validation { .. })
        ));

        let dump = format!("{session:?}");
        assert!(!dump.contains("91827364"));
        assert!(!dump.contains("91-82-73-64"));
        assert_eq!(session.snapshot().pin_digits, 3);
    }

    #[test]
    fn test_loading_event_resets_everything() {
        let mut session = unlocked();
        let now = Instant::now();
        let request = type_and_commit(&mut session, "1234", now).unwrap();
        session.apply_prefix(request.tag, Ok(vec![guest(1, "12345678")]));
        found(&mut session, guest(1, "12345678"));

        let load = session.begin_load("CD34EF").unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.gate, GateState::Locked);
        assert_eq!(snapshot.query, "");
        assert_eq!(snapshot.lookup, LookupPhase::Idle);
        assert!(snapshot.suggestions.is_empty());
        assert!(snapshot.event.is_none());

        session.apply_event(load.epoch, Ok(Some(event())));
        assert_eq!(session.snapshot().gate, GateState::Locked);
    }

    #[test]
    fn test_debounce_suppressed_when_locked_or_short() {
        let now = Instant::now();

        let mut locked = loaded();
        assert!(type_and_commit(&mut locked, "1234", now).is_none());

        let mut session = unlocked();
        let request = type_and_commit(&mut session, "1234", now).unwrap();
        session.apply_prefix(request.tag, Ok(vec![guest(1, "12345678")]));
        assert_eq!(session.suggestions().len(), 1);

        // Shortened below the minimum: list cleared, in-flight lookup stale
        let in_flight = type_and_commit(&mut session, "12345", now).unwrap();
        assert!(type_and_commit(&mut session, "12", now).is_none());
        assert!(session.suggestions().is_empty());
        assert!(!session.apply_prefix(in_flight.tag, Ok(vec![guest(1, "12345678")])));
        assert!(session.suggestions().is_empty());
    }

    #[test]
    fn test_prefix_request_contents() {
        let mut session = unlocked();
        let request = type_and_commit(&mut session, "1.23-4", Instant::now()).unwrap();

        assert_eq!(request.prefix, "1234");
        assert_eq!(request.event_id, EVENT_ID);
        assert_eq!(request.limit, 12);
        assert!(session.snapshot().suggestions_loading);
    }

    #[test]
    fn test_stale_prefix_response_dropped() {
        let mut session = unlocked();
        let now = Instant::now();

        let t1 = type_and_commit(&mut session, "123", now).unwrap();
        let t2 = type_and_commit(&mut session, "1234", now).unwrap();

        assert!(session.apply_prefix(t2.tag, Ok(vec![guest(2, "12345678")])));
        assert!(!session.apply_prefix(
            t1.tag,
            Ok(vec![guest(1, "1230000"), guest(2, "12345678")])
        ));

        let ids: Vec<_> = session.suggestions().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![2]);
        assert!(!session.snapshot().suggestions_loading);
    }

    #[test]
    fn test_failed_prefix_keeps_previous_list() {
        let mut session = unlocked();
        let now = Instant::now();

        let first = type_and_commit(&mut session, "123", now).unwrap();
        session.apply_prefix(first.tag, Ok(vec![guest(1, "1230000")]));
        let second = type_and_commit(&mut session, "1230", now).unwrap();
        session.apply_prefix(second.tag, Err(Error::remote("timeout")));

        assert_eq!(session.suggestions().len(), 1);
        assert!(!session.snapshot().suggestions_loading);
    }

    #[test]
    fn test_exact_search_requires_unlocked_gate() {
        let mut session = loaded();
        assert!(matches!(
            session.submit_exact_search("12345678"),
            Err(Error::GateLocked)
        ));
    }

    #[test]
    fn test_exact_search_validation_leaves_state() {
        let mut session = unlocked();
        found(&mut session, guest(1, "12345678"));

        let result = session.submit_exact_search("123");

        assert!(matches!(result, Err(Error::Validation { .. })));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.lookup, LookupPhase::Found);
        assert_eq!(snapshot.search_message.as_deref(), Some(DisplayMessages::CI_INVALID));
    }

    #[test]
    fn test_exact_search_outcomes() {
        let mut session = unlocked();

        let request = session.submit_exact_search("1.234.567").unwrap();
        assert_eq!(request.ci.as_str(), "1234567");
        assert_eq!(session.lookup().phase(), LookupPhase::Searching);
        session.apply_exact(request.ticket, Ok(None));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.lookup, LookupPhase::NotFound);
        assert_eq!(
            snapshot.search_message.as_deref(),
            Some(DisplayMessages::GUEST_NOT_ON_LIST)
        );

        let request = session.submit_exact_search("1234567").unwrap();
        assert_eq!(session.snapshot().search_message, None);
        session.apply_exact(request.ticket, Err(Error::remote("down")));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.lookup, LookupPhase::Idle);
        assert_eq!(
            snapshot.search_message.as_deref(),
            Some(DisplayMessages::SEARCH_FAILED)
        );
    }

    #[test]
    fn test_exact_search_supersedes_prefix_lookup() {
        let mut session = unlocked();
        let prefix = type_and_commit(&mut session, "1234", Instant::now()).unwrap();

        let exact = session.submit_exact_search("12345678").unwrap();
        assert!(!session.apply_prefix(prefix.tag, Ok(vec![guest(9, "12349999")])));

        session.apply_exact(exact.ticket, Ok(Some(guest(1, "12345678"))));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.lookup, LookupPhase::Found);
        assert!(snapshot.suggestions.is_empty());
        assert!(!snapshot.suggestions_visible);
    }

    #[test]
    fn test_resubmitted_search_drops_first_result() {
        let mut session = unlocked();
        let first = session.submit_exact_search("1111111").unwrap();
        let second = session.submit_exact_search("2222222").unwrap();

        assert!(!session.apply_exact(first.ticket, Ok(Some(guest(1, "1111111")))));
        assert_eq!(session.lookup().phase(), LookupPhase::Searching);
        assert!(session.apply_exact(second.ticket, Ok(None)));
    }

    #[test]
    fn test_pick_suggestion() {
        let mut session = unlocked();
        let now = Instant::now();
        let request = type_and_commit(&mut session, "123", now).unwrap();
        session.apply_prefix(
            request.tag,
            Ok(vec![guest(1, "1230000"), guest(2, "12345678")]),
        );

        assert!(matches!(
            session.pick_suggestion(99),
            Err(Error::SuggestionNotVisible { guest_id: 99 })
        ));

        // A keystroke still pending must not fire after the pick
        session.set_query_text("1234", now);
        session.pick_suggestion(2).unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.lookup, LookupPhase::Found);
        assert_eq!(snapshot.guest.map(|g| g.id), Some(2));
        assert_eq!(snapshot.query, "12345678");
        assert!(snapshot.suggestions.is_empty());
        assert_eq!(session.debounce_deadline(), None);
        assert!(session.fire_debounce(now + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_pick_suggestion_wins_over_search_in_flight() {
        let mut session = unlocked();
        let request = type_and_commit(&mut session, "123", Instant::now()).unwrap();
        session.apply_prefix(request.tag, Ok(vec![guest(1, "1230000")]));

        let exact = session.submit_exact_search("7654321").unwrap();
        session.pick_suggestion(1).unwrap();

        assert!(!session.apply_exact(exact.ticket, Ok(None)));
        assert_eq!(session.lookup().phase(), LookupPhase::Found);
    }

    #[test]
    fn test_pick_suggestion_after_query_shrinks() {
        let mut session = unlocked();
        let now = Instant::now();
        let request = type_and_commit(&mut session, "123", now).unwrap();
        session.apply_prefix(request.tag, Ok(vec![guest(1, "1230000")]));

        // The list is still held until the next settle, but no longer shown
        session.set_query_text("12", now);
        assert_eq!(session.suggestions().len(), 1);
        assert!(!session.suggestions_visible());

        assert!(matches!(
            session.pick_suggestion(1),
            Err(Error::SuggestionNotVisible { guest_id: 1 })
        ));
        assert_eq!(session.lookup().phase(), LookupPhase::Idle);
        assert_eq!(session.query(), "12");
    }

    #[test]
    fn test_editing_query_clears_result() {
        let mut session = unlocked();
        found(&mut session, guest(1, "12345678"));

        session.set_query_text("1234567", Instant::now());

        let snapshot = session.snapshot();
        assert_eq!(snapshot.lookup, LookupPhase::Idle);
        assert_eq!(snapshot.guest, None);
    }

    #[test]
    fn test_editing_query_does_not_interrupt_search() {
        let mut session = unlocked();
        let request = session.submit_exact_search("12345678").unwrap();

        session.set_query_text("1234", Instant::now());

        assert_eq!(session.lookup().phase(), LookupPhase::Searching);
        assert!(session.apply_exact(request.ticket, Ok(Some(guest(1, "12345678")))));
    }

    #[test]
    fn test_check_in_success_and_idempotency() {
        let mut session = unlocked();
        found(&mut session, guest(1, "12345678"));

        let request = session.check_in(Utc::now()).unwrap();
        assert_eq!(request.guest_id, 1);

        // Second press while in flight
        assert!(matches!(
            session.check_in(Utc::now()),
            Err(Error::AlreadyCheckedIn { in_flight: true, .. })
        ));

        let mut persisted = guest(1, "12345678");
        let server_time = Utc::now() - chrono::Duration::seconds(3);
        persisted.checked_in_at = Some(server_time);
        let now = Instant::now();
        assert!(session.apply_check_in(request.ticket, Ok(persisted), now));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.lookup, LookupPhase::CheckedIn);
        assert_eq!(snapshot.guest.unwrap().checked_in_at, Some(server_time));
        assert_eq!(
            snapshot.check_message.as_deref(),
            Some(DisplayMessages::CHECK_IN_DONE)
        );

        // Second press after completion
        assert!(matches!(
            session.check_in(Utc::now()),
            Err(Error::AlreadyCheckedIn { in_flight: false, .. })
        ));
        assert_eq!(session.reset_deadline(), Some(now + Duration::from_secs(2)));
    }

    #[test]
    fn test_check_in_refused_for_guest_already_in() {
        let mut session = unlocked();
        let mut g = guest(1, "12345678");
        g.checked_in_at = Some(Utc::now());
        found(&mut session, g);

        let result = session.check_in(Utc::now());

        assert!(matches!(
            result,
            Err(Error::AlreadyCheckedIn { ref ci, in_flight: false }) if ci == "12345678"
        ));
        assert_eq!(session.lookup().phase(), LookupPhase::Found);
        assert_eq!(
            session.snapshot().check_message.as_deref(),
            Some(DisplayMessages::ALREADY_CHECKED_IN)
        );
    }

    #[test]
    fn test_check_in_without_guest() {
        let mut session = unlocked();
        assert!(matches!(
            session.check_in(Utc::now()),
            Err(Error::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_check_in_failure_returns_to_found() {
        let mut session = unlocked();
        found(&mut session, guest(1, "12345678"));
        let request = session.check_in(Utc::now()).unwrap();

        session.apply_check_in(
            request.ticket,
            Err(Error::remote("down")),
            Instant::now(),
        );

        let snapshot = session.snapshot();
        assert_eq!(snapshot.lookup, LookupPhase::Found);
        assert_eq!(snapshot.guest.unwrap().checked_in_at, None);
        assert_eq!(
            snapshot.check_message.as_deref(),
            Some(DisplayMessages::CHECK_IN_FAILED)
        );
        assert_eq!(session.reset_deadline(), None);

        // Retry is allowed
        assert!(session.check_in(Utc::now()).is_ok());
    }

    #[test]
    fn test_search_refused_while_checking_in() {
        let mut session = unlocked();
        found(&mut session, guest(1, "12345678"));
        session.check_in(Utc::now()).unwrap();

        assert!(matches!(
            session.submit_exact_search("7654321"),
            Err(Error::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_reset_after_display_window() {
        let mut session = unlocked();
        found(&mut session, guest(1, "12345678"));
        let request = session.check_in(Utc::now()).unwrap();
        let mut persisted = guest(1, "12345678");
        persisted.checked_in_at = Some(Utc::now());
        let now = Instant::now();
        session.apply_check_in(request.ticket, Ok(persisted), now);

        assert!(!session.fire_reset(now + Duration::from_millis(1999)));
        assert!(session.fire_reset(now + Duration::from_secs(2)));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.lookup, LookupPhase::Idle);
        assert_eq!(snapshot.query, "");
        assert_eq!(snapshot.check_message, None);
        assert_eq!(snapshot.gate, GateState::Unlocked);
    }

    #[test]
    fn test_reset_skipped_when_screen_moved_on() {
        let mut session = unlocked();
        found(&mut session, guest(1, "12345678"));
        let request = session.check_in(Utc::now()).unwrap();
        let mut persisted = guest(1, "12345678");
        persisted.checked_in_at = Some(Utc::now());
        let now = Instant::now();
        session.apply_check_in(request.ticket, Ok(persisted), now);

        // Next guest searched before the window elapsed
        let next = session.submit_exact_search("7654321").unwrap();
        session.apply_exact(next.ticket, Ok(Some(guest(2, "7654321"))));

        assert!(!session.fire_reset(now + Duration::from_secs(5)));
        assert_eq!(session.lookup().phase(), LookupPhase::Found);
        assert_eq!(session.query(), "7654321");
    }

    #[test]
    fn test_check_in_from_earlier_event_dropped() {
        let mut session = unlocked();
        found(&mut session, guest(1, "12345678"));
        let request = session.check_in(Utc::now()).unwrap();

        let load = session.begin_load("AB12CD").unwrap();
        session.apply_event(load.epoch, Ok(Some(event())));

        let mut persisted = guest(1, "12345678");
        persisted.checked_in_at = Some(Utc::now());
        assert!(!session.apply_check_in(request.ticket, Ok(persisted), Instant::now()));
        assert_eq!(session.lookup().phase(), LookupPhase::Idle);
        assert_eq!(session.gate().state(), GateState::Locked);
    }

    #[test]
    fn test_snapshot_serializes() {
        let session = unlocked();
        let json = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(json["gate"], "unlocked");
        assert_eq!(json["lookup"], "idle");
        assert_eq!(json["event"]["event_code"], "AB12CD");
        assert!(json.get("door_pin_hash").is_none());
    }
}
