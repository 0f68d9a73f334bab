//! Door terminal actor.
//!
//! [`DoorTerminal`] owns a [`DoorSession`] and drives it from a single task.
//! Store calls run as spawned tasks in a `JoinSet` so keystrokes keep being
//! handled while a lookup is in flight; their results come back into the
//! same loop and are applied through the session's `apply_*` methods.
//!
//! ```text
//! ┌────────────────┐  Command   ┌──────────────────────────┐
//! │ TerminalHandle │──(mpsc)───►│                          │
//! └────────────────┘            │   DoorTerminal loop      │
//!         ▲                     │   (owns DoorSession)     │
//!         │  TerminalSnapshot   │                          │
//!         └──────(watch)────────│  debounce / reset timers │
//!                               └───────┬──────────▲───────┘
//!                                spawn  │          │ Completion
//!                                       ▼          │
//!                               ┌──────────────────┴───────┐
//!                               │ JoinSet of store calls   │
//!                               └──────────────────────────┘
//! ```
//!
//! Store calls are never cancelled while the terminal runs. A result that
//! arrives after the session moved on is dropped by the session.
//!
//! # Examples
//!
//! ```no_run
//! use guestgate_storage::{Database, DatabaseConfig};
//! use guestgate_terminal::{DoorTerminal, GateState, TerminalConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let db = Database::open(DatabaseConfig::new("guestgate.db")).await?;
//! let store = Arc::new(db.guest_list());
//!
//! let terminal = DoorTerminal::start(store, TerminalConfig::default())?;
//! terminal.load_event("AB12CD").await?;
//! terminal.wait_for(|s| !s.loading_event).await?;
//! terminal.submit_pin("4821").await?;
//! assert_eq!(terminal.snapshot().gate, GateState::Unlocked);
//!
//! terminal.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::TerminalConfig;
use crate::guard::SequenceTag;
use crate::session::{
    CheckInRequest, DoorSession, EventRequest, ExactRequest, LookupTicket, PrefixRequest,
    TerminalSnapshot,
};
use chrono::Utc;
use guestgate_core::{Error, Result};
use guestgate_storage::{Event, Guest, GuestListStore};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Capacity of the command channel.
const COMMAND_BUFFER: usize = 64;

type Reply = oneshot::Sender<Result<()>>;

/// Operator action sent to the terminal loop.
enum Command {
    LoadEvent { code: String, reply: Reply },
    SubmitPin { pin: Zeroizing<String>, reply: Reply },
    SetQueryText { text: String, reply: Reply },
    SubmitExactSearch { ci: String, reply: Reply },
    PickSuggestion { guest_id: i64, reply: Reply },
    CheckIn { reply: Reply },
    Shutdown,
}

/// Outcome of a spawned store call.
#[derive(Debug)]
enum Completion {
    Event {
        epoch: u64,
        result: Result<Option<Event>>,
    },
    Prefix {
        tag: SequenceTag,
        result: Result<Vec<Guest>>,
    },
    Exact {
        ticket: LookupTicket,
        result: Result<Option<Guest>>,
    },
    CheckIn {
        ticket: LookupTicket,
        result: Result<Guest>,
    },
}

/// The door terminal loop. Create one with [`DoorTerminal::start`].
pub struct DoorTerminal<S: GuestListStore> {
    store: Arc<S>,
    session: DoorSession,
    commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<TerminalSnapshot>,
    tasks: JoinSet<Completion>,
}

impl<S: GuestListStore> DoorTerminal<S> {
    /// Validate `config` and spawn a terminal loop over `store`.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is unusable.
    pub fn start(store: Arc<S>, config: TerminalConfig) -> Result<TerminalHandle> {
        config.validate()?;

        let session = DoorSession::new(config);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());

        let terminal = Self {
            store,
            session,
            commands: command_rx,
            snapshots: snapshot_tx,
            tasks: JoinSet::new(),
        };
        let task = tokio::spawn(terminal.run());

        debug!("Door terminal started");
        Ok(TerminalHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            task,
        })
    }

    async fn run(mut self) {
        loop {
            let debounce_at = self.session.debounce_deadline();
            let reset_at = self.session.reset_deadline();

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    self.handle_completion(joined);
                }
                _ = wait_until(debounce_at) => {
                    if let Some(request) = self.session.fire_debounce(Instant::now()) {
                        self.spawn_prefix(request);
                    }
                    self.publish();
                }
                _ = wait_until(reset_at) => {
                    self.session.fire_reset(Instant::now());
                    self.publish();
                }
            }
        }

        let in_flight = self.tasks.len();
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
        info!(in_flight, "Door terminal stopped");
    }

    fn handle_command(&mut self, command: Command) {
        let (result, reply) = match command {
            Command::LoadEvent { code, reply } => {
                let result = self
                    .session
                    .begin_load(&code)
                    .map(|request| self.spawn_event(request));
                (result, reply)
            }
            Command::SubmitPin { pin, reply } => (self.session.submit_pin(&pin), reply),
            Command::SetQueryText { text, reply } => {
                self.session.set_query_text(&text, Instant::now());
                (Ok(()), reply)
            }
            Command::SubmitExactSearch { ci, reply } => {
                let result = self
                    .session
                    .submit_exact_search(&ci)
                    .map(|request| self.spawn_exact(request));
                (result, reply)
            }
            Command::PickSuggestion { guest_id, reply } => {
                (self.session.pick_suggestion(guest_id), reply)
            }
            Command::CheckIn { reply } => {
                let result = self
                    .session
                    .check_in(Utc::now())
                    .map(|request| self.spawn_check_in(request));
                (result, reply)
            }
            Command::Shutdown => return,
        };

        // Publish first so the caller sees its own action in the snapshot
        self.publish();
        let _ = reply.send(result);
    }

    fn handle_completion(&mut self, joined: std::result::Result<Completion, JoinError>) {
        let completion = match joined {
            Ok(completion) => completion,
            Err(e) => {
                warn!(error = %e, "Store task did not complete");
                return;
            }
        };

        let applied = match completion {
            Completion::Event { epoch, result } => self.session.apply_event(epoch, result),
            Completion::Prefix { tag, result } => self.session.apply_prefix(tag, result),
            Completion::Exact { ticket, result } => self.session.apply_exact(ticket, result),
            Completion::CheckIn { ticket, result } => {
                self.session
                    .apply_check_in(ticket, result, Instant::now())
            }
        };

        if applied {
            self.publish();
        }
    }

    fn spawn_event(&mut self, request: EventRequest) {
        let store = Arc::clone(&self.store);
        self.tasks.spawn(async move {
            let result = store
                .find_event_by_code(request.code.as_str())
                .await
                .map_err(Error::from);
            Completion::Event {
                epoch: request.epoch,
                result,
            }
        });
    }

    fn spawn_prefix(&mut self, request: PrefixRequest) {
        let store = Arc::clone(&self.store);
        self.tasks.spawn(async move {
            let result = store
                .find_guests_by_prefix(request.event_id, &request.prefix, request.limit)
                .await
                .map_err(Error::from);
            Completion::Prefix {
                tag: request.tag,
                result,
            }
        });
    }

    fn spawn_exact(&mut self, request: ExactRequest) {
        let store = Arc::clone(&self.store);
        self.tasks.spawn(async move {
            let result = store
                .find_guest_by_exact_ci(request.event_id, request.ci.as_str())
                .await
                .map_err(Error::from);
            Completion::Exact {
                ticket: request.ticket,
                result,
            }
        });
    }

    fn spawn_check_in(&mut self, request: CheckInRequest) {
        let store = Arc::clone(&self.store);
        self.tasks.spawn(async move {
            let result = store
                .mark_checked_in(request.guest_id, request.at)
                .await
                .map_err(Error::from);
            Completion::CheckIn {
                ticket: request.ticket,
                result,
            }
        });
    }

    fn publish(&self) {
        let snapshot = self.session.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

/// Sleep until `deadline`, or forever when there is none.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Handle to a running [`DoorTerminal`].
///
/// Every action resolves once the terminal has taken its local decision: an
/// `Ok` means the action was accepted and any store call it needs has been
/// dispatched, not that the call has completed. Watch the snapshot for the
/// outcome.
#[derive(Debug)]
pub struct TerminalHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<TerminalSnapshot>,
    task: JoinHandle<()>,
}

impl TerminalHandle {
    /// Load the event behind a door code. Locks the gate and clears the
    /// search state.
    pub async fn load_event(&self, code: impl Into<String>) -> Result<()> {
        let code = code.into();
        self.request(|reply| Command::LoadEvent { code, reply }).await
    }

    /// Try to unlock the gate for the loaded event.
    pub async fn submit_pin(&self, pin: impl Into<String>) -> Result<()> {
        let pin = Zeroizing::new(pin.into());
        self.request(|reply| Command::SubmitPin { pin, reply }).await
    }

    /// Replace the CI field contents. Suggestions follow after the settle
    /// window.
    pub async fn set_query_text(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.request(|reply| Command::SetQueryText { text, reply })
            .await
    }

    /// Look up a complete CI.
    pub async fn submit_exact_search(&self, ci: impl Into<String>) -> Result<()> {
        let ci = ci.into();
        self.request(|reply| Command::SubmitExactSearch { ci, reply })
            .await
    }

    /// Display one of the visible suggestions.
    pub async fn pick_suggestion(&self, guest_id: i64) -> Result<()> {
        self.request(|reply| Command::PickSuggestion { guest_id, reply })
            .await
    }

    /// Check in the displayed guest.
    pub async fn check_in(&self) -> Result<()> {
        self.request(|reply| Command::CheckIn { reply }).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> TerminalSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<TerminalSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until the snapshot satisfies `predicate` and return it.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalClosed`] if the terminal stops first.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&TerminalSnapshot) -> bool,
    ) -> Result<TerminalSnapshot> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| Error::TerminalClosed)?;
        Ok(snapshot.clone())
    }

    /// Stop the terminal loop and wait for it to finish. Store calls still
    /// in flight are aborted.
    pub async fn shutdown(self) -> Result<()> {
        // The loop may already be gone; joining below covers both cases
        let _ = self.commands.send(Command::Shutdown).await;

        match self.task.await {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => {
                warn!(error = %e, "Door terminal task panicked");
                Err(Error::TerminalClosed)
            }
        }
    }

    async fn request(&self, command: impl FnOnce(Reply) -> Command) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply_tx))
            .await
            .map_err(|_| Error::TerminalClosed)?;
        reply_rx.await.map_err(|_| Error::TerminalClosed)?
    }
}
