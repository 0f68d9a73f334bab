//! Interactive door mode.
//!
//! Reads one action per line from stdin and prints the door screen whenever
//! the terminal snapshot changes.

use anyhow::{Context, bail};
use chrono::Local;
use clap::Args;
use guestgate_core::constants::{
    DEFAULT_CHECKED_IN_DISPLAY_MS, DEFAULT_SETTLE_WINDOW_MS, DEFAULT_SUGGESTION_LIMIT,
};
use guestgate_storage::Database;
use guestgate_terminal::{
    DoorTerminal, LookupPhase, TerminalConfig, TerminalHandle, TerminalSnapshot,
};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

const HELP: &str = "\
Commands:
  pin <digits>     unlock the gate
  type <digits>    type in the CI field (suggestions follow)
  search <ci>      look up a full CI
  pick <n>         show suggestion number n
  in               check in the displayed guest
  event <code>     switch to another event
  show             print the screen again
  help             show this help
  quit             leave door mode";

#[derive(Debug, Args)]
pub struct DoorArgs {
    /// Event door code
    pub code: String,

    /// Quiet time before a typed prefix is looked up (milliseconds)
    #[arg(long, env = "GUESTGATE_SETTLE_MS", default_value_t = DEFAULT_SETTLE_WINDOW_MS)]
    pub settle_ms: u64,

    /// How long a check-in stays on screen (milliseconds)
    #[arg(long, env = "GUESTGATE_DISPLAY_MS", default_value_t = DEFAULT_CHECKED_IN_DISPLAY_MS)]
    pub display_ms: u64,

    /// Maximum number of suggestions shown
    #[arg(long, default_value_t = DEFAULT_SUGGESTION_LIMIT)]
    pub suggestions: usize,
}

impl DoorArgs {
    pub fn terminal_config(&self) -> TerminalConfig {
        TerminalConfig::default()
            .with_settle_window(Duration::from_millis(self.settle_ms))
            .with_checked_in_display(Duration::from_millis(self.display_ms))
            .with_suggestion_limit(self.suggestions)
    }
}

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoorInput {
    Pin(String),
    Type(String),
    Search(String),
    Pick(usize),
    CheckIn,
    Event(String),
    Show,
    Help,
    Quit,
}

impl DoorInput {
    /// Parse a line. Blank lines yield `None`.
    pub fn parse(line: &str) -> anyhow::Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));

        let input = match (word.to_ascii_lowercase().as_str(), rest) {
            ("pin", pin) if !pin.is_empty() => Self::Pin(pin.to_string()),
            // An empty argument clears the field
            ("type", text) => Self::Type(text.to_string()),
            ("search", ci) if !ci.is_empty() => Self::Search(ci.to_string()),
            ("pick", n) => match n.parse::<usize>() {
                Ok(n) if n >= 1 => Self::Pick(n),
                _ => bail!("pick needs a suggestion number"),
            },
            ("in", "") => Self::CheckIn,
            ("event", code) if !code.is_empty() => Self::Event(code.to_string()),
            ("show", "") => Self::Show,
            ("help", "") => Self::Help,
            ("quit" | "exit", "") => Self::Quit,
            _ => bail!("unknown command: {line} (try `help`)"),
        };
        Ok(Some(input))
    }
}

pub async fn run(args: DoorArgs, db: &Database) -> anyhow::Result<()> {
    let store = Arc::new(db.guest_list());
    let terminal = DoorTerminal::start(store, args.terminal_config())
        .context("starting door terminal")?;

    let renderer = tokio::spawn(render_updates(terminal.subscribe()));

    println!("{HELP}");
    report(terminal.load_event(&args.code).await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let input = match DoorInput::parse(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(e) => {
                println!("  ! {e}");
                continue;
            }
        };

        match input {
            DoorInput::Quit => break,
            DoorInput::Help => println!("{HELP}"),
            DoorInput::Show => println!("{}", render(&terminal.snapshot())),
            other => report(apply(&terminal, other).await),
        }
    }

    renderer.abort();
    terminal.shutdown().await.context("stopping door terminal")?;
    Ok(())
}

async fn apply(terminal: &TerminalHandle, input: DoorInput) -> guestgate_core::Result<()> {
    match input {
        DoorInput::Pin(pin) => terminal.submit_pin(pin).await,
        DoorInput::Type(text) => terminal.set_query_text(text).await,
        DoorInput::Search(ci) => terminal.submit_exact_search(ci).await,
        DoorInput::Pick(n) => {
            let snapshot = terminal.snapshot();
            match snapshot.suggestions.get(n - 1) {
                Some(guest) if snapshot.suggestions_visible => {
                    terminal.pick_suggestion(guest.id).await
                }
                _ => Err(guestgate_core::Error::not_found(format!("suggestion {n}"))),
            }
        }
        DoorInput::CheckIn => terminal.check_in().await,
        DoorInput::Event(code) => terminal.load_event(code).await,
        DoorInput::Show | DoorInput::Help | DoorInput::Quit => Ok(()),
    }
}

/// Print a refused action. Refusals that already show a screen message are
/// left to the renderer.
fn report(result: guestgate_core::Result<()>) {
    use guestgate_core::Error;

    match result {
        Ok(()) => {}
        Err(
            Error::Validation { .. } | Error::Authentication | Error::AlreadyCheckedIn { .. },
        ) => {}
        Err(e) => println!("  ! {e}"),
    }
}

async fn render_updates(mut snapshots: watch::Receiver<TerminalSnapshot>) {
    let mut last = String::new();
    while snapshots.changed().await.is_ok() {
        let screen = render(&snapshots.borrow_and_update());
        if screen != last {
            println!("{screen}");
            last = screen;
        }
    }
}

/// Text rendering of the door screen.
pub fn render(snapshot: &TerminalSnapshot) -> String {
    let mut out = String::new();

    match &snapshot.event {
        Some(event) => {
            let date = event
                .event_date
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| "Sin fecha".to_string());
            let _ = write!(
                out,
                "[{} {} {}] {}",
                event.event_code, event.name, date, snapshot.gate
            );
        }
        None if snapshot.loading_event => out.push_str("[cargando evento...]"),
        None => out.push_str("[sin evento]"),
    }

    for message in [&snapshot.event_message, &snapshot.pin_message]
        .into_iter()
        .flatten()
    {
        let _ = write!(out, "\n  ! {message}");
    }

    if snapshot.event.is_none() || snapshot.gate != guestgate_terminal::GateState::Unlocked {
        return out;
    }

    let _ = write!(out, "\nci> {}", snapshot.query);
    if snapshot.suggestions_loading || snapshot.lookup == LookupPhase::Searching {
        out.push_str("  (buscando...)");
    }

    if snapshot.suggestions_visible {
        for (i, guest) in snapshot.suggestions.iter().enumerate() {
            let _ = write!(out, "\n  {}) {:<9} {}", i + 1, guest.ci, guest.full_name());
        }
    }

    if let Some(guest) = &snapshot.guest {
        let _ = write!(out, "\n  => {} ({})", guest.full_name(), guest.ci);
        if let Some(at) = guest.checked_in_at {
            let _ = write!(out, " ingresó {}", at.with_timezone(&Local).format("%H:%M"));
        }
        if snapshot.lookup == LookupPhase::CheckingIn {
            out.push_str("  (marcando...)");
        }
    }

    for message in [&snapshot.search_message, &snapshot.check_message]
        .into_iter()
        .flatten()
    {
        let _ = write!(out, "\n  * {message}");
    }

    out
}
