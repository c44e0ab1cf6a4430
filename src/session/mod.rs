//! Interactive session: the dashboard as a live terminal page.
//!
//! One thread owns the [`Dashboard`] and runs the event loop. Input lines
//! arrive from a reader thread; each backend request runs on its own worker
//! thread and reports back over the same channel. Only the loop thread
//! touches view state, so evaluate and history requests overlap freely while
//! each kind stays limited to one request at a time.
//!
//! Commands:
//!
//! - any text: set it as input and evaluate it
//! - `:eval`: evaluate the current input again
//! - `:history`: fetch the evaluation history
//! - `:theme`: toggle between light and dark
//! - `:clear`: dismiss the error banner
//! - `:help`, `:quit`

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use anyhow::Result;
use colored::Colorize;

use crate::activity::{self, ActivityLog};
use crate::api::{ApiError, EvaluationResult, HistoryItem};
use crate::render;
use crate::state::Dashboard;
use crate::theme::KeyValueStore;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text: set as input and evaluate.
    Submit(String),
    Reevaluate,
    History,
    Theme,
    Clear,
    Help,
    Quit,
    /// Blank line.
    Nothing,
    Unknown(String),
}

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Nothing;
    }

    let Some(name) = trimmed.strip_prefix(':') else {
        return Command::Submit(trimmed.to_string());
    };

    match name.trim().to_ascii_lowercase().as_str() {
        "eval" | "e" => Command::Reevaluate,
        "history" | "h" => Command::History,
        "theme" | "t" => Command::Theme,
        "clear" | "c" => Command::Clear,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

/// Everything the loop thread reacts to.
#[derive(Debug)]
pub enum Event {
    Line(String),
    InputClosed,
    Evaluated(Result<EvaluationResult, ApiError>),
    HistoryLoaded(Result<Vec<HistoryItem>, ApiError>),
}

/// What the loop should do after handling an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// State changed; redraw the page.
    Redraw,
    /// State unchanged; show a one-line notice.
    Notice(String),
    Quit,
}

/// Event-loop state: the dashboard plus the channel workers report on.
pub struct Session<S> {
    dashboard: Dashboard<S>,
    log: ActivityLog,
    events: Sender<Event>,
    input_closed: bool,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(dashboard: Dashboard<S>, log: ActivityLog, events: Sender<Event>) -> Self {
        Self {
            dashboard,
            log,
            events,
            input_closed: false,
        }
    }

    pub fn dashboard(&self) -> &Dashboard<S> {
        &self.dashboard
    }

    /// Whether any request is still outstanding.
    pub fn is_busy(&self) -> bool {
        let state = self.dashboard.state();
        state.evaluate.is_in_flight() || state.history_fetch.is_in_flight()
    }

    pub fn handle(&mut self, event: Event) -> Flow {
        let flow = match event {
            Event::Line(line) => self.handle_command(parse_command(&line)),
            Event::InputClosed => {
                self.input_closed = true;
                Flow::Redraw
            }
            Event::Evaluated(outcome) => {
                self.dashboard.finish_evaluate(outcome);
                Flow::Redraw
            }
            Event::HistoryLoaded(outcome) => {
                self.dashboard.finish_fetch_history(outcome);
                Flow::Redraw
            }
        };

        // End of input: leave once the last outstanding request has landed.
        if self.input_closed && !self.is_busy() {
            Flow::Quit
        } else {
            flow
        }
    }

    fn handle_command(&mut self, command: Command) -> Flow {
        match command {
            Command::Submit(text) => {
                self.dashboard.set_input(text);
                self.start_evaluate()
            }
            Command::Reevaluate => self.start_evaluate(),
            Command::History => self.start_history(),
            Command::Theme => match self.dashboard.toggle_theme() {
                Ok(_) => Flow::Redraw,
                Err(e) => Flow::Notice(format!("theme applied but not saved: {e:#}")),
            },
            Command::Clear => {
                self.dashboard.clear_error();
                Flow::Redraw
            }
            Command::Help => Flow::Notice(HELP.to_string()),
            Command::Quit => Flow::Quit,
            Command::Nothing => Flow::Notice(String::new()),
            Command::Unknown(name) => Flow::Notice(format!("unknown command ':{name}' (try :help)")),
        }
    }

    fn start_evaluate(&mut self) -> Flow {
        let was_configured = self.dashboard.is_configured();
        let Some(pending) = self.dashboard.begin_evaluate() else {
            return if !was_configured {
                Flow::Redraw
            } else if self.dashboard.state().evaluate.is_in_flight() {
                Flow::Notice("an evaluation is already in progress".to_string())
            } else {
                Flow::Notice("nothing to evaluate: input is empty".to_string())
            };
        };

        let events = self.events.clone();
        let log = self.log.clone();
        thread::spawn(move || {
            let outcome = activity::send_evaluate(pending, &log);
            let _ = events.send(Event::Evaluated(outcome));
        });
        Flow::Redraw
    }

    fn start_history(&mut self) -> Flow {
        let was_configured = self.dashboard.is_configured();
        let Some(pending) = self.dashboard.begin_fetch_history() else {
            return if was_configured {
                Flow::Notice("history is already loading".to_string())
            } else {
                Flow::Redraw
            };
        };

        let events = self.events.clone();
        let log = self.log.clone();
        thread::spawn(move || {
            let outcome = activity::send_history(pending, &log);
            let _ = events.send(Event::HistoryLoaded(outcome));
        });
        Flow::Redraw
    }
}

const HELP: &str = "commands: <text> evaluate text | :eval again | :history | :theme | :clear | :quit";

// ---------------------------------------------------------------------------
// Terminal loop
// ---------------------------------------------------------------------------

/// Run the interactive session on stdin/stdout until `:quit` or end of input.
pub fn run<S: KeyValueStore>(dashboard: Dashboard<S>, log: ActivityLog) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    spawn_input_reader(tx.clone());

    let mut session = Session::new(dashboard, log, tx);
    println!("{}", HELP.dimmed());
    draw(&session)?;

    event_loop(&mut session, &rx)
}

fn event_loop<S: KeyValueStore>(session: &mut Session<S>, rx: &Receiver<Event>) -> Result<()> {
    // The session holds a sender, so `recv` only fails if every worker and
    // the reader have gone away, which cannot happen while we loop.
    while let Ok(event) = rx.recv() {
        match session.handle(event) {
            Flow::Redraw => draw(session)?,
            Flow::Notice(text) if text.is_empty() => {}
            Flow::Notice(text) => println!("{}", text.dimmed()),
            Flow::Quit => break,
        }
    }
    Ok(())
}

fn draw<S: KeyValueStore>(session: &Session<S>) -> Result<()> {
    let dashboard = session.dashboard();
    let page = render::render_page(
        dashboard.state(),
        dashboard.theme(),
        dashboard.is_configured(),
    );

    let mut stdout = io::stdout().lock();
    writeln!(stdout)?;
    write!(stdout, "{page}")?;
    write!(stdout, "{} ", ">".bold())?;
    stdout.flush()?;
    Ok(())
}

fn spawn_input_reader(events: Sender<Event>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines().map_while(Result::ok) {
            if events.send(Event::Line(line)).is_err() {
                return;
            }
        }
        let _ = events.send(Event::InputClosed);
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
