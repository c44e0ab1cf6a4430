//! View state and the two backend actions.
//!
//! [`Dashboard`] owns everything the page shows: the input text, the latest
//! result, the history, one [`RequestStatus`] per action, the error banner and
//! the theme setting. Actions are split in two halves so the request itself
//! can run anywhere (the interactive session runs it on a worker thread):
//!
//! - `begin_*` applies the guards, moves the lifecycle to `InFlight` and hands
//!   back a pending request, or `None` when the action is disabled;
//! - `finish_*` applies the outcome on the owning thread.
//!
//! Evaluate and history never share state transitions and may overlap.

use std::sync::Arc;

use anyhow::Result;

use crate::api::{ApiError, Backend, EvaluationResult, HistoryItem};
use crate::theme::{KeyValueStore, Theme, ThemeSetting};

/// Lifecycle of one action kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestStatus {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

impl RequestStatus {
    pub fn is_in_flight(self) -> bool {
        self == Self::InFlight
    }
}

/// Everything the page renders, minus the theme.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub input: String,
    /// Latest successful evaluation.
    pub result: Option<EvaluationResult>,
    /// Whatever the last successful history fetch returned.
    pub history: Vec<HistoryItem>,
    pub evaluate: RequestStatus,
    pub history_fetch: RequestStatus,
    /// Error banner text, shared by both actions.
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Pending requests
// ---------------------------------------------------------------------------

/// An evaluate request that has passed the guards and is waiting to be sent.
pub struct PendingEvaluate {
    backend: Arc<dyn Backend>,
    text: String,
}

impl PendingEvaluate {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Issue the request. Blocks until the backend answers.
    pub fn send(self) -> Result<EvaluationResult, ApiError> {
        self.backend.evaluate(&self.text)
    }
}

/// A history request that has passed the guards and is waiting to be sent.
pub struct PendingHistory {
    backend: Arc<dyn Backend>,
}

impl PendingHistory {
    /// Issue the request. Blocks until the backend answers.
    pub fn send(self) -> Result<Vec<HistoryItem>, ApiError> {
        self.backend.fetch_history()
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// The page controller.
pub struct Dashboard<S> {
    state: ViewState,
    backend: Option<Arc<dyn Backend>>,
    /// Banner error for either action when `backend` is `None`.
    unavailable: ApiError,
    theme: ThemeSetting<S>,
}

impl<S: KeyValueStore> Dashboard<S> {
    /// Build a dashboard. `backend` is `None` when no backend is configured;
    /// both actions are then disabled.
    pub fn new(backend: Option<Arc<dyn Backend>>, theme: ThemeSetting<S>) -> Self {
        Self {
            state: ViewState::default(),
            backend,
            unavailable: ApiError::NotConfigured,
            theme,
        }
    }

    /// Build a dashboard with no backend, reporting `reason` when either
    /// action is attempted.
    pub fn without_backend(reason: ApiError, theme: ThemeSetting<S>) -> Self {
        Self {
            unavailable: reason,
            ..Self::new(None, theme)
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn theme(&self) -> Theme {
        self.theme.theme()
    }

    pub fn theme_setting(&self) -> &ThemeSetting<S> {
        &self.theme
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub fn backend_url(&self) -> Option<&str> {
        self.backend.as_deref().map(|backend| backend.base_url())
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.state.input = text.into();
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    /// Whether the evaluate control is enabled.
    pub fn can_evaluate(&self) -> bool {
        self.is_configured()
            && !self.state.input.trim().is_empty()
            && !self.state.evaluate.is_in_flight()
    }

    /// Whether the history control is enabled.
    pub fn can_fetch_history(&self) -> bool {
        self.is_configured() && !self.state.history_fetch.is_in_flight()
    }

    // -- Evaluate --

    /// Start an evaluation of the current input.
    ///
    /// Returns `None` without side effects when the input is empty or an
    /// evaluation is already in flight. Without a backend it sets the
    /// configuration error and returns `None`.
    pub fn begin_evaluate(&mut self) -> Option<PendingEvaluate> {
        if self.state.evaluate.is_in_flight() || self.state.input.trim().is_empty() {
            return None;
        }

        let Some(backend) = self.backend.clone() else {
            self.state.error = Some(self.unavailable.to_string());
            self.state.evaluate = RequestStatus::Failed;
            return None;
        };

        self.state.error = None;
        self.state.evaluate = RequestStatus::InFlight;
        Some(PendingEvaluate {
            backend,
            text: self.state.input.clone(),
        })
    }

    /// Apply the outcome of an evaluation started with [`begin_evaluate`].
    ///
    /// A failure leaves the previous result in place.
    ///
    /// [`begin_evaluate`]: Self::begin_evaluate
    pub fn finish_evaluate(&mut self, outcome: Result<EvaluationResult, ApiError>) {
        match outcome {
            Ok(result) => {
                self.state.result = Some(result);
                self.state.evaluate = RequestStatus::Succeeded;
            }
            Err(e) => {
                self.state.error = Some(e.to_string());
                self.state.evaluate = RequestStatus::Failed;
            }
        }
    }

    /// Evaluate the current input synchronously. Returns `true` if a request
    /// was issued.
    pub fn evaluate(&mut self) -> bool {
        match self.begin_evaluate() {
            Some(pending) => {
                let outcome = pending.send();
                self.finish_evaluate(outcome);
                true
            }
            None => false,
        }
    }

    // -- History --

    /// Start a history fetch.
    ///
    /// Returns `None` without side effects when a fetch is already in flight.
    /// Without a backend it sets the configuration error and returns `None`.
    pub fn begin_fetch_history(&mut self) -> Option<PendingHistory> {
        if self.state.history_fetch.is_in_flight() {
            return None;
        }

        let Some(backend) = self.backend.clone() else {
            self.state.error = Some(self.unavailable.to_string());
            self.state.history_fetch = RequestStatus::Failed;
            return None;
        };

        self.state.error = None;
        self.state.history_fetch = RequestStatus::InFlight;
        Some(PendingHistory { backend })
    }

    /// Apply the outcome of a fetch started with [`begin_fetch_history`].
    ///
    /// Success replaces the whole history; failure keeps the old one.
    ///
    /// [`begin_fetch_history`]: Self::begin_fetch_history
    pub fn finish_fetch_history(&mut self, outcome: Result<Vec<HistoryItem>, ApiError>) {
        match outcome {
            Ok(items) => {
                self.state.history = items;
                self.state.history_fetch = RequestStatus::Succeeded;
            }
            Err(e) => {
                self.state.error = Some(e.to_string());
                self.state.history_fetch = RequestStatus::Failed;
            }
        }
    }

    /// Fetch history synchronously. Returns `true` if a request was issued.
    pub fn fetch_history(&mut self) -> bool {
        match self.begin_fetch_history() {
            Some(pending) => {
                let outcome = pending.send();
                self.finish_fetch_history(outcome);
                true
            }
            None => false,
        }
    }

    // -- Theme --

    /// Flip the theme and persist it.
    pub fn toggle_theme(&mut self) -> Result<Theme> {
        self.theme.toggle()
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.theme.set(theme)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
