//! Text rendering of the dashboard.
//!
//! Every function here is a pure function of view state and theme: the page
//! is rebuilt from scratch after each state change. Colors come from the
//! active theme's [`Palette`] and disappear when `colored` is disabled
//! (non-TTY output, `NO_COLOR`, tests).

pub mod chart;

use colored::Colorize;

use crate::api::{EvaluationResult, HistoryItem};
use crate::state::{RequestStatus, ViewState};
use crate::theme::{Palette, Theme};

pub use chart::TrendChart;

/// Rows in the trend chart plot area.
pub const CHART_HEIGHT: usize = 8;

/// Maximum sentence width in the history table.
const SENTENCE_WIDTH: usize = 40;

/// Render the full page.
pub fn render_page(state: &ViewState, theme: Theme, configured: bool) -> String {
    let palette = theme.palette();
    let mut lines = Vec::new();

    lines.push(format!(
        "{}  {}",
        "Text Evaluation".bold().color(palette.heading),
        format!("[{theme} mode]").dimmed()
    ));
    lines.push("=".repeat(60));
    lines.extend(render_form(state, configured, &palette));

    if let Some(error) = &state.error {
        lines.push(String::new());
        lines.push(render_error(error, &palette));
    }

    if let Some(result) = &state.result {
        lines.push(String::new());
        lines.extend(render_result(result, &palette));
    }

    if !state.history.is_empty() {
        lines.push(String::new());
        lines.extend(render_history(&state.history, &palette));
    }

    let mut page = lines.join("\n");
    page.push('\n');
    page
}

/// Input line and the two action controls.
pub fn render_form(state: &ViewState, configured: bool, palette: &Palette) -> Vec<String> {
    let input = if state.input.is_empty() {
        "(empty)".dimmed().to_string()
    } else {
        state.input.clone()
    };

    let evaluate_enabled =
        configured && !state.input.trim().is_empty() && !state.evaluate.is_in_flight();
    let history_enabled = configured && !state.history_fetch.is_in_flight();

    let mut lines = vec![
        format!("  {} {}", "Input:".bold(), input),
        format!(
            "  {}  {}",
            control(
                &control_label("Evaluate", "Evaluating...", state.evaluate),
                evaluate_enabled,
                palette
            ),
            control(
                &control_label("Fetch history", "Loading history...", state.history_fetch),
                history_enabled,
                palette
            ),
        ),
    ];

    if !configured {
        lines.push(format!(
            "  {}",
            "No backend configured: set EVALBOARD_BACKEND_URL.".color(palette.warn)
        ));
    }

    lines
}

/// Caption of an action control for its lifecycle.
pub fn control_label(idle: &str, busy: &str, status: RequestStatus) -> String {
    if status.is_in_flight() {
        busy.to_string()
    } else {
        idle.to_string()
    }
}

fn control(label: &str, enabled: bool, palette: &Palette) -> String {
    let text = format!("[ {label} ]");
    if enabled {
        text.bold().color(palette.accent).to_string()
    } else {
        text.dimmed().to_string()
    }
}

pub fn render_error(message: &str, palette: &Palette) -> String {
    format!("  {} {}", "Error:".bold().color(palette.error), message.color(palette.error))
}

/// Result panel: class and both scores.
pub fn render_result(result: &EvaluationResult, palette: &Palette) -> Vec<String> {
    vec![
        "Evaluation Result".bold().color(palette.heading).to_string(),
        format!(
            "  {} {}",
            "Gibberish class:    ".bold(),
            result.gibberish.class.color(class_color(&result.gibberish.class, palette))
        ),
        format!(
            "  {} {}",
            "Gibberish score:    ".bold(),
            format_score(result.gibberish.score)
        ),
        format!(
            "  {} {}",
            "Hallucination score:".bold(),
            format_score(result.hallucination)
        ),
    ]
}

/// History table followed by the trend chart.
pub fn render_history(items: &[HistoryItem], palette: &Palette) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{} ({} evaluations)",
            "Evaluation History".bold().color(palette.heading),
            items.len()
        ),
        format!(
            "  {:>4}  {:<SENTENCE_WIDTH$}  {:<16} {:>9} {:>13}",
            "#", "Sentence", "Class", "Gibberish", "Hallucination"
        ),
        format!("  {}", "-".repeat(4 + 2 + SENTENCE_WIDTH + 2 + 16 + 1 + 9 + 1 + 13)),
    ];

    for (index, item) in items.iter().enumerate() {
        let row = format_history_row(index, item);
        if index % 2 == 0 {
            lines.push(row);
        } else {
            lines.push(row.dimmed().to_string());
        }
    }

    lines.push(String::new());
    lines.push("Score Trend".bold().color(palette.heading).to_string());
    lines.extend(TrendChart::from_history(items).render(CHART_HEIGHT, palette));
    lines
}

/// One table row, keyed by 1-based evaluation index.
pub fn format_history_row(index: usize, item: &HistoryItem) -> String {
    format!(
        "  {:>4}  {:<SENTENCE_WIDTH$}  {:<16} {:>9} {:>13}",
        index + 1,
        truncate(&single_line(&item.sentence), SENTENCE_WIDTH),
        truncate(&item.gibberish_model_class, 16),
        format_score(item.gibberish_model_score),
        format_score(item.hallucination_model_score),
    )
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Scores are always shown with two decimals.
pub fn format_score(score: f64) -> String {
    format!("{score:.2}")
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Color a gibberish class label by severity.
fn class_color(class: &str, palette: &Palette) -> colored::Color {
    match class.to_ascii_lowercase().as_str() {
        "clean" => palette.ok,
        "mild gibberish" => palette.warn,
        "noise" | "word salad" => palette.error,
        _ => palette.accent,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
