/// Integration tests for the dashboard controller and page rendering.
///
/// A counting in-process backend stands in for the HTTP service so tests can
/// assert exactly how many requests each action issued.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use evalboard::api::{
    ApiError, Backend, EvaluationResult, GibberishScore, HistoryItem, HttpBackend,
};
use evalboard::config::schema::BackendConfig;
use evalboard::render::{TrendChart, render_page};
use evalboard::state::{Dashboard, RequestStatus};
use evalboard::theme::{KeyValueStore, MemoryStore, THEME_KEY, Theme, ThemeSetting};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct CountingBackend {
    evaluate_calls: AtomicUsize,
    history_calls: AtomicUsize,
    evaluate_outcome: Mutex<Result<EvaluationResult, ApiError>>,
    history_outcome: Mutex<Result<Vec<HistoryItem>, ApiError>>,
}

impl CountingBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            evaluate_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
            evaluate_outcome: Mutex::new(Ok(clean_result())),
            history_outcome: Mutex::new(Ok(vec![hi_item()])),
        })
    }

    fn fail_with(&self, status: u16) {
        let err = ApiError::Status {
            status,
            body: "boom".to_string(),
        };
        *self.evaluate_outcome.lock().unwrap() = Err(err.clone());
        *self.history_outcome.lock().unwrap() = Err(err);
    }

    fn evaluate_calls(&self) -> usize {
        self.evaluate_calls.load(Ordering::SeqCst)
    }

    fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }
}

impl Backend for CountingBackend {
    fn evaluate(&self, _text: &str) -> Result<EvaluationResult, ApiError> {
        self.evaluate_calls.fetch_add(1, Ordering::SeqCst);
        self.evaluate_outcome.lock().unwrap().clone()
    }

    fn fetch_history(&self) -> Result<Vec<HistoryItem>, ApiError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.history_outcome.lock().unwrap().clone()
    }

    fn base_url(&self) -> &str {
        "http://counting"
    }
}

fn clean_result() -> EvaluationResult {
    EvaluationResult {
        gibberish: GibberishScore {
            class: "Clean".to_string(),
            score: 0.12,
        },
        hallucination: 0.03,
    }
}

fn hi_item() -> HistoryItem {
    HistoryItem {
        sentence: "hi".to_string(),
        gibberish_model_class: "Clean".to_string(),
        gibberish_model_score: 0.1,
        hallucination_model_score: 0.2,
    }
}

fn dashboard_with(backend: &Arc<CountingBackend>) -> Dashboard<MemoryStore> {
    let backend: Arc<dyn Backend> = backend.clone();
    Dashboard::new(Some(backend), ThemeSetting::load(MemoryStore::new()))
}

fn page(dash: &Dashboard<MemoryStore>) -> String {
    colored::control::set_override(false);
    render_page(dash.state(), dash.theme(), dash.is_configured())
}

// ---------------------------------------------------------------------------
// Evaluate
// ---------------------------------------------------------------------------

#[test]
fn empty_input_never_issues_a_call() {
    let backend = CountingBackend::new();
    let mut dash = dashboard_with(&backend);

    assert!(!dash.can_evaluate());
    assert!(!dash.evaluate());

    dash.set_input("   ");
    assert!(!dash.can_evaluate());
    assert!(!dash.evaluate());

    assert_eq!(backend.evaluate_calls(), 0);
    assert_eq!(dash.state().evaluate, RequestStatus::Idle);
    assert_eq!(dash.state().error, None);
}

#[test]
fn successful_evaluate_renders_class_and_scores() {
    let backend = CountingBackend::new();
    let mut dash = dashboard_with(&backend);

    dash.set_input("The cat sat on the mat.");
    assert!(dash.evaluate());

    assert_eq!(dash.state().evaluate, RequestStatus::Succeeded);
    assert_eq!(dash.state().result, Some(clean_result()));

    let page = page(&dash);
    assert!(page.contains("Clean"));
    assert!(page.contains("0.12"));
    assert!(page.contains("0.03"));
    assert!(!page.contains("Error:"));
}

#[test]
fn failed_evaluate_keeps_previous_result() {
    let backend = CountingBackend::new();
    let mut dash = dashboard_with(&backend);

    dash.set_input("first");
    dash.evaluate();
    backend.fail_with(500);
    dash.set_input("second");
    dash.evaluate();

    assert_eq!(dash.state().evaluate, RequestStatus::Failed);
    assert_eq!(dash.state().result, Some(clean_result()));
    let error = dash.state().error.as_deref().unwrap();
    assert!(error.contains("500"), "got: {error}");

    let page = page(&dash);
    assert!(page.contains("Error:"));
    assert!(page.contains("Gibberish score:     0.12"));
}

#[test]
fn success_after_failure_clears_banner() {
    let backend = CountingBackend::new();
    let mut dash = dashboard_with(&backend);
    backend.fail_with(502);

    dash.set_input("text");
    dash.evaluate();
    assert!(dash.state().error.is_some());

    *backend.evaluate_outcome.lock().unwrap() = Ok(clean_result());
    dash.evaluate();
    assert_eq!(dash.state().error, None);
    assert_eq!(backend.evaluate_calls(), 2);
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[test]
fn history_renders_one_row_and_one_point_per_series() {
    let backend = CountingBackend::new();
    let mut dash = dashboard_with(&backend);

    assert!(dash.fetch_history());
    assert_eq!(dash.state().history_fetch, RequestStatus::Succeeded);
    assert_eq!(dash.state().history, vec![hi_item()]);

    let page = page(&dash);
    assert!(page.contains("(1 evaluations)"));
    let rows: Vec<&str> = page
        .lines()
        .filter(|line| line.trim_start().starts_with("1 "))
        .collect();
    assert_eq!(rows.len(), 1);
    let row = rows[0];
    assert!(row.contains("hi"));
    assert!(row.contains("Clean"));
    assert!(row.contains("0.10"));
    assert!(row.contains("0.20"));

    let chart = TrendChart::from_history(&dash.state().history);
    assert_eq!(chart.gibberish.points, vec![0.1]);
    assert_eq!(chart.hallucination.points, vec![0.2]);
}

#[test]
fn history_is_replaced_not_merged() {
    let backend = CountingBackend::new();
    let mut dash = dashboard_with(&backend);

    dash.fetch_history();
    *backend.history_outcome.lock().unwrap() = Ok(vec![hi_item(), hi_item(), hi_item()]);
    dash.fetch_history();
    assert_eq!(dash.state().history.len(), 3);

    *backend.history_outcome.lock().unwrap() = Ok(Vec::new());
    dash.fetch_history();
    assert!(dash.state().history.is_empty());
    assert!(!page(&dash).contains("Evaluation History"));
}

#[test]
fn failed_history_keeps_previous_history_and_result() {
    let backend = CountingBackend::new();
    let mut dash = dashboard_with(&backend);

    dash.set_input("text");
    dash.evaluate();
    dash.fetch_history();
    let before = dash.state().clone();

    backend.fail_with(404);
    dash.fetch_history();

    assert_eq!(dash.state().history, before.history);
    assert_eq!(dash.state().result, before.result);
    assert_eq!(dash.state().history_fetch, RequestStatus::Failed);
    assert!(dash.state().error.as_deref().unwrap().contains("404"));
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn missing_backend_sets_configuration_error_for_both_actions() {
    let mut dash: Dashboard<MemoryStore> =
        Dashboard::new(None, ThemeSetting::load(MemoryStore::new()));
    let expected = ApiError::NotConfigured.to_string();

    dash.set_input("hello");
    assert!(!dash.can_evaluate());
    assert!(!dash.evaluate());
    assert_eq!(dash.state().error.as_deref(), Some(expected.as_str()));
    assert_eq!(dash.state().evaluate, RequestStatus::Failed);

    dash.clear_error();
    assert!(!dash.can_fetch_history());
    assert!(!dash.fetch_history());
    assert_eq!(dash.state().error.as_deref(), Some(expected.as_str()));
    assert_eq!(dash.state().history_fetch, RequestStatus::Failed);

    let page = page(&dash);
    assert!(page.contains("No backend configured"));
    assert!(page.contains("not configured"));
}

#[test]
fn malformed_backend_url_is_reported_as_invalid() {
    let config = BackendConfig {
        url: "localhost:8000".to_string(),
        timeout_ms: None,
    };
    let reason = HttpBackend::from_config(&config).unwrap_err();
    let mut dash: Dashboard<MemoryStore> =
        Dashboard::without_backend(reason, ThemeSetting::load(MemoryStore::new()));

    dash.set_input("hello");
    assert!(!dash.evaluate());
    let banner = dash.state().error.clone().unwrap();
    assert!(banner.contains("\"localhost:8000\""));
    assert!(banner.contains("not an http(s):// URL"));
    assert!(!banner.contains("not configured"));

    dash.clear_error();
    assert!(!dash.fetch_history());
    assert_eq!(dash.state().error.as_deref(), Some(banner.as_str()));
}

// ---------------------------------------------------------------------------
// Overlap
// ---------------------------------------------------------------------------

#[test]
fn second_evaluate_while_in_flight_is_a_no_op() {
    let backend = CountingBackend::new();
    let mut dash = dashboard_with(&backend);
    dash.set_input("text");

    let first = dash.begin_evaluate().expect("first evaluate starts");
    assert!(dash.begin_evaluate().is_none());
    assert!(!dash.evaluate());

    dash.finish_evaluate(first.send());
    assert_eq!(backend.evaluate_calls(), 1);
    assert_eq!(dash.state().evaluate, RequestStatus::Succeeded);
}

#[test]
fn second_history_while_in_flight_is_a_no_op() {
    let backend = CountingBackend::new();
    let mut dash = dashboard_with(&backend);

    let first = dash.begin_fetch_history().expect("first fetch starts");
    assert!(dash.begin_fetch_history().is_none());
    assert!(!dash.fetch_history());

    dash.finish_fetch_history(first.send());
    assert_eq!(backend.history_calls(), 1);
}

#[test]
fn evaluate_and_history_may_overlap() {
    let backend = CountingBackend::new();
    let mut dash = dashboard_with(&backend);
    dash.set_input("text");

    let evaluate = dash.begin_evaluate().unwrap();
    let history = dash.begin_fetch_history().unwrap();
    assert_eq!(dash.state().evaluate, RequestStatus::InFlight);
    assert_eq!(dash.state().history_fetch, RequestStatus::InFlight);

    // Completion order is independent of start order.
    dash.finish_fetch_history(history.send());
    assert_eq!(dash.state().evaluate, RequestStatus::InFlight);
    dash.finish_evaluate(evaluate.send());

    assert_eq!(dash.state().evaluate, RequestStatus::Succeeded);
    assert_eq!(dash.state().history_fetch, RequestStatus::Succeeded);
    assert_eq!(backend.evaluate_calls(), 1);
    assert_eq!(backend.history_calls(), 1);
}

#[test]
fn in_flight_history_failure_does_not_touch_evaluate() {
    let backend = CountingBackend::new();
    let mut dash = dashboard_with(&backend);
    dash.set_input("text");

    let evaluate = dash.begin_evaluate().unwrap();
    dash.finish_fetch_history(Err(ApiError::Transport("reset".to_string())));
    assert_eq!(dash.state().evaluate, RequestStatus::InFlight);

    dash.finish_evaluate(evaluate.send());
    assert_eq!(dash.state().result, Some(clean_result()));
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[test]
fn toggling_theme_twice_restores_state_and_storage() {
    let store = MemoryStore::new().with(THEME_KEY, "light");
    let mut dash: Dashboard<MemoryStore> = Dashboard::new(None, ThemeSetting::load(store));

    assert_eq!(dash.theme(), Theme::Light);
    dash.toggle_theme().unwrap();
    assert_eq!(dash.theme(), Theme::Dark);
    assert!(page(&dash).contains("[dark mode]"));
    dash.toggle_theme().unwrap();

    assert_eq!(dash.theme(), Theme::Light);
    assert_eq!(
        dash.theme_setting().store().get(THEME_KEY).unwrap().as_deref(),
        Some("light")
    );
}

#[test]
fn persisted_dark_theme_is_applied_before_first_render() {
    let store = MemoryStore::new().with(THEME_KEY, "dark");
    let dash: Dashboard<MemoryStore> = Dashboard::new(None, ThemeSetting::load(store));
    assert!(page(&dash).contains("[dark mode]"));
}
