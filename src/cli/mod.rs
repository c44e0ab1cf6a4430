//! CLI command implementations for evalboard.
//!
//! Provides subcommand handlers for:
//! - `evalboard evaluate <text>`: score one text and print the result panel
//! - `evalboard history`: fetch history, print table and trend chart
//! - `evalboard theme show|toggle|set`: persisted light/dark theme
//! - `evalboard session`: interactive dashboard
//! - `evalboard health`: config, backend, theme and activity log status
//! - `evalboard config show|init|set|reset`: configuration management

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::activity::{self, ActivityLog};
use crate::api::{Backend, EvaluationResult, HistoryItem, HttpBackend};
use crate::config::{self, EvalboardConfig};
use crate::render;
use crate::session;
use crate::state::Dashboard;
use crate::theme::{FileStore, KeyValueStore, Theme, ThemeSetting};

/// Output format for result and history commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// `evalboard theme` actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeAction {
    Show,
    Toggle,
    Set(Theme),
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Open the settings store named by the config.
fn settings_store(cfg: &EvalboardConfig) -> Result<FileStore> {
    let path = cfg
        .settings
        .resolved_path()
        .context("could not determine settings path (no home directory?)")?;
    Ok(FileStore::new(path))
}

/// Build the dashboard from the resolved config, restoring the saved theme.
pub fn build_dashboard(cfg: &EvalboardConfig) -> Result<Dashboard<FileStore>> {
    let theme = ThemeSetting::load(settings_store(cfg)?);
    Ok(match HttpBackend::from_config(&cfg.backend) {
        Ok(backend) => Dashboard::new(Some(Arc::new(backend) as Arc<dyn Backend>), theme),
        Err(reason) => Dashboard::without_backend(reason, theme),
    })
}

// ---------------------------------------------------------------------------
// evalboard evaluate
// ---------------------------------------------------------------------------

/// Score `text` and print the result.
pub fn run_evaluate(text: &str, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let log = ActivityLog::from_config(&cfg.logging);
    let mut dashboard = build_dashboard(&cfg)?;

    let result = evaluate_once(&mut dashboard, text, &log)?;
    let palette = dashboard.theme().palette();

    match format {
        OutputFormat::Json => print_result_json(&result)?,
        OutputFormat::Csv => print_result_csv(&result),
        OutputFormat::Table => {
            for line in render::render_result(&result, &palette) {
                println!("{line}");
            }
        }
    }

    Ok(())
}

/// Run one evaluation through the dashboard and return its result.
///
/// The dashboard's error banner becomes the command's error.
pub fn evaluate_once<S: KeyValueStore>(
    dashboard: &mut Dashboard<S>,
    text: &str,
    log: &ActivityLog,
) -> Result<EvaluationResult> {
    if text.trim().is_empty() {
        anyhow::bail!("nothing to evaluate: input is empty");
    }

    dashboard.set_input(text);
    if let Some(pending) = dashboard.begin_evaluate() {
        let outcome = activity::send_evaluate(pending, log);
        dashboard.finish_evaluate(outcome);
    }

    if let Some(error) = &dashboard.state().error {
        anyhow::bail!("{error}");
    }
    dashboard
        .state()
        .result
        .clone()
        .context("backend returned no result")
}

fn print_result_json(result: &EvaluationResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

fn print_result_csv(result: &EvaluationResult) {
    println!("gibberish_class,gibberish_score,hallucination_score");
    println!(
        "{},{},{}",
        csv_field(&result.gibberish.class),
        result.gibberish.score,
        result.hallucination
    );
}

// ---------------------------------------------------------------------------
// evalboard history
// ---------------------------------------------------------------------------

/// Fetch and print the evaluation history.
pub fn run_history(format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let log = ActivityLog::from_config(&cfg.logging);
    let mut dashboard = build_dashboard(&cfg)?;

    let items = fetch_history_once(&mut dashboard, &log)?;

    if items.is_empty() && format == OutputFormat::Table {
        println!("{}", "No evaluations yet.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
        OutputFormat::Csv => print_history_csv(&items),
        OutputFormat::Table => {
            let palette = dashboard.theme().palette();
            for line in render::render_history(&items, &palette) {
                println!("{line}");
            }
        }
    }

    Ok(())
}

/// Run one history fetch through the dashboard and return the items.
pub fn fetch_history_once<S: KeyValueStore>(
    dashboard: &mut Dashboard<S>,
    log: &ActivityLog,
) -> Result<Vec<HistoryItem>> {
    if let Some(pending) = dashboard.begin_fetch_history() {
        let outcome = activity::send_history(pending, log);
        dashboard.finish_fetch_history(outcome);
    }

    if let Some(error) = &dashboard.state().error {
        anyhow::bail!("{error}");
    }
    Ok(dashboard.state().history.clone())
}

fn print_history_csv(items: &[HistoryItem]) {
    println!("index,sentence,gibberish_model_class,gibberish_model_score,hallucination_model_score");
    for (index, item) in items.iter().enumerate() {
        println!(
            "{},{},{},{},{}",
            index + 1,
            csv_field(&item.sentence),
            csv_field(&item.gibberish_model_class),
            item.gibberish_model_score,
            item.hallucination_model_score,
        );
    }
}

// ---------------------------------------------------------------------------
// evalboard theme
// ---------------------------------------------------------------------------

pub fn run_theme(action: ThemeAction) -> Result<()> {
    let cfg = config::load();
    let mut setting = ThemeSetting::load(settings_store(&cfg)?);

    match action {
        ThemeAction::Show => {}
        ThemeAction::Toggle => {
            setting.toggle()?;
        }
        ThemeAction::Set(theme) => setting.set(theme)?,
    }

    let theme = setting.theme();
    let palette = theme.palette();
    println!(
        "{} {}",
        "Theme:".bold(),
        theme.as_str().bold().color(palette.accent)
    );
    println!("  {}", setting.store().path().display().to_string().dimmed());
    Ok(())
}

// ---------------------------------------------------------------------------
// evalboard session
// ---------------------------------------------------------------------------

pub fn run_session() -> Result<()> {
    let cfg = config::load();
    let log = ActivityLog::from_config(&cfg.logging);
    let dashboard = build_dashboard(&cfg)?;
    session::run(dashboard, log)
}

// ---------------------------------------------------------------------------
// evalboard health
// ---------------------------------------------------------------------------

/// Check config sources, backend URL, theme store and activity log.
pub fn run_health() -> Result<()> {
    println!("{}", "evalboard Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();

    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.evalboard/config.toml found"
        } else {
            "not found (run `evalboard config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".evalboard.toml found"
        } else {
            "none (optional)"
        },
    );

    match cfg.backend.resolved_url() {
        Some(url) => print_health_item("Backend", true, &url),
        None if cfg.backend.is_malformed() => print_health_item(
            "Backend",
            false,
            &format!("'{}' is not an http(s):// URL", cfg.backend.url.trim()),
        ),
        None => print_health_item(
            "Backend",
            false,
            "not configured (set EVALBOARD_BACKEND_URL)",
        ),
    }
    print_health_item(
        "Request timeout",
        true,
        &match cfg.backend.timeout_ms {
            Some(ms) => format!("{ms}ms"),
            None => "transport default".to_string(),
        },
    );

    match settings_store(&cfg) {
        Ok(store) => {
            let stored = store.get(crate::theme::THEME_KEY);
            let ok = stored.is_ok();
            let theme = Theme::from_stored(stored.ok().flatten().as_deref());
            print_health_item(
                "Theme",
                ok,
                &format!("{theme} ({})", store.path().display()),
            );
        }
        Err(e) => print_health_item("Theme", false, &format!("{e:#}")),
    }

    let log = ActivityLog::from_config(&cfg.logging);
    match log.path() {
        None => print_health_item("Activity log", true, "disabled"),
        Some(path) => {
            let summary = activity::summarize(&log.read_all());
            let detail = if summary.total == 0 {
                format!("no entries yet ({})", path.display())
            } else {
                format!(
                    "{} actions ({} evaluate, {} history), {:.0}% failed, avg {:.0}ms",
                    summary.total,
                    summary.evaluations,
                    summary.history_fetches,
                    summary.failure_pct(),
                    summary.avg_latency_ms,
                )
            };
            print_health_item("Activity log", true, &detail);
            if let Some(error) = &summary.last_error {
                print_health_item("Last failure", false, error);
            }
        }
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<18} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// evalboard config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective evalboard Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    for (label, path) in [
        ("~/.evalboard/config.toml", config::global_config_file()),
        (".evalboard.toml", config::project_config_file()),
    ] {
        if path.map(|p| p.exists()).unwrap_or(false) {
            println!("  {} {}", "✓".green(), label.dimmed());
        } else {
            println!("  {} {}", "·".dimmed(), format!("{label} (not found)").dimmed());
        }
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "EVALBOARD_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.evalboard/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Quote a CSV field when it contains a delimiter, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
