use anyhow::Result;
use clap::{Parser, Subcommand};

use evalboard::cli::{self, OutputFormat, ThemeAction};
use evalboard::theme::Theme;

#[derive(Debug, Parser)]
#[command(name = "evalboard")]
#[command(about = "Score text for gibberish and hallucination against an evaluation backend")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Evaluate a piece of text and show both model scores
    Evaluate {
        /// The text to evaluate
        #[arg(trailing_var_arg = true, required = true, allow_hyphen_values = true)]
        text: Vec<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Fetch all past evaluations with a score trend chart
    History {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show or change the persisted light/dark theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeCommands>,
    },
    /// Interactive dashboard: type text to evaluate, `:help` for commands
    Session,
    /// Check configuration, backend URL, theme store and activity log
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ThemeCommands {
    /// Print the current theme
    Show,
    /// Switch between light and dark
    Toggle,
    /// Set the theme explicitly
    Set {
        /// `dark` or `light`
        theme: Theme,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write the default config to ~/.evalboard/config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Set a config value, e.g. `backend.url http://127.0.0.1:8000`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Evaluate { text, format } => {
            let text = text.join(" ");
            cli::run_evaluate(&text, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::History { format } => cli::run_history(OutputFormat::from_str_opt(Some(&format))),
        Commands::Theme { action } => {
            let action = match action {
                None | Some(ThemeCommands::Show) => ThemeAction::Show,
                Some(ThemeCommands::Toggle) => ThemeAction::Toggle,
                Some(ThemeCommands::Set { theme }) => ThemeAction::Set(theme),
            };
            cli::run_theme(action)
        }
        Commands::Session => cli::run_session(),
        Commands::Health => cli::run_health(),
        Commands::Config { action } => match action {
            ConfigCommands::Show => cli::run_config_show(),
            ConfigCommands::Init { force } => cli::run_config_init(force),
            ConfigCommands::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigCommands::Reset => cli::run_config_reset(),
        },
    }
}
