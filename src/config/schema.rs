/// Configuration schema and defaults for evalboard.
///
/// Defines the TOML-serializable configuration with three sections:
/// `[backend]`, `[settings]` and `[logging]`. Every field has a built-in
/// default; users only set the values they want to override.
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Accepts `http://` and `https://` URLs with a non-empty host part.
static BACKEND_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/?#]+(/[^\s?#]*)?$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level evalboard configuration.
///
/// Maps directly to `~/.evalboard/config.toml` and `.evalboard.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalboardConfig {
    pub backend: BackendConfig,
    pub settings: SettingsConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Location of the evaluation backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL, e.g. `http://127.0.0.1:8000`. Empty means not configured.
    pub url: String,
    /// Request timeout in milliseconds. Unset: wait on transport defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl BackendConfig {
    /// The configured base URL, if it is present and well-formed.
    pub fn resolved_url(&self) -> Option<String> {
        let url = self.url.trim();
        if is_valid_backend_url(url) {
            Some(url.trim_end_matches('/').to_string())
        } else {
            None
        }
    }

    /// `true` when a URL is set but is not an `http(s)://` URL.
    pub fn is_malformed(&self) -> bool {
        let url = self.url.trim();
        !url.is_empty() && !is_valid_backend_url(url)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Check that `url` is an absolute `http(s)://` URL.
pub fn is_valid_backend_url(url: &str) -> bool {
    BACKEND_URL_RE.is_match(url)
}

// ---------------------------------------------------------------------------
// [settings]
// ---------------------------------------------------------------------------

/// Where persisted UI settings (the theme) live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Path to the settings store. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: "~/.evalboard/settings.toml".to_string(),
        }
    }
}

impl SettingsConfig {
    pub fn resolved_path(&self) -> Option<PathBuf> {
        expand_home(&self.path)
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Activity log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether action outcomes are appended to the activity log.
    pub enabled: bool,
    /// Path to the JSONL activity log. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.evalboard/activity.jsonl".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn resolved_path(&self) -> Option<PathBuf> {
        expand_home(&self.path)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    if path == "~" {
        return dirs::home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

impl EvalboardConfig {
    /// Annotated default config written by `evalboard config init`.
    pub fn default_toml() -> String {
        r#"# evalboard configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (EVALBOARD_*)
#   2. Project config (.evalboard.toml in current directory)
#   3. User global config (~/.evalboard/config.toml)
#   4. Built-in defaults

[backend]
url = ""              # e.g. "http://127.0.0.1:8000" or EVALBOARD_BACKEND_URL
# timeout_ms = 10000  # unset: no explicit request timeout

[settings]
path = "~/.evalboard/settings.toml"   # persisted theme

[logging]
enabled = true
path = "~/.evalboard/activity.jsonl"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_parses_back() {
        let config: EvalboardConfig = toml::from_str(&EvalboardConfig::default_toml()).unwrap();
        assert_eq!(config, EvalboardConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: EvalboardConfig = toml::from_str(
            r#"
[backend]
url = "http://127.0.0.1:8000"
"#,
        )
        .unwrap();
        assert_eq!(config.backend.url, "http://127.0.0.1:8000");
        assert_eq!(config.backend.timeout_ms, None);
        assert!(config.logging.enabled);
        assert_eq!(config.settings, SettingsConfig::default());
    }

    #[test]
    fn resolved_url_trims_and_strips_slash() {
        let backend = BackendConfig {
            url: "  https://scores.example.com/api/  ".to_string(),
            timeout_ms: None,
        };
        assert_eq!(
            backend.resolved_url().as_deref(),
            Some("https://scores.example.com/api")
        );
    }

    #[test]
    fn url_validation() {
        assert!(is_valid_backend_url("http://127.0.0.1:8000"));
        assert!(is_valid_backend_url("https://scores.example.com/v1"));
        assert!(!is_valid_backend_url(""));
        assert!(!is_valid_backend_url("127.0.0.1:8000"));
        assert!(!is_valid_backend_url("ftp://example.com"));
        assert!(!is_valid_backend_url("http://"));
        assert!(!is_valid_backend_url("http://exa mple.com"));
    }

    #[test]
    fn malformed_is_distinct_from_missing() {
        assert!(!BackendConfig::default().is_malformed());
        let bad = BackendConfig {
            url: "localhost:8000".to_string(),
            timeout_ms: None,
        };
        assert!(bad.is_malformed());
        assert!(bad.resolved_url().is_none());
    }

    #[test]
    fn timeout_converts_millis() {
        let backend = BackendConfig {
            url: String::new(),
            timeout_ms: Some(1500),
        };
        assert_eq!(backend.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(
            expand_home("/var/lib/evalboard/settings.toml"),
            Some(PathBuf::from("/var/lib/evalboard/settings.toml"))
        );
    }
}
