//! Light/dark display theme with durable persistence.
//!
//! The theme is one boolean setting stored under [`THEME_KEY`] as the string
//! `"dark"` or `"light"`. Anything other than `"dark"` (including a missing
//! key or an unreadable store) loads as light. The applied theme picks the
//! [`Palette`] every rendered section is colored with.

pub mod store;

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use colored::Color;

pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Storage key of the persisted theme.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Interpret a persisted value.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Self::Dark,
            _ => Self::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Self::Light => Palette {
                heading: Color::Blue,
                accent: Color::Magenta,
                error: Color::Red,
                ok: Color::Green,
                warn: Color::Yellow,
                gibberish: Color::Blue,
                hallucination: Color::Red,
            },
            Self::Dark => Palette {
                heading: Color::BrightCyan,
                accent: Color::BrightMagenta,
                error: Color::BrightRed,
                ok: Color::BrightGreen,
                warn: Color::BrightYellow,
                gibberish: Color::BrightCyan,
                hallucination: Color::BrightMagenta,
            },
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            other => anyhow::bail!("unknown theme '{other}' (expected 'dark' or 'light')"),
        }
    }
}

/// Terminal colors for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub heading: Color,
    pub accent: Color,
    pub error: Color,
    pub ok: Color,
    pub warn: Color,
    /// Gibberish series in the trend chart.
    pub gibberish: Color,
    /// Hallucination series in the trend chart.
    pub hallucination: Color,
}

// ---------------------------------------------------------------------------
// Persisted setting
// ---------------------------------------------------------------------------

/// The theme currently applied, backed by a [`KeyValueStore`].
#[derive(Debug)]
pub struct ThemeSetting<S> {
    store: S,
    theme: Theme,
}

impl<S: KeyValueStore> ThemeSetting<S> {
    /// Restore the persisted theme from `store`.
    pub fn load(store: S) -> Self {
        let stored = store.get(THEME_KEY).ok().flatten();
        let theme = Theme::from_stored(stored.as_deref());
        Self { store, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Flip between light and dark and persist the new value.
    ///
    /// The in-memory theme flips even when persisting fails; the error is
    /// returned so the caller can report it.
    pub fn toggle(&mut self) -> Result<Theme> {
        let next = self.theme.toggled();
        self.set(next)?;
        Ok(next)
    }

    /// Apply `theme` and persist it.
    pub fn set(&mut self, theme: Theme) -> Result<()> {
        self.theme = theme;
        self.store
            .set(THEME_KEY, theme.as_str())
            .with_context(|| format!("failed to persist theme '{theme}'"))
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Store whose writes always fail.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(Some("dark".to_string()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            anyhow::bail!("read-only")
        }
    }

    #[test]
    fn only_dark_loads_as_dark() {
        assert_eq!(Theme::from_stored(Some("dark")), Theme::Dark);
        assert_eq!(Theme::from_stored(Some("light")), Theme::Light);
        assert_eq!(Theme::from_stored(Some("Dark")), Theme::Light);
        assert_eq!(Theme::from_stored(Some("")), Theme::Light);
        assert_eq!(Theme::from_stored(None), Theme::Light);
    }

    #[test]
    fn load_defaults_to_light() {
        let setting = ThemeSetting::load(MemoryStore::new());
        assert_eq!(setting.theme(), Theme::Light);
    }

    #[test]
    fn load_restores_dark() {
        let setting = ThemeSetting::load(MemoryStore::new().with(THEME_KEY, "dark"));
        assert_eq!(setting.theme(), Theme::Dark);
    }

    #[test]
    fn toggle_persists_new_value() {
        let mut setting = ThemeSetting::load(MemoryStore::new());
        assert_eq!(setting.toggle().unwrap(), Theme::Dark);
        assert_eq!(
            setting.store().get(THEME_KEY).unwrap().as_deref(),
            Some("dark")
        );
    }

    #[test]
    fn toggle_twice_restores_theme_and_stored_value() {
        let mut setting = ThemeSetting::load(MemoryStore::new().with(THEME_KEY, "light"));
        setting.toggle().unwrap();
        setting.toggle().unwrap();
        assert_eq!(setting.theme(), Theme::Light);
        assert_eq!(
            setting.store().get(THEME_KEY).unwrap().as_deref(),
            Some("light")
        );
    }

    #[test]
    fn failed_persist_still_applies_theme() {
        let mut setting = ThemeSetting::load(ReadOnlyStore);
        assert_eq!(setting.theme(), Theme::Dark);
        assert!(setting.toggle().is_err());
        assert_eq!(setting.theme(), Theme::Light);
    }

    #[test]
    fn parses_theme_names() {
        assert_eq!("DARK".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(" light ".parse::<Theme>().unwrap(), Theme::Light);
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn palettes_differ_between_themes() {
        assert_ne!(Theme::Light.palette(), Theme::Dark.palette());
    }
}
