/// Key-value persistence port for UI settings.
///
/// The theme setting never touches the filesystem directly; it goes through
/// a [`KeyValueStore`]. The CLI uses [`FileStore`], tests use [`MemoryStore`].
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// A durable string-to-string store.
pub trait KeyValueStore {
    /// Read the value stored under `key`, or `None` if it was never set.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local store with no durability.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a value, as if persisted by an earlier session.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// TOML file holding a flat table of string values.
///
/// The file is read on every `get` and rewritten on every `set`; settings
/// change rarely and other keys in the file are preserved.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file content, or `None` when the file does not exist yet.
    fn read_content(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&self.path)
            .map(Some)
            .with_context(|| format!("failed to read settings file: {}", self.path.display()))
    }

    fn read_table(&self) -> Result<toml::Table> {
        let Some(content) = self.read_content()? else {
            return Ok(toml::Table::new());
        };
        content
            .parse::<toml::Table>()
            .with_context(|| format!("failed to parse settings file: {}", self.path.display()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let table = self.read_table()?;
        Ok(table
            .get(key)
            .and_then(|value| value.as_str())
            .map(str::to_string))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        // Unparseable content is replaced; an unreadable file fails the write.
        let mut table = self
            .read_content()?
            .and_then(|content| content.parse::<toml::Table>().ok())
            .unwrap_or_default();
        table.insert(key.to_string(), toml::Value::String(value.to_string()));

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("failed to create settings directory")?;
        }
        let content = toml::to_string_pretty(&table).context("failed to serialize settings")?;
        fs::write(&self.path, content)
            .with_context(|| format!("failed to write settings file: {}", self.path.display()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
