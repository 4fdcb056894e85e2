//! Persisted dark/light theme flag.
//!
//! A single key (`rk-theme`) holds `dark` or `light`. It is read once at
//! startup and written on every toggle; startup resolution never writes.
//!
//! TRADE-OFFS
//! ==========
//! With no saved value the page historically evaluated "system prefers
//! dark OR true", so the system preference never mattered. That behaviour
//! is kept as `SystemThemePolicy::ForceDark` (the default); `Honor` makes
//! the system preference decide instead.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::warn;

pub const THEME_KEY: &str = "rk-theme";

// =============================================================================
// THEME
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    /// Only the exact stored values are recognised.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Glyph shown on the toggle button while this theme is active.
    #[must_use]
    pub fn toggle_icon(self) -> &'static str {
        match self {
            Self::Dark => "☀️",
            Self::Light => "☾",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemThemePolicy {
    /// Ignore the system preference and start dark.
    ForceDark,
    /// Start in whatever scheme the system prefers.
    Honor,
}

impl SystemThemePolicy {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "force-dark" | "force_dark" => Some(Self::ForceDark),
            "honor" | "honour" => Some(Self::Honor),
            _ => None,
        }
    }
}

/// Pick the startup theme: a recognised saved value wins, otherwise policy.
#[must_use]
pub fn resolve_initial(saved: Option<&str>, system_prefers_dark: bool, policy: SystemThemePolicy) -> Theme {
    if let Some(theme) = saved.and_then(Theme::parse) {
        return theme;
    }
    match policy {
        SystemThemePolicy::ForceDark => Theme::Dark,
        SystemThemePolicy::Honor if system_prefers_dark => Theme::Dark,
        SystemThemePolicy::Honor => Theme::Light,
    }
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ThemeStoreError {
    #[error("theme store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("theme store is not a JSON object: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Client-local key-value storage.
pub trait ThemeStore: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, ThemeStoreError>;

    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), ThemeStoreError>;
}

/// JSON object file of string keys to string values.
pub struct FileThemeStore {
    path: PathBuf,
}

impl FileThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, ThemeStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl ThemeStore for FileThemeStore {
    fn get(&self, key: &str) -> Result<Option<String>, ThemeStoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ThemeStoreError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        std::fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

pub struct ThemeController<S: ThemeStore> {
    store: S,
    current: Theme,
}

impl<S: ThemeStore> ThemeController<S> {
    /// Resolve the startup theme without persisting it.
    ///
    /// An unreadable store is logged and treated as "nothing saved".
    pub fn init(store: S, system_prefers_dark: bool, policy: SystemThemePolicy) -> Self {
        let saved = store.get(THEME_KEY).unwrap_or_else(|e| {
            warn!(error = %e, "theme store unreadable; using default");
            None
        });
        let current = resolve_initial(saved.as_deref(), system_prefers_dark, policy);
        Self { store, current }
    }

    #[must_use]
    pub fn current(&self) -> Theme {
        self.current
    }

    /// Flip the theme and persist the new value.
    ///
    /// Entry point for the host's toggle control; the headless binary only
    /// resolves and reports the startup theme.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails; the in-memory theme is
    /// still flipped.
    pub fn toggle(&mut self) -> Result<Theme, ThemeStoreError> {
        self.current = self.current.toggled();
        self.store.set(THEME_KEY, self.current.as_str())?;
        Ok(self.current)
    }
}

#[cfg(test)]
#[path = "theme_test.rs"]
mod tests;
