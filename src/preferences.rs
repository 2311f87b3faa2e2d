//! Persisted user preferences
//!
//! Stores whether automatic sync is on, plus the last palette a manual
//! refresh returned and when, so a status display can show them without
//! talking to the provider.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::palette::Palette;

const PREFERENCES_FILE: &str = "preferences.json";

/// `{"autoMode":bool,"lastColors":{...},"lastUpdate":millis}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_auto_mode")]
    pub auto_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_colors: Option<Palette>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_update: Option<DateTime<Utc>>,
}

fn default_auto_mode() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            auto_mode: default_auto_mode(),
            last_colors: None,
            last_update: None,
        }
    }
}

/// Preferences plus the file they live in
#[derive(Debug)]
pub struct PreferencesStore {
    prefs: Preferences,
    file_path: PathBuf,
    dirty: bool,
}

impl PreferencesStore {
    /// Store at ~/.material-sync/preferences.json
    pub fn new() -> Self {
        Self::with_path(default_path())
    }

    pub fn with_path(file_path: PathBuf) -> Self {
        PreferencesStore {
            prefs: Preferences::default(),
            file_path,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn get(&self) -> &Preferences {
        &self.prefs
    }

    pub fn auto_mode(&self) -> bool {
        self.prefs.auto_mode
    }

    /// Load from disk. A missing file keeps the defaults.
    pub fn load(&mut self) -> Result<()> {
        if !self.file_path.exists() {
            info!(path = %self.file_path.display(), "Preferences file not found, using defaults");
            return Ok(());
        }

        let content = std::fs::read_to_string(&self.file_path).with_context(|| {
            format!("Failed to read preferences file: {}", self.file_path.display())
        })?;
        self.prefs =
            serde_json::from_str(&content).with_context(|| "Failed to parse preferences JSON")?;

        debug!(
            path = %self.file_path.display(),
            auto_mode = self.prefs.auto_mode,
            "Loaded preferences"
        );
        self.dirty = false;
        Ok(())
    }

    pub fn set_auto_mode(&mut self, enabled: bool) {
        if self.prefs.auto_mode != enabled {
            self.prefs.auto_mode = enabled;
            self.dirty = true;
        }
    }

    /// Remember the palette from a successful manual refresh
    pub fn record_refresh(&mut self, colors: Palette, at: DateTime<Utc>) {
        self.prefs.last_colors = Some(colors);
        self.prefs.last_update = Some(at);
        self.dirty = true;
    }

    /// Save using atomic write (write temp + rename). No-op when unchanged.
    #[instrument(name = "preferences_save", skip(self))]
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            debug!("No preference changes to save");
            return Ok(());
        }

        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let json =
            serde_json::to_string_pretty(&self.prefs).context("Failed to serialize preferences")?;

        let temp_path = self.file_path.with_extension("json.tmp");
        std::fs::write(&temp_path, &json).with_context(|| {
            format!("Failed to write temp preferences file: {}", temp_path.display())
        })?;
        std::fs::rename(&temp_path, &self.file_path).with_context(|| {
            format!("Failed to rename temp file to {}", self.file_path.display())
        })?;

        info!(path = %self.file_path.display(), bytes = json.len(), "Saved preferences");
        self.dirty = false;
        Ok(())
    }
}

impl Default for PreferencesStore {
    fn default() -> Self {
        Self::new()
    }
}

fn default_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".material-sync"))
        .unwrap_or_else(|| std::env::temp_dir().join("material-sync"))
        .join(PREFERENCES_FILE)
}
