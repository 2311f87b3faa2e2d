//! Theme sinks
//!
//! The engine hands every changed `ThemeDescriptor` to a `ThemeSink`. Two
//! concrete sinks ship with the crate:
//!
//! - `JsonFileSink` rewrites a JSON file atomically for hosts that watch it
//! - `JsonlSink` writes `{"type":"applyTheme","theme":{...}}` lines to a stream

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::{Result, SyncError};
use crate::theme::ThemeDescriptor;

/// Host capability for applying a theme
pub trait ThemeSink: Send {
    /// Apply `theme`. An error leaves the host on its previous theme.
    fn apply(&mut self, theme: &ThemeDescriptor) -> Result<()>;
}

/// Writes the descriptor as pretty JSON, replacing the file atomically
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileSink { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ThemeSink for JsonFileSink {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn apply(&mut self, theme: &ThemeDescriptor) -> Result<()> {
        let json = serde_json::to_string_pretty(theme)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SyncError::Apply(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        // Write to temp file, then rename over the target
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &json).map_err(|e| {
            SyncError::Apply(format!("cannot write {}: {}", temp_path.display(), e))
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            SyncError::Apply(format!("cannot replace {}: {}", self.path.display(), e))
        })?;

        info!(
            bytes = json.len(),
            color_scheme = %theme.color_scheme(),
            "Theme written"
        );
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum SinkMessage<'a> {
    ApplyTheme { theme: &'a ThemeDescriptor },
}

/// Streams apply commands as JSON lines
pub struct JsonlSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        JsonlSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> ThemeSink for JsonlSink<W> {
    fn apply(&mut self, theme: &ThemeDescriptor) -> Result<()> {
        let mut line = serde_json::to_vec(&SinkMessage::ApplyTheme { theme })?;
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .and_then(|_| self.writer.flush())
            .map_err(|e| SyncError::Apply(e.to_string()))?;
        debug!(bytes = line.len(), "Theme line written");
        Ok(())
    }
}
