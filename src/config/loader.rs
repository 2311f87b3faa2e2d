//! Configuration loading from file system

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use super::defaults::DEFAULT_CONFIG_PATH;
use super::types::Config;
use crate::error::{Result, SyncError};

/// Default config file location with `~` expanded
pub fn config_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).as_ref())
}

/// Load configuration from ~/.material-sync/config.json
///
/// Returns Config::default() if the file is missing or invalid.
#[instrument(name = "load_config")]
pub fn load_config() -> Config {
    load_config_or_default(&config_path())
}

/// Like `load_config`, for an explicit path
pub fn load_config_or_default(path: &Path) -> Config {
    if !path.exists() {
        info!(path = %path.display(), "Config file not found, using defaults");
        return Config::default();
    }

    match load_config_from(path) {
        Ok(config) => config,
        Err(e) => {
            warn!(
                error = %e,
                path = %path.display(),
                "Failed to load config, using defaults"
            );
            Config::default()
        }
    }
}

/// Read and parse a config file, reporting any failure
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .map_err(|e| SyncError::Config(format!("cannot read {}: {}", path.display(), e)))?;

    let config: Config = serde_json::from_str(&contents)
        .map_err(|e| SyncError::Config(format!("invalid {}: {}", path.display(), e)))?;

    info!(
        path = %path.display(),
        provider = %config.provider.command,
        poll_interval_ms = config.poll_interval().as_millis() as u64,
        "Successfully loaded config"
    );
    Ok(config)
}
