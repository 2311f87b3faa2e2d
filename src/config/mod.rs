//! Configuration module - Application settings
//!
//! This module provides functionality for:
//! - Loading configuration from ~/.material-sync/config.json
//! - Default values for all settings
//! - Type definitions for config structures
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - Configuration struct definitions (Config, ProviderConfig, etc.)
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{
    MIN_POLL_INTERVAL_MS, MIN_RECONNECT_DELAY_MS, MIN_REFRESH_TIMEOUT_MS, STDOUT_THEME_OUTPUT,
};

pub use types::{Config, ProviderConfig, ReconnectConfig};

pub use loader::{config_path, load_config, load_config_from, load_config_or_default};

#[cfg(test)]
pub use defaults::{
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_PROVIDER_COMMAND, DEFAULT_RECONNECT_DELAY_MS,
    DEFAULT_REFRESH_TIMEOUT_MS, DEFAULT_THEME_OUTPUT,
};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
