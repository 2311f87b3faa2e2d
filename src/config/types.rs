//! Configuration type definitions
//!
//! This module contains all the struct and enum definitions for configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults::*;
use crate::protocol::Framing;
use crate::provider::ReconnectPolicy;

// ============================================
// PROVIDER
// ============================================

/// How to launch the color provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Executable name or path, `~` allowed (default: material_color_reader)
    #[serde(default = "default_provider_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Stdio framing (default: native)
    #[serde(default)]
    pub framing: Framing,
}

fn default_provider_command() -> String {
    DEFAULT_PROVIDER_COMMAND.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            command: default_provider_command(),
            args: Vec::new(),
            framing: Framing::default(),
        }
    }
}

// ============================================
// RECONNECT
// ============================================

/// Reconnect timing after the provider goes away
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectConfig {
    /// Delay before the first reconnect in milliseconds (default: 5000)
    #[serde(default = "default_reconnect_delay_ms")]
    pub delay_ms: u64,
    /// Give up after this many consecutive failures (None = never)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Delay multiplier per consecutive failure (default: 1.0, fixed delay)
    #[serde(default = "default_reconnect_backoff_factor")]
    pub backoff_factor: f64,
    /// Upper bound for backed-off delays (default: 60000)
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_reconnect_delay_ms() -> u64 {
    DEFAULT_RECONNECT_DELAY_MS
}
fn default_reconnect_backoff_factor() -> f64 {
    DEFAULT_RECONNECT_BACKOFF_FACTOR
}
fn default_reconnect_max_delay_ms() -> u64 {
    DEFAULT_RECONNECT_MAX_DELAY_MS
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        ReconnectConfig {
            delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            max_attempts: None,
            backoff_factor: DEFAULT_RECONNECT_BACKOFF_FACTOR,
            max_delay_ms: DEFAULT_RECONNECT_MAX_DELAY_MS,
        }
    }
}

impl ReconnectConfig {
    /// Build the client policy. The backoff factor is clamped to at least 1.0
    /// and both delays to at least `MIN_RECONNECT_DELAY_MS`.
    pub fn policy(&self) -> ReconnectPolicy {
        let backoff_factor = if self.backoff_factor.is_finite() && self.backoff_factor > 1.0 {
            self.backoff_factor
        } else {
            1.0
        };
        let delay_ms = self.delay_ms.max(MIN_RECONNECT_DELAY_MS);
        ReconnectPolicy {
            delay: Duration::from_millis(delay_ms),
            max_attempts: self.max_attempts,
            backoff_factor,
            max_delay: Duration::from_millis(self.max_delay_ms.max(delay_ms)),
        }
    }
}

// ============================================
// MAIN CONFIG
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Automatic sync period in milliseconds (default: 2000, minimum 100)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long a manual refresh waits for an answer (default: 10000)
    #[serde(default = "default_refresh_timeout_ms")]
    pub refresh_timeout_ms: u64,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    /// Theme file path, or "-" for JSONL on stdout
    #[serde(default = "default_theme_output")]
    pub theme_output: String,
    /// Drop a response that arrives after auto mode was turned off
    #[serde(default = "default_discard_in_flight_on_disable")]
    pub discard_in_flight_on_disable: bool,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
fn default_refresh_timeout_ms() -> u64 {
    DEFAULT_REFRESH_TIMEOUT_MS
}
fn default_theme_output() -> String {
    DEFAULT_THEME_OUTPUT.to_string()
}
fn default_discard_in_flight_on_disable() -> bool {
    DEFAULT_DISCARD_IN_FLIGHT_ON_DISABLE
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: ProviderConfig::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            refresh_timeout_ms: DEFAULT_REFRESH_TIMEOUT_MS,
            reconnect: ReconnectConfig::default(),
            theme_output: default_theme_output(),
            discard_in_flight_on_disable: DEFAULT_DISCARD_IN_FLIGHT_ON_DISABLE,
        }
    }
}

impl Config {
    /// Returns the poll interval, never below the minimum
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    /// Returns the manual refresh timeout, never below the minimum
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms.max(MIN_REFRESH_TIMEOUT_MS))
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        self.reconnect.policy()
    }

    /// Resolved theme file path, or None when themes go to stdout
    pub fn theme_output_path(&self) -> Option<PathBuf> {
        if self.theme_output == STDOUT_THEME_OUTPUT {
            None
        } else {
            Some(PathBuf::from(
                shellexpand::tilde(&self.theme_output).as_ref(),
            ))
        }
    }
}
