//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Provider executable looked up on PATH
pub const DEFAULT_PROVIDER_COMMAND: &str = "material_color_reader";

/// Timer period for automatic sync
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
/// Anything faster would just spin the provider
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// How long a manual refresh waits for the provider
pub const DEFAULT_REFRESH_TIMEOUT_MS: u64 = 10_000;
pub const MIN_REFRESH_TIMEOUT_MS: u64 = 100;

/// Reconnect settings
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5000;
pub const DEFAULT_RECONNECT_BACKOFF_FACTOR: f64 = 1.0;
pub const DEFAULT_RECONNECT_MAX_DELAY_MS: u64 = 60_000;
/// Floor for reconnect delays, so a dead provider is not respawned in a loop
pub const MIN_RECONNECT_DELAY_MS: u64 = 100;

/// Where the file sink writes the theme
pub const DEFAULT_THEME_OUTPUT: &str = "~/.material-sync/theme.json";
/// `themeOutput` value that selects the JSONL sink on stdout
pub const STDOUT_THEME_OUTPUT: &str = "-";

pub const DEFAULT_DISCARD_IN_FLIGHT_ON_DISABLE: bool = false;

/// Config file location
pub const DEFAULT_CONFIG_PATH: &str = "~/.material-sync/config.json";
