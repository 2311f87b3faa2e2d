use std::time::Duration;

use thiserror::Error;
use tracing::{error, warn};

/// Error severity for status display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,     // expected churn, retried automatically
    Warning,  // recoverable, no update this cycle
    Error,    // operation failed
    Critical, // requires user action (bad config, missing provider)
}

/// Domain-specific errors for the theme sync engine
#[derive(Error, Debug)]
pub enum SyncError {
    /// `request_palette` was called while the provider link is down.
    #[error("Color provider is not connected")]
    NotConnected,

    /// The link dropped while a request was outstanding or being written.
    #[error("Color provider connection unavailable: {0}")]
    ConnectionUnavailable(String),

    /// Establishing the provider link failed (absent binary, permissions, spawn error).
    #[error("Failed to connect to color provider: {0}")]
    ConnectionFailed(String),

    /// Provider answered with `success: false`.
    #[error("Color provider error: {0}")]
    Provider(String),

    #[error("Malformed color value '{0}'")]
    MalformedColor(String),

    /// The theme sink rejected the descriptor.
    #[error("Theme apply failed: {0}")]
    Apply(String),

    #[error("Failed to parse protocol message: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timed out after {0:?} waiting for the color provider")]
    Timeout(Duration),

    #[error("Sync engine is not running")]
    EngineStopped,
}

impl SyncError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotConnected => ErrorSeverity::Info,
            Self::ConnectionUnavailable(_) => ErrorSeverity::Warning,
            Self::ConnectionFailed(_) => ErrorSeverity::Critical,
            Self::Provider(_) => ErrorSeverity::Warning,
            Self::MalformedColor(_) => ErrorSeverity::Info,
            Self::Apply(_) => ErrorSeverity::Error,
            Self::Protocol(_) => ErrorSeverity::Warning,
            Self::Io(_) => ErrorSeverity::Error,
            Self::Config(_) => ErrorSeverity::Critical,
            Self::Timeout(_) => ErrorSeverity::Warning,
            Self::EngineStopped => ErrorSeverity::Error,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::NotConnected => "Not connected to the color provider".to_string(),
            Self::ConnectionUnavailable(msg) => format!("Color provider went away: {}", msg),
            Self::ConnectionFailed(msg) => format!("Could not start color provider: {}", msg),
            Self::Provider(msg) => format!("Failed to read colors: {}", msg),
            Self::MalformedColor(value) => format!("Ignoring invalid color {}", value),
            Self::Apply(msg) => format!("Could not apply theme: {}", msg),
            Self::Protocol(e) => format!("Invalid message format: {}", e),
            Self::Io(e) => format!("I/O failure: {}", e),
            Self::Config(msg) => format!("Configuration issue: {}", msg),
            Self::Timeout(after) => format!(
                "No answer from the color provider after {} ms",
                after.as_millis()
            ),
            Self::EngineStopped => "Sync engine has stopped".to_string(),
        }
    }

    /// Connection-level failures are retried by the reconnect loop.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::ConnectionUnavailable(_) | Self::ConnectionFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and nobody is waiting on the result.
///
/// # Examples
///
/// ```ignore
/// use material_theme_sync::error::ResultExt;
///
/// // Keep running if the preferences file can't be written
/// prefs.save().warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}
