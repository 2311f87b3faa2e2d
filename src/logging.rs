//! Structured JSONL logging plus human-readable stderr output.
//!
//! This module provides dual-output logging:
//! - **JSONL to file** (~/.material-sync/logs/material-sync.jsonl) - structured for tooling
//! - **Pretty to stderr** - human-readable for developers
//!
//! stdout is reserved for the control protocol, so nothing here writes to it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use material_theme_sync::logging;
//!
//! // Initialize logging - MUST keep guard alive for duration of program
//! let _guard = logging::init();
//!
//! tracing::info!(event_type = "sync", "Theme updated");
//! ```

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::OnceLock;

use parking_lot::Mutex;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Recent activity shown by the `status` control command
static LOG_BUFFER: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();
const MAX_LOG_LINES: usize = 50;

const LOG_FILE_NAME: &str = "material-sync.jsonl";

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the dual-output logging system.
///
/// Returns a guard that MUST be kept alive for the duration of the program.
pub fn init() -> LoggingGuard {
    let log_dir = get_log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }

    let log_path = log_dir.join(LOG_FILE_NAME);

    // Open log file with append mode; fall back to a sink writer if that fails
    let (non_blocking_file, file_guard) = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => tracing_appender::non_blocking(file),
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            tracing_appender::non_blocking(std::io::sink())
        }
    };

    // Environment filter - default to info, allow override via RUST_LOG
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    // try_init: a second init (tests, embedding hosts) keeps the first subscriber
    if tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .is_err()
    {
        eprintln!("[LOGGING] Global subscriber already installed");
    }

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %log_path.display(),
        "Application logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Get the log directory path (~/.material-sync/logs/)
fn get_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".material-sync").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("material-sync-logs"))
}

/// Get the path to the JSONL log file
pub fn log_path() -> PathBuf {
    get_log_dir().join(LOG_FILE_NAME)
}

/// Category-tagged info line that is also kept in the recent-activity buffer.
///
/// Prefer tracing macros directly when structured fields matter.
pub fn log(category: &str, message: &str) {
    add_to_buffer(category, message);
    tracing::info!(category = category, "{}", message);
}

/// Log an error with structured fields and context
pub fn log_error(category: &str, error: &str, context: Option<&str>) {
    let msg = match context {
        Some(ctx) => format!("{}: {} (context: {})", category, error, ctx),
        None => format!("{}: {}", category, error),
    };
    add_to_buffer("ERROR", &msg);

    tracing::error!(
        event_type = "error",
        category = category,
        error_message = error,
        context = context,
        "{}", msg
    );
}

/// Log the outcome of one sync cycle
pub fn log_sync_event(origin: &str, applied: bool, fingerprint: Option<&str>) {
    let short = fingerprint.map(|f| &f[..f.len().min(12)]).unwrap_or("-");
    add_to_buffer(
        "SYNC",
        &format!("{} cycle applied={} fingerprint={}", origin, applied, short),
    );

    tracing::info!(
        event_type = "sync_cycle",
        origin = origin,
        applied = applied,
        fingerprint = fingerprint,
        "Sync cycle finished"
    );
}

fn add_to_buffer(category: &str, message: &str) {
    let buffer = LOG_BUFFER.get_or_init(|| Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES)));
    let mut buf = buffer.lock();
    if buf.len() >= MAX_LOG_LINES {
        buf.pop_front();
    }
    buf.push_back(format!("[{}] {}", category, message));
}

/// Get the last N log lines, newest first
pub fn get_last_logs(n: usize) -> Vec<String> {
    match LOG_BUFFER.get() {
        Some(buffer) => buffer.lock().iter().rev().take(n).cloned().collect(),
        None => Vec::new(),
    }
}

pub use tracing;
