//! External command handling via stdin.
//!
//! The `run` daemon is controlled with JSONL commands on stdin and answers
//! with one JSON line per command on stdout.
//!
//! # Protocol
//!
//! ```json
//! {"type": "refresh", "requestId": "r1"}
//! {"type": "setAutoMode", "enabled": false}
//! {"type": "toggleAutoMode"}
//! {"type": "status"}
//! {"type": "quit"}
//! ```
//!
//! # Example Usage
//!
//! ```bash
//! echo '{"type": "refresh"}' | material-sync run
//! ```

use std::io::{BufRead, Write};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::engine::{EngineHandle, EngineStatus, RefreshOutcome};
use crate::error::ResultExt;
use crate::logging;
use crate::preferences::{Preferences, PreferencesStore};

/// Commands accepted on stdin
///
/// All commands support an optional `requestId` that is echoed in the reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlCommand {
    /// Run one sync cycle now
    Refresh {
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    SetAutoMode {
        enabled: bool,
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    ToggleAutoMode {
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    Status {
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    /// Stop the daemon
    Quit {
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
}

impl ControlCommand {
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ControlCommand::Refresh { request_id }
            | ControlCommand::SetAutoMode { request_id, .. }
            | ControlCommand::ToggleAutoMode { request_id }
            | ControlCommand::Status { request_id }
            | ControlCommand::Quit { request_id } => request_id.as_deref(),
        }
    }
}

/// One stdout line per handled command
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlReply {
    RefreshResult {
        #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        #[serde(flatten)]
        outcome: RefreshOutcome,
    },
    AutoMode {
        #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        enabled: bool,
    },
    Status {
        #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        engine: Option<EngineStatus>,
        preferences: Preferences,
        #[serde(rename = "recentLogs")]
        recent_logs: Vec<String>,
    },
    Bye {
        #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
}

/// Whether the daemon keeps reading commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Number of recent log lines included in a status reply
const STATUS_LOG_LINES: usize = 10;

/// Start a thread that listens on stdin for JSONL commands.
/// Returns an async_channel::Receiver; the daemon blocks on it.
///
/// # Channel Capacity
///
/// Bounded to 100 to prevent unbounded memory growth. Commands arrive at
/// human speed, so the bound is never reached in practice.
pub fn start_stdin_listener() -> async_channel::Receiver<ControlCommand> {
    let (tx, rx) = async_channel::bounded(100);

    std::thread::spawn(move || {
        logging::log("STDIN", "External command listener started");
        let stdin = std::io::stdin();
        read_commands(stdin.lock(), &tx);
        logging::log("STDIN", "External command listener exiting");
    });

    rx
}

/// Forward every parseable line from `reader` into `tx`
///
/// Stops at EOF, on a read error, or when the receiver is gone.
pub fn read_commands<R: BufRead>(reader: R, tx: &async_channel::Sender<ControlCommand>) {
    for line in reader.lines() {
        match line {
            Ok(line) if !line.trim().is_empty() => {
                match serde_json::from_str::<ControlCommand>(&line) {
                    Ok(cmd) => {
                        logging::log("STDIN", &format!("Parsed command: {:?}", cmd));
                        // send_blocking is used since we're in a sync thread
                        if tx.send_blocking(cmd).is_err() {
                            logging::log("STDIN", "Command channel closed, exiting");
                            break;
                        }
                    }
                    Err(e) => {
                        logging::log("STDIN", &format!("Failed to parse command: {}", e));
                    }
                }
            }
            Ok(_) => {} // Empty line, ignore
            Err(e) => {
                logging::log("STDIN", &format!("Error reading stdin: {}", e));
                break;
            }
        }
    }
}

/// Execute one command against the engine, updating preferences as needed
pub fn handle_command(
    command: ControlCommand,
    engine: &EngineHandle,
    prefs: &mut PreferencesStore,
) -> (ControlReply, Flow) {
    match command {
        ControlCommand::Refresh { request_id } => {
            let outcome = engine.refresh();
            if outcome.success {
                if let Some(colors) = outcome.colors.clone() {
                    prefs.record_refresh(colors, Utc::now());
                    prefs.save().warn_on_err();
                }
            }
            (ControlReply::RefreshResult { request_id, outcome }, Flow::Continue)
        }
        ControlCommand::SetAutoMode { enabled, request_id } => {
            (set_auto_mode(enabled, request_id, engine, prefs), Flow::Continue)
        }
        ControlCommand::ToggleAutoMode { request_id } => {
            let enabled = !engine.auto_mode();
            (set_auto_mode(enabled, request_id, engine, prefs), Flow::Continue)
        }
        ControlCommand::Status { request_id } => (
            ControlReply::Status {
                request_id,
                engine: engine.status(),
                preferences: prefs.get().clone(),
                recent_logs: logging::get_last_logs(STATUS_LOG_LINES),
            },
            Flow::Continue,
        ),
        ControlCommand::Quit { request_id } => (ControlReply::Bye { request_id }, Flow::Quit),
    }
}

fn set_auto_mode(
    enabled: bool,
    request_id: Option<String>,
    engine: &EngineHandle,
    prefs: &mut PreferencesStore,
) -> ControlReply {
    engine.set_auto_mode(enabled);
    prefs.set_auto_mode(enabled);
    prefs.save().warn_on_err();
    ControlReply::AutoMode {
        request_id,
        enabled,
    }
}

/// Write a reply as a single JSON line
pub fn write_reply<W: Write>(out: &mut W, reply: &ControlReply) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, reply)?;
    out.write_all(b"\n")?;
    out.flush()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::SyncService;
    use crate::protocol::ProviderResponse;
    use crate::provider::testing::ScriptedTransport;
    use crate::sink::JsonlSink;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn service_with_reply(reply: ProviderResponse) -> SyncService {
        let transport = ScriptedTransport::new();
        transport.auto_reply(Some(reply));
        let config = Config {
            poll_interval_ms: 60_000,
            refresh_timeout_ms: 5_000,
            ..Config::default()
        };
        SyncService::start(
            &config,
            Box::new(transport),
            Box::new(JsonlSink::new(std::io::sink())),
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_refresh_deserialization() {
        let cmd: ControlCommand = serde_json::from_str(r#"{"type": "refresh"}"#).unwrap();
        assert_eq!(cmd, ControlCommand::Refresh { request_id: None });
    }

    #[test]
    fn test_set_auto_mode_with_request_id() {
        let json = r#"{"type": "setAutoMode", "enabled": false, "requestId": "req-1"}"#;
        let cmd: ControlCommand = serde_json::from_str(json).unwrap();
        match &cmd {
            ControlCommand::SetAutoMode { enabled, .. } => assert!(!enabled),
            _ => panic!("Expected SetAutoMode command"),
        }
        assert_eq!(cmd.request_id(), Some("req-1"));
    }

    #[test]
    fn test_set_auto_mode_requires_enabled() {
        let result = serde_json::from_str::<ControlCommand>(r#"{"type": "setAutoMode"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_command_fails() {
        let result = serde_json::from_str::<ControlCommand>(r#"{"type": "show"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_commands_skips_bad_lines() {
        let input = "{\"type\":\"status\"}\n\nnot json\n{\"type\":\"quit\",\"requestId\":\"q\"}\n";
        let (tx, rx) = async_channel::bounded(10);
        read_commands(Cursor::new(input), &tx);

        assert_eq!(
            rx.try_recv().unwrap(),
            ControlCommand::Status { request_id: None }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ControlCommand::Quit {
                request_id: Some("q".to_string())
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_refresh_records_preferences() {
        let dir = TempDir::new().unwrap();
        let mut prefs = PreferencesStore::with_path(dir.path().join("preferences.json"));
        let colors = [("primary", "#d0bcff")].into_iter().collect();
        let service = service_with_reply(ProviderResponse::colors(colors));

        let (reply, flow) = handle_command(
            ControlCommand::Refresh {
                request_id: Some("r1".to_string()),
            },
            &service.handle(),
            &mut prefs,
        );
        assert_eq!(flow, Flow::Continue);
        match reply {
            ControlReply::RefreshResult { request_id, outcome } => {
                assert_eq!(request_id.as_deref(), Some("r1"));
                assert!(outcome.success);
            }
            other => panic!("Expected refresh result, got {:?}", other),
        }

        let mut reloaded = PreferencesStore::with_path(dir.path().join("preferences.json"));
        reloaded.load().unwrap();
        let saved = reloaded.get().last_colors.clone().unwrap();
        assert_eq!(saved.get_raw("primary"), Some("#d0bcff"));
        assert!(reloaded.get().last_update.is_some());
    }

    #[test]
    fn test_toggle_flips_and_persists_auto_mode() {
        let dir = TempDir::new().unwrap();
        let mut prefs = PreferencesStore::with_path(dir.path().join("preferences.json"));
        let service = service_with_reply(ProviderResponse::failure("unused"));
        let handle = service.handle();
        assert!(handle.auto_mode());

        let (reply, _) = handle_command(
            ControlCommand::ToggleAutoMode { request_id: None },
            &handle,
            &mut prefs,
        );
        assert!(matches!(reply, ControlReply::AutoMode { enabled: false, .. }));
        assert!(!handle.auto_mode());
        assert!(!prefs.auto_mode());
        assert!(prefs.path().exists());
    }

    #[test]
    fn test_quit_ends_session() {
        let dir = TempDir::new().unwrap();
        let mut prefs = PreferencesStore::with_path(dir.path().join("preferences.json"));
        let service = service_with_reply(ProviderResponse::failure("unused"));

        let (reply, flow) = handle_command(
            ControlCommand::Quit { request_id: None },
            &service.handle(),
            &mut prefs,
        );
        assert_eq!(flow, Flow::Quit);
        assert!(matches!(reply, ControlReply::Bye { .. }));
    }

    #[test]
    fn test_reply_is_one_json_line() {
        let reply = ControlReply::AutoMode {
            request_id: Some("a".to_string()),
            enabled: true,
        };
        let mut out = Vec::new();
        write_reply(&mut out, &reply).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["type"], "autoMode");
        assert_eq!(value["requestId"], "a");
        assert_eq!(value["enabled"], true);
    }

    #[test]
    fn test_failed_refresh_reply_shape() {
        let reply = ControlReply::RefreshResult {
            request_id: None,
            outcome: RefreshOutcome::failure(&crate::error::SyncError::NotConnected),
        };
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["type"], "refreshResult");
        assert_eq!(value["success"], false);
        assert!(value["error"].is_string());
        assert!(value.get("requestId").is_none());
    }
}
