//! Color provider spoken to over a child process's stdio
//!
//! The provider is launched like a browser native-messaging host: requests
//! go to its stdin, responses come back on stdout, and stderr is diagnostic
//! output only.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;

use tracing::{debug, error, info, instrument, warn};

use super::transport::{LinkCallback, LinkEvent, ProviderLink, ProviderTransport};
use crate::config::ProviderConfig;
use crate::error::{Result, SyncError};
use crate::logging;
use crate::protocol::{encode_frame, FrameReader, Framing, ProviderRequest};

/// Spawns the provider process on every `open`
#[derive(Debug, Clone)]
pub struct NativeHostTransport {
    command: String,
    args: Vec<String>,
    framing: Framing,
}

impl NativeHostTransport {
    pub fn new(command: impl Into<String>, args: Vec<String>, framing: Framing) -> Self {
        NativeHostTransport {
            command: command.into(),
            args,
            framing,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone(), config.framing)
    }

    /// Expand `~` and look the command up on PATH
    pub fn resolve_command(&self) -> Result<PathBuf> {
        let expanded = shellexpand::tilde(&self.command);
        which::which(expanded.as_ref()).map_err(|e| {
            SyncError::ConnectionFailed(format!("provider '{}' not found: {}", self.command, e))
        })
    }
}

impl ProviderTransport for NativeHostTransport {
    #[instrument(skip_all, fields(command = %self.command, generation = generation))]
    fn open(&mut self, generation: u64, events: LinkCallback) -> Result<Box<dyn ProviderLink>> {
        let executable = self.resolve_command()?;
        debug!(executable = %executable.display(), args = ?self.args, "Spawning color provider");

        let mut child = Command::new(&executable)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                error!(error = %e, executable = %executable.display(), "Provider spawn failed");
                SyncError::ConnectionFailed(format!(
                    "failed to spawn '{}': {}",
                    executable.display(),
                    e
                ))
            })?;

        let pid = child.id();
        info!(pid = pid, generation = generation, "Color provider spawned");
        logging::log("PROVIDER", &format!("Spawned provider PID {} (link {})", pid, generation));

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let (stdin, stdout) = match (stdin, stdout) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                kill_child(&mut child);
                return Err(SyncError::ConnectionFailed(
                    "provider stdio was not captured".to_string(),
                ));
            }
        };

        let framing = self.framing;
        let reader_events = events.clone();
        let spawned = thread::Builder::new()
            .name(format!("provider-reader-{}", generation))
            .spawn(move || {
                let mut reader = FrameReader::new(stdout, framing);
                loop {
                    match reader.next_response() {
                        Ok(Some(response)) => reader_events(LinkEvent::message(generation, response)),
                        Ok(None) => {
                            reader_events(LinkEvent::closed(generation, None));
                            break;
                        }
                        Err(e) => {
                            warn!(error = %e, generation = generation, "Provider read failed");
                            reader_events(LinkEvent::closed(generation, Some(e.to_string())));
                            break;
                        }
                    }
                }
                debug!(generation = generation, "Provider reader exiting");
            });
        if let Err(e) = spawned {
            kill_child(&mut child);
            return Err(SyncError::ConnectionFailed(format!(
                "failed to start reader thread: {}",
                e
            )));
        }

        if let Some(stderr) = child.stderr.take() {
            let stderr_thread = thread::Builder::new()
                .name(format!("provider-stderr-{}", generation))
                .spawn(move || {
                    for line in BufReader::new(stderr).lines() {
                        match line {
                            Ok(line) => debug!(target: "PROVIDER", "{}", line),
                            Err(_) => break,
                        }
                    }
                });
            if let Err(e) = stderr_thread {
                warn!(error = %e, "Could not start provider stderr reader");
            }
        }

        Ok(Box::new(NativeHostLink {
            child,
            stdin,
            framing,
            generation,
        }))
    }
}

/// One running provider process
struct NativeHostLink {
    child: Child,
    stdin: ChildStdin,
    framing: Framing,
    generation: u64,
}

impl ProviderLink for NativeHostLink {
    fn send(&mut self, request: &ProviderRequest) -> Result<()> {
        let frame = encode_frame(request, self.framing)?;
        self.stdin.write_all(&frame)?;
        self.stdin.flush()?;
        debug!(generation = self.generation, bytes = frame.len(), "Sent provider request");
        Ok(())
    }
}

impl Drop for NativeHostLink {
    fn drop(&mut self) {
        debug!(generation = self.generation, pid = self.child.id(), "Closing provider link");
        kill_child(&mut self.child);
    }
}

fn kill_child(child: &mut Child) {
    match child.try_wait() {
        Ok(Some(status)) => debug!(status = %status, "Provider already exited"),
        _ => {
            if let Err(e) = child.kill() {
                debug!(error = %e, "Provider kill failed");
            }
            // Reap to avoid a zombie
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_missing_command_is_connection_failure() {
        let mut transport = NativeHostTransport::new(
            "definitely-not-a-real-color-provider-binary",
            Vec::new(),
            Framing::Native,
        );
        let events: LinkCallback = Arc::new(|_| {});
        match transport.open(1, events) {
            Err(SyncError::ConnectionFailed(msg)) => assert!(msg.contains("not found")),
            Err(other) => panic!("Expected ConnectionFailed, got {:?}", other),
            Ok(_) => panic!("Expected ConnectionFailed, got a link"),
        }
    }

    #[test]
    fn test_from_config_copies_provider_settings() {
        let config = ProviderConfig {
            command: "reader".to_string(),
            args: vec!["--stdio".to_string()],
            framing: Framing::Jsonl,
        };
        let transport = NativeHostTransport::from_config(&config);
        assert_eq!(transport.command, "reader");
        assert_eq!(transport.args, vec!["--stdio".to_string()]);
        assert_eq!(transport.framing, Framing::Jsonl);
    }
}
