//! Engine thread and the handle the UI talks to
//!
//! One thread owns the `SyncEngine` and drains a single queue of
//! `EngineEvent`s. Timer ticks and reconnects are deadlines: the loop waits on
//! the queue until the nearest one. Provider reader threads only forward
//! link events into the same queue, so no two cycles ever interleave.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::outcome::{EngineStatus, RefreshOutcome};
use super::sync_engine::{EngineOptions, SyncEngine};
use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::provider::{ColorSourceClient, LinkCallback, LinkEvent, ProviderTransport};
use crate::sink::ThemeSink;

/// Everything the engine thread reacts to
pub enum EngineEvent {
    Link(LinkEvent),
    Refresh(Sender<RefreshOutcome>),
    SetAutoMode(bool),
    Status(Sender<EngineStatus>),
    Shutdown,
}

/// Cloneable, thread-safe front end to a running engine
#[derive(Clone)]
pub struct EngineHandle {
    tx: Sender<EngineEvent>,
    auto_mode: Arc<AtomicBool>,
    refresh_timeout: Duration,
}

impl EngineHandle {
    /// Run one cycle now and wait for its outcome
    ///
    /// Waits at most the configured refresh timeout. Failures come back as an
    /// unsuccessful outcome, never as a panic.
    pub fn refresh(&self) -> RefreshOutcome {
        let (reply_tx, reply_rx) = mpsc::channel();
        if self.tx.send(EngineEvent::Refresh(reply_tx)).is_err() {
            return RefreshOutcome::failure(&SyncError::EngineStopped);
        }
        match reply_rx.recv_timeout(self.refresh_timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                warn!(timeout_ms = self.refresh_timeout.as_millis() as u64, "Manual refresh timed out");
                RefreshOutcome::failure(&SyncError::Timeout(self.refresh_timeout))
            }
            Err(RecvTimeoutError::Disconnected) => RefreshOutcome::failure(&SyncError::EngineStopped),
        }
    }

    pub fn set_auto_mode(&self, enabled: bool) {
        self.auto_mode.store(enabled, Ordering::SeqCst);
        if self.tx.send(EngineEvent::SetAutoMode(enabled)).is_err() {
            debug!("Engine gone, auto mode change not delivered");
        }
    }

    pub fn auto_mode(&self) -> bool {
        self.auto_mode.load(Ordering::SeqCst)
    }

    /// Snapshot of engine state, or None if the engine has stopped
    pub fn status(&self) -> Option<EngineStatus> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx.send(EngineEvent::Status(reply_tx)).ok()?;
        reply_rx.recv_timeout(self.refresh_timeout).ok()
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(EngineEvent::Shutdown);
    }
}

/// Owns the engine thread. Dropping it stops the engine.
pub struct SyncService {
    handle: EngineHandle,
    thread: Option<JoinHandle<()>>,
}

impl SyncService {
    /// Build the engine from `config` and start its thread
    pub fn start(
        config: &Config,
        transport: Box<dyn ProviderTransport>,
        sink: Box<dyn ThemeSink>,
        auto_mode: bool,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<EngineEvent>();

        let link_tx = tx.clone();
        let events: LinkCallback = Arc::new(move |event| {
            // Fails only once the engine has stopped
            let _ = link_tx.send(EngineEvent::Link(event));
        });

        let client = ColorSourceClient::new(transport, config.reconnect_policy(), events);
        let options = EngineOptions {
            poll_interval: config.poll_interval(),
            discard_in_flight_on_disable: config.discard_in_flight_on_disable,
            auto_mode,
            refresh_timeout: config.refresh_timeout(),
        };
        let engine = SyncEngine::new(client, sink, options);

        let handle = EngineHandle {
            tx,
            auto_mode: engine.auto_mode_flag(),
            refresh_timeout: config.refresh_timeout(),
        };

        let thread = thread::Builder::new()
            .name("sync-engine".to_string())
            .spawn(move || run_engine(engine, rx))?;

        info!(auto_mode = auto_mode, "Sync service started");
        Ok(SyncService {
            handle,
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Stop the engine and wait for its thread
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.handle.shutdown();
            if thread.join().is_err() {
                warn!("Sync engine thread panicked");
            }
            info!("Sync service stopped");
        }
    }
}

impl Drop for SyncService {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_engine(mut engine: SyncEngine, rx: Receiver<EngineEvent>) {
    engine.start(Instant::now());

    loop {
        engine.poll(Instant::now());

        let event = match engine.next_deadline() {
            Some(deadline) => {
                let wait = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(wait) {
                    Ok(event) => event,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(event) => event,
                Err(_) => break,
            },
        };

        let now = Instant::now();
        match event {
            EngineEvent::Link(link_event) => engine.handle_link_event(link_event, now),
            EngineEvent::Refresh(reply) => engine.refresh(reply, now),
            EngineEvent::SetAutoMode(enabled) => engine.set_auto_mode(enabled, now),
            EngineEvent::Status(reply) => {
                let _ = reply.send(engine.status());
            }
            EngineEvent::Shutdown => break,
        }
    }

    engine.shutdown();
}
