//! The synchronization engine
//!
//! `SyncEngine` is single-threaded state: it is driven by the service loop
//! (or directly by tests) with explicit `Instant`s and never sleeps.
//!
//! A cycle is: ensure connected -> request palette -> (response) map ->
//! change gate -> sink. Responses carry no ids, so a response resolves every
//! caller currently waiting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::outcome::{EngineStatus, RefreshOutcome};
use crate::change_gate::ChangeGate;
use crate::error::SyncError;
use crate::logging;
use crate::protocol::ProviderResponse;
use crate::provider::{ClientNotice, ColorSourceClient, LinkEvent};
use crate::sink::ThemeSink;
use crate::theme::{map_palette, ThemeDescriptor};

/// Engine tuning, usually taken from `Config`
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub poll_interval: Duration,
    pub discard_in_flight_on_disable: bool,
    /// Initial auto mode
    pub auto_mode: bool,
    /// How long a manual caller is kept waiting before it is failed
    pub refresh_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            poll_interval: crate::config::Config::default().poll_interval(),
            discard_in_flight_on_disable: false,
            auto_mode: true,
            refresh_timeout: crate::config::Config::default().refresh_timeout(),
        }
    }
}

/// Where a cycle was started from, for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Timer,
    Manual,
}

impl Origin {
    fn as_str(self) -> &'static str {
        match self {
            Origin::Timer => "timer",
            Origin::Manual => "manual",
        }
    }
}

/// A manual caller waiting for the next outcome
struct Waiter {
    reply: Sender<RefreshOutcome>,
    expires_at: Instant,
}

pub struct SyncEngine {
    client: ColorSourceClient,
    sink: Box<dyn ThemeSink>,
    gate: ChangeGate,
    current: Option<ThemeDescriptor>,
    auto_mode: Arc<AtomicBool>,
    options: EngineOptions,
    next_tick: Option<Instant>,
    in_flight: bool,
    /// Drop the next response unless someone is waiting for it
    discard_next: bool,
    waiters: Vec<Waiter>,
    last_error: Option<String>,
}

impl SyncEngine {
    pub fn new(client: ColorSourceClient, sink: Box<dyn ThemeSink>, options: EngineOptions) -> Self {
        let auto_mode = Arc::new(AtomicBool::new(options.auto_mode));
        SyncEngine {
            client,
            sink,
            gate: ChangeGate::new(),
            current: None,
            auto_mode,
            options,
            next_tick: None,
            in_flight: false,
            discard_next: false,
            waiters: Vec::new(),
            last_error: None,
        }
    }

    /// Shared view of the auto-mode flag for handles
    pub fn auto_mode_flag(&self) -> Arc<AtomicBool> {
        self.auto_mode.clone()
    }

    pub fn auto_mode(&self) -> bool {
        self.auto_mode.load(Ordering::SeqCst)
    }

    pub fn current_theme(&self) -> Option<&ThemeDescriptor> {
        self.current.as_ref()
    }

    pub fn client(&self) -> &ColorSourceClient {
        &self.client
    }

    /// Connect and arm the timer
    pub fn start(&mut self, now: Instant) {
        if let Err(e) = self.client.connect(now) {
            warn!(error = %e, "Color provider unavailable at startup");
            self.last_error = Some(e.user_message());
        }
        if self.auto_mode() {
            self.next_tick = Some(now + self.options.poll_interval);
        }
        info!(
            auto_mode = self.auto_mode(),
            poll_interval_ms = self.options.poll_interval.as_millis() as u64,
            "Sync engine started"
        );
    }

    /// Earliest instant at which `poll` has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        let expiry = self.waiters.iter().map(|w| w.expires_at).min();
        [self.next_tick, self.client.next_deadline(), expiry]
            .into_iter()
            .flatten()
            .min()
    }

    /// Run whatever is due: expired callers, reconnects, then the timer
    pub fn poll(&mut self, now: Instant) {
        self.expire_waiters(now);


        if let Some(Err(e)) = self.client.poll(now) {
            debug!(error = %e, "Scheduled reconnect failed");
            self.last_error = Some(e.user_message());
        }

        if let Some(at) = self.next_tick {
            if at <= now {
                self.tick(now);
            }
        }
    }

    fn tick(&mut self, now: Instant) {
        if !self.auto_mode() {
            self.next_tick = None;
            return;
        }
        self.next_tick = Some(now + self.options.poll_interval);
        if let Err(e) = self.begin_cycle(now) {
            // Routine while the provider is down; the reconnect loop handles it
            debug!(error = %e, origin = "timer", "Sync cycle not started");
            self.last_error = Some(e.user_message());
        }
    }

    /// Start a manual cycle. `reply` receives the outcome once it is known,
    /// or a timeout failure after `refresh_timeout`.
    pub fn refresh(&mut self, reply: Sender<RefreshOutcome>, now: Instant) {
        self.waiters.push(Waiter {
            reply,
            expires_at: now + self.options.refresh_timeout,
        });
        if let Err(e) = self.begin_cycle(now) {
            warn!(error = %e, origin = "manual", "Manual refresh failed");
            self.fail(&e);
        }
    }

    /// Ensure a link and send one request
    fn begin_cycle(&mut self, now: Instant) -> Result<(), SyncError> {
        self.client.connect(now)?;
        self.client.request_palette(now)?;
        self.in_flight = true;
        self.discard_next = false;
        Ok(())
    }

    pub fn set_auto_mode(&mut self, enabled: bool, now: Instant) {
        let was = self.auto_mode.swap(enabled, Ordering::SeqCst);
        if enabled {
            if !was || self.next_tick.is_none() {
                self.next_tick = Some(now + self.options.poll_interval);
            }
        } else {
            self.next_tick = None;
            if self.options.discard_in_flight_on_disable && self.in_flight {
                self.discard_next = true;
            }
        }
        logging::log("SYNC", &format!("Auto mode {}", if enabled { "enabled" } else { "disabled" }));
    }

    pub fn handle_link_event(&mut self, event: LinkEvent, now: Instant) {
        match self.client.handle_link_event(event, now) {
            ClientNotice::Ignored => {}
            ClientNotice::Disconnected => {
                self.in_flight = false;
                self.discard_next = false;
                if !self.waiters.is_empty() {
                    self.fail(&SyncError::ConnectionUnavailable(
                        "provider disconnected before answering".to_string(),
                    ));
                }
            }
            ClientNotice::Response(response) => self.handle_response(response),
        }
    }

    fn handle_response(&mut self, response: ProviderResponse) {
        let expected = self.in_flight;
        self.in_flight = false;

        if self.discard_next && self.waiters.is_empty() {
            debug!("Dropping response that arrived after auto mode was disabled");
            self.discard_next = false;
            return;
        }
        self.discard_next = false;
        if !expected {
            debug!("Response without an outstanding request, applying anyway");
        }

        let origin = if self.waiters.is_empty() {
            Origin::Timer
        } else {
            Origin::Manual
        };

        let reply = match response.into_result() {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, origin = origin.as_str(), "Provider could not supply colors");
                self.fail(&e);
                return;
            }
        };

        let theme = map_palette(&reply.palette);
        if !self.gate.should_apply(&theme) {
            logging::log_sync_event(origin.as_str(), false, self.gate.last_applied().map(|f| f.as_str()));
            self.last_error = None;
            self.resolve(RefreshOutcome::synced(reply, theme, false));
            return;
        }

        match self.sink.apply(&theme) {
            Ok(()) => {
                logging::log_sync_event(origin.as_str(), true, self.gate.last_applied().map(|f| f.as_str()));
                self.current = Some(theme.clone());
                self.last_error = None;
                self.resolve(RefreshOutcome::synced(reply, theme, true));
            }
            Err(e) => {
                self.gate.revert();
                error!(error = %e, origin = origin.as_str(), "Theme sink rejected theme");
                self.fail(&e);
            }
        }
    }

    fn fail(&mut self, error: &SyncError) {
        let message = error.user_message();
        if error.is_connection_error() {
            logging::log("SYNC", &message);
        } else {
            logging::log_error("SYNC", &message, None);
        }
        self.last_error = Some(message);
        self.resolve(RefreshOutcome::failure(error));
    }

    fn resolve(&mut self, outcome: RefreshOutcome) {
        for waiter in self.waiters.drain(..) {
            // The caller may have timed out and gone away
            let _ = waiter.reply.send(outcome.clone());
        }
    }

    /// Fail and forget callers whose timeout has passed
    fn expire_waiters(&mut self, now: Instant) {
        if !self.waiters.iter().any(|w| w.expires_at <= now) {
            return;
        }
        let timeout = SyncError::Timeout(self.options.refresh_timeout);
        let outcome = RefreshOutcome::failure(&timeout);
        let before = self.waiters.len();
        self.waiters.retain(|w| {
            if w.expires_at <= now {
                let _ = w.reply.send(outcome.clone());
                false
            } else {
                true
            }
        });
        debug!(expired = before - self.waiters.len(), "Manual refresh callers timed out");
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            auto_mode: self.auto_mode(),
            connection: self.client.state(),
            request_in_flight: self.in_flight,
            waiting_callers: self.waiters.len(),
            fingerprint: self.gate.last_applied().map(|f| f.to_string()),
            current_theme: self.current.clone(),
            last_error: self.last_error.clone(),
        }
    }

    /// Fail waiting callers and close the provider link
    pub fn shutdown(&mut self) {
        if !self.waiters.is_empty() {
            self.resolve(RefreshOutcome::failure(&SyncError::EngineStopped));
        }
        self.next_tick = None;
        self.client.disconnect();
        info!("Sync engine stopped");
    }
}
