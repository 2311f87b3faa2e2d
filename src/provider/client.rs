//! Connection state machine for the color provider
//!
//! `ColorSourceClient` owns at most one live link. It never blocks and never
//! reads the clock itself: every time-dependent operation takes `now`, and the
//! owner asks `next_deadline()` when it should call `poll()` again.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::transport::{LinkCallback, LinkEvent, LinkEventKind, ProviderLink, ProviderTransport};
use crate::error::{Result, SyncError};
use crate::logging;
use crate::protocol::{ProviderRequest, ProviderResponse};

/// Default wait before reconnecting after a drop or failed connect
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Ceiling for backed-off reconnect delays
pub const DEFAULT_MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        })
    }
}

/// When to retry after losing the provider
///
/// The default retries forever with a fixed delay.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    /// Stop scheduling reconnects after this many consecutive failures
    pub max_attempts: Option<u32>,
    /// Multiplier applied per consecutive failure; 1.0 keeps the delay fixed
    pub backoff_factor: f64,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy {
            delay: DEFAULT_RECONNECT_DELAY,
            max_attempts: None,
            backoff_factor: 1.0,
            max_delay: DEFAULT_MAX_RECONNECT_DELAY,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.backoff_factor <= 1.0 || attempt <= 1 {
            return self.delay;
        }
        let exponent = (attempt - 1).min(32) as i32;
        let scaled = self.delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        let cap = self.max_delay.max(self.delay);
        if !scaled.is_finite() || scaled >= cap.as_secs_f64() {
            cap
        } else {
            Duration::from_secs_f64(scaled)
        }
    }

    fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt <= max)
    }
}

/// What a link event means to the owner of the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientNotice {
    /// A response arrived on the live link
    Response(ProviderResponse),
    /// The live link went away; a reconnect may have been scheduled
    Disconnected,
    /// Event from a link that is no longer live
    Ignored,
}

pub struct ColorSourceClient {
    transport: Box<dyn ProviderTransport>,
    events: LinkCallback,
    policy: ReconnectPolicy,
    state: ConnectionState,
    link: Option<Box<dyn ProviderLink>>,
    /// Last generation handed to the transport
    generation: u64,
    /// Generation of the current link, if any
    live: Option<u64>,
    reconnect_at: Option<Instant>,
    /// Consecutive failures since the last successful connect
    failures: u32,
}

impl ColorSourceClient {
    pub fn new(
        transport: Box<dyn ProviderTransport>,
        policy: ReconnectPolicy,
        events: LinkCallback,
    ) -> Self {
        ColorSourceClient {
            transport,
            events,
            policy,
            state: ConnectionState::Disconnected,
            link: None,
            generation: 0,
            live: None,
            reconnect_at: None,
            failures: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Generation of the live link
    pub fn generation(&self) -> Option<u64> {
        self.live
    }

    /// When `poll()` next has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        self.reconnect_at
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Open a link if there is none. Idempotent.
    ///
    /// A failure leaves the client disconnected with a reconnect scheduled.
    pub fn connect(&mut self, now: Instant) -> Result<()> {
        if self.state != ConnectionState::Disconnected {
            return Ok(());
        }

        self.state = ConnectionState::Connecting;
        self.reconnect_at = None;
        self.generation += 1;
        let generation = self.generation;
        debug!(generation = generation, "Connecting to color provider");

        match self.transport.open(generation, self.events.clone()) {
            Ok(link) => {
                self.link = Some(link);
                self.live = Some(generation);
                self.state = ConnectionState::Connected;
                self.failures = 0;
                info!(generation = generation, "Connected to color provider");
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                let message = match e {
                    SyncError::ConnectionFailed(msg) => msg,
                    other => other.to_string(),
                };
                logging::log_error("PROVIDER", &message, Some("connect"));
                self.schedule_reconnect(now);
                Err(SyncError::ConnectionFailed(message))
            }
        }
    }

    /// Fire a due reconnect. Returns `None` when nothing was due.
    pub fn poll(&mut self, now: Instant) -> Option<Result<()>> {
        match self.reconnect_at {
            Some(at) if at <= now && self.state == ConnectionState::Disconnected => {
                self.reconnect_at = None;
                debug!(attempt = self.failures, "Reconnect due");
                Some(self.connect(now))
            }
            _ => None,
        }
    }

    /// Send one `getColors` request on the live link
    ///
    /// Never queues: without a link this fails with `NotConnected`.
    pub fn request_palette(&mut self, now: Instant) -> Result<()> {
        let link = match (self.state, self.link.as_mut()) {
            (ConnectionState::Connected, Some(link)) => link,
            _ => return Err(SyncError::NotConnected),
        };

        match link.send(&ProviderRequest::GetColors) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, "Provider write failed, dropping link");
                self.drop_link();
                self.schedule_reconnect(now);
                Err(SyncError::ConnectionUnavailable(e.to_string()))
            }
        }
    }

    pub fn handle_link_event(&mut self, event: LinkEvent, now: Instant) -> ClientNotice {
        if self.live != Some(event.generation) {
            debug!(
                generation = event.generation,
                live = ?self.live,
                "Ignoring event from stale provider link"
            );
            return ClientNotice::Ignored;
        }

        match event.kind {
            LinkEventKind::Message(response) => ClientNotice::Response(response),
            LinkEventKind::Closed(reason) => {
                let reason = reason.unwrap_or_else(|| "end of stream".to_string());
                warn!(generation = event.generation, reason = %reason, "Color provider disconnected");
                logging::log("PROVIDER", &format!("Disconnected: {}", reason));
                self.drop_link();
                self.schedule_reconnect(now);
                ClientNotice::Disconnected
            }
        }
    }

    /// Close the link and cancel any pending reconnect
    pub fn disconnect(&mut self) {
        self.drop_link();
        self.reconnect_at = None;
    }

    fn drop_link(&mut self) {
        self.link = None;
        self.live = None;
        self.state = ConnectionState::Disconnected;
    }

    fn schedule_reconnect(&mut self, now: Instant) {
        self.failures = self.failures.saturating_add(1);
        if !self.policy.allows(self.failures) {
            warn!(failures = self.failures, "Reconnect attempts exhausted");
            self.reconnect_at = None;
            return;
        }
        let delay = self.policy.delay_for(self.failures);
        debug!(delay_ms = delay.as_millis() as u64, attempt = self.failures, "Reconnect scheduled");
        self.reconnect_at = Some(now + delay);
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
