//! In-memory provider transport for tests
//!
//! `ScriptedTransport` is a cloneable handle: hand one clone to the client and
//! keep another to fail opens, inspect requests and push events.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::transport::{LinkCallback, LinkEvent, ProviderLink, ProviderTransport};
use crate::error::{Result, SyncError};
use crate::protocol::{ProviderRequest, ProviderResponse};

#[derive(Default)]
struct ScriptState {
    /// Errors returned by upcoming `open` calls, front first
    open_failures: VecDeque<String>,
    opens: u32,
    /// Generation and callback of the most recently opened link
    current: Option<(u64, LinkCallback)>,
    sent: Vec<(u64, ProviderRequest)>,
    fail_writes: bool,
    /// Reply pushed synchronously for every request
    auto_reply: Option<ProviderResponse>,
}

#[derive(Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_opens(&self, count: usize, reason: &str) {
        let mut state = self.state.lock();
        for _ in 0..count {
            state.open_failures.push_back(reason.to_string());
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    pub fn auto_reply(&self, response: Option<ProviderResponse>) {
        self.state.lock().auto_reply = response;
    }

    pub fn open_count(&self) -> u32 {
        self.state.lock().opens
    }

    pub fn sent_count(&self) -> usize {
        self.state.lock().sent.len()
    }

    pub fn current_generation(&self) -> Option<u64> {
        self.state.lock().current.as_ref().map(|(generation, _)| *generation)
    }

    /// Deliver a response on the most recent link
    pub fn respond(&self, response: ProviderResponse) {
        self.emit_current(|generation| LinkEvent::message(generation, response));
    }

    /// Close the most recent link from the provider side
    pub fn close(&self, reason: Option<&str>) {
        self.emit_current(|generation| LinkEvent::closed(generation, reason.map(str::to_string)));
    }

    /// Deliver an arbitrary event through the most recent callback
    pub fn emit(&self, event: LinkEvent) {
        let callback = self.state.lock().current.as_ref().map(|(_, cb)| cb.clone());
        if let Some(callback) = callback {
            callback(event);
        }
    }

    fn emit_current(&self, build: impl FnOnce(u64) -> LinkEvent) {
        // Release the lock before calling out
        let current = self.state.lock().current.clone();
        if let Some((generation, callback)) = current {
            callback(build(generation));
        }
    }
}

impl ProviderTransport for ScriptedTransport {
    fn open(&mut self, generation: u64, events: LinkCallback) -> Result<Box<dyn ProviderLink>> {
        let mut state = self.state.lock();
        state.opens += 1;
        if let Some(reason) = state.open_failures.pop_front() {
            return Err(SyncError::ConnectionFailed(reason));
        }
        state.current = Some((generation, events));
        Ok(Box::new(ScriptedLink {
            generation,
            state: self.state.clone(),
        }))
    }
}

struct ScriptedLink {
    generation: u64,
    state: Arc<Mutex<ScriptState>>,
}

impl ProviderLink for ScriptedLink {
    fn send(&mut self, request: &ProviderRequest) -> Result<()> {
        let reply = {
            let mut state = self.state.lock();
            if state.fail_writes {
                return Err(SyncError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "scripted write failure",
                )));
            }
            state.sent.push((self.generation, request.clone()));
            match (&state.auto_reply, &state.current) {
                (Some(resp), Some((generation, cb))) if *generation == self.generation => {
                    Some((cb.clone(), resp.clone()))
                }
                _ => None,
            }
        };
        if let Some((callback, response)) = reply {
            callback(LinkEvent::message(self.generation, response));
        }
        Ok(())
    }
}
