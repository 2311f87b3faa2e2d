//! Theme synchronization engine
//!
//! # Module Structure
//!
//! - `sync_engine` - `SyncEngine`, the timer/refresh/apply state machine
//! - `service` - engine thread, `EngineHandle` and `SyncService`
//! - `outcome` - `RefreshOutcome` and `EngineStatus`

mod outcome;
mod service;
mod sync_engine;

pub use outcome::{EngineStatus, RefreshOutcome};
pub use service::{EngineEvent, EngineHandle, SyncService};
pub use sync_engine::{EngineOptions, SyncEngine};

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
