//! Color provider connection
//!
//! - `transport`: the `ProviderTransport`/`ProviderLink` seam and link events
//! - `native`: provider launched as a child process over stdio
//! - `client`: `ColorSourceClient`, connection state and reconnect policy

mod client;
mod native;
mod transport;

#[cfg(test)]
pub mod testing;

pub use client::*;
pub use native::NativeHostTransport;
pub use transport::*;
