//! Material theme sync - keeps a host's chrome theme in step with
//! Material-You-style design tokens from an external color provider.
//!
//! The provider runs out of process and is asked for its palette over stdio.
//! The engine maps each palette to a concrete theme, skips themes identical to
//! the last one applied, and hands the rest to a `ThemeSink`.

pub mod change_gate;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod palette;
pub mod preferences;
pub mod protocol;
pub mod provider;
pub mod sink;
pub mod stdin_commands;
pub mod theme;
