//! Values the engine reports to callers

use serde::Serialize;

use crate::error::SyncError;
use crate::palette::Palette;
use crate::protocol::PaletteReply;
use crate::provider::ConnectionState;
use crate::theme::ThemeDescriptor;

/// Result of a manual refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    pub success: bool,
    /// The sink received this theme (false when unchanged or on failure)
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Palette>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RefreshOutcome {
    pub fn synced(reply: PaletteReply, theme: ThemeDescriptor, applied: bool) -> Self {
        RefreshOutcome {
            success: true,
            applied,
            colors: Some(reply.palette),
            theme: Some(theme),
            file_path: reply.file_path,
            error: None,
        }
    }

    pub fn failure(error: &SyncError) -> Self {
        RefreshOutcome {
            success: false,
            applied: false,
            colors: None,
            theme: None,
            file_path: None,
            error: Some(error.user_message()),
        }
    }
}

/// Snapshot of engine state for status displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub auto_mode: bool,
    pub connection: ConnectionState,
    pub request_in_flight: bool,
    pub waiting_callers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_theme: Option<ThemeDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}
