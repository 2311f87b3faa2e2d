//! Provider request/response messages

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::palette::Palette;

/// Messages sent to the color provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ProviderRequest {
    /// Ask for the current palette
    GetColors,
}

/// Reply from the color provider
///
/// `{ success, colors?, error?, filePath? }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Palette>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Source file the provider read the palette from, for display
    #[serde(default, rename = "filePath", skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

/// A successful palette reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteReply {
    pub palette: Palette,
    pub file_path: Option<String>,
}

impl ProviderResponse {
    pub fn colors(palette: Palette) -> Self {
        ProviderResponse {
            success: true,
            colors: Some(palette),
            error: None,
            file_path: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        ProviderResponse {
            success: false,
            colors: None,
            error: Some(error.into()),
            file_path: None,
        }
    }

    /// Success requires both the flag and a palette
    pub fn into_result(self) -> Result<PaletteReply, SyncError> {
        match (self.success, self.colors) {
            (true, Some(palette)) => Ok(PaletteReply {
                palette,
                file_path: self.file_path,
            }),
            (true, None) => Err(SyncError::Provider(
                "response reported success without colors".to_string(),
            )),
            (false, _) => Err(SyncError::Provider(
                self.error.unwrap_or_else(|| "Unknown error".to_string()),
            )),
        }
    }
}
