//! Theme descriptor types
//!
//! Contains the closed set of browser-chrome surfaces (`ThemeRole`), the
//! light/dark classification (`ColorScheme`) and the descriptor handed to a
//! theme sink.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::hex_color::HexColor;

/// Chrome surfaces a theme assigns colors to.
///
/// Declaration order is the canonical key order used for fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeRole {
    // Main browser chrome
    Frame,
    FrameInactive,
    // Toolbar
    Toolbar,
    ToolbarText,
    ToolbarField,
    ToolbarFieldText,
    ToolbarFieldBorder,
    ToolbarFieldFocus,
    // Tabs
    TabBackgroundText,
    TabText,
    TabLine,
    TabLoading,
    // Buttons
    ButtonBackgroundHover,
    ButtonBackgroundActive,
    // Popups and menus
    Popup,
    PopupText,
    PopupBorder,
    PopupHighlight,
    PopupHighlightText,
    // Sidebar
    Sidebar,
    SidebarText,
    SidebarBorder,
    // Icons and accents
    Icons,
    IconsAttention,
    // Special states
    BookmarkText,
    ToolbarBottomSeparator,
    ToolbarTopSeparator,
}

impl ThemeRole {
    pub const ALL: [ThemeRole; 27] = [
        ThemeRole::Frame,
        ThemeRole::FrameInactive,
        ThemeRole::Toolbar,
        ThemeRole::ToolbarText,
        ThemeRole::ToolbarField,
        ThemeRole::ToolbarFieldText,
        ThemeRole::ToolbarFieldBorder,
        ThemeRole::ToolbarFieldFocus,
        ThemeRole::TabBackgroundText,
        ThemeRole::TabText,
        ThemeRole::TabLine,
        ThemeRole::TabLoading,
        ThemeRole::ButtonBackgroundHover,
        ThemeRole::ButtonBackgroundActive,
        ThemeRole::Popup,
        ThemeRole::PopupText,
        ThemeRole::PopupBorder,
        ThemeRole::PopupHighlight,
        ThemeRole::PopupHighlightText,
        ThemeRole::Sidebar,
        ThemeRole::SidebarText,
        ThemeRole::SidebarBorder,
        ThemeRole::Icons,
        ThemeRole::IconsAttention,
        ThemeRole::BookmarkText,
        ThemeRole::ToolbarBottomSeparator,
        ThemeRole::ToolbarTopSeparator,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Frame => "frame",
            Self::FrameInactive => "frame_inactive",
            Self::Toolbar => "toolbar",
            Self::ToolbarText => "toolbar_text",
            Self::ToolbarField => "toolbar_field",
            Self::ToolbarFieldText => "toolbar_field_text",
            Self::ToolbarFieldBorder => "toolbar_field_border",
            Self::ToolbarFieldFocus => "toolbar_field_focus",
            Self::TabBackgroundText => "tab_background_text",
            Self::TabText => "tab_text",
            Self::TabLine => "tab_line",
            Self::TabLoading => "tab_loading",
            Self::ButtonBackgroundHover => "button_background_hover",
            Self::ButtonBackgroundActive => "button_background_active",
            Self::Popup => "popup",
            Self::PopupText => "popup_text",
            Self::PopupBorder => "popup_border",
            Self::PopupHighlight => "popup_highlight",
            Self::PopupHighlightText => "popup_highlight_text",
            Self::Sidebar => "sidebar",
            Self::SidebarText => "sidebar_text",
            Self::SidebarBorder => "sidebar_border",
            Self::Icons => "icons",
            Self::IconsAttention => "icons_attention",
            Self::BookmarkText => "bookmark_text",
            Self::ToolbarBottomSeparator => "toolbar_bottom_separator",
            Self::ToolbarTopSeparator => "toolbar_top_separator",
        }
    }
}

impl std::fmt::Display for ThemeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Light/dark classification of a theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl ColorScheme {
    /// `Dark` strictly below 0.5, so a mid-gray boundary stays `Light`
    pub fn from_luminance(luminance: f64) -> Self {
        if luminance < 0.5 {
            ColorScheme::Dark
        } else {
            ColorScheme::Light
        }
    }

    pub fn is_dark(self) -> bool {
        self == ColorScheme::Dark
    }
}

impl std::fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

/// Non-color theme properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThemeProperties {
    pub color_scheme: ColorScheme,
    pub content_color_scheme: ColorScheme,
}

impl ThemeProperties {
    pub fn uniform(scheme: ColorScheme) -> Self {
        ThemeProperties {
            color_scheme: scheme,
            content_color_scheme: scheme,
        }
    }
}

/// Concrete theme handed to a theme sink.
///
/// Value type: two descriptors are the same theme iff their contents match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeDescriptor {
    pub colors: BTreeMap<ThemeRole, HexColor>,
    pub properties: ThemeProperties,
}

impl ThemeDescriptor {
    pub fn get(&self, role: ThemeRole) -> Option<HexColor> {
        self.colors.get(&role).copied()
    }

    pub fn color_scheme(&self) -> ColorScheme {
        self.properties.color_scheme
    }

    /// Serialize to the canonical JSON used for display and fingerprints
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
