//! Palette -> theme mapping
//!
//! Every chrome surface reads exactly one palette role and falls back to a
//! fixed Material baseline color when that role is missing or malformed.

use std::collections::BTreeMap;

use tracing::debug;

use super::hex_color::HexColor;
use super::types::{ColorScheme, ThemeDescriptor, ThemeProperties, ThemeRole};
use crate::palette::{Palette, PaletteRole};

/// One row of the mapping table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleMapping {
    pub target: ThemeRole,
    pub source: PaletteRole,
    pub default: HexColor,
}

const fn row(target: ThemeRole, source: PaletteRole, default: u32) -> RoleMapping {
    RoleMapping {
        target,
        source,
        default: HexColor::from_rgb(default),
    }
}

/// Surface used for light/dark classification, and its default when absent
pub const SCHEME_SOURCE: PaletteRole = PaletteRole::Surface;
pub const SCHEME_DEFAULT: HexColor = HexColor::WHITE;

/// The full mapping table, one row per `ThemeRole` in declaration order
pub const ROLE_MAPPINGS: [RoleMapping; 27] = [
    row(ThemeRole::Frame, PaletteRole::Primary, 0x6750a4),
    row(ThemeRole::FrameInactive, PaletteRole::SurfaceVariant, 0xe7e0ec),
    row(ThemeRole::Toolbar, PaletteRole::SurfaceContainer, 0xf3edf7),
    row(ThemeRole::ToolbarText, PaletteRole::OnSurface, 0x1d1b20),
    row(ThemeRole::ToolbarField, PaletteRole::SurfaceContainerHigh, 0xece6f0),
    row(ThemeRole::ToolbarFieldText, PaletteRole::OnSurface, 0x1d1b20),
    row(ThemeRole::ToolbarFieldBorder, PaletteRole::Outline, 0x79747e),
    row(ThemeRole::ToolbarFieldFocus, PaletteRole::SurfaceContainerHighest, 0xe6e0e9),
    row(ThemeRole::TabBackgroundText, PaletteRole::OnSurfaceVariant, 0x49454f),
    row(ThemeRole::TabText, PaletteRole::OnSurface, 0x1d1b20),
    row(ThemeRole::TabLine, PaletteRole::Primary, 0x6750a4),
    row(ThemeRole::TabLoading, PaletteRole::Primary, 0x6750a4),
    row(ThemeRole::ButtonBackgroundHover, PaletteRole::SecondaryContainer, 0xe8def8),
    row(ThemeRole::ButtonBackgroundActive, PaletteRole::Secondary, 0x625b71),
    row(ThemeRole::Popup, PaletteRole::SurfaceContainer, 0xf3edf7),
    row(ThemeRole::PopupText, PaletteRole::OnSurface, 0x1d1b20),
    row(ThemeRole::PopupBorder, PaletteRole::OutlineVariant, 0xcac4d0),
    row(ThemeRole::PopupHighlight, PaletteRole::SecondaryContainer, 0xe8def8),
    row(ThemeRole::PopupHighlightText, PaletteRole::OnSecondaryContainer, 0x1e192b),
    row(ThemeRole::Sidebar, PaletteRole::Surface, 0xfef7ff),
    row(ThemeRole::SidebarText, PaletteRole::OnSurface, 0x1d1b20),
    row(ThemeRole::SidebarBorder, PaletteRole::OutlineVariant, 0xcac4d0),
    row(ThemeRole::Icons, PaletteRole::OnSurfaceVariant, 0x49454f),
    row(ThemeRole::IconsAttention, PaletteRole::Primary, 0x6750a4),
    row(ThemeRole::BookmarkText, PaletteRole::OnSurface, 0x1d1b20),
    row(ThemeRole::ToolbarBottomSeparator, PaletteRole::OutlineVariant, 0xcac4d0),
    row(ThemeRole::ToolbarTopSeparator, PaletteRole::OutlineVariant, 0xcac4d0),
];

/// Resolve one palette role, degrading to `default` when absent or malformed
fn resolve(palette: &Palette, source: PaletteRole, default: HexColor) -> HexColor {
    match palette.get(source) {
        None => default,
        Some(raw) => HexColor::parse(raw).unwrap_or_else(|_| {
            debug!(role = %source, value = raw, "Malformed palette color, using default");
            default
        }),
    }
}

/// Classify a palette as light or dark from its surface color
pub fn classify(palette: &Palette) -> ColorScheme {
    let surface = resolve(palette, SCHEME_SOURCE, SCHEME_DEFAULT);
    ColorScheme::from_luminance(surface.luminance())
}

/// Map a provider palette to a complete theme descriptor.
///
/// Total and pure: every `ThemeRole` is present in the result and the same
/// palette always yields an identical descriptor.
pub fn map_palette(palette: &Palette) -> ThemeDescriptor {
    let colors: BTreeMap<ThemeRole, HexColor> = ROLE_MAPPINGS
        .iter()
        .map(|m| (m.target, resolve(palette, m.source, m.default)))
        .collect();

    ThemeDescriptor {
        colors,
        properties: ThemeProperties::uniform(classify(palette)),
    }
}
