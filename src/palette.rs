//! Palette received from the color provider
//!
//! A palette maps Material role names (`primary`, `on_surface`, ...) to raw
//! color strings. Roles may be missing and values are not validated here;
//! the theme mapper decides what to do with absent or malformed entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

/// Material color roles the sync engine knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaletteRole {
    Primary,
    OnPrimary,
    Secondary,
    OnSecondary,
    SecondaryContainer,
    OnSecondaryContainer,
    Background,
    OnBackground,
    Surface,
    OnSurface,
    SurfaceVariant,
    OnSurfaceVariant,
    SurfaceContainer,
    SurfaceContainerHigh,
    SurfaceContainerHighest,
    Outline,
    OutlineVariant,
}

impl PaletteRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::OnPrimary => "on_primary",
            Self::Secondary => "secondary",
            Self::OnSecondary => "on_secondary",
            Self::SecondaryContainer => "secondary_container",
            Self::OnSecondaryContainer => "on_secondary_container",
            Self::Background => "background",
            Self::OnBackground => "on_background",
            Self::Surface => "surface",
            Self::OnSurface => "on_surface",
            Self::SurfaceVariant => "surface_variant",
            Self::OnSurfaceVariant => "on_surface_variant",
            Self::SurfaceContainer => "surface_container",
            Self::SurfaceContainerHigh => "surface_container_high",
            Self::SurfaceContainerHighest => "surface_container_highest",
            Self::Outline => "outline",
            Self::OutlineVariant => "outline_variant",
        }
    }
}

impl std::fmt::Display for PaletteRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key colors shown in a status display, in display order
pub const SWATCH_ROLES: [PaletteRole; 8] = [
    PaletteRole::Primary,
    PaletteRole::Secondary,
    PaletteRole::Surface,
    PaletteRole::Background,
    PaletteRole::OnPrimary,
    PaletteRole::OnSecondary,
    PaletteRole::OnSurface,
    PaletteRole::OnBackground,
];

/// Named-color map supplied by the color provider.
///
/// Non-string values in the provider payload are dropped on deserialize so a
/// single odd entry can't reject the whole response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, serde_json::Value>")]
pub struct Palette(BTreeMap<String, String>);

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a known role
    pub fn get(&self, role: PaletteRole) -> Option<&str> {
        self.get_raw(role.as_str())
    }

    /// Look up any role name, including ones this crate doesn't model
    pub fn get_raw(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Key colors for a status display, skipping roles the palette lacks
    pub fn swatches(&self) -> Vec<(PaletteRole, &str)> {
        SWATCH_ROLES
            .iter()
            .filter_map(|role| self.get(*role).map(|value| (*role, value)))
            .collect()
    }
}

impl From<BTreeMap<String, serde_json::Value>> for Palette {
    fn from(raw: BTreeMap<String, serde_json::Value>) -> Self {
        let mut colors = BTreeMap::new();
        for (name, value) in raw {
            match value {
                serde_json::Value::String(s) => {
                    colors.insert(name, s);
                }
                other => {
                    debug!(role = %name, value = %other, "Dropping non-string palette entry");
                }
            }
        }
        Palette(colors)
    }
}

impl Serialize for Palette {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Palette {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Palette(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_role_and_raw_name() {
        let palette: Palette = [("primary", "#112233"), ("tertiary", "#445566")]
            .into_iter()
            .collect();
        assert_eq!(palette.get(PaletteRole::Primary), Some("#112233"));
        assert_eq!(palette.get_raw("tertiary"), Some("#445566"));
        assert_eq!(palette.get(PaletteRole::Surface), None);
    }

    #[test]
    fn test_deserialize_drops_non_string_values() {
        let json = r##"{"primary":"#6750a4","surface":null,"outline":42}"##;
        let palette: Palette = serde_json::from_str(json).unwrap();
        assert_eq!(palette.len(), 1);
        assert_eq!(palette.get(PaletteRole::Primary), Some("#6750a4"));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let palette: Palette = [("surface", "#000000")].into_iter().collect();
        let json = serde_json::to_string(&palette).unwrap();
        assert_eq!(json, r##"{"surface":"#000000"}"##);
    }

    #[test]
    fn test_swatches_follow_display_order_and_skip_missing() {
        let palette: Palette = [
            ("on_surface", "#1d1b20"),
            ("primary", "#6750a4"),
            ("surface", "#fef7ff"),
        ]
        .into_iter()
        .collect();

        let roles: Vec<PaletteRole> = palette.swatches().into_iter().map(|(r, _)| r).collect();
        assert_eq!(
            roles,
            vec![PaletteRole::Primary, PaletteRole::Surface, PaletteRole::OnSurface]
        );
    }
}
