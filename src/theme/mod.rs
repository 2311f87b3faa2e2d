//! Theme module - palette to browser-chrome theme mapping
//!
//! This module provides functionality for:
//! - Hex color parsing and luminance
//! - The closed set of chrome surfaces and the light/dark scheme
//! - The pure palette -> theme mapping with Material baseline defaults
//!
//! # Module Structure
//!
//! - `hex_color` - Hex color parsing and serialization
//! - `types` - ThemeRole, ColorScheme, ThemeDescriptor
//! - `mapper` - Mapping table and `map_palette`

pub mod hex_color;
pub mod mapper;
mod types;

pub use hex_color::HexColor;
pub use mapper::{classify, map_palette, RoleMapping, ROLE_MAPPINGS};
pub use types::{ColorScheme, ThemeDescriptor, ThemeProperties, ThemeRole};

#[cfg(test)]
#[path = "theme_tests.rs"]
mod tests;
