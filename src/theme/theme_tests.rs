use super::*;
use crate::palette::{Palette, PaletteRole};

fn palette(pairs: &[(&str, &str)]) -> Palette {
    pairs.iter().copied().collect()
}

#[test]
fn test_mapping_table_covers_every_role_in_order() {
    assert_eq!(ROLE_MAPPINGS.len(), ThemeRole::ALL.len());
    for (mapping, role) in ROLE_MAPPINGS.iter().zip(ThemeRole::ALL) {
        assert_eq!(mapping.target, role);
    }
}

#[test]
fn test_empty_palette_uses_material_baseline() {
    let theme = map_palette(&Palette::new());

    assert_eq!(theme.colors.len(), ThemeRole::ALL.len());
    assert_eq!(theme.get(ThemeRole::Frame), Some(HexColor::from_rgb(0x6750a4)));
    assert_eq!(theme.get(ThemeRole::Toolbar), Some(HexColor::from_rgb(0xf3edf7)));
    assert_eq!(theme.get(ThemeRole::ToolbarText), Some(HexColor::from_rgb(0x1d1b20)));
    assert_eq!(theme.get(ThemeRole::TabLine), Some(HexColor::from_rgb(0x6750a4)));
    assert_eq!(theme.get(ThemeRole::PopupBorder), Some(HexColor::from_rgb(0xcac4d0)));
    assert_eq!(theme.get(ThemeRole::Sidebar), Some(HexColor::from_rgb(0xfef7ff)));
    assert_eq!(theme.get(ThemeRole::Icons), Some(HexColor::from_rgb(0x49454f)));
    // No surface means pure white, which is light
    assert_eq!(theme.color_scheme(), ColorScheme::Light);
}

#[test]
fn test_missing_primary_falls_back_for_frame() {
    let theme = map_palette(&palette(&[("surface", "#101010"), ("on_surface", "#eeeeee")]));
    assert_eq!(theme.get(ThemeRole::Frame).unwrap().to_hex(), "#6750a4");
    assert_eq!(theme.get(ThemeRole::ToolbarText).unwrap().to_hex(), "#eeeeee");
}

#[test]
fn test_primary_and_black_surface_is_dark() {
    let theme = map_palette(&palette(&[("primary", "#112233"), ("surface", "#000000")]));
    assert_eq!(theme.get(ThemeRole::Frame).unwrap().to_hex(), "#112233");
    assert_eq!(theme.get(ThemeRole::Sidebar).unwrap().to_hex(), "#000000");
    assert_eq!(theme.properties.color_scheme, ColorScheme::Dark);
    assert_eq!(theme.properties.content_color_scheme, ColorScheme::Dark);
}

#[test]
fn test_each_target_reads_only_its_source_role() {
    for mapping in ROLE_MAPPINGS.iter() {
        let theme = map_palette(&palette(&[(mapping.source.as_str(), "#0a0b0c")]));
        assert_eq!(
            theme.get(mapping.target),
            Some(HexColor::from_rgb(0x0a0b0c)),
            "{} should read {}",
            mapping.target,
            mapping.source
        );
        for other in ROLE_MAPPINGS.iter().filter(|m| m.source != mapping.source) {
            assert_eq!(theme.get(other.target), Some(other.default));
        }
    }
}

#[test]
fn test_malformed_value_degrades_single_field() {
    let theme = map_palette(&palette(&[("primary", "purple"), ("outline", "#123456")]));
    assert_eq!(theme.get(ThemeRole::Frame), Some(HexColor::from_rgb(0x6750a4)));
    assert_eq!(theme.get(ThemeRole::ToolbarFieldBorder), Some(HexColor::from_rgb(0x123456)));
}

#[test]
fn test_values_are_normalized() {
    let upper = map_palette(&palette(&[("primary", "ABCDEF")]));
    let lower = map_palette(&palette(&[("primary", "#abcdef")]));
    assert_eq!(upper, lower);
    assert_eq!(upper.get(ThemeRole::Frame).unwrap().to_hex(), "#abcdef");
}

#[test]
fn test_luminance_boundary_is_light() {
    assert_eq!(ColorScheme::from_luminance(0.5), ColorScheme::Light);
    assert_eq!(ColorScheme::from_luminance(0.4999), ColorScheme::Dark);
    assert_eq!(ColorScheme::from_luminance(0.0), ColorScheme::Dark);
    assert_eq!(ColorScheme::from_luminance(1.0), ColorScheme::Light);
}

#[test]
fn test_classify_near_mid_gray() {
    // 128 -> 0.502, 127 -> 0.498
    assert_eq!(classify(&palette(&[("surface", "#808080")])), ColorScheme::Light);
    assert_eq!(classify(&palette(&[("surface", "#7f7f7f")])), ColorScheme::Dark);
}

#[test]
fn test_classify_weights_green_over_blue() {
    // Pure green: 0.587 -> light. Pure blue: 0.114 -> dark.
    assert_eq!(classify(&palette(&[("surface", "#00ff00")])), ColorScheme::Light);
    assert_eq!(classify(&palette(&[("surface", "#0000ff")])), ColorScheme::Dark);
}

#[test]
fn test_malformed_surface_fails_closed_to_light() {
    for bad in ["#000", "black", "#00000g", ""] {
        assert_eq!(
            classify(&palette(&[("surface", bad)])),
            ColorScheme::Light,
            "{:?} should classify as light",
            bad
        );
    }
}

#[test]
fn test_mapping_is_deterministic() {
    let p = palette(&[
        ("primary", "#d0bcff"),
        ("surface", "#141218"),
        ("on_surface", "#e6e0e9"),
        ("outline_variant", "#49454f"),
    ]);
    let first = map_palette(&p);
    let second = map_palette(&p);
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn test_descriptor_json_shape() {
    let theme = map_palette(&palette(&[("primary", "#112233"), ("surface", "#000000")]));
    let value: serde_json::Value = serde_json::from_str(&theme.to_json().unwrap()).unwrap();

    assert_eq!(value["colors"]["frame"], "#112233");
    assert_eq!(value["colors"]["toolbar_top_separator"], "#cac4d0");
    assert_eq!(value["properties"]["color_scheme"], "dark");
    assert_eq!(value["properties"]["content_color_scheme"], "dark");
    assert_eq!(value["colors"].as_object().unwrap().len(), 27);

    let back: ThemeDescriptor = serde_json::from_value(value).unwrap();
    assert_eq!(back, theme);
}

#[test]
fn test_scheme_source_is_surface() {
    assert_eq!(mapper::SCHEME_SOURCE, PaletteRole::Surface);
}
