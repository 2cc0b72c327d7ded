//! Settings Tests
//!
//! Tests for:
//! - `RenderSettings` JSON parsing (defaults, camelCase keys, nested contact shadow block)
//! - `SettingsPatch` parsing and application
//! - `TextureSlot` name parsing

use std::str::FromStr;

use verdant::VerdantError;
use verdant::renderer::settings::DEFAULT_SHADOW_RESOLUTION;
use verdant::renderer::{ContactShadowSettings, RenderSettings, SettingsPatch, TextureSlot};

// ============================================================================
// RenderSettings
// ============================================================================

#[test]
fn empty_json_yields_defaults() {
    let settings = RenderSettings::from_json("{}").unwrap();
    assert_eq!(settings, RenderSettings::default());
    assert!(settings.shadow_enabled);
    assert!(!settings.contact_shadow_enabled);
    assert_eq!(settings.shadow_resolution, DEFAULT_SHADOW_RESOLUTION);
}

#[test]
fn camel_case_keys_override_defaults() {
    let settings = RenderSettings::from_json(
        r#"{
            "shadowResolution": 4096,
            "contactShadowEnabled": true,
            "contactShadow": { "steps": 24 },
            "showGrid": false,
            "fpsMode": true
        }"#,
    )
    .unwrap();

    assert_eq!(settings.shadow_resolution, 4096);
    assert!(settings.contact_shadow_enabled);
    assert_eq!(settings.contact_shadow.steps, 24);
    // Missing nested fields keep their defaults.
    assert!((settings.contact_shadow.intensity - ContactShadowSettings::default().intensity).abs() < f32::EPSILON);
    assert!(!settings.show_grid);
    assert!(settings.show_axes);
    assert!(settings.fps_mode);
}

#[test]
fn malformed_json_is_a_settings_error() {
    let err = RenderSettings::from_json("{ shadowEnabled: ").unwrap_err();
    assert!(matches!(err, VerdantError::SettingsParse(_)));

    let err = RenderSettings::from_json(r#"{ "shadowResolution": "high" }"#).unwrap_err();
    assert!(matches!(err, VerdantError::SettingsParse(_)));
}

// ============================================================================
// SettingsPatch
// ============================================================================

#[test]
fn patch_from_json_applies_present_fields_only() {
    let patch = SettingsPatch::from_json(r#"{ "showAxes": false, "contactShadowIntensity": 0.25 }"#).unwrap();
    assert_eq!(patch.show_axes, Some(false));
    assert_eq!(patch.show_grid, None);

    let mut settings = RenderSettings::default();
    settings.apply(&patch);
    assert!(!settings.show_axes);
    assert!(settings.show_grid);
    assert!((settings.contact_shadow.intensity - 0.25).abs() < f32::EPSILON);
}

#[test]
fn empty_patch_is_identity() {
    let mut settings = RenderSettings::from_json(r#"{ "wireframeMode": true, "skyWhitePoint": 8.0 }"#).unwrap();
    let before = settings.clone();
    settings.apply(&SettingsPatch::default());
    assert_eq!(settings, before);
}

#[test]
fn patch_round_trips_through_settings_json() {
    let mut settings = RenderSettings::default();
    settings.apply(&SettingsPatch {
        contact_shadow_enabled: Some(true),
        contact_shadow_steps: Some(48),
        ..Default::default()
    });
    let json = serde_json::to_string(&settings).unwrap();
    assert!(json.contains("\"contactShadowEnabled\":true"));
    assert_eq!(RenderSettings::from_json(&json).unwrap(), settings);
}

// ============================================================================
// TextureSlot
// ============================================================================

#[test]
fn slot_names_parse_back() {
    for slot in TextureSlot::ALL {
        assert_eq!(TextureSlot::from_str(slot.name()).unwrap(), slot);
        assert_eq!(slot.to_string(), slot.name());
    }
}

#[test]
fn slot_aliases_parse() {
    assert_eq!("terrain_depth".parse::<TextureSlot>().unwrap(), TextureSlot::TerrainDepth);
    assert_eq!("hdrTexture".parse::<TextureSlot>().unwrap(), TextureSlot::Hdr);
    assert_eq!("contact_shadow".parse::<TextureSlot>().unwrap(), TextureSlot::ContactShadow);
}

#[test]
fn unknown_slot_is_reported_by_name() {
    let err = "normals".parse::<TextureSlot>().unwrap_err();
    assert!(matches!(&err, VerdantError::UnknownTextureSlot(name) if name == "normals"));
    assert_eq!(err.to_string(), "Unknown texture slot: normals");
}
