//! Unit tests for configuration module
//!
//! Tests configuration parsing, validation, serialization/deserialization,
//! and edge cases in configuration handling.

use super::*;
use crate::window::transition::TransitionTimings;
use anyhow::Result;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_default_configuration_is_valid() {
    let config = StrataConfig::default();
    assert!(config.validate().is_ok());

    assert_eq!(config.stack.min_order, 10);
    assert_eq!(config.stack.order_step, 2);
    assert_eq!(config.stack.shadow_alpha, 0.7);
    assert_eq!(config.windows.path_to_windows, "Windows");
    assert!(config.windows.templates.is_empty());
}

#[test]
fn test_default_animation_timings() {
    let animation = AnimationConfig::default();
    assert_eq!(animation.alpha_ms, 300);
    assert_eq!(animation.combined_alpha_ms, 500);
    assert_eq!(animation.combined_position_ms, 300);

    // Combined hide: fade 300 ms, slide 500 ms
    assert_eq!(animation.combined_hide_alpha_ms(), 300);
    assert_eq!(animation.combined_hide_position_ms(), 500);
}

#[test]
fn test_hide_delta_never_goes_negative() {
    let animation = AnimationConfig {
        combined_alpha_ms: 100,
        hide_alpha_delta_ms: -400,
        ..AnimationConfig::default()
    };
    assert_eq!(animation.combined_hide_alpha_ms(), 0);
}

#[test]
fn test_timings_follow_animation_config() {
    let animation = AnimationConfig {
        alpha_ms: 120,
        drag_settle_ms: 40,
        ..AnimationConfig::default()
    };
    let timings = TransitionTimings::from(&animation);
    assert_eq!(timings.alpha, Duration::from_millis(120));
    assert_eq!(timings.drag_settle, Duration::from_millis(40));
    assert_eq!(timings.combined_hide_position, Duration::from_millis(500));
}

#[test]
fn test_configuration_serialization_roundtrip() -> Result<()> {
    let mut original = StrataConfig::default();
    original.stack.shadow_alpha = 0.5;
    original
        .windows
        .insert(WindowTemplate::new("Shop", "pos").with_flags(WindowFlags {
            needs_shadow: false,
            ..WindowFlags::default()
        }));

    let toml_string = toml::to_string(&original)?;
    let deserialized: StrataConfig = toml::from_str(&toml_string)?;

    assert_eq!(original, deserialized);
    Ok(())
}

#[test]
fn test_configuration_from_file() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("strata.toml");

    let config_content = r#"
[stack]
min_order = 100
order_step = 4
shadow_alpha = 0.4
shadow_fade_ms = 150

[animation]
alpha_ms = 250
drag_hide_ms = 180

[windows]
path_to_windows = "Ui/Windows"

[[windows.templates]]
kind = "Settings"
transition = "alpha"

[[windows.templates]]
kind = "Inventory"
transition = "drag"
show_side = "left"
hide_side = "right"
multiplier = 0.5
drag = true
drag_offset = [20.0, 0.0]
show_ease = "out-quart"
hide_ease = "linear"

[windows.templates.flags]
needs_shadow = false
destroy_after_close = false
uses_activity = true
"#;

    fs::write(&config_path, config_content)?;
    let config = StrataConfig::load(&config_path)?;

    assert_eq!(config.stack.min_order, 100);
    assert_eq!(config.stack.order_step, 4);
    assert_eq!(config.stack.shadow_alpha, 0.4);
    assert_eq!(config.stack.shadow_fade(), Duration::from_millis(150));
    // Unspecified keys keep their defaults
    assert_eq!(config.stack.destroy_grace_ms, 500);

    assert_eq!(config.animation.alpha_ms, 250);
    assert_eq!(config.animation.drag_hide_ms, 180);
    assert_eq!(config.animation.position_ms, 300);

    assert_eq!(config.windows.path_to_windows, "Ui/Windows");
    assert_eq!(config.windows.templates.len(), 2);

    let settings = config.windows.template(&"Settings".into()).expect("settings");
    assert_eq!(settings.transition, "alpha");
    assert_eq!(settings.show_side, Side::Top);
    assert_eq!(settings.flags, WindowFlags::default());

    let inventory = config.windows.template(&"Inventory".into()).expect("inventory");
    assert_eq!(inventory.show_side, Side::Left);
    assert_eq!(inventory.hide_side, Side::Right);
    assert_eq!(inventory.multiplier, 0.5);
    assert!(inventory.drag);
    assert_eq!(inventory.drag_offset, [20.0, 0.0]);
    assert_eq!(inventory.show_ease, Ease::OutQuart);
    assert_eq!(inventory.hide_ease, Ease::Linear);
    assert!(!inventory.flags.needs_shadow);
    assert!(!inventory.flags.destroy_after_close);
    assert!(inventory.flags.uses_activity);
    assert!(inventory.flags.back_button_enabled);

    Ok(())
}

#[test]
fn test_partial_configuration_uses_defaults() -> Result<()> {
    let config: StrataConfig = toml::from_str("[stack]\nmin_order = 50\n")?;
    assert_eq!(config.stack.min_order, 50);
    assert_eq!(config.stack.order_step, 2);
    assert_eq!(config.animation, AnimationConfig::default());
    assert_eq!(config.windows, WindowsConfig::default());
    Ok(())
}

#[test]
fn test_empty_configuration_is_default() -> Result<()> {
    let config: StrataConfig = toml::from_str("")?;
    assert_eq!(config, StrataConfig::default());
    Ok(())
}

#[test]
fn test_template_defaults_when_omitted() -> Result<()> {
    let template: WindowTemplate = toml::from_str("kind = \"Toast\"\n")?;
    assert_eq!(template.kind.as_str(), "Toast");
    assert_eq!(template.transition, "instant");
    assert_eq!(template.show_side, Side::Top);
    assert_eq!(template.hide_side, Side::Bottom);
    assert_eq!(template.multiplier, 1.0);
    assert!(!template.drag);
    assert_eq!(template.show_ease, Ease::OutQuad);
    assert_eq!(template.hide_ease, Ease::InQuad);
    Ok(())
}

#[test]
fn test_invalid_toml_is_rejected() {
    let result: std::result::Result<StrataConfig, _> = toml::from_str("[stack\nmin_order = 1");
    assert!(result.is_err());
}

#[test]
fn test_wrong_types_are_rejected() {
    let result: std::result::Result<StrataConfig, _> =
        toml::from_str("[stack]\nshadow_alpha = \"dark\"\n");
    assert!(result.is_err());
}

#[test]
fn test_missing_file_fails() {
    let result = StrataConfig::load("/nonexistent/path/strata.toml");
    assert!(result.is_err());
}

#[test]
fn test_validation_rejects_small_order_step() {
    let mut config = StrataConfig::default();
    config.stack.order_step = 1;
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_shadow_alpha_out_of_range() {
    let mut config = StrataConfig::default();
    config.stack.shadow_alpha = 1.5;
    assert!(config.validate().is_err());

    config.stack.shadow_alpha = -0.1;
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_empty_fallback_root() {
    let mut config = StrataConfig::default();
    config.windows.path_to_windows = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_duplicate_and_empty_kinds() {
    let mut config = StrataConfig::default();
    config.windows.templates.push(WindowTemplate::new("Shop", "alpha"));
    config.windows.templates.push(WindowTemplate::new("Shop", "pos"));
    assert!(config.validate().is_err());

    let mut config = StrataConfig::default();
    config.windows.templates.push(WindowTemplate::new("", "alpha"));
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_negative_multiplier() {
    let mut config = StrataConfig::default();
    let mut template = WindowTemplate::new("Shop", "pos");
    template.multiplier = -1.0;
    config.windows.insert(template);
    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_file_fails_validation_on_load() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("bad.toml");
    fs::write(&config_path, "[stack]\norder_step = 0\n")?;

    let err = StrataConfig::load(&config_path).unwrap_err();
    assert!(err.to_string().contains("order_step"));
    Ok(())
}

#[test]
fn test_save_and_load_roundtrip() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("saved.toml");

    let mut config = StrataConfig::default();
    config.animation.combined_alpha_ms = 420;
    config.windows.insert(WindowTemplate::new("Rate", "all"));
    config.save(&config_path)?;

    let loaded = StrataConfig::load(&config_path)?;
    assert_eq!(loaded, config);
    Ok(())
}

#[test]
fn test_tilde_path_expansion() -> Result<()> {
    let home = tempdir()?;
    fs::write(home.path().join("strata.toml"), "[stack]\nmin_order = 7\n")?;

    let previous = std::env::var("HOME").ok();
    std::env::set_var("HOME", home.path());
    let result = StrataConfig::load("~/strata.toml");
    match previous {
        Some(value) => std::env::set_var("HOME", value),
        None => std::env::remove_var("HOME"),
    }

    assert_eq!(result?.stack.min_order, 7);
    Ok(())
}

#[test]
fn test_insert_replaces_same_kind() {
    let mut windows = WindowsConfig::default();
    windows.insert(WindowTemplate::new("Shop", "alpha"));
    windows.insert(WindowTemplate::new("Shop", "pos"));
    assert_eq!(windows.templates.len(), 1);
    assert_eq!(windows.template(&"Shop".into()).map(|t| t.transition.as_str()), Some("pos"));
    assert_eq!(windows.path_to_window(&"Shop".into()), "Windows/Shop");
}

#[test]
fn test_merge_partial_overrides_changed_sections() {
    let mut base = StrataConfig::default();
    base.windows.insert(WindowTemplate::new("Shop", "alpha"));
    base.windows.insert(WindowTemplate::new("Settings", "alpha"));

    let mut partial = StrataConfig::default();
    partial.stack.shadow_alpha = 0.3;
    partial.windows.insert(WindowTemplate::new("Shop", "drag"));
    partial.windows.insert(WindowTemplate::new("Rate", "pos"));

    let merged = base.merge_partial(partial);
    assert_eq!(merged.stack.shadow_alpha, 0.3);
    assert_eq!(merged.animation, AnimationConfig::default());
    assert_eq!(merged.windows.path_to_windows, "Windows");
    assert_eq!(merged.windows.templates.len(), 3);
    assert_eq!(
        merged.windows.template(&"Shop".into()).map(|t| t.transition.as_str()),
        Some("drag")
    );
    assert!(merged.windows.template(&"Settings".into()).is_some());
}

#[test]
fn test_merge_partial_keeps_base_when_partial_is_default() {
    let mut base = StrataConfig::default();
    base.stack.min_order = 40;
    base.windows.path_to_windows = "Ui".to_string();

    let merged = base.clone().merge_partial(StrataConfig::default());
    assert_eq!(merged, base);
}
