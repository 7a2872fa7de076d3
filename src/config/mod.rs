//! Configuration management for Strata
//!
//! This module handles loading, parsing, and validating configuration
//! from TOML files. It combines settings for the stack (sorting order,
//! shadow), transition timings, and the window template registry.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::effects::Ease;
use crate::window::transition::Side;
use crate::window::{WindowFlags, WindowKind};

/// Main configuration struct containing all Strata settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StrataConfig {
    /// Stack ordering and shadow behavior
    #[serde(default)]
    pub stack: StackConfig,

    /// Transition timings
    #[serde(default)]
    pub animation: AnimationConfig,

    /// Window templates
    #[serde(default)]
    pub windows: WindowsConfig,
}

/// Sorting order and shadow settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StackConfig {
    /// Sorting order of the shadow when the first window opens
    pub min_order: i32,

    /// Order slots consumed per open window (shadow + window)
    pub order_step: i32,

    /// Shadow opacity while shown (0.0-1.0)
    pub shadow_alpha: f32,

    /// Shadow fade duration (milliseconds)
    pub shadow_fade_ms: u32,

    /// Delay between a destroy-after-close window hiding and its destruction (milliseconds)
    pub destroy_grace_ms: u32,
}

/// Transition timings (milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnimationConfig {
    /// Alpha fade in/out
    pub alpha_ms: u32,

    /// Positional slide in/out
    pub position_ms: u32,

    /// Combined fade duration on show
    pub combined_alpha_ms: u32,

    /// Combined slide duration on show
    pub combined_position_ms: u32,

    /// Added to the combined fade duration when hiding
    pub hide_alpha_delta_ms: i32,

    /// Added to the combined slide duration when hiding
    pub hide_position_delta_ms: i32,

    /// Drag variant: slide in (to the drag offset when dragging)
    pub drag_overshoot_ms: u32,

    /// Drag variant: settle from the drag offset back to rest
    pub drag_settle_ms: u32,

    /// Drag variant: slide out
    pub drag_hide_ms: u32,
}

/// Window template registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowsConfig {
    /// Root used for convention-based template lookup ("<root>/<kind>")
    pub path_to_windows: String,

    /// Explicitly configured templates
    pub templates: Vec<WindowTemplate>,
}

/// Declared defaults and transition for one window kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowTemplate {
    pub kind: WindowKind,

    /// Transition selector ("alpha", "pos", "all", "drag", "pos_alpha", "instant")
    #[serde(default = "WindowTemplate::default_transition")]
    pub transition: String,

    /// Edge a positional window enters from
    #[serde(default = "WindowTemplate::default_show_side")]
    pub show_side: Side,

    /// Edge a positional window leaves through
    #[serde(default = "WindowTemplate::default_hide_side")]
    pub hide_side: Side,

    /// Scales the edge offset relative to the parent size
    #[serde(default = "WindowTemplate::default_multiplier")]
    pub multiplier: f32,

    /// Drag variant: overshoot to `drag_offset` before settling
    #[serde(default)]
    pub drag: bool,

    /// Drag variant: overshoot position relative to rest
    #[serde(default)]
    pub drag_offset: [f32; 2],

    /// Ease for entrances
    #[serde(default = "WindowTemplate::default_show_ease")]
    pub show_ease: Ease,

    /// Ease for exits
    #[serde(default = "WindowTemplate::default_hide_ease")]
    pub hide_ease: Ease,

    /// Declared flag defaults, restored on every reacquisition
    #[serde(default)]
    pub flags: WindowFlags,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            min_order: 10,
            order_step: 2,
            shadow_alpha: 0.7,
            shadow_fade_ms: 200,
            destroy_grace_ms: 500,
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            alpha_ms: 300,
            position_ms: 300,
            combined_alpha_ms: 500,
            combined_position_ms: 300,
            hide_alpha_delta_ms: -200,
            hide_position_delta_ms: 200,
            drag_overshoot_ms: 500,
            drag_settle_ms: 100,
            drag_hide_ms: 300,
        }
    }
}

impl Default for WindowsConfig {
    fn default() -> Self {
        Self {
            path_to_windows: "Windows".to_string(),
            templates: Vec::new(),
        }
    }
}

impl StackConfig {
    pub fn shadow_fade(&self) -> Duration {
        Duration::from_millis(self.shadow_fade_ms as u64)
    }

    pub fn destroy_grace(&self) -> Duration {
        Duration::from_millis(self.destroy_grace_ms as u64)
    }
}

impl AnimationConfig {
    /// Combined fade duration when hiding
    pub fn combined_hide_alpha_ms(&self) -> u32 {
        offset_ms(self.combined_alpha_ms, self.hide_alpha_delta_ms)
    }

    /// Combined slide duration when hiding
    pub fn combined_hide_position_ms(&self) -> u32 {
        offset_ms(self.combined_position_ms, self.hide_position_delta_ms)
    }
}

fn offset_ms(base: u32, delta: i32) -> u32 {
    (base as i64 + delta as i64).max(0) as u32
}

/// Convert a millisecond setting into a `Duration`.
pub fn millis(ms: u32) -> Duration {
    Duration::from_millis(ms as u64)
}

impl WindowTemplate {
    /// Template with default flags and the given transition selector
    pub fn new(kind: impl Into<WindowKind>, transition: &str) -> Self {
        Self {
            kind: kind.into(),
            flags: WindowFlags::default(),
            transition: transition.to_string(),
            show_side: Self::default_show_side(),
            hide_side: Self::default_hide_side(),
            multiplier: Self::default_multiplier(),
            drag: false,
            drag_offset: [0.0, 0.0],
            show_ease: Self::default_show_ease(),
            hide_ease: Self::default_hide_ease(),
        }
    }

    /// Replace the declared flags
    pub fn with_flags(mut self, flags: WindowFlags) -> Self {
        self.flags = flags;
        self
    }

    fn default_transition() -> String {
        "instant".to_string()
    }
    fn default_show_side() -> Side {
        Side::Top
    }
    fn default_hide_side() -> Side {
        Side::Bottom
    }
    fn default_multiplier() -> f32 {
        1.0
    }
    fn default_show_ease() -> Ease {
        Ease::OutQuad
    }
    fn default_hide_ease() -> Ease {
        Ease::InQuad
    }
}

impl WindowsConfig {
    /// Look up the explicitly configured template for `kind`
    pub fn template(&self, kind: &WindowKind) -> Option<&WindowTemplate> {
        self.templates.iter().find(|t| &t.kind == kind)
    }

    /// Add or replace a template
    pub fn insert(&mut self, template: WindowTemplate) {
        match self.templates.iter_mut().find(|t| t.kind == template.kind) {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }

    /// Convention-based path for `kind`
    pub fn path_to_window(&self, kind: &WindowKind) -> String {
        format!("{}/{}", self.path_to_windows, kind)
    }
}

impl StrataConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Expand ~ to home directory
        let expanded_path = if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            Path::new(&home).join(path.strip_prefix("~").unwrap_or(path))
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: StrataConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.stack.order_step < 2 {
            anyhow::bail!(
                "Invalid order_step {}: each window needs a slot for itself and the shadow",
                self.stack.order_step
            );
        }

        if !(0.0..=1.0).contains(&self.stack.shadow_alpha) {
            anyhow::bail!("Invalid shadow_alpha: must be between 0.0 and 1.0");
        }

        if self.windows.path_to_windows.trim().is_empty() {
            anyhow::bail!("path_to_windows must not be empty");
        }

        let mut seen = std::collections::HashSet::new();
        for template in &self.windows.templates {
            if template.kind.as_str().is_empty() {
                anyhow::bail!("Window template with an empty kind");
            }
            if !seen.insert(template.kind.clone()) {
                anyhow::bail!("Duplicate window template: {}", template.kind);
            }
            if template.multiplier < 0.0 {
                anyhow::bail!("Invalid multiplier for {}: must not be negative", template.kind);
            }
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }

    /// Merge a partial configuration into this one
    /// Non-default sections from the partial config override this config;
    /// templates are merged by kind.
    pub fn merge_partial(mut self, partial: StrataConfig) -> Self {
        let default_config = StrataConfig::default();

        if partial.stack != default_config.stack {
            self.stack = partial.stack;
        }
        if partial.animation != default_config.animation {
            self.animation = partial.animation;
        }
        if partial.windows.path_to_windows != default_config.windows.path_to_windows {
            self.windows.path_to_windows = partial.windows.path_to_windows;
        }
        for template in partial.windows.templates {
            self.windows.insert(template);
        }

        self
    }
}

#[cfg(test)]
mod tests;
