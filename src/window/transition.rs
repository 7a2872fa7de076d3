//! Show/hide transition strategies
//!
//! Every window carries one [`Transition`]: a default [`TransitionKind`], an
//! optional one-off override, and the parameters the kinds need. Building a
//! show or hide motion takes the window's own base contribution (whatever its
//! [`WindowBehavior`](super::WindowBehavior) adds) and composes it with the
//! kind's visual effect:
//!
//! | kind                 | show                              | hide                              |
//! |----------------------|-----------------------------------|-----------------------------------|
//! | `Instant`            | base                              | base                              |
//! | `Alpha`              | base, then fade in                | fade out, then base               |
//! | `Positional`         | base, then slide in               | slide out, then base              |
//! | `Combined`           | base, joined by fade and slide    | base, joined by fade and slide    |
//! | `PositionalWithDrag` | slide in (and settle), then base  | slide out, then base              |
//! | `PositionalAlpha`    | base, then slide joined by fade   | slide joined by fade, then base   |

use cgmath::{Vector2, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::{millis, AnimationConfig, WindowTemplate};
use crate::effects::animations::{fade, slide};
use crate::effects::{Ease, Sequence};
use crate::error::{Result, StackError};
use crate::surface::{SharedVisual, WindowVisual};

/// Edge of the parent container a window slides through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// Selectable animation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// No motion of its own
    Instant,
    /// Fade the alpha group
    Alpha,
    /// Slide the anchor from/to an edge
    Positional,
    /// Fade and slide at the same time
    Combined,
    /// Slide with an optional overshoot-and-settle entrance
    PositionalWithDrag,
    /// Slide and fade together, after the base on show and before it on hide
    PositionalAlpha,
}

impl TransitionKind {
    /// Parse a selector from configuration.
    ///
    /// Accepts names and the numeric codes used by older configs
    /// (0 = alpha, 1 = pos, 2 = all).
    pub fn from_selector(selector: &str) -> Result<Self> {
        match selector.trim().to_ascii_lowercase().as_str() {
            "instant" | "none" => Ok(TransitionKind::Instant),
            "alpha" | "0" => Ok(TransitionKind::Alpha),
            "pos" | "positional" | "1" => Ok(TransitionKind::Positional),
            "all" | "combined" | "2" => Ok(TransitionKind::Combined),
            "drag" | "positional_with_drag" | "positional-with-drag" => {
                Ok(TransitionKind::PositionalWithDrag)
            }
            "pos_alpha" | "positional_alpha" | "positional-alpha" => {
                Ok(TransitionKind::PositionalAlpha)
            }
            other => Err(StackError::invalid(format!(
                "unknown transition selector '{}'",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Instant => "instant",
            TransitionKind::Alpha => "alpha",
            TransitionKind::Positional => "pos",
            TransitionKind::Combined => "all",
            TransitionKind::PositionalWithDrag => "drag",
            TransitionKind::PositionalAlpha => "pos_alpha",
        }
    }
}

impl FromStr for TransitionKind {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_selector(s)
    }
}

impl TryFrom<i32> for TransitionKind {
    type Error = StackError;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            0 => Ok(TransitionKind::Alpha),
            1 => Ok(TransitionKind::Positional),
            2 => Ok(TransitionKind::Combined),
            other => Err(StackError::invalid(format!(
                "unknown transition code {}",
                other
            ))),
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durations used by the transition kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionTimings {
    pub alpha: Duration,
    pub position: Duration,
    pub combined_alpha: Duration,
    pub combined_position: Duration,
    pub combined_hide_alpha: Duration,
    pub combined_hide_position: Duration,
    pub drag_overshoot: Duration,
    pub drag_settle: Duration,
    pub drag_hide: Duration,
}

impl From<&AnimationConfig> for TransitionTimings {
    fn from(config: &AnimationConfig) -> Self {
        Self {
            alpha: millis(config.alpha_ms),
            position: millis(config.position_ms),
            combined_alpha: millis(config.combined_alpha_ms),
            combined_position: millis(config.combined_position_ms),
            combined_hide_alpha: millis(config.combined_hide_alpha_ms()),
            combined_hide_position: millis(config.combined_hide_position_ms()),
            drag_overshoot: millis(config.drag_overshoot_ms),
            drag_settle: millis(config.drag_settle_ms),
            drag_hide: millis(config.drag_hide_ms),
        }
    }
}

impl Default for TransitionTimings {
    fn default() -> Self {
        Self::from(&AnimationConfig::default())
    }
}

/// Parameters shared by the positional kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionParams {
    pub show_side: Side,
    pub hide_side: Side,
    pub multiplier: f32,
    pub drag: bool,
    pub drag_offset: Vector2<f32>,
    pub show_ease: Ease,
    pub hide_ease: Ease,
    pub timings: TransitionTimings,
}

impl TransitionParams {
    pub fn from_template(template: &WindowTemplate, timings: TransitionTimings) -> Self {
        Self {
            show_side: template.show_side,
            hide_side: template.hide_side,
            multiplier: template.multiplier,
            drag: template.drag,
            drag_offset: Vector2::new(template.drag_offset[0], template.drag_offset[1]),
            show_ease: template.show_ease,
            hide_ease: template.hide_ease,
            timings,
        }
    }
}

impl Default for TransitionParams {
    fn default() -> Self {
        Self {
            show_side: Side::Top,
            hide_side: Side::Bottom,
            multiplier: 1.0,
            drag: false,
            drag_offset: Vector2::zero(),
            show_ease: Ease::OutQuad,
            hide_ease: Ease::InQuad,
            timings: TransitionTimings::default(),
        }
    }
}

/// A window's animation policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    default_kind: TransitionKind,
    override_kind: Option<TransitionKind>,
    params: TransitionParams,
}

impl Transition {
    pub fn new(default_kind: TransitionKind, params: TransitionParams) -> Self {
        Self {
            default_kind,
            override_kind: None,
            params,
        }
    }

    /// Kind used by the next show/hide.
    pub fn active_kind(&self) -> TransitionKind {
        self.override_kind.unwrap_or(self.default_kind)
    }

    pub fn default_kind(&self) -> TransitionKind {
        self.default_kind
    }

    /// Override the kind until [`Transition::reset_animation_type`] is called.
    pub fn pre_initialize(&mut self, kind: TransitionKind) {
        self.override_kind = Some(kind);
    }

    pub fn reset_animation_type(&mut self) {
        self.override_kind = None;
    }

    pub fn params(&self) -> &TransitionParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut TransitionParams {
        &mut self.params
    }

    /// Offset of `side` scaled by the parent size and multiplier.
    pub fn edge_offset(&self, visual: &SharedVisual, side: Side) -> Vector2<f32> {
        let parent = visual.borrow().parent_size();
        let m = self.params.multiplier;
        match side {
            Side::Left => Vector2::new(-parent.x * m, 0.0),
            Side::Right => Vector2::new(parent.x * m, 0.0),
            Side::Top => Vector2::new(0.0, parent.y * m),
            Side::Bottom => Vector2::new(0.0, -parent.y * m),
        }
    }

    /// Snap the visual to the end state of a show.
    pub fn show_fast(&self, visual: &SharedVisual) {
        let mut v = visual.borrow_mut();
        match self.active_kind() {
            TransitionKind::Instant => {}
            TransitionKind::Alpha
            | TransitionKind::Positional
            | TransitionKind::Combined
            | TransitionKind::PositionalAlpha => {
                v.set_anchor(Vector2::zero());
                v.set_alpha(1.0);
            }
            TransitionKind::PositionalWithDrag => v.set_anchor(Vector2::zero()),
        }
    }

    /// Snap the visual to the end state of a hide.
    pub fn hide_fast(&self, visual: &SharedVisual) {
        let kind = self.active_kind();
        let parked = match kind {
            TransitionKind::Positional | TransitionKind::Combined => {
                Some(self.edge_offset(visual, self.params.hide_side))
            }
            // Parked at the entrance edge, ready for the next show
            TransitionKind::PositionalWithDrag => {
                Some(self.edge_offset(visual, self.params.show_side))
            }
            TransitionKind::Instant | TransitionKind::Alpha | TransitionKind::PositionalAlpha => {
                None
            }
        };

        let mut v = visual.borrow_mut();
        if let Some(anchor) = parked {
            v.set_anchor(anchor);
        }
        if matches!(
            kind,
            TransitionKind::Alpha | TransitionKind::Combined | TransitionKind::PositionalAlpha
        ) {
            v.set_alpha(0.0);
        }
    }

    /// Compose the show motion around the window's base contribution.
    pub fn show(&self, visual: &SharedVisual, base: Sequence) -> Sequence {
        let p = &self.params;
        let t = &p.timings;
        let mut seq = Sequence::new();

        match self.active_kind() {
            TransitionKind::Instant => {
                seq.append(base);
            }
            TransitionKind::Alpha => {
                visual.borrow_mut().set_anchor(Vector2::zero());
                seq.append(base)
                    .append(fade(visual, 1.0, t.alpha, p.show_ease));
            }
            TransitionKind::Positional => {
                let start = self.edge_offset(visual, p.show_side);
                {
                    let mut v = visual.borrow_mut();
                    v.set_alpha(1.0);
                    v.set_anchor(start);
                }
                seq.append(base)
                    .append(slide(visual, Vector2::zero(), t.position, p.show_ease));
            }
            TransitionKind::Combined => {
                let start = self.edge_offset(visual, p.show_side);
                visual.borrow_mut().set_anchor(start);
                seq.append(base)
                    .join(fade(visual, 1.0, t.combined_alpha, p.show_ease))
                    .join(slide(visual, Vector2::zero(), t.combined_position, p.show_ease));
            }
            TransitionKind::PositionalWithDrag => {
                let start = self.edge_offset(visual, p.show_side);
                let parked = visual.clone();
                seq.append_callback(move || parked.borrow_mut().set_anchor(start));

                let landing = if p.drag { p.drag_offset } else { Vector2::zero() };
                seq.append(slide(visual, landing, t.drag_overshoot, p.show_ease));
                if p.drag {
                    seq.append(slide(visual, Vector2::zero(), t.drag_settle, p.show_ease));
                }
                seq.append(base);
            }
            TransitionKind::PositionalAlpha => {
                let start = self.edge_offset(visual, p.show_side);
                let parked = visual.clone();
                seq.append(base)
                    .append(
                        slide(visual, Vector2::zero(), t.position, p.show_ease)
                            .with_on_start(move || parked.borrow_mut().set_anchor(start)),
                    )
                    .join(fade(visual, 1.0, t.alpha, Ease::OutQuart));
            }
        }

        seq
    }

    /// Compose the hide motion around the window's base contribution.
    pub fn hide(&self, visual: &SharedVisual, base: Sequence) -> Sequence {
        let p = &self.params;
        let t = &p.timings;
        let mut seq = Sequence::new();

        match self.active_kind() {
            TransitionKind::Instant => {
                seq.append(base);
            }
            TransitionKind::Alpha => {
                seq.append(fade(visual, 0.0, t.alpha, p.hide_ease))
                    .append(base);
            }
            TransitionKind::Positional => {
                let end = self.edge_offset(visual, p.hide_side);
                visual.borrow_mut().set_anchor(Vector2::zero());
                seq.append(slide(visual, end, t.position, p.hide_ease))
                    .append(base);
            }
            TransitionKind::Combined => {
                let end = self.edge_offset(visual, p.hide_side);
                seq.append(base)
                    .join(fade(visual, 0.0, t.combined_hide_alpha, p.hide_ease))
                    .join(slide(visual, end, t.combined_hide_position, p.hide_ease));
            }
            TransitionKind::PositionalWithDrag => {
                let end = self.edge_offset(visual, p.hide_side);
                let resting = visual.clone();
                seq.append(
                    slide(visual, end, t.drag_hide, p.hide_ease)
                        .with_on_start(move || resting.borrow_mut().set_anchor(Vector2::zero())),
                )
                .append(base);
            }
            TransitionKind::PositionalAlpha => {
                let end = self.edge_offset(visual, p.hide_side);
                let resting = visual.clone();
                seq.append(
                    slide(visual, end, t.position, p.hide_ease)
                        .with_on_start(move || resting.borrow_mut().set_anchor(Vector2::zero())),
                )
                .join(fade(visual, 0.0, t.alpha, Ease::InQuart))
                .append(base);
            }
        }

        seq
    }
}
