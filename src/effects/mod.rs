//! Transition effects
//!
//! This module holds everything that moves on screen:
//! - `animations`: tweens and sequences (the transition builder)
//! - `scheduler`: frame-driven playback and awaitable handles
//! - `shadow`: the shared dimming backdrop and its arbitration rules
//!
//! Easing curves live here so both tweens and configuration can name them.

pub mod animations;
pub mod scheduler;
pub mod shadow;

pub use animations::{Sequence, Tween, TweenTarget};
pub use scheduler::{Scheduler, TransitionHandle};
pub use shadow::{ShadowController, ShadowDecision, ShadowRequest};

use serde::{Deserialize, Serialize};

/// Easing curve applied to a tween's normalized progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ease {
    Linear,
    InQuad,
    #[default]
    OutQuad,
    InOutQuad,
    InQuart,
    OutQuart,
}

impl Ease {
    /// Map linear progress `t` (clamped to 0.0 - 1.0) onto the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Ease::Linear => t,
            Ease::InQuad => t * t,
            Ease::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Ease::InQuart => t * t * t * t,
            Ease::OutQuart => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv * inv
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_curve_hits_both_endpoints() {
        for ease in [
            Ease::Linear,
            Ease::InQuad,
            Ease::OutQuad,
            Ease::InOutQuad,
            Ease::InQuart,
            Ease::OutQuart,
        ] {
            assert_eq!(ease.apply(0.0), 0.0, "{:?}", ease);
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-6, "{:?}", ease);
        }
    }

    #[test]
    fn out_curves_lead_in_curves() {
        assert!(Ease::OutQuad.apply(0.25) > Ease::Linear.apply(0.25));
        assert!(Ease::InQuad.apply(0.25) < Ease::Linear.apply(0.25));
        assert!(Ease::OutQuart.apply(0.25) > Ease::OutQuad.apply(0.25));
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(Ease::Linear.apply(-1.0), 0.0);
        assert_eq!(Ease::Linear.apply(3.0), 1.0);
    }
}
