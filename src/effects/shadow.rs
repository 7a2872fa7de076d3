//! Shared dimming shadow
//!
//! One backdrop sits beneath the top window(s). Its opacity is decided by
//! [`ShadowController::arbitrate`], which every caller (open, close, and a
//! window's explicit toggle) goes through; the resulting [`ShadowDecision`]
//! is then applied either instantly or as a fade tween.

use log::{debug, info};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use super::{Ease, Tween, TweenTarget};
use crate::surface::ShadowSurface;

/// Shadow-related policy of a single window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShadowPolicy {
    pub needs_shadow: bool,
    pub waits_for_next_window: bool,
}

/// A situation the shadow has to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowRequest {
    /// `window` is being shown above `beneath` (the previous top, if any).
    Open {
        window: ShadowPolicy,
        beneath: Option<ShadowPolicy>,
    },
    /// `window` was removed; `new_top` is the window now on top, if any.
    Close {
        window: ShadowPolicy,
        new_top: Option<ShadowPolicy>,
    },
    /// A window explicitly asked for the shadow to be shown or hidden.
    Toggle { needs_shadow: bool, show: bool },
}

/// What the shadow should do in response to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowDecision {
    /// Leave opacity alone
    Keep,
    /// Go to the configured shadow alpha
    Show,
    /// Go fully transparent
    Hide,
}

/// Owner of the shadow surface, its order and its configured opacity.
pub struct ShadowController {
    surface: Box<dyn ShadowSurface>,
    shown_alpha: f32,
    fade_duration: Duration,
    order: i32,
    enabled: bool,
    showing: bool,
    /// Bumped when a new batch commits; fades of older generations go inert.
    generation: u64,
    batch: u64,
    committed_batch: u64,
    /// Bumped by every `set_order`
    placement: u64,
}

/// Shared handle captured by shadow fade tweens.
pub type SharedShadow = Rc<RefCell<ShadowController>>;

impl ShadowController {
    /// Take over `surface`: disabled, transparent, with its own sorting order.
    pub fn new(mut surface: Box<dyn ShadowSurface>, shown_alpha: f32, fade_duration: Duration) -> Self {
        surface.set_visible(false);
        surface.set_interactive(false);
        surface.set_alpha(0.0);

        info!(
            "🌑 Shadow controller ready (alpha {:.2}, fade {}ms)",
            shown_alpha,
            fade_duration.as_millis()
        );

        Self {
            surface,
            shown_alpha,
            fade_duration,
            order: 0,
            enabled: false,
            showing: false,
            generation: 0,
            batch: 0,
            committed_batch: 0,
            placement: 0,
        }
    }

    /// The arbitration rules. Pure; callers apply the decision.
    pub fn arbitrate(request: ShadowRequest) -> ShadowDecision {
        match request {
            ShadowRequest::Open { window, beneath } => {
                if window.needs_shadow {
                    if window.waits_for_next_window {
                        ShadowDecision::Keep
                    } else {
                        ShadowDecision::Show
                    }
                } else if beneath.map_or(true, |below| !below.needs_shadow) {
                    // Nothing in the pair wants dimming; clear any leftover shadow
                    ShadowDecision::Hide
                } else {
                    ShadowDecision::Keep
                }
            }
            ShadowRequest::Close { window, new_top } => {
                if window.waits_for_next_window || !window.needs_shadow {
                    return ShadowDecision::Keep;
                }
                match new_top {
                    Some(top) if top.needs_shadow => ShadowDecision::Keep,
                    _ => ShadowDecision::Hide,
                }
            }
            ShadowRequest::Toggle { needs_shadow, show } => match (needs_shadow, show) {
                (false, _) => ShadowDecision::Keep,
                (true, true) => ShadowDecision::Show,
                (true, false) => ShadowDecision::Hide,
            },
        }
    }

    /// Target alpha for a decision, `None` for [`ShadowDecision::Keep`].
    pub fn target_alpha(&self, decision: ShadowDecision) -> Option<f32> {
        match decision {
            ShadowDecision::Keep => None,
            ShadowDecision::Show => Some(self.shown_alpha),
            ShadowDecision::Hide => Some(0.0),
        }
    }

    /// Start a new batch of decisions.
    ///
    /// The first commit of a batch retires every fade tween created before
    /// it; commits within one batch (a chained close-all) stay compatible.
    pub fn begin_batch(&mut self) {
        self.batch += 1;
    }

    /// Record the visibility a decision leads to. Returns `Some(showing)`
    /// when that differs from the previous target.
    pub fn commit(&mut self, decision: ShadowDecision) -> Option<bool> {
        let showing = match decision {
            ShadowDecision::Keep => return None,
            ShadowDecision::Show => true,
            ShadowDecision::Hide => false,
        };
        if self.committed_batch != self.batch {
            self.committed_batch = self.batch;
            self.generation += 1;
            debug!("🌑 Shadow decisions now at generation {}", self.generation);
        }
        if self.showing == showing {
            return None;
        }
        self.showing = showing;
        Some(showing)
    }

    /// Apply a decision instantly.
    pub fn apply_now(&mut self, decision: ShadowDecision) {
        if let Some(alpha) = self.target_alpha(decision) {
            self.set_alpha(alpha);
        }
    }

    /// Tween the shared shadow to `alpha` over the configured fade duration.
    ///
    /// The tween does nothing once a later batch has committed a decision.
    pub fn fade_tween(shadow: &SharedShadow, alpha: f32) -> Tween {
        let (duration, generation) = {
            let shadow = shadow.borrow();
            (shadow.fade_duration, shadow.generation)
        };
        Tween::new(
            duration,
            Ease::Linear,
            ShadowFade {
                shadow: shadow.clone(),
                generation,
                from: alpha,
                to: alpha,
            },
        )
    }

    /// Generation of the latest committed batch.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn alpha(&self) -> f32 {
        self.surface.alpha()
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.surface.set_alpha(alpha.clamp(0.0, 1.0));
    }

    /// Opacity used when the shadow is shown.
    pub fn shown_alpha(&self) -> f32 {
        self.shown_alpha
    }

    /// Target visibility after the last committed decision.
    pub fn is_showing(&self) -> bool {
        self.showing
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn set_order(&mut self, order: i32) {
        if self.order != order {
            debug!("🌑 Shadow order {} -> {}", self.order, order);
        }
        self.order = order;
        self.placement += 1;
        self.surface.set_order(order);
    }

    /// Token identifying the current placement of the shadow.
    pub fn placement(&self) -> u64 {
        self.placement
    }

    /// Move the shadow to `order` unless it was placed again after `placement`.
    pub fn restore_order(&mut self, order: i32, placement: u64) -> bool {
        if self.placement != placement {
            debug!("🌑 Shadow was placed again, keeping order {}", self.order);
            return false;
        }
        if self.order != order {
            debug!("🌑 Shadow order {} -> {}", self.order, order);
        }
        self.order = order;
        self.surface.set_order(order);
        true
    }

    /// Enable or disable drawing and input blocking of the shadow.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.surface.set_visible(enabled);
        self.surface.set_interactive(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn fade_duration(&self) -> Duration {
        self.fade_duration
    }
}

impl fmt::Debug for ShadowController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowController")
            .field("alpha", &self.alpha())
            .field("shown_alpha", &self.shown_alpha)
            .field("order", &self.order)
            .field("enabled", &self.enabled)
            .finish()
    }
}

struct ShadowFade {
    shadow: SharedShadow,
    generation: u64,
    from: f32,
    to: f32,
}

impl ShadowFade {
    fn is_current(&self, shadow: &ShadowController) -> bool {
        shadow.generation == self.generation
    }
}

impl TweenTarget for ShadowFade {
    fn begin(&mut self) {
        let shadow = self.shadow.borrow();
        if self.is_current(&shadow) {
            self.from = shadow.alpha();
        } else {
            debug!("🌑 Skipping fade to {:.2}, superseded", self.to);
        }
    }

    fn apply(&mut self, progress: f32) {
        let mut shadow = self.shadow.borrow_mut();
        if !self.is_current(&shadow) {
            return;
        }
        let alpha = self.from + (self.to - self.from) * progress;
        shadow.set_alpha(alpha);
    }
}
