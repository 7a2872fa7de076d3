//! Stackable windows
//!
//! A [`Window`] is one instance of a window kind: a visual, a set of policy
//! flags, a [`Transition`] and an optional host [`WindowBehavior`]. Its
//! lifecycle is a four-state machine driven by the hook methods:
//!
//! ```text
//! Hidden ──on_start_show──► Showing ──on_shown──► Shown
//!    ▲                                              │
//!    └──────on_hidden────── Hiding ◄──on_start_hide─┘
//! ```
//!
//! The manager wires those hooks into the sequences it plays, so hosts
//! normally only read the state.

pub mod transition;

use log::debug;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::config::WindowTemplate;
use crate::effects::shadow::ShadowPolicy;
use crate::effects::Sequence;
use crate::error::Result;
use crate::events::{Listeners, SubscriptionId};
use crate::surface::{SharedVisual, WindowVisual};

pub use transition::{Side, Transition, TransitionKind, TransitionParams, TransitionTimings};

/// Name of a window kind, e.g. `"Settings"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowKind(String);

impl WindowKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WindowKind {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for WindowKind {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&WindowKind> for WindowKind {
    fn from(kind: &WindowKind) -> Self {
        kind.clone()
    }
}

/// Identity of one window instance. Never reused within a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowState {
    /// Not drawn, not interactive
    #[default]
    Hidden,
    /// Drawn; input stays off until shown
    Showing,
    /// Drawn and interactive
    Shown,
    /// Input off; drawing stops once hidden
    Hiding,
}

/// Per-window policy flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowFlags {
    /// The host's back button may close this window
    pub back_button_enabled: bool,
    /// Dim everything beneath this window
    pub needs_shadow: bool,
    /// Leave the shadow to the next window instead of fading it out on close
    pub shadow_waits_for_next_window: bool,
    /// The host may show a banner above this window
    pub shows_banner: bool,
    /// Destroy the instance after its hide transition instead of caching it
    pub destroy_after_close: bool,
    /// Reported with open/close events so the host can track activity
    pub uses_activity: bool,
}

impl Default for WindowFlags {
    fn default() -> Self {
        Self {
            back_button_enabled: true,
            needs_shadow: true,
            shadow_waits_for_next_window: false,
            shows_banner: true,
            destroy_after_close: true,
            uses_activity: false,
        }
    }
}

/// Window-specific logic supplied by the host.
///
/// The contributions are the base part of every show/hide; the window's
/// transition composes its own motion around them.
pub trait WindowBehavior {
    fn show_contribution(&mut self) -> Sequence {
        Sequence::new()
    }

    fn hide_contribution(&mut self) -> Sequence {
        Sequence::new()
    }

    /// Called after the declared flags have been restored.
    fn on_reset_defaults(&mut self, _flags: &mut WindowFlags) {}

    fn on_destroyed(&mut self) {}
}

/// What a factory hands back for a new instance.
pub struct WindowParts {
    pub visual: SharedVisual,
    pub behavior: Option<Box<dyn WindowBehavior>>,
}

impl WindowParts {
    pub fn new(visual: SharedVisual) -> Self {
        Self {
            visual,
            behavior: None,
        }
    }

    pub fn with_behavior(mut self, behavior: impl WindowBehavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }
}

/// Shared handle to a window.
pub type WindowRef = Rc<RefCell<Window>>;

/// Connection to the manager that owns a window.
#[derive(Clone)]
pub(crate) struct WindowLink {
    pub(crate) close_requests: Rc<RefCell<VecDeque<WindowId>>>,
    /// Called with (needs_shadow, show)
    pub(crate) shadow_toggle: Rc<dyn Fn(bool, bool)>,
}

pub struct Window {
    id: WindowId,
    kind: WindowKind,
    state: WindowState,
    declared: WindowFlags,
    flags: WindowFlags,
    shadow_shown: bool,
    sorting_order: i32,
    visual: SharedVisual,
    transition: Transition,
    behavior: Option<Box<dyn WindowBehavior>>,
    shown_listeners: Listeners<WindowId>,
    hidden_listeners: Listeners<WindowId>,
    link: Option<WindowLink>,
    destroyed: bool,
}

impl Window {
    /// Build an instance from its template.
    ///
    /// Fails with `InvalidConfiguration` if the template's transition
    /// selector is not recognized.
    pub fn new(
        id: WindowId,
        template: &WindowTemplate,
        parts: WindowParts,
        timings: TransitionTimings,
    ) -> Result<Self> {
        let kind = TransitionKind::from_selector(&template.transition)?;
        let params = TransitionParams::from_template(template, timings);

        Ok(Self {
            id,
            kind: template.kind.clone(),
            state: WindowState::Hidden,
            declared: template.flags,
            flags: template.flags,
            shadow_shown: template.flags.needs_shadow,
            sorting_order: 0,
            visual: parts.visual,
            transition: Transition::new(kind, params),
            behavior: parts.behavior,
            shown_listeners: Listeners::new(),
            hidden_listeners: Listeners::new(),
            link: None,
            destroyed: false,
        })
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn kind(&self) -> &WindowKind {
        &self.kind
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn flags(&self) -> &WindowFlags {
        &self.flags
    }

    /// Flags may be changed freely until the next [`Window::reset_defaults`].
    pub fn flags_mut(&mut self) -> &mut WindowFlags {
        &mut self.flags
    }

    /// Flags declared by the template.
    pub fn declared_flags(&self) -> &WindowFlags {
        &self.declared
    }

    pub(crate) fn shadow_policy(&self) -> ShadowPolicy {
        ShadowPolicy {
            needs_shadow: self.flags.needs_shadow,
            waits_for_next_window: self.flags.shadow_waits_for_next_window,
        }
    }

    /// Per-window shadow toggle, see [`Window::toggle_shadow`].
    pub fn is_shadow_shown(&self) -> bool {
        self.shadow_shown
    }

    pub fn visual(&self) -> &SharedVisual {
        &self.visual
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }

    pub fn transition_mut(&mut self) -> &mut Transition {
        &mut self.transition
    }

    pub fn sorting_order(&self) -> i32 {
        self.sorting_order
    }

    pub fn set_sorting_order(&mut self, order: i32) {
        self.sorting_order = order;
        self.visual.borrow_mut().set_order(order);
    }

    /// Whether the window is currently drawn.
    pub fn is_showing(&self) -> bool {
        self.visual.borrow().is_visible()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn on_start_show(&mut self) {
        self.state = WindowState::Showing;
        self.visual.borrow_mut().set_visible(true);
    }

    pub fn on_shown(&mut self) {
        self.state = WindowState::Shown;
        self.visual.borrow_mut().set_interactive(true);
    }

    pub fn on_start_hide(&mut self) {
        self.state = WindowState::Hiding;
        self.visual.borrow_mut().set_interactive(false);
    }

    pub fn on_hidden(&mut self) {
        self.state = WindowState::Hidden;
        self.visual.borrow_mut().set_visible(false);
    }

    /// Snap to the shown end state.
    pub fn show_fast(&mut self) {
        self.transition.show_fast(&self.visual);
        {
            let mut visual = self.visual.borrow_mut();
            visual.set_visible(true);
            visual.set_interactive(true);
        }
        self.state = WindowState::Shown;
    }

    /// Snap to the hidden end state.
    pub fn hide_fast(&mut self) {
        self.transition.hide_fast(&self.visual);
        {
            let mut visual = self.visual.borrow_mut();
            visual.set_visible(false);
            visual.set_interactive(false);
        }
        self.state = WindowState::Hidden;
    }

    /// Build the show motion. The caller plays it.
    pub fn show(&mut self) -> Sequence {
        let base = match self.behavior.as_mut() {
            Some(behavior) => behavior.show_contribution(),
            None => Sequence::new(),
        };
        self.transition.show(&self.visual, base)
    }

    /// Build the hide motion. The caller plays it.
    pub fn hide(&mut self) -> Sequence {
        let base = match self.behavior.as_mut() {
            Some(behavior) => behavior.hide_contribution(),
            None => Sequence::new(),
        };
        self.transition.hide(&self.visual, base)
    }

    /// Restore the declared flags, the shadow toggle and the default transition.
    pub fn reset_defaults(&mut self) {
        self.flags = self.declared;
        if let Some(behavior) = self.behavior.as_mut() {
            behavior.on_reset_defaults(&mut self.flags);
        }
        self.shadow_shown = self.flags.needs_shadow;
        self.transition.reset_animation_type();
    }

    /// Use `kind` until [`Window::reset_animation_type`].
    pub fn pre_initialize(&mut self, kind: TransitionKind) {
        debug!("Window {} {} transition overridden to {}", self.kind, self.id, kind);
        self.transition.pre_initialize(kind);
    }

    /// Like [`Window::pre_initialize`], from a configuration selector.
    pub fn pre_initialize_selector(&mut self, selector: &str) -> Result<()> {
        let kind = TransitionKind::from_selector(selector)?;
        self.pre_initialize(kind);
        Ok(())
    }

    pub fn reset_animation_type(&mut self) {
        self.transition.reset_animation_type();
    }

    pub fn subscribe_shown(&self, listener: impl Fn(&WindowId) + 'static) -> SubscriptionId {
        self.shown_listeners.subscribe(listener)
    }

    pub fn unsubscribe_shown(&self, id: SubscriptionId) -> bool {
        self.shown_listeners.unsubscribe(id)
    }

    pub fn subscribe_hidden(&self, listener: impl Fn(&WindowId) + 'static) -> SubscriptionId {
        self.hidden_listeners.subscribe(listener)
    }

    pub fn unsubscribe_hidden(&self, id: SubscriptionId) -> bool {
        self.hidden_listeners.unsubscribe(id)
    }

    /// Close-button handler: asks the owning manager to close this window.
    ///
    /// Returns false when the window is not attached to a manager.
    pub fn request_close(&self) -> bool {
        match &self.link {
            Some(link) => {
                let mut queue = link.close_requests.borrow_mut();
                if !queue.contains(&self.id) {
                    queue.push_back(self.id);
                }
                true
            }
            None => false,
        }
    }

    /// Flip (or set) the shadow toggle and ask the manager to apply it.
    ///
    /// Takes the shared handle because the manager publishes an event while
    /// applying the toggle, and listeners may look at the window.
    pub fn toggle_shadow(window: &WindowRef, show: Option<bool>) -> bool {
        let (needs_shadow, shown, link) = {
            let mut w = window.borrow_mut();
            w.shadow_shown = show.unwrap_or(!w.shadow_shown);
            (w.flags.needs_shadow, w.shadow_shown, w.link.clone())
        };
        if let Some(link) = link {
            (link.shadow_toggle)(needs_shadow, shown);
        }
        shown
    }

    pub(crate) fn attach(&mut self, link: WindowLink) {
        self.link = Some(link);
    }

    /// Release the instance. Listeners are dropped and the visual released.
    pub(crate) fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.link = None;
        self.shown_listeners.clear();
        self.hidden_listeners.clear();
        if let Some(behavior) = self.behavior.as_mut() {
            behavior.on_destroyed();
        }
        self.visual.borrow_mut().release();
        debug!("Destroyed window {} {}", self.kind, self.id);
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("flags", &self.flags)
            .field("sorting_order", &self.sorting_order)
            .field("transition", &self.transition.active_kind())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

/// Run the window's shown listeners. Must be called without the window borrowed.
pub(crate) fn notify_shown(window: &WindowRef) {
    let (id, listeners) = {
        let w = window.borrow();
        (w.id, w.shown_listeners.snapshot())
    };
    for listener in listeners {
        listener(&id);
    }
}

/// Run the window's hidden listeners. Must be called without the window borrowed.
pub(crate) fn notify_hidden(window: &WindowRef) {
    let (id, listeners) = {
        let w = window.borrow();
        (w.id, w.hidden_listeners.snapshot())
    };
    for listener in listeners {
        listener(&id);
    }
}
