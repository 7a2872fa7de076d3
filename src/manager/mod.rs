//! Window stack manager
//!
//! The [`WindowManager`] owns the open windows, assigns their sorting order,
//! arbitrates the shared shadow and plays every show/hide transition on its
//! [`Scheduler`]. All bookkeeping (stack membership, sorting order, shadow
//! decision) happens synchronously when an operation is called; the returned
//! [`TransitionHandle`] only carries the visual part and the lifecycle hooks.
//!
//! # Ordering
//!
//! A show plays, in order: the first-opened edge (if the stack was empty),
//! the window's start hook, the shadow fade, the window's own motion, then
//! the shown hook, the `WindowOpened` event and the window's shown listeners.
//!
//! A hide plays: the start hook, the window's motion, the hidden hook and
//! listeners, the shadow fade, the shadow re-order, then the last-closed
//! edge (if the stack is now empty).
//!
//! Steps that finish after a newer operation are checked when they run: a
//! shadow fade or re-order superseded by a later show or close is skipped,
//! and the last-closed edge is skipped once another window has been opened.
//!
//! Fast variants run the same steps synchronously with no tweens.

pub mod stack;
pub mod templates;

use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use crate::config::{StrataConfig, WindowTemplate, WindowsConfig};
use crate::effects::shadow::{ShadowPolicy, SharedShadow};
use crate::effects::{
    Scheduler, Sequence, ShadowController, ShadowDecision, ShadowRequest, TransitionHandle,
};
use crate::error::Result;
use crate::events::{Listeners, StackEvent, StackEvents, SubscriptionId};
use crate::surface::{ShadowSurface, Surface};
use crate::window::{
    notify_hidden, notify_shown, TransitionTimings, Window, WindowId, WindowKind, WindowLink,
    WindowParts, WindowRef, WindowState,
};

use self::stack::WindowStack;
use self::templates::{ResourceProvider, TemplateRegistry};

/// Produces the visual (and optional behavior) of new window instances.
pub trait WindowFactory {
    fn create(&mut self, kind: &WindowKind, template: &WindowTemplate) -> Result<WindowParts>;
}

impl<F> WindowFactory for F
where
    F: FnMut(&WindowKind, &WindowTemplate) -> Result<WindowParts>,
{
    fn create(&mut self, kind: &WindowKind, template: &WindowTemplate) -> Result<WindowParts> {
        self(kind, template)
    }
}

/// Smallest step that leaves a slot for the shadow and one for the window.
pub const MIN_ORDER_STEP: i32 = 2;

/// Sorting order allocator.
///
/// Each shown window takes two slots: the shadow's and its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderCounter {
    baseline: i32,
    step: i32,
    current: i32,
}

impl OrderCounter {
    /// `step` is raised to [`MIN_ORDER_STEP`] if smaller.
    pub fn new(baseline: i32, step: i32) -> Self {
        Self {
            baseline,
            step: step.max(MIN_ORDER_STEP),
            current: baseline,
        }
    }

    /// Next free slot.
    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn baseline(&self) -> i32 {
        self.baseline
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    /// Take the next pair of slots: `(shadow, window)`.
    pub fn claim(&mut self) -> (i32, i32) {
        let shadow = self.current;
        self.current += self.step;
        (shadow, shadow + 1)
    }

    /// Give back one pair of slots. Never drops below `floor` or the baseline.
    pub fn release(&mut self, floor: i32) -> i32 {
        self.current = (self.current - self.step).max(floor).max(self.baseline);
        self.current
    }

    pub fn reset(&mut self) -> i32 {
        self.current = self.baseline;
        self.current
    }
}

/// A window returned by `open`, together with its show transition.
#[derive(Debug, Clone)]
pub struct Opened {
    pub window: WindowRef,
    pub transition: TransitionHandle,
}

/// Root surface, shadow and edge listeners, captured by transition callbacks.
#[derive(Clone)]
struct Edges {
    root: Rc<RefCell<dyn Surface>>,
    shadow: SharedShadow,
    first_opened: Rc<Listeners<()>>,
    last_closed: Rc<Listeners<()>>,
    /// Bumped each time the stack goes from empty to non-empty
    opened: Rc<Cell<u64>>,
}

impl Edges {
    fn open_generation(&self) -> u64 {
        self.opened.get()
    }

    /// Called when a show is built on an empty stack.
    fn mark_opened(&self) {
        self.opened.set(self.opened.get() + 1);
    }

    fn first_opened(&self) {
        info!("🪟 First window opened, enabling window layer");
        {
            let mut root = self.root.borrow_mut();
            root.set_visible(true);
            root.set_interactive(true);
        }
        self.shadow.borrow_mut().set_enabled(true);
        self.first_opened.emit(&());
    }

    fn last_closed(&self) {
        info!("🪟 Last window closed, disabling window layer");
        {
            let mut root = self.root.borrow_mut();
            root.set_visible(false);
            root.set_interactive(false);
        }
        self.shadow.borrow_mut().set_enabled(false);
        self.last_closed.emit(&());
    }

    /// Tear the layer down unless a window was opened after `generation`.
    fn last_closed_since(&self, generation: u64) {
        if self.opened.get() != generation {
            debug!("Window opened during the last close, keeping window layer");
            return;
        }
        self.last_closed();
    }
}

/// Apply an explicit shadow toggle. Shared by the manager and window links.
fn apply_shadow_toggle(shadow: &SharedShadow, events: &StackEvents, needs_shadow: bool, show: bool) {
    let decision = ShadowController::arbitrate(ShadowRequest::Toggle { needs_shadow, show });
    {
        let mut shadow = shadow.borrow_mut();
        shadow.begin_batch();
        shadow.apply_now(decision);
        shadow.commit(decision);
    }
    events.publish(StackEvent::ShadowFadeChanged { showing: show });
}

pub struct WindowManager {
    config: StrataConfig,
    timings: TransitionTimings,
    templates: TemplateRegistry,
    factory: Box<dyn WindowFactory>,
    edges: Edges,
    shadow: SharedShadow,
    scheduler: Scheduler,
    events: StackEvents,
    stack: WindowStack,
    /// Every instance not yet destroyed
    live: HashMap<WindowId, WindowRef>,
    /// Instances kept across closes (`destroy_after_close == false`)
    cache: HashMap<WindowKind, WindowRef>,
    counter: OrderCounter,
    next_id: u64,
    close_requests: Rc<RefCell<VecDeque<WindowId>>>,
    in_flight: HashMap<WindowId, TransitionHandle>,
    active_show: Option<TransitionHandle>,
    active_hide: Option<TransitionHandle>,
}

impl WindowManager {
    /// Create a manager.
    ///
    /// The root surface and the shadow start disabled. An `order_step` below
    /// [`MIN_ORDER_STEP`] is raised to it. Templates come from
    /// `config.windows` first and from `resources` at
    /// `"<path_to_windows>/<kind>"` otherwise.
    pub fn new(
        config: StrataConfig,
        factory: impl WindowFactory + 'static,
        resources: impl ResourceProvider + 'static,
        root: impl Surface + 'static,
        shadow: impl ShadowSurface + 'static,
    ) -> Self {
        if let Err(e) = config.validate() {
            warn!("⚠️ Invalid stack configuration, continuing with clamped values: {}", e);
        }

        let root: Rc<RefCell<dyn Surface>> = Rc::new(RefCell::new(root));
        {
            let mut root = root.borrow_mut();
            root.set_visible(false);
            root.set_interactive(false);
        }

        let shadow: SharedShadow = Rc::new(RefCell::new(ShadowController::new(
            Box::new(shadow),
            config.stack.shadow_alpha,
            config.stack.shadow_fade(),
        )));

        info!(
            "🗂️ Window manager ready (baseline order {}, {} configured templates)",
            config.stack.min_order,
            config.windows.templates.len()
        );

        Self {
            timings: TransitionTimings::from(&config.animation),
            templates: TemplateRegistry::new(config.windows.clone(), Box::new(resources)),
            factory: Box::new(factory),
            edges: Edges {
                root,
                shadow: shadow.clone(),
                first_opened: Rc::new(Listeners::new()),
                last_closed: Rc::new(Listeners::new()),
                opened: Rc::new(Cell::new(0)),
            },
            shadow,
            scheduler: Scheduler::new(),
            events: StackEvents::new(),
            stack: WindowStack::new(),
            live: HashMap::new(),
            cache: HashMap::new(),
            counter: OrderCounter::new(config.stack.min_order, config.stack.order_step),
            next_id: 1,
            close_requests: Rc::new(RefCell::new(VecDeque::new())),
            in_flight: HashMap::new(),
            active_show: None,
            active_hide: None,
            config,
        }
    }

    /// Replace the explicit template configuration.
    pub fn set_windows_config(&mut self, windows: WindowsConfig) {
        debug!("Windows config set ({} templates)", windows.templates.len());
        self.config.windows = windows.clone();
        self.templates.set_config(windows);
    }

    pub fn config(&self) -> &StrataConfig {
        &self.config
    }

    /// Scheduler playing this manager's transitions. Tick it once per frame.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn subscribe(&self, listener: impl Fn(&StackEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Runs when the stack goes from empty to non-empty, before the show proceeds.
    pub fn subscribe_first_opened(&self, listener: impl Fn() + 'static) -> SubscriptionId {
        self.edges.first_opened.subscribe(move |_| listener())
    }

    pub fn unsubscribe_first_opened(&self, id: SubscriptionId) -> bool {
        self.edges.first_opened.unsubscribe(id)
    }

    /// Runs after the hide that emptied the stack has completed.
    pub fn subscribe_last_closed(&self, listener: impl Fn() + 'static) -> SubscriptionId {
        self.edges.last_closed.subscribe(move |_| listener())
    }

    pub fn unsubscribe_last_closed(&self, id: SubscriptionId) -> bool {
        self.edges.last_closed.unsubscribe(id)
    }

    /// Return a usable, fully hidden instance of `kind`.
    ///
    /// Cached instances are reused; anything else comes from the factory.
    /// Declared defaults are restored either way.
    pub fn get_or_create_window(&mut self, kind: impl Into<WindowKind>) -> Result<WindowRef> {
        let kind = kind.into();
        self.purge();

        if let Some(window) = self.cache.get(&kind).cloned() {
            let id = window.borrow().id();
            self.settle(id);
            {
                let mut w = window.borrow_mut();
                w.reset_defaults();
                if self.stack.top() != Some(id) {
                    w.hide_fast();
                }
            }
            debug!("Reusing cached window {} {}", kind, id);
            return Ok(window);
        }

        let template = self.templates.resolve(&kind)?;
        let parts = self.factory.create(&kind, &template)?;
        let id = WindowId(self.next_id);
        self.next_id += 1;

        let mut window = Window::new(id, &template, parts, self.timings)?;
        window.attach(self.link());
        window.reset_defaults();
        window.hide_fast();
        let destroy_after_close = window.flags().destroy_after_close;
        let window: WindowRef = Rc::new(RefCell::new(window));

        if destroy_after_close {
            self.schedule_destroy_on_hidden(&window);
        } else {
            self.cache.insert(kind.clone(), window.clone());
        }
        self.live.insert(id, window.clone());

        info!("✨ Created window {} {}", kind, id);
        Ok(window)
    }

    /// Obtain `kind` and show it.
    pub fn open(&mut self, kind: impl Into<WindowKind>) -> Result<Opened> {
        self.open_with(kind, |_| {})
    }

    /// Obtain `kind`, let `before_show` customize it, then show it.
    pub fn open_with(
        &mut self,
        kind: impl Into<WindowKind>,
        before_show: impl FnOnce(&WindowRef),
    ) -> Result<Opened> {
        let window = self.get_or_create_window(kind)?;
        before_show(&window);
        let transition = self.show_window(&window);
        Ok(Opened { window, transition })
    }

    /// Synchronous open: every hook has run when this returns.
    pub fn open_fast(&mut self, kind: impl Into<WindowKind>) -> Result<WindowRef> {
        let window = self.get_or_create_window(kind)?;
        self.show_window_fast(&window);
        Ok(window)
    }

    /// Show an instance obtained from this manager, raising it to the top.
    ///
    /// Showing the current top window is a no-op and returns a completed handle.
    pub fn show_window(&mut self, window: &WindowRef) -> TransitionHandle {
        let Some(id) = self.prepare_show(window) else {
            return TransitionHandle::completed();
        };

        self.shadow.borrow_mut().begin_batch();
        let sequence = self.build_show(window, false);
        self.stack.raise_or_push(id);

        let handle = self.scheduler.play(sequence);
        self.track(id, &handle);
        self.active_show = Some(handle.clone());
        handle
    }

    /// Synchronous [`WindowManager::show_window`].
    pub fn show_window_fast(&mut self, window: &WindowRef) {
        let Some(id) = self.prepare_show(window) else {
            return;
        };

        self.shadow.borrow_mut().begin_batch();
        let sequence = self.build_show(window, true);
        self.stack.raise_or_push(id);
        self.scheduler.play(sequence).complete();
    }

    /// Remove `window` from the stack and hide it.
    ///
    /// A window that is not on the stack yields a completed handle.
    pub fn close(&mut self, window: &WindowRef) -> TransitionHandle {
        self.shadow.borrow_mut().begin_batch();
        match self.close_sequence(window, false) {
            Some(sequence) => {
                let id = window.borrow().id();
                let handle = self.scheduler.play(sequence);
                self.track(id, &handle);
                self.active_hide = Some(handle.clone());
                handle
            }
            None => TransitionHandle::completed(),
        }
    }

    /// Close the topmost open window of `kind`.
    pub fn close_kind(&mut self, kind: impl Into<WindowKind>) -> TransitionHandle {
        match self.find_open(&kind.into()) {
            Some(window) => self.close(&window),
            None => TransitionHandle::completed(),
        }
    }

    /// Close every open window, top to bottom, one hide after the other.
    ///
    /// With `complete_active_first`, the most recent show and hide still
    /// playing are fast-forwarded before anything is closed.
    pub fn close_all(&mut self, complete_active_first: bool) -> TransitionHandle {
        if complete_active_first {
            for handle in [self.active_hide.take(), self.active_show.take()]
                .into_iter()
                .flatten()
            {
                handle.complete();
            }
        }

        self.purge();
        let ids: Vec<WindowId> = self.stack.iter().rev().copied().collect();
        if ids.is_empty() {
            return TransitionHandle::completed();
        }

        info!("🧹 Closing all {} windows", ids.len());
        self.shadow.borrow_mut().begin_batch();
        let mut chain = Sequence::new();
        let mut closed = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(window) = self.live.get(&id).cloned() else {
                continue;
            };
            if let Some(sequence) = self.close_sequence(&window, false) {
                chain.append(sequence);
                closed.push(id);
            }
        }

        let handle = self.scheduler.play(chain);
        for id in closed {
            self.track(id, &handle);
        }
        self.active_hide = Some(handle.clone());
        handle
    }

    /// Synchronous [`WindowManager::close`]. Returns false if `window` was not open.
    pub fn close_fast(&mut self, window: &WindowRef) -> bool {
        self.shadow.borrow_mut().begin_batch();
        match self.close_sequence(window, true) {
            Some(sequence) => {
                self.scheduler.play(sequence).complete();
                true
            }
            None => false,
        }
    }

    pub fn close_fast_kind(&mut self, kind: impl Into<WindowKind>) -> bool {
        match self.find_open(&kind.into()) {
            Some(window) => self.close_fast(&window),
            None => false,
        }
    }

    /// Synchronously close every open window, top to bottom.
    pub fn close_all_fast(&mut self) {
        self.purge();
        let ids: Vec<WindowId> = self.stack.iter().rev().copied().collect();
        for id in ids {
            if let Some(window) = self.live.get(&id).cloned() {
                self.close_fast(&window);
            }
        }
    }

    /// Close every window whose close button was pressed since the last call.
    pub fn process_close_requests(&mut self) -> Vec<TransitionHandle> {
        let requests: Vec<WindowId> = self.close_requests.borrow_mut().drain(..).collect();
        let windows: Vec<WindowRef> = requests
            .into_iter()
            .filter_map(|id| self.live.get(&id).cloned())
            .collect();
        windows.iter().map(|window| self.close(window)).collect()
    }

    /// Fade the shadow to `alpha` over the configured duration.
    pub fn fade_shadow(&mut self, alpha: f32) -> TransitionHandle {
        let decision = if alpha > 0.0 {
            ShadowDecision::Show
        } else {
            ShadowDecision::Hide
        };
        let changed = {
            let mut shadow = self.shadow.borrow_mut();
            shadow.begin_batch();
            shadow.commit(decision)
        };
        if let Some(showing) = changed {
            self.events.publish(StackEvent::ShadowFadeChanged { showing });
        }

        let mut sequence = Sequence::new();
        sequence.append(ShadowController::fade_tween(&self.shadow, alpha));
        self.scheduler.play(sequence)
    }

    /// Explicitly show or hide the shadow on behalf of `window`.
    ///
    /// Only windows that need a shadow change its opacity; the
    /// `ShadowFadeChanged` event is published either way.
    pub fn show_or_hide_shadow_while_open(&mut self, window: &WindowRef, show: bool) {
        let needs_shadow = window.borrow().flags().needs_shadow;
        apply_shadow_toggle(&self.shadow, &self.events, needs_shadow, show);
    }

    /// Whether a window of `kind` is on the stack.
    pub fn is_opened(&self, kind: impl Into<WindowKind>) -> bool {
        self.find_open(&kind.into()).is_some()
    }

    pub fn is_any_opened(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn top_window(&self) -> Option<WindowRef> {
        self.stack.top().and_then(|id| self.live.get(&id).cloned())
    }

    /// Open windows, bottom to top.
    pub fn windows(&self) -> Vec<WindowRef> {
        self.stack
            .iter()
            .filter_map(|id| self.live.get(id).cloned())
            .collect()
    }

    pub fn window(&self, id: WindowId) -> Option<WindowRef> {
        self.live.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Next sorting order to be handed out.
    pub fn current_order(&self) -> i32 {
        self.counter.current()
    }

    pub fn shadow_alpha(&self) -> f32 {
        self.shadow.borrow().alpha()
    }

    pub fn shadow_order(&self) -> i32 {
        self.shadow.borrow().order()
    }

    pub fn is_shadow_showing(&self) -> bool {
        self.shadow.borrow().is_showing()
    }

    fn link(&self) -> WindowLink {
        let shadow = self.shadow.clone();
        let events = self.events.clone();
        WindowLink {
            close_requests: self.close_requests.clone(),
            shadow_toggle: Rc::new(move |needs_shadow, show| {
                apply_shadow_toggle(&shadow, &events, needs_shadow, show)
            }),
        }
    }

    fn schedule_destroy_on_hidden(&self, window: &WindowRef) {
        let weak = Rc::downgrade(window);
        let scheduler = self.scheduler.clone();
        let grace = self.config.stack.destroy_grace();

        window.borrow().subscribe_hidden(move |_| {
            let weak = weak.clone();
            scheduler.after(grace, move || {
                let Some(window) = weak.upgrade() else {
                    return;
                };
                let Ok(mut window) = window.try_borrow_mut() else {
                    warn!("Window busy at destroy time, keeping it");
                    return;
                };
                // Reopened during the grace period
                if window.state() == WindowState::Hidden {
                    window.destroy();
                }
            });
        });
    }

    /// Topmost open window of `kind`.
    fn find_open(&self, kind: &WindowKind) -> Option<WindowRef> {
        self.stack
            .iter()
            .rev()
            .filter_map(|id| self.live.get(id))
            .find(|window| window.borrow().kind() == kind)
            .cloned()
    }

    /// Drop destroyed instances and finished transitions.
    fn purge(&mut self) {
        fn alive(window: &WindowRef) -> bool {
            window.try_borrow().map_or(true, |w| !w.is_destroyed())
        }

        let live = &self.live;
        let dropped = self
            .stack
            .retain(|id| live.get(&id).map_or(false, alive));
        if dropped > 0 {
            debug!("Purged {} destroyed windows from the stack", dropped);
        }
        self.live.retain(|_, window| alive(window));
        self.cache.retain(|_, window| alive(window));
        self.in_flight.retain(|_, handle| !handle.is_complete());
    }

    /// Fast-forward whatever transition `id` is still playing.
    fn settle(&mut self, id: WindowId) {
        if let Some(handle) = self.in_flight.remove(&id) {
            if !handle.is_complete() {
                debug!("Completing in-flight transition of window {}", id);
                handle.complete();
            }
        }
    }

    fn track(&mut self, id: WindowId, handle: &TransitionHandle) {
        if !handle.is_complete() {
            self.in_flight.insert(id, handle.clone());
        }
    }

    /// Common checks before showing. Returns the id when a show should happen.
    fn prepare_show(&mut self, window: &WindowRef) -> Option<WindowId> {
        self.purge();
        let (id, destroyed) = {
            let w = window.borrow();
            (w.id(), w.is_destroyed())
        };

        if destroyed {
            warn!("Ignoring show of destroyed window {}", id);
            return None;
        }
        if self.stack.top() == Some(id) {
            debug!("Window {} already on top", id);
            return None;
        }

        self.settle(id);
        self.live.entry(id).or_insert_with(|| window.clone());
        Some(id)
    }

    fn policy_of(&self, id: WindowId) -> Option<ShadowPolicy> {
        self.live.get(&id).map(|w| w.borrow().shadow_policy())
    }

    /// Queue the shadow part of a decision: fade (or snap, when `fast`).
    fn append_shadow(&self, sequence: &mut Sequence, decision: ShadowDecision, fast: bool) {
        let Some(target) = self.shadow.borrow().target_alpha(decision) else {
            return;
        };

        let changed = self.shadow.borrow_mut().commit(decision);
        if let Some(showing) = changed {
            let events = self.events.clone();
            let shadow = self.shadow.clone();
            let generation = shadow.borrow().generation();
            sequence.append_callback(move || {
                if shadow.borrow().generation() == generation {
                    events.publish(StackEvent::ShadowFadeChanged { showing })
                }
            });
        } else if self.shadow.borrow().alpha() == target {
            // Already there; a fade would only delay the window
            return;
        }

        if fast {
            let shadow = self.shadow.clone();
            sequence.append_callback(move || shadow.borrow_mut().set_alpha(target));
        } else {
            sequence.append(ShadowController::fade_tween(&self.shadow, target));
        }
    }

    /// Build the show of `window`. The stack must not yet contain it on top.
    fn build_show(&mut self, window: &WindowRef, fast: bool) -> Sequence {
        let first = self.stack.is_empty();
        let beneath = self.stack.top().and_then(|id| self.policy_of(id));
        let (shadow_order, window_order) = self.counter.claim();

        let (id, kind, policy, uses_activity) = {
            let mut w = window.borrow_mut();
            w.set_sorting_order(window_order);
            (w.id(), w.kind().clone(), w.shadow_policy(), w.flags().uses_activity)
        };
        self.shadow.borrow_mut().set_order(shadow_order);

        let decision = ShadowController::arbitrate(ShadowRequest::Open {
            window: policy,
            beneath,
        });
        debug!(
            "Showing {} {} at order {} (shadow {}, {:?})",
            kind, id, window_order, shadow_order, decision
        );

        let mut sequence = Sequence::new();
        if first {
            self.edges.mark_opened();
            let edges = self.edges.clone();
            sequence.append_callback(move || edges.first_opened());
        }

        let w = window.clone();
        sequence.append_callback(move || w.borrow_mut().on_start_show());

        self.append_shadow(&mut sequence, decision, fast);

        if fast {
            let w = window.clone();
            sequence.append_callback(move || w.borrow_mut().show_fast());
        } else {
            let motion = window.borrow_mut().show();
            sequence.append(motion);
        }

        let w = window.clone();
        let events = self.events.clone();
        sequence.append_callback(move || {
            w.borrow_mut().on_shown();
            events.publish(StackEvent::WindowOpened { uses_activity });
            notify_shown(&w);
        });

        sequence
    }

    /// Take `window` off the stack and build its hide. `None` if it was not open.
    fn close_sequence(&mut self, window: &WindowRef, fast: bool) -> Option<Sequence> {
        let (id, uses_activity) = {
            let w = window.borrow();
            (w.id(), w.flags().uses_activity)
        };

        if self.stack.remove(id).is_none() {
            debug!("Window {} is not open, nothing to close", id);
            return None;
        }
        self.purge();
        self.settle(id);

        self.events.publish(StackEvent::WindowClosed { uses_activity });
        Some(self.build_hide(window, fast))
    }

    /// Build the hide of `window`, already removed from the stack.
    fn build_hide(&mut self, window: &WindowRef, fast: bool) -> Sequence {
        let new_top = self.stack.top();
        let new_top_policy = new_top.and_then(|id| self.policy_of(id));

        let current = match new_top.and_then(|id| self.live.get(&id)) {
            Some(top) => {
                let floor = top.borrow().sorting_order() + 1;
                self.counter.release(floor)
            }
            None => self.counter.reset(),
        };
        let shadow_order = (current - self.counter.step()).max(self.counter.baseline());

        let (id, kind, policy) = {
            let w = window.borrow();
            (w.id(), w.kind().clone(), w.shadow_policy())
        };
        let decision = ShadowController::arbitrate(ShadowRequest::Close {
            window: policy,
            new_top: new_top_policy,
        });
        let last = new_top.is_none() && !policy.waits_for_next_window;
        let opened = self.edges.open_generation();
        let placement = self.shadow.borrow().placement();
        debug!(
            "Hiding {} {} (next order {}, {:?}, last: {})",
            kind, id, current, decision, last
        );

        let mut sequence = Sequence::new();
        let w = window.clone();
        sequence.append_callback(move || w.borrow_mut().on_start_hide());

        if fast {
            let w = window.clone();
            sequence.append_callback(move || w.borrow_mut().hide_fast());
        } else {
            let motion = window.borrow_mut().hide();
            sequence.append(motion);
        }

        let w = window.clone();
        sequence.append_callback(move || {
            w.borrow_mut().on_hidden();
            notify_hidden(&w);
        });

        self.append_shadow(&mut sequence, decision, fast);

        if !policy.waits_for_next_window {
            let shadow = self.shadow.clone();
            sequence.append_callback(move || {
                shadow.borrow_mut().restore_order(shadow_order, placement);
            });
        }

        if last {
            let edges = self.edges.clone();
            sequence.append_callback(move || edges.last_closed_since(opened));
        }

        sequence
    }
}

impl fmt::Debug for WindowManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowManager")
            .field("stack", &self.stack)
            .field("order", &self.counter.current())
            .field("live", &self.live.len())
            .field("cached", &self.cache.len())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
