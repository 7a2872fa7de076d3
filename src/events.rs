//! Stack notifications
//!
//! [`Listeners`] is a small single-threaded observer list. Emission iterates
//! over a snapshot, so a listener may subscribe, unsubscribe or call back into
//! the stack while it runs.

use log::debug;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Token returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Notifications published by the window manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackEvent {
    /// A window started showing. Carries the window's `uses_activity` flag.
    WindowOpened { uses_activity: bool },
    /// A window was removed from the stack and started hiding.
    WindowClosed { uses_activity: bool },
    /// The shadow's target visibility changed, or a window toggled it.
    ShadowFadeChanged { showing: bool },
}

type Listener<E> = Rc<dyn Fn(&E)>;

/// Ordered list of callbacks for events of type `E`.
pub struct Listeners<E> {
    entries: RefCell<Vec<(SubscriptionId, Listener<E>)>>,
    next_id: Cell<u64>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    /// Current listeners, in subscription order.
    pub fn snapshot(&self) -> Vec<Listener<E>> {
        self.entries
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }

    pub fn emit(&self, event: &E) {
        for listener in self.snapshot() {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("len", &self.len()).finish()
    }
}

/// Shared event bus of a window manager. Clones publish to the same listeners.
#[derive(Clone, Default)]
pub struct StackEvents {
    listeners: Rc<Listeners<StackEvent>>,
}

impl StackEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&StackEvent) + 'static) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn publish(&self, event: StackEvent) {
        debug!("Stack event: {:?}", event);
        self.listeners.emit(&event);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for StackEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackEvents")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
