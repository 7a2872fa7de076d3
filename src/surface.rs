//! Drawable surface capabilities
//!
//! The stack never talks to a renderer directly. Windows, the shadow and the
//! root canvas are reached through the small traits below, which the host
//! implements on top of whatever widget toolkit it uses.
//!
//! [`HeadlessSurface`] implements all of them by recording the values it is
//! given. It backs the test-suite and hosts that run without a display.

use cgmath::{Vector2, Zero};
use std::cell::RefCell;
use std::rc::Rc;

/// Minimal drawable: drawn or not, receiving input or not, and a z-order.
pub trait Surface {
    fn set_visible(&mut self, visible: bool);
    fn set_interactive(&mut self, interactive: bool);
    fn set_order(&mut self, order: i32);
}

/// The visual side of a window: an alpha group and an anchor inside its parent.
pub trait WindowVisual: Surface {
    /// Opacity of the window's visibility group (0.0 - 1.0)
    fn alpha(&self) -> f32;
    fn set_alpha(&mut self, alpha: f32);

    /// Anchored position relative to the resting point
    fn anchor(&self) -> Vector2<f32>;
    fn set_anchor(&mut self, anchor: Vector2<f32>);

    /// Size of the parent container, used to compute edge offsets
    fn parent_size(&self) -> Vector2<f32>;

    /// Called once when the window instance is destroyed.
    fn release(&mut self) {}

    /// Whether the window is currently drawn.
    fn is_visible(&self) -> bool;
}

/// The shared dimming backdrop.
pub trait ShadowSurface: Surface {
    fn alpha(&self) -> f32;
    fn set_alpha(&mut self, alpha: f32);
}

/// Shared handle to a window's visual, captured by running tweens.
pub type SharedVisual = Rc<RefCell<dyn WindowVisual>>;

/// Everything a [`HeadlessSurface`] has been told so far.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceRecord {
    pub visible: bool,
    pub interactive: bool,
    pub order: i32,
    pub alpha: f32,
    pub anchor: Vector2<f32>,
    pub parent_size: Vector2<f32>,
    pub released: bool,
    /// Whether alpha writes are appended to `alpha_trace`
    pub tracing: bool,
    /// Every alpha value written while tracing, in order
    pub alpha_trace: Vec<f32>,
}

impl Default for SurfaceRecord {
    fn default() -> Self {
        Self {
            visible: false,
            interactive: false,
            order: 0,
            alpha: 1.0,
            anchor: Vector2::zero(),
            parent_size: Vector2::new(1080.0, 1920.0),
            released: false,
            tracing: false,
            alpha_trace: Vec::new(),
        }
    }
}

/// Recording surface. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    record: Rc<RefCell<SurfaceRecord>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface whose parent container has the given size.
    pub fn with_parent_size(width: f32, height: f32) -> Self {
        let surface = Self::new();
        surface.record.borrow_mut().parent_size = Vector2::new(width, height);
        surface
    }

    /// A surface that keeps every alpha value written to it.
    ///
    /// The trace is never trimmed; call [`HeadlessSurface::clear_trace`]
    /// when it is no longer needed.
    pub fn traced() -> Self {
        let surface = Self::new();
        surface.record.borrow_mut().tracing = true;
        surface
    }

    /// Copy of the current record.
    pub fn snapshot(&self) -> SurfaceRecord {
        self.record.borrow().clone()
    }

    /// Forget the alpha trace collected so far.
    pub fn clear_trace(&self) {
        self.record.borrow_mut().alpha_trace.clear();
    }

    /// Wrap a clone of this surface as a [`SharedVisual`].
    pub fn shared(&self) -> SharedVisual {
        Rc::new(RefCell::new(self.clone()))
    }
}

impl Surface for HeadlessSurface {
    fn set_visible(&mut self, visible: bool) {
        self.record.borrow_mut().visible = visible;
    }

    fn set_interactive(&mut self, interactive: bool) {
        self.record.borrow_mut().interactive = interactive;
    }

    fn set_order(&mut self, order: i32) {
        self.record.borrow_mut().order = order;
    }
}

impl WindowVisual for HeadlessSurface {
    fn alpha(&self) -> f32 {
        self.record.borrow().alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        let mut record = self.record.borrow_mut();
        record.alpha = alpha;
        if record.tracing {
            record.alpha_trace.push(alpha);
        }
    }

    fn anchor(&self) -> Vector2<f32> {
        self.record.borrow().anchor
    }

    fn set_anchor(&mut self, anchor: Vector2<f32>) {
        self.record.borrow_mut().anchor = anchor;
    }

    fn parent_size(&self) -> Vector2<f32> {
        self.record.borrow().parent_size
    }

    fn release(&mut self) {
        self.record.borrow_mut().released = true;
    }

    fn is_visible(&self) -> bool {
        self.record.borrow().visible
    }
}

impl ShadowSurface for HeadlessSurface {
    fn alpha(&self) -> f32 {
        self.record.borrow().alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        WindowVisual::set_alpha(self, alpha);
    }
}
