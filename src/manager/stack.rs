//! Window ordering stack
//!
//! This module provides the `WindowStack` data structure holding the open
//! windows of a manager. Windows are ordered from bottom to top, with the last
//! window in the stack being the top-most visible window.

use std::collections::HashMap;

use crate::window::WindowId;

/// Ordered set of open windows.
///
/// Windows are stored in bottom-to-top order, where index 0 represents the
/// bottom-most window and the last index represents the top-most window.
///
/// # Examples
///
/// ```
/// use strata::manager::stack::WindowStack;
/// use strata::window::WindowId;
///
/// let mut stack = WindowStack::new();
/// stack.push(WindowId(1));
/// stack.push(WindowId(2));
///
/// assert_eq!(stack.top(), Some(WindowId(2)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct WindowStack {
    /// Windows ordered from bottom to top
    windows: Vec<WindowId>,

    /// Fast lookup: window ID → position in stack
    positions: HashMap<WindowId, usize>,
}

impl WindowStack {
    /// Creates a new empty window stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a window to the top of the stack.
    ///
    /// Returns `false` if the window was already present (the stack is unchanged).
    pub fn push(&mut self, window_id: WindowId) -> bool {
        if self.positions.contains_key(&window_id) {
            return false;
        }

        let position = self.windows.len();
        self.windows.push(window_id);
        self.positions.insert(window_id, position);
        true
    }

    /// Removes a window from the stack.
    ///
    /// Returns the window's previous position if found.
    pub fn remove(&mut self, window_id: WindowId) -> Option<usize> {
        let pos = self.positions.remove(&window_id)?;
        self.windows.remove(pos);
        self.rebuild_positions();
        Some(pos)
    }

    /// Moves a window to the top, pushing it if it was not present.
    ///
    /// Returns `true` if the window was already in the stack.
    pub fn raise_or_push(&mut self, window_id: WindowId) -> bool {
        let present = self.remove(window_id).is_some();
        self.push(window_id);
        present
    }

    /// Keeps only the windows for which `keep` returns true.
    ///
    /// Returns the number of windows dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(WindowId) -> bool) -> usize {
        let before = self.windows.len();
        self.windows.retain(|&id| keep(id));
        let dropped = before - self.windows.len();
        if dropped > 0 {
            self.rebuild_positions();
        }
        dropped
    }

    /// Windows in bottom-to-top order.
    pub fn as_slice(&self) -> &[WindowId] {
        &self.windows
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &WindowId> {
        self.windows.iter()
    }

    /// Returns the top-most window in the stack.
    pub fn top(&self) -> Option<WindowId> {
        self.windows.last().copied()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn contains(&self, window_id: WindowId) -> bool {
        self.positions.contains_key(&window_id)
    }

    /// Position 0 is the bottom-most window, and `len() - 1` is the top-most.
    pub fn position(&self, window_id: WindowId) -> Option<usize> {
        self.positions.get(&window_id).copied()
    }

    fn rebuild_positions(&mut self) {
        self.positions.clear();
        for (i, &window_id) in self.windows.iter().enumerate() {
            self.positions.insert(window_id, i);
        }
    }
}
