//! # Strata Window Stack Library
//!
//! A stack manager for overlay windows (dialogs, popups, panels) with
//! animated show/hide transitions and a shared dimming shadow.
//!
//! ## Architecture
//!
//! Strata is built on a modular architecture:
//! - `manager`: The window stack, sorting order and open/close operations
//! - `window`: Window lifecycle, declared flags and transition strategies
//! - `effects`: Tweens, sequences, playback scheduling and the shadow
//! - `surface`: Capabilities the host toolkit implements for drawing
//! - `events`: Stack notifications and listener lists
//! - `config`: Configuration parsing and management
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use strata::config::WindowTemplate;
//! use strata::manager::templates::NoResources;
//! use strata::{HeadlessSurface, StrataConfig, WindowKind, WindowManager, WindowParts};
//!
//! let mut config = StrataConfig::default();
//! config.windows.insert(WindowTemplate::new("Settings", "alpha"));
//!
//! let mut manager = WindowManager::new(
//!     config,
//!     |_: &WindowKind, _: &WindowTemplate| -> strata::Result<WindowParts> {
//!         Ok(WindowParts::new(HeadlessSurface::new().shared()))
//!     },
//!     NoResources,
//!     HeadlessSurface::new(),
//!     HeadlessSurface::new(),
//! );
//!
//! let opened = manager.open("Settings")?;
//! manager.scheduler().tick(Duration::from_secs(1));
//! assert!(opened.transition.is_complete());
//! assert!(manager.is_opened("Settings"));
//! # Ok::<(), strata::StackError>(())
//! ```

pub mod config;
pub mod effects;
pub mod error;
pub mod events;
pub mod logging;
pub mod manager;
pub mod surface;
pub mod window;

// Re-export main types for easy access
pub use config::StrataConfig;
pub use effects::{Ease, Scheduler, Sequence, TransitionHandle};
pub use error::{Result, StackError};
pub use events::{StackEvent, SubscriptionId};
pub use manager::{Opened, WindowFactory, WindowManager};
pub use surface::{HeadlessSurface, ShadowSurface, Surface, WindowVisual};
pub use window::{
    TransitionKind, Window, WindowBehavior, WindowFlags, WindowId, WindowKind, WindowParts,
    WindowRef, WindowState,
};

/// Version information for Strata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
