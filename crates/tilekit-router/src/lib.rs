//! # Event router
//!
//! The router owns every screen of an application and is the single entry
//! point to them. The driver thread feeds it presses, keys, resizes and
//! ticks; worker threads reach the current screen through
//! [`EventRouter::call`] or switch screens with [`EventRouter::activate`].
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use parking_lot::Mutex;
//! use tilekit_core::*;
//! use tilekit_router::EventRouter;
//!
//! struct Hello {
//!     base: ScreenBase,
//! }
//!
//! impl Screen for Hello {
//!     fn base(&self) -> &ScreenBase {
//!         &self.base
//!     }
//!     fn base_mut(&mut self) -> &mut ScreenBase {
//!         &mut self.base
//!     }
//!     fn create_screen_panel(&mut self) -> Widget {
//!         Widget::new(WidgetClass::Label, Layout::fill()).label("Hello")
//!     }
//!     fn reset_widgets(&mut self) {}
//! }
//!
//! let adapter: SharedAdapter = Arc::new(Mutex::new(FixedPitch::default()));
//! let router = EventRouter::new(adapter.clone(), 640.0, 480.0);
//! let hello = router.create(Hello { base: ScreenBase::new("hello", adapter) })?;
//! router.activate(hello, |_| {});
//! router.draw()?;
//! assert_eq!(router.current_screen_name().as_deref(), Some("hello"));
//! # Ok::<(), tilekit_core::Error>(())
//! ```
//!
//! ## Ordering
//!
//! Locking calls are served first come, first served by a [`FifoMutex`].
//! Screen switches and alerts are posted through [`SpinSlot`]s and applied
//! by the next [`EventRouter::draw`], never between a press and its release.

mod fifo;
mod router;
mod spin;

pub use fifo::{FifoGuard, FifoMutex};
pub use router::{EventRouter, PendingUp, ScreenHandle, ScreenKey};
pub use spin::SpinSlot;
