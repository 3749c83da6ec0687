//! # Tilekit core
//!
//! A retained-mode widget tree whose rectangles are declared relative to
//! other widgets and resolved for whatever framebuffer size the screen has.
//!
//! - [`Widget`] is the single node type. Behavior comes from installable
//!   hooks (draw, layout, down-event, input, new-child, serialize) with
//!   defaults for each.
//! - [`Layout`] places a widget by two [`Position`]s, each a scaled vertex of
//!   the parent, the root, a sibling or any widget by identifier.
//! - The resolver runs two passes so that forward references resolve and
//!   labels sharing a char-size group end up with one character size. A
//!   settle pass between them fits group members placed by forward
//!   references.
//! - A [`DrawProtocol`] paints draw records and measures labels. The core
//!   ships a deterministic [`FixedPitch`] protocol for headless use.
//!
//! ```
//! use tilekit_core::*;
//!
//! let mut root = Widget::root().child(
//!     Widget::new(
//!         WidgetClass::Label,
//!         Layout::new(Position::new(-1.0, -1.0), Position::new(0.0, 0.0)),
//!     )
//!     .label("Hello"),
//! );
//! root.assign_root_ids();
//!
//! let mut metrics = FixedPitch::default();
//! let mut sizes = CharSizeMap::new();
//! root.resize(1000.0, 1000.0, &mut metrics, &mut sizes).unwrap();
//!
//! let label = &root.children()[0];
//! assert_eq!(label.rect(), Rectangle::new(0.0, 0.0, 500.0, 500.0, 0.0));
//! assert!(label.char_size() > 0);
//! ```

pub mod color;
pub mod draw;
pub mod environment;
pub mod error;
pub mod event;
pub mod geometry;
pub mod id;
pub mod layout;
pub mod prelude;
pub mod resolve;
pub mod screen;
pub mod serialize;
pub mod tests;
pub mod text;
pub mod widget;

pub use color::*;
pub use draw::*;
pub use environment::*;
pub use error::*;
pub use event::*;
pub use geometry::*;
pub use id::*;
pub use layout::{Layout, Normalize, Position, TrackerRef, Vertex, WidgetRef};
pub use resolve::*;
pub use screen::*;
pub use serialize::*;
pub use text::*;
pub use widget::*;
