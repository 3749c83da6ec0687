//! Layout directives.
//!
//! A widget's rectangle is declared by two [`Position`]s, each one a vertex
//! of another widget's rectangle scaled by `(sx, sy)` in `[-1, 1]`: `-1` is
//! the left (top) edge, `0` the center and `1` the right (bottom) edge.
//!
//! ```
//! use tilekit_core::{Layout, Position, WidgetId};
//!
//! // Upper-left quadrant of the parent.
//! let quadrant = Layout::new(Position::new(-1.0, -1.0), Position::new(0.0, 0.0));
//! assert_eq!(quadrant.upper_left.widget_ref.id(), Some(WidgetId::PARENT));
//!
//! // A square pinned to the upper right corner of the parent.
//! let badge = Layout::slice(true, 0.9, 1.0).pin(tilekit_core::Vertex::UpperRight);
//! assert!(badge.pin.is_some());
//! ```

use crate::{Tracker, WidgetId};

/// Which edge of a bordered rectangle an offset is measured against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Normalize {
    /// Outer edge of the border.
    Outer,
    /// Midline of the border.
    Middle,
    /// Inner edge of the border.
    Inner,
    /// `Inner` when the referent is the parent, `Outer` otherwise.
    #[default]
    Default,
}

impl Normalize {
    pub fn as_str(self) -> &'static str {
        match self {
            Normalize::Outer => "outer",
            Normalize::Middle => "middle",
            Normalize::Inner => "inner",
            Normalize::Default => "default",
        }
    }

    /// Amount the referent's radius shrinks along one axis.
    pub(crate) fn inset(self, border: f64, referent_is_parent: bool) -> f64 {
        match self {
            Normalize::Outer => 0.0,
            Normalize::Middle => border / 2.0,
            Normalize::Inner => border,
            Normalize::Default if referent_is_parent => border,
            Normalize::Default => 0.0,
        }
    }
}

/// One of the nine vertices a square can be pinned at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vertex {
    UpperLeft,
    UpperCenter,
    UpperRight,
    CenterLeft,
    CenterCenter,
    CenterRight,
    LowerLeft,
    LowerCenter,
    LowerRight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Anchor {
    Start,
    Middle,
    End,
}

impl Vertex {
    pub(crate) fn anchors(self) -> (Anchor, Anchor) {
        use Anchor::*;
        match self {
            Vertex::UpperLeft => (Start, Start),
            Vertex::UpperCenter => (Middle, Start),
            Vertex::UpperRight => (End, Start),
            Vertex::CenterLeft => (Start, Middle),
            Vertex::CenterCenter => (Middle, Middle),
            Vertex::CenterRight => (End, Middle),
            Vertex::LowerLeft => (Start, End),
            Vertex::LowerCenter => (Middle, End),
            Vertex::LowerRight => (End, End),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Vertex::UpperLeft => "upper-left",
            Vertex::UpperCenter => "upper-center",
            Vertex::UpperRight => "upper-right",
            Vertex::CenterLeft => "center-left",
            Vertex::CenterCenter => "center",
            Vertex::CenterRight => "center-right",
            Vertex::LowerLeft => "lower-left",
            Vertex::LowerCenter => "lower-center",
            Vertex::LowerRight => "lower-right",
        }
    }
}

/// The widget a position is measured against.
#[derive(Clone, Debug, PartialEq)]
pub enum WidgetRef {
    Id(WidgetId),
    /// Indirection through a tracker attached to some other widget.
    Tracked(TrackerRef),
}

impl WidgetRef {
    pub fn id(&self) -> Option<WidgetId> {
        match self {
            WidgetRef::Id(id) => Some(*id),
            WidgetRef::Tracked(t) => t.0.get(),
        }
    }

    /// True when the reference cannot survive a move into another tree.
    pub fn is_absolute(&self) -> bool {
        match self {
            WidgetRef::Id(id) => !id.is_relative(),
            WidgetRef::Tracked(_) => true,
        }
    }
}

impl From<WidgetId> for WidgetRef {
    fn from(id: WidgetId) -> Self {
        WidgetRef::Id(id)
    }
}

impl From<&Tracker> for WidgetRef {
    fn from(t: &Tracker) -> Self {
        WidgetRef::Tracked(TrackerRef(t.clone()))
    }
}

/// Tracker compared by identity.
#[derive(Clone, Debug)]
pub struct TrackerRef(pub Tracker);

impl PartialEq for TrackerRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

impl std::fmt::Display for WidgetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WidgetRef::Id(id) => write!(f, "{id}"),
            WidgetRef::Tracked(t) => match t.0.get() {
                Some(id) => write!(f, "tracked:{id}"),
                None => f.write_str("tracked:unset"),
            },
        }
    }
}

/// One corner of a widget's rectangle.
#[derive(Clone, Debug, PartialEq)]
pub struct Position {
    pub sx: f64,
    pub sy: f64,
    pub widget_ref: WidgetRef,
    pub norm_x: Normalize,
    pub norm_y: Normalize,
}

impl Position {
    /// Vertex of the parent.
    pub fn new(sx: f64, sy: f64) -> Self {
        Self::of(sx, sy, WidgetId::PARENT)
    }

    pub fn of(sx: f64, sy: f64, widget_ref: impl Into<WidgetRef>) -> Self {
        Self {
            sx,
            sy,
            widget_ref: widget_ref.into(),
            norm_x: Normalize::Default,
            norm_y: Normalize::Default,
        }
    }

    pub fn normalize(mut self, norm: Normalize) -> Self {
        self.norm_x = norm;
        self.norm_y = norm;
        self
    }

    pub fn normalize_xy(mut self, x: Normalize, y: Normalize) -> Self {
        self.norm_x = x;
        self.norm_y = y;
        self
    }
}

/// Where a widget lies relative to others.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub upper_left: Position,
    pub lower_right: Position,
    pub pin: Option<Vertex>,
    /// Border thickness in per-mille of the larger root dimension; `-1`
    /// inherits the class default.
    pub thickness: i32,
}

impl Default for Layout {
    fn default() -> Self {
        Layout::new(Position::new(-1.0, -1.0), Position::new(1.0, 1.0))
    }
}

impl Layout {
    pub const INHERIT: i32 = -1;

    pub fn new(upper_left: Position, lower_right: Position) -> Self {
        Self {
            upper_left,
            lower_right,
            pin: None,
            thickness: Layout::INHERIT,
        }
    }

    /// Fill the parent.
    pub fn fill() -> Self {
        Layout::default()
    }

    /// Centered box covering `width` by `height` of the referent's extent
    /// (both in `(0, 1]`), measured against the root's outer edge.
    pub fn centered(width: f64, height: f64) -> Self {
        Layout::new(
            Position::of(-width, -height, WidgetId::ROOT).normalize(Normalize::Outer),
            Position::of(width, height, WidgetId::ROOT).normalize(Normalize::Outer),
        )
    }

    /// A horizontal (`vertical == false`) or vertical slice of the parent
    /// between the two scalars.
    pub fn slice(vertical: bool, begin: f64, end: f64) -> Self {
        if vertical {
            Layout::new(Position::new(begin, -1.0), Position::new(end, 1.0))
        } else {
            Layout::new(Position::new(-1.0, begin), Position::new(1.0, end))
        }
    }

    pub fn thickness(mut self, per_mille: i32) -> Self {
        self.thickness = per_mille;
        self
    }

    pub fn pin(mut self, vertex: Vertex) -> Self {
        self.pin = Some(vertex);
        self
    }

    /// First position whose reference is absolute, if any.
    pub fn absolute_reference(&self) -> Option<&WidgetRef> {
        [&self.upper_left, &self.lower_right]
            .into_iter()
            .map(|p| &p.widget_ref)
            .find(|r| r.is_absolute())
    }
}
