use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Identifies a widget.
///
/// Absolute identifiers are handed out by [`crate::Widget::assign_widget_ids`]
/// in post-order and are dense per screen. Relative identifiers are only
/// meaningful inside a layout directive: they name a sibling by child index,
/// or one of the [`WidgetId::PARENT`] and [`WidgetId::ROOT`] sentinels.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId {
    value: u32,
    relative: bool,
}

const PARENT_VALUE: u32 = u32::MAX;
const ROOT_VALUE: u32 = u32::MAX - 1;

impl WidgetId {
    /// Not yet assigned.
    pub const NONE: WidgetId = WidgetId {
        value: 0,
        relative: false,
    };
    pub const PARENT: WidgetId = WidgetId {
        value: PARENT_VALUE,
        relative: true,
    };
    pub const ROOT: WidgetId = WidgetId {
        value: ROOT_VALUE,
        relative: true,
    };

    pub const fn absolute(value: u32) -> Self {
        WidgetId {
            value,
            relative: false,
        }
    }

    /// The `index`-th child of the widget containing the layout.
    pub const fn child(index: u32) -> Self {
        WidgetId {
            value: index,
            relative: true,
        }
    }

    pub fn value(self) -> u32 {
        self.value
    }

    pub fn is_relative(self) -> bool {
        self.relative
    }

    pub fn is_set(self) -> bool {
        self != WidgetId::NONE
    }

    pub fn is_parent(self) -> bool {
        self == WidgetId::PARENT
    }

    pub fn is_root(self) -> bool {
        self == WidgetId::ROOT
    }

    /// Sibling index for relative, non-sentinel identifiers.
    pub fn child_index(self) -> Option<usize> {
        (self.relative && self.value < ROOT_VALUE).then_some(self.value as usize)
    }
}

impl Default for WidgetId {
    fn default() -> Self {
        WidgetId::NONE
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (*self, self.relative) {
            (WidgetId::PARENT, _) => f.write_str("parent"),
            (WidgetId::ROOT, _) => f.write_str("root"),
            (_, true) => write!(f, "child:{}", self.value),
            (_, false) if !self.is_set() => f.write_str("unset"),
            (_, false) => write!(f, "{}", self.value),
        }
    }
}

impl fmt::Debug for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WidgetId({self})")
    }
}

/// A handle client code keeps on a widget across moves.
///
/// The widget writes its absolute identifier into the tracker every time
/// identifiers are assigned, so the handle stays valid after the widget was
/// moved into a parent, a screen, or a dialog.
#[derive(Clone, Default)]
pub struct Tracker(Arc<AtomicU32>);

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<WidgetId> {
        let id = WidgetId::absolute(self.0.load(Ordering::Acquire));
        id.is_set().then_some(id)
    }

    pub fn ptr_eq(&self, other: &Tracker) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn set(&self, id: WidgetId) {
        self.0.store(id.value(), Ordering::Release);
    }

    pub(crate) fn clear(&self) {
        self.0.store(0, Ordering::Release);
    }
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tracker").field(&self.get()).finish()
    }
}
