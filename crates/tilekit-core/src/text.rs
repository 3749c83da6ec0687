use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::{BulletMark, WidgetId, environment};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// A widget's label: a fixed string, or a function producing one each time
/// the label is resolved.
#[derive(Clone)]
pub enum LabelView {
    Static(String),
    Dynamic(Arc<dyn Fn() -> String + Send + Sync>),
}

impl LabelView {
    pub fn dynamic(f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        LabelView::Dynamic(Arc::new(f))
    }

    /// Current string. Static labels pass through the environment's
    /// translation hook.
    pub fn resolve(&self) -> String {
        match self {
            LabelView::Static(s) => environment().translate(s),
            LabelView::Dynamic(f) => f(),
        }
    }
}

impl Default for LabelView {
    fn default() -> Self {
        LabelView::Static(String::new())
    }
}

impl fmt::Debug for LabelView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelView::Static(s) => f.debug_tuple("Static").field(s).finish(),
            LabelView::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

impl From<&str> for LabelView {
    fn from(s: &str) -> Self {
        LabelView::Static(s.to_string())
    }
}

impl From<String> for LabelView {
    fn from(s: String) -> Self {
        LabelView::Static(s)
    }
}

/// Label data and how to lay it out.
#[derive(Clone, Debug, Default)]
pub struct Text {
    pub view: LabelView,
    pub align: TextAlign,
    /// Labels sharing a group tag (within one dialog or screen) share one
    /// character size.
    pub group: Option<u8>,
    pub mark: BulletMark,
    pub left_align_mark: bool,
    /// Center on the character size rather than the measured height, so
    /// labels of one row share a baseline.
    pub baseline_align: bool,
    /// Largest size that fit this label in the last first pass.
    pub(crate) fitted: u16,
    /// The rectangle was still unresolved in the last first pass.
    pub(crate) deferred: bool,
}

impl Text {
    pub fn new(view: impl Into<LabelView>) -> Self {
        Self {
            view: view.into(),
            left_align_mark: true,
            ..Default::default()
        }
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn group(mut self, group: u8) -> Self {
        self.group = Some(group);
        self
    }

    pub fn mark(mut self, mark: BulletMark, left: bool) -> Self {
        self.mark = mark;
        self.left_align_mark = left;
        self
    }

    pub fn baseline_align(mut self) -> Self {
        self.baseline_align = true;
        self
    }

    pub fn fitted(&self) -> u16 {
        self.fitted
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Text::new(s)
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        Text::new(s)
    }
}

/// A char-size group: the tag qualified by the dialog (or root) it lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub scope: WidgetId,
    pub group: u8,
}

/// Chosen character size per group: the smallest size any member needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CharSizeMap(BTreeMap<GroupKey, u16>);

impl CharSizeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: GroupKey) -> Option<u16> {
        self.0.get(&key).copied()
    }

    /// Exclusive search limit for a new member, capped by the group size.
    pub fn limit(&self, key: GroupKey, upper_limit: u16) -> u16 {
        match self.get(key) {
            Some(size) => upper_limit.min(size.saturating_add(1)),
            None => upper_limit,
        }
    }

    /// Record a member's fit; keeps the smaller size.
    pub fn record(&mut self, key: GroupKey, size: u16) {
        self.0
            .entry(key)
            .and_modify(|s| *s = (*s).min(size))
            .or_insert(size);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Drop the groups scoped to one dialog.
    pub fn clear_scope(&mut self, scope: WidgetId) {
        self.0.retain(|k, _| k.scope != scope);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GroupKey, u16)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}
