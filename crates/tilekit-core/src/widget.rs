use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::{
    DrawData, DrawProtocol, Error, LabelView, Layout, LayoutCx, Options, Point, Rectangle,
    Result, Text, Tracker, UpEventCb, WidgetId, environment,
};

/// The closed set of widget classes. Class names key the environment's
/// defaults and tag serialized dumps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WidgetClass {
    Screen,
    Dialog,
    #[default]
    Panel,
    Label,
    Push,
    Bullet,
    Item,
    List,
}

impl WidgetClass {
    pub const COUNT: usize = 8;
    pub const ALL: [WidgetClass; WidgetClass::COUNT] = [
        WidgetClass::Screen,
        WidgetClass::Dialog,
        WidgetClass::Panel,
        WidgetClass::Label,
        WidgetClass::Push,
        WidgetClass::Bullet,
        WidgetClass::Item,
        WidgetClass::List,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WidgetClass::Screen => "screen",
            WidgetClass::Dialog => "dialog",
            WidgetClass::Panel => "panel",
            WidgetClass::Label => "label",
            WidgetClass::Push => "push",
            WidgetClass::Bullet => "bullet",
            WidgetClass::Item => "item",
            WidgetClass::List => "list",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for WidgetClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        WidgetClass::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown widget class '{s}'")))
    }
}

impl fmt::Display for WidgetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct WidgetFlags: u8 {
        const HIDDEN = 1;
        const DISABLED = 1 << 1;
        /// Hit-test against the label bounds instead of the rectangle.
        const USE_TEXT_BOUNDS = 1 << 2;
        /// Last layout produced an inverted rectangle.
        const LAYOUT_FAILED = 1 << 3;
    }
}

/// Paints one widget; the result says whether to descend into children.
pub type DrawFn = Arc<dyn Fn(&Widget, &mut dyn DrawProtocol) -> Result<bool> + Send + Sync>;
/// Resolves one widget's rectangle and label; children are walked after.
pub type LayoutFn = Arc<dyn Fn(&mut Widget, &mut LayoutCx<'_>) -> Result<()> + Send + Sync>;
pub type DownEventFn = Arc<dyn Fn(&mut Widget, Point) -> Option<UpEventCb> + Send + Sync>;
/// Consumes a character; `false` gives up the focus.
pub type InputFn = Arc<dyn Fn(&mut Widget, char) -> bool + Send + Sync>;
/// Called with `(parent, child)` before the child is appended.
pub type NewChildFn = Arc<dyn Fn(&mut Widget, &mut Widget) + Send + Sync>;
pub type SerializeFn =
    Arc<dyn Fn(&Widget, &mut dyn fmt::Write, usize) -> fmt::Result + Send + Sync>;

/// Installable behavior. A missing hook falls back to the default method.
#[derive(Clone, Default)]
pub struct Methods {
    pub draw: Option<DrawFn>,
    pub layout: Option<LayoutFn>,
    pub down_event: Option<DownEventFn>,
    pub input: Option<InputFn>,
    pub new_child: Option<NewChildFn>,
    pub serialize: Option<SerializeFn>,
}

impl fmt::Debug for Methods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Methods")
            .field("draw", &self.draw.is_some())
            .field("layout", &self.layout.is_some())
            .field("down_event", &self.down_event.is_some())
            .field("input", &self.input.is_some())
            .field("new_child", &self.new_child.is_some())
            .field("serialize", &self.serialize.is_some())
            .finish()
    }
}

/// A rectangular node of the widget tree.
#[derive(Debug)]
pub struct Widget {
    pub(crate) class: WidgetClass,
    pub(crate) layout: Layout,
    pub(crate) draw: DrawData,
    pub(crate) text: Option<Text>,
    pub(crate) flags: WidgetFlags,
    pub(crate) children: Vec<Widget>,
    pub(crate) methods: Methods,
    pub(crate) tracker: Option<Tracker>,
    /// Root only: the next identifier to hand out.
    pub(crate) next_id: u32,
    /// Root only: `next_id` saved by each pushed dialog.
    pub(crate) dialog_marks: SmallVec<[u32; 2]>,
}

impl Widget {
    pub fn new(class: WidgetClass, layout: Layout) -> Self {
        let options = environment().defaults(class).options.clone();
        Self {
            class,
            layout,
            draw: DrawData {
                class,
                options,
                ..Default::default()
            },
            text: None,
            flags: WidgetFlags::empty(),
            children: Vec::new(),
            methods: Methods::default(),
            tracker: None,
            next_id: 0,
            dialog_marks: SmallVec::new(),
        }
    }

    /// The root of a screen, covering the whole framebuffer.
    pub fn root() -> Self {
        Widget::new(WidgetClass::Screen, Layout::fill())
    }

    pub fn with_text(mut self, text: Text) -> Self {
        self.text = Some(text);
        self
    }

    pub fn label(self, view: impl Into<LabelView>) -> Self {
        self.with_text(Text::new(view))
    }

    pub fn child(mut self, child: Widget) -> Self {
        self.add_child(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Widget>) -> Self {
        for c in children {
            self.add_child(c);
        }
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.draw.options = options;
        self
    }

    pub fn tracker(mut self, tracker: &Tracker) -> Self {
        self.tracker = Some(tracker.clone());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.set_hidden(hidden);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.set_disabled(disabled);
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.draw.selected = selected;
        self
    }

    pub fn disable_effect(mut self, on: bool) -> Self {
        self.draw.disable_effect = on;
        self
    }

    pub fn use_text_bounds(mut self) -> Self {
        self.flags.insert(WidgetFlags::USE_TEXT_BOUNDS);
        self
    }

    pub fn on_draw(
        mut self,
        f: impl Fn(&Widget, &mut dyn DrawProtocol) -> Result<bool> + Send + Sync + 'static,
    ) -> Self {
        self.methods.draw = Some(Arc::new(f));
        self
    }

    pub fn on_layout(
        mut self,
        f: impl Fn(&mut Widget, &mut LayoutCx<'_>) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.methods.layout = Some(Arc::new(f));
        self
    }

    pub fn on_down_event(
        mut self,
        f: impl Fn(&mut Widget, Point) -> Option<UpEventCb> + Send + Sync + 'static,
    ) -> Self {
        self.methods.down_event = Some(Arc::new(f));
        self
    }

    pub fn on_input(
        mut self,
        f: impl Fn(&mut Widget, char) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.methods.input = Some(Arc::new(f));
        self
    }

    pub fn on_new_child(
        mut self,
        f: impl Fn(&mut Widget, &mut Widget) + Send + Sync + 'static,
    ) -> Self {
        self.methods.new_child = Some(Arc::new(f));
        self
    }

    pub fn on_serialize(
        mut self,
        f: impl Fn(&Widget, &mut dyn fmt::Write, usize) -> fmt::Result + Send + Sync + 'static,
    ) -> Self {
        self.methods.serialize = Some(Arc::new(f));
        self
    }

    pub fn methods_mut(&mut self) -> &mut Methods {
        &mut self.methods
    }

    // ---- accessors ----

    pub fn id(&self) -> WidgetId {
        self.draw.id
    }

    pub fn class(&self) -> WidgetClass {
        self.class
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut Layout {
        &mut self.layout
    }

    pub fn draw_data(&self) -> &DrawData {
        &self.draw
    }

    pub fn rect(&self) -> Rectangle {
        self.draw.rect
    }

    pub fn text(&self) -> Option<&Text> {
        self.text.as_ref()
    }

    pub fn text_mut(&mut self) -> Option<&mut Text> {
        self.text.as_mut()
    }

    pub fn label_str(&self) -> &str {
        &self.draw.label
    }

    pub fn char_size(&self) -> u16 {
        self.draw.char_size
    }

    /// Replace the label. The draw record follows immediately; sizes wait
    /// for the next layout.
    pub fn set_label(&mut self, view: impl Into<LabelView>) {
        let view = view.into();
        self.draw.label = view.resolve();
        match &mut self.text {
            Some(t) => t.view = view,
            None => self.text = Some(Text::new(view)),
        }
    }

    /// Resolve the label view again, e.g. after the state behind a dynamic
    /// view changed.
    pub fn refresh_label(&mut self) {
        if let Some(t) = &self.text {
            self.draw.label = t.view.resolve();
        }
    }

    pub fn children(&self) -> &[Widget] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Widget] {
        &mut self.children
    }

    pub fn flags(&self) -> WidgetFlags {
        self.flags
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.contains(WidgetFlags::HIDDEN)
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.flags.set(WidgetFlags::HIDDEN, hidden);
    }

    pub fn is_disabled(&self) -> bool {
        self.flags.contains(WidgetFlags::DISABLED)
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.flags.set(WidgetFlags::DISABLED, disabled);
    }

    pub fn is_selected(&self) -> bool {
        self.draw.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.draw.selected = selected;
    }

    pub fn set_disable_effect(&mut self, on: bool) {
        self.draw.disable_effect = on;
    }

    pub fn set_options(&mut self, options: Options) {
        self.draw.options = options;
    }

    pub fn successful_layout(&self) -> bool {
        !self.flags.contains(WidgetFlags::LAYOUT_FAILED)
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn get_tracker(&self) -> Option<&Tracker> {
        self.tracker.as_ref()
    }

    /// Last child is a pushed dialog.
    pub fn has_modal(&self) -> bool {
        !self.dialog_marks.is_empty()
    }

    // ---- composition ----

    /// Append `child`, running the new-child hook first.
    pub fn add_child(&mut self, mut child: Widget) -> &mut Widget {
        if let Some(hook) = self.methods.new_child.clone() {
            hook(self, &mut child);
        }
        let index = self.children.len();
        self.children.push(child);
        &mut self.children[index]
    }

    /// Number the subtree in post-order starting at `next`; returns the
    /// first unused identifier.
    pub fn assign_widget_ids(&mut self, mut next: u32) -> u32 {
        for child in &mut self.children {
            next = child.assign_widget_ids(next);
        }
        self.draw.id = WidgetId::absolute(next);
        if let Some(t) = &self.tracker {
            t.set(self.draw.id);
        }
        next + 1
    }

    /// Number a whole tree from 1 and remember where the root left off.
    pub fn assign_root_ids(&mut self) -> u32 {
        self.dialog_marks.clear();
        self.next_id = self.assign_widget_ids(1);
        log::debug!(
            "assigned widget ids 1..{} to {} tree",
            self.next_id,
            self.class
        );
        self.next_id
    }

    /// Number of nodes in the subtree.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Widget::count).sum::<usize>()
    }

    /// Visit the subtree in pre-order.
    pub fn for_each(&self, f: &mut impl FnMut(&Widget)) {
        f(self);
        for c in &self.children {
            c.for_each(f);
        }
    }

    pub fn lookup(&self, id: WidgetId) -> Option<&Widget> {
        if self.draw.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.lookup(id))
    }

    pub fn lookup_mut(&mut self, id: WidgetId) -> Option<&mut Widget> {
        if self.draw.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.lookup_mut(id))
    }

    pub fn find(&self, id: WidgetId) -> Result<&Widget> {
        self.lookup(id).ok_or(Error::WidgetNotFound(id))
    }

    pub fn find_mut(&mut self, id: WidgetId) -> Result<&mut Widget> {
        self.lookup_mut(id).ok_or(Error::WidgetNotFound(id))
    }

    pub fn lookup_tracked(&mut self, tracker: &Tracker) -> Option<&mut Widget> {
        tracker.get().and_then(|id| self.lookup_mut(id))
    }

    pub fn parent_of(&self, id: WidgetId) -> Option<&Widget> {
        if self.children.iter().any(|c| c.draw.id == id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.parent_of(id))
    }

    /// Resolve `id` against `context`, called on the root: `ROOT` is this
    /// widget, `PARENT` the context's parent, `child(n)` the context's n-th
    /// child, and absolute identifiers are searched in the tree.
    pub fn lookup_from(&self, context: WidgetId, id: WidgetId) -> Result<&Widget> {
        let found = if id.is_root() {
            Some(self)
        } else if id.is_parent() {
            self.parent_of(context)
        } else if let Some(index) = id.child_index() {
            self.lookup(context)
                .and_then(|c| c.children.get(index))
        } else {
            self.lookup(id)
        };
        found.ok_or(Error::WidgetNotFound(id))
    }

    /// Duplicate the subtree. Every layout reference inside must be relative
    /// since absolute identifiers do not survive the move to another tree.
    pub fn try_clone(&self) -> Result<Widget> {
        if let Some(reference) = self.layout.absolute_reference() {
            return Err(Error::InvalidClone {
                widget: self.draw.id,
                reference: reference.to_string(),
            });
        }
        let children = self
            .children
            .iter()
            .map(Widget::try_clone)
            .collect::<Result<Vec<_>>>()?;
        Ok(Widget {
            class: self.class,
            layout: self.layout.clone(),
            draw: DrawData {
                id: WidgetId::NONE,
                ..self.draw.clone()
            },
            text: self.text.clone(),
            flags: self.flags - WidgetFlags::LAYOUT_FAILED,
            children,
            methods: self.methods.clone(),
            tracker: None,
            next_id: 0,
            dialog_marks: SmallVec::new(),
        })
    }

    // ---- dispatch ----

    /// Paint the subtree in child order, later children over earlier ones.
    pub fn draw(&self, adapter: &mut dyn DrawProtocol) -> Result<()> {
        if self.is_hidden() || !self.successful_layout() {
            return Ok(());
        }
        let descend = match &self.methods.draw {
            Some(hook) => hook(self, adapter)?,
            None => adapter.draw(&self.draw),
        };
        if descend {
            for child in &self.children {
                child.draw(adapter)?;
            }
        }
        Ok(())
    }

    /// The rectangle presses are tested against.
    pub fn hit_rect(&self) -> Rectangle {
        if self.flags.contains(WidgetFlags::USE_TEXT_BOUNDS) {
            self.draw.label_bounds
        } else {
            self.draw.rect
        }
    }

    /// Whether a press at `at` may land on this widget.
    pub fn accepts(&self, at: Point) -> bool {
        !self.flags.intersects(
            WidgetFlags::HIDDEN | WidgetFlags::DISABLED | WidgetFlags::LAYOUT_FAILED,
        ) && self.hit_rect().contains(at)
    }

    pub fn down_event(&mut self, at: Point) -> Option<UpEventCb> {
        match self.methods.down_event.clone() {
            Some(hook) => hook(self, at),
            None => self.default_down_event(at),
        }
    }

    /// Offer the press to children, topmost first.
    pub fn default_down_event(&mut self, at: Point) -> Option<UpEventCb> {
        if !self.accepts(at) {
            return None;
        }
        self.children
            .iter_mut()
            .rev()
            .find_map(|c| c.down_event(at))
    }

    pub fn input_event(&mut self, ch: char) -> bool {
        match self.methods.input.clone() {
            Some(hook) => hook(self, ch),
            None => false,
        }
    }
}
