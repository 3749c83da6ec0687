use crate::{Point, Widget, WidgetId};

/// Continuation returned by a down-event; the driver runs it on release.
pub type UpEventCb = Box<dyn FnOnce(&mut UpEvent<'_>) + Send>;

/// What an up-event continuation gets to work with.
pub struct UpEvent<'a> {
    pub at: Point,
    pub root: &'a mut Widget,
    focus: Option<WidgetId>,
}

impl<'a> UpEvent<'a> {
    pub fn new(at: Point, root: &'a mut Widget) -> Self {
        Self {
            at,
            root,
            focus: None,
        }
    }

    /// Ask for keyboard focus to move to `id` once the continuation returns.
    /// Without a request the screen drops its focus.
    pub fn request_focus(&mut self, id: WidgetId) {
        self.focus = Some(id);
    }

    pub fn focus_request(&self) -> Option<WidgetId> {
        self.focus
    }

    pub fn widget_mut(&mut self, id: WidgetId) -> Option<&mut Widget> {
        self.root.lookup_mut(id)
    }
}
