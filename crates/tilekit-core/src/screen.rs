//! Screens: one widget tree, its focus, its modal dialog and its pending
//! timed event.
//!
//! Concrete screens embed a [`ScreenBase`] and implement [`Screen`]. Every
//! fallible method on the base wraps errors with the screen's name and a dump
//! of its tree, so the driver can report them without further context.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use web_time::Instant;

use crate::{
    CharSizeMap, DrawProtocol, Error, Layout, Options, Point, Result, UpEvent, UpEventCb, Widget,
    WidgetClass, WidgetId, environment,
};

/// The draw protocol shared by the router and every screen it owns.
pub type SharedAdapter = Arc<Mutex<dyn DrawProtocol + Send>>;

/// A timed event with the concrete screen type erased. It receives the
/// screen as `&mut dyn Any` and downcasts it back.
pub type TimedEvent = Box<dyn FnOnce(&mut dyn Any) + Send>;

struct PendingTimer {
    deadline: Instant,
    event: TimedEvent,
}

/// State every screen carries.
pub struct ScreenBase {
    name: String,
    root: Widget,
    focus: Option<WidgetId>,
    sizes: CharSizeMap,
    timer: Option<PendingTimer>,
    adapter: SharedAdapter,
    width: f64,
    height: f64,
}

impl std::fmt::Debug for ScreenBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenBase")
            .field("name", &self.name)
            .field("focus", &self.focus)
            .field("timer", &self.timer.as_ref().map(|t| t.deadline))
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl ScreenBase {
    pub fn new(name: impl Into<String>, adapter: SharedAdapter) -> Self {
        Self {
            name: name.into(),
            root: Widget::root(),
            focus: None,
            sizes: CharSizeMap::new(),
            timer: None,
            adapter,
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Widget {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Widget {
        &mut self.root
    }

    pub fn focus(&self) -> Option<WidgetId> {
        self.focus
    }

    pub fn char_sizes(&self) -> &CharSizeMap {
        &self.sizes
    }

    pub fn adapter(&self) -> &SharedAdapter {
        &self.adapter
    }

    pub fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn widget(&self, id: WidgetId) -> Result<&Widget> {
        self.root.find(id)
    }

    pub fn widget_mut(&mut self, id: WidgetId) -> Result<&mut Widget> {
        self.root.find_mut(id)
    }

    /// Attach `error` to this screen, unless it already carries a screen.
    pub fn wrap(&self, context: &'static str, error: Error) -> Error {
        if error.is_wrapped() {
            return error;
        }
        Error::Screen {
            context,
            name: self.name.clone(),
            dump: self.root.to_dump(),
            source: Box::new(error),
        }
    }

    /// Take the built panel as this screen's tree, number it and lay it out.
    pub fn install(&mut self, panel: Widget, width: f64, height: f64) -> Result<()> {
        self.root = if panel.class() == WidgetClass::Screen {
            panel
        } else {
            Widget::root().child(panel)
        };
        self.root.assign_root_ids();
        self.focus = None;
        self.timer = None;
        // Left unwrapped; callers attach their own context.
        self.width = width;
        self.height = height;
        let mut adapter = self.adapter.lock();
        self.root
            .resize(width, height, &mut *adapter, &mut self.sizes)
    }

    pub fn draw(&self) -> Result<()> {
        let mut adapter = self.adapter.lock();
        self.root
            .draw(&mut *adapter)
            .map_err(|e| self.wrap("Painting", e))
    }

    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        self.width = width;
        self.height = height;
        let result = {
            let mut adapter = self.adapter.lock();
            self.root
                .resize(width, height, &mut *adapter, &mut self.sizes)
        };
        result.map_err(|e| self.wrap("Resizing", e))
    }

    /// Lay out again at the current dimensions, after widgets changed.
    pub fn relayout(&mut self) -> Result<()> {
        self.resize(self.width, self.height)
    }

    /// Hit-test a press. With a dialog up only the dialog is offered the
    /// press.
    pub fn down_event(&mut self, at: Point) -> Option<UpEventCb> {
        if self.root.has_modal() {
            return self.root.children.last_mut()?.down_event(at);
        }
        self.root.down_event(at)
    }

    /// Run an up-event continuation, then move the focus to whatever it asked
    /// for.
    pub fn deliver_up(&mut self, callback: UpEventCb, at: Point) {
        let mut up = UpEvent::new(at, &mut self.root);
        callback(&mut up);
        let request = up.focus_request();
        self.set_focus(request);
    }

    pub fn set_focus(&mut self, focus: Option<WidgetId>) {
        if focus == self.focus {
            return;
        }
        let sentinel = environment().glyphs.focus_change;
        if let Some(old) = self.focus.take()
            && let Some(w) = self.root.lookup_mut(old)
        {
            w.input_event(sentinel);
        }
        if let Some(new) = focus
            && let Some(w) = self.root.lookup_mut(new)
            && w.input_event(sentinel)
        {
            self.focus = Some(new);
        }
    }

    pub fn clear_focus(&mut self) {
        self.set_focus(None);
    }

    /// Feed a character to the focused widget. Returns whether it was
    /// consumed; a widget refusing it loses the focus.
    pub fn input_event(&mut self, ch: char) -> bool {
        let Some(id) = self.focus else {
            return false;
        };
        let consumed = match self.root.lookup_mut(id) {
            Some(w) => w.input_event(ch),
            None => false,
        };
        if !consumed {
            self.focus = None;
        }
        consumed
    }

    /// Push a centered modal dialog holding `children`. `width` and `height`
    /// are fractions of the screen in `(0.1, 1]`.
    pub fn add_modal_dialog_box(
        &mut self,
        children: Vec<Widget>,
        width: f64,
        height: f64,
        thickness: i32,
        options: Option<Options>,
    ) -> Result<WidgetId> {
        if !(width > 0.1 && width <= 1.0 && height > 0.1 && height <= 1.0) {
            return Err(self.wrap("Modal", Error::InvalidDialogSize { width, height }));
        }
        let mut dialog = Widget::new(
            WidgetClass::Dialog,
            Layout::centered(width, height).thickness(thickness),
        )
        .with_children(children);
        if let Some(options) = options {
            dialog.set_options(options);
        }
        self.clear_focus();
        let result = {
            let mut adapter = self.adapter.lock();
            self.root
                .push_dialog(dialog, &mut *adapter, &mut self.sizes)
        };
        result.map_err(|e| self.wrap("Modal", e))
    }

    pub fn drop_modal_dialog_box(&mut self) -> Option<Widget> {
        self.clear_focus();
        self.root.pop_dialog(&mut self.sizes)
    }

    /// Pop every modal dialog and the pending timed event. Used when the
    /// screen is activated again.
    pub fn reset_modal_state(&mut self) {
        while self.drop_modal_dialog_box().is_some() {}
        self.timer = None;
    }

    /// Replace the pending timed event.
    pub fn set_timer(&mut self, after: Duration, event: TimedEvent) {
        self.timer = Some(PendingTimer {
            deadline: Instant::now() + after,
            event,
        });
    }

    pub fn cancel_timed_event(&mut self) {
        self.timer = None;
    }

    pub fn timer_deadline(&self) -> Option<Instant> {
        self.timer.as_ref().map(|t| t.deadline)
    }

    /// Remove the pending event if its deadline has passed by `now`.
    pub fn take_due_timer(&mut self, now: Instant) -> Option<TimedEvent> {
        if self.timer.as_ref()?.deadline > now {
            return None;
        }
        self.timer.take().map(|t| t.event)
    }
}

/// A screen of the application.
pub trait Screen: Any + Send {
    fn base(&self) -> &ScreenBase;

    fn base_mut(&mut self) -> &mut ScreenBase;

    /// Build the widget tree. Called once by [`Screen::setup`].
    fn create_screen_panel(&mut self) -> Widget;

    /// Bring widgets back to their initial state before the screen is shown
    /// again.
    fn reset_widgets(&mut self);

    /// Runs once after the first layout.
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Build, number and lay out the tree, then initialize.
    fn setup(&mut self, width: f64, height: f64) -> Result<()> {
        let panel = self.create_screen_panel();
        self.base_mut()
            .install(panel, width, height)
            .map_err(|e| self.base().wrap("Setup", e))?;
        self.initialize()
            .map_err(|e| self.base().wrap("Initialize", e))
    }

    /// Run `f` on this screen once `after` has elapsed, replacing any
    /// pending event.
    fn set_timed_event<F>(&mut self, after: Duration, f: F)
    where
        Self: Sized,
        F: FnOnce(&mut Self) + Send + 'static,
    {
        self.base_mut().set_timer(
            after,
            Box::new(move |screen: &mut dyn Any| {
                if let Some(screen) = screen.downcast_mut::<Self>() {
                    f(screen);
                }
            }),
        );
    }

    fn cancel_timed_event(&mut self) {
        self.base_mut().cancel_timed_event();
    }
}

/// Fire `screen`'s timed event if it is due. Returns whether it fired.
pub fn fire_due_timer(screen: &mut dyn Screen, now: Instant) -> bool {
    let Some(event) = screen.base_mut().take_due_timer(now) else {
        return false;
    };
    log::trace!("timed event fired on '{}'", screen.base().name());
    let any: &mut dyn Any = screen;
    event(any);
    true
}
