use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use slotmap::SlotMap;
use tilekit_core::{
    CharSizeMap, Error, Layout, Point, Result, Screen, SharedAdapter, UpEvent, UpEventCb, Widget,
    WidgetClass, fire_due_timer,
};
use web_time::Instant;

use crate::{FifoMutex, SpinSlot};

slotmap::new_key_type! {
    /// Registry key of a created screen.
    pub struct ScreenKey;
}

/// Typed handle to a screen created by [`EventRouter::create`].
pub struct ScreenHandle<S> {
    key: ScreenKey,
    _screen: PhantomData<fn() -> S>,
}

impl<S> ScreenHandle<S> {
    fn new(key: ScreenKey) -> Self {
        Self {
            key,
            _screen: PhantomData,
        }
    }

    pub fn key(&self) -> ScreenKey {
        self.key
    }
}

impl<S> Clone for ScreenHandle<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for ScreenHandle<S> {}

impl<S> PartialEq for ScreenHandle<S> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<S> Eq for ScreenHandle<S> {}

impl<S> fmt::Debug for ScreenHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScreenHandle")
            .field(&std::any::type_name::<S>())
            .field(&self.key)
            .finish()
    }
}

type Reset = Box<dyn FnOnce(&mut dyn Screen) + Send>;

struct Activation {
    key: ScreenKey,
    reset: Reset,
}

enum AlertUpdate {
    Show {
        panel: Widget,
        width: f64,
        height: f64,
        thickness: i32,
    },
    Discard,
}

struct Alert {
    root: Widget,
    sizes: CharSizeMap,
}

struct Installed {
    screen: Box<dyn Screen>,
    type_name: &'static str,
}

struct State {
    screens: SlotMap<ScreenKey, Installed>,
    current: Option<ScreenKey>,
    width: f64,
    height: f64,
    alert: Option<Alert>,
}

impl State {
    fn current(&self) -> Option<&Installed> {
        self.screens.get(self.current?)
    }

    fn current_mut(&mut self) -> Option<&mut Installed> {
        self.screens.get_mut(self.current?)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Alert,
    Screen(ScreenKey),
}

/// Owns every screen and serializes all access to them.
///
/// Driver calls (`draw`, `down_event`, `input_event`, `resize`, `tick`) and
/// worker calls (`call`, `create`) take one [`FifoMutex`] and enter the
/// screens in arrival order. `activate`, `show_alert` and `discard_alert`
/// only post to a [`SpinSlot`]; the next `draw` applies them.
///
/// Callbacks run with the router locked and must not call back into the
/// locking methods.
pub struct EventRouter {
    state: FifoMutex<State>,
    adapter: SharedAdapter,
    activation: SpinSlot<Activation>,
    alert_update: SpinSlot<AlertUpdate>,
    pending_ups: AtomicUsize,
    dirty: AtomicBool,
    shutdown: AtomicBool,
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRouter")
            .field("lock", &self.state)
            .field("pending_ups", &self.pending_ups.load(Ordering::Relaxed))
            .field("shutdown", &self.shutdown.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

fn sleep_until(deadline: Instant) {
    let now = Instant::now();
    if deadline > now {
        std::thread::sleep(deadline - now);
    }
}

impl EventRouter {
    pub fn new(adapter: SharedAdapter, width: f64, height: f64) -> Arc<Self> {
        Arc::new(Self {
            state: FifoMutex::new(State {
                screens: SlotMap::with_key(),
                current: None,
                width,
                height,
                alert: None,
            }),
            adapter,
            activation: SpinSlot::new(),
            alert_update: SpinSlot::new(),
            pending_ups: AtomicUsize::new(0),
            dirty: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        })
    }

    /// The draw protocol screens should be built with.
    pub fn adapter(&self) -> &SharedAdapter {
        &self.adapter
    }

    pub fn dimensions(&self) -> (f64, f64) {
        let state = self.state.lock();
        (state.width, state.height)
    }

    /// Set up `screen` at the current dimensions and register it. It stays
    /// hidden until activated.
    pub fn create<S: Screen>(&self, mut screen: S) -> Result<ScreenHandle<S>> {
        let mut state = self.state.lock();
        screen.setup(state.width, state.height)?;
        log::info!(
            "created screen '{}' ({} widgets)",
            screen.base().name(),
            screen.base().root().count()
        );
        let key = state.screens.insert(Installed {
            screen: Box::new(screen),
            type_name: std::any::type_name::<S>(),
        });
        Ok(ScreenHandle::new(key))
    }

    /// Make `handle` the current screen at the next draw with no press
    /// outstanding. Its dialogs and timed event are dropped, then
    /// `reset_widgets` and `reset` run and the screen is laid out again.
    ///
    /// A later activation replaces one not yet applied.
    pub fn activate<S: Screen>(
        &self,
        handle: ScreenHandle<S>,
        reset: impl FnOnce(&mut S) + Send + 'static,
    ) {
        let reset: Reset = Box::new(move |screen: &mut dyn Screen| {
            let any: &mut dyn Any = screen;
            if let Some(screen) = any.downcast_mut::<S>() {
                reset(screen);
            }
        });
        let replaced = self.activation.put(Activation {
            key: handle.key,
            reset,
        });
        if replaced.is_some() {
            log::debug!("pending activation replaced");
        }
        self.dirty.store(true, Ordering::Release);
    }

    /// Run `f` on the screen if it is current. Returns `None` when it is not;
    /// calls from workers are best effort.
    pub fn call<S: Screen, R>(
        &self,
        handle: ScreenHandle<S>,
        f: impl FnOnce(&mut S) -> R,
    ) -> Option<R> {
        let mut state = self.state.lock();
        if state.current != Some(handle.key) {
            log::debug!(
                "call to {} skipped, screen is not current",
                std::any::type_name::<S>()
            );
            return None;
        }
        let installed = state.screens.get_mut(handle.key)?;
        let any: &mut dyn Any = &mut *installed.screen;
        let screen = any.downcast_mut::<S>()?;
        let result = f(screen);
        self.dirty.store(true, Ordering::Release);
        Some(result)
    }

    /// Run `f` on the current screen, whatever its type.
    pub fn inspect<R>(&self, f: impl FnOnce(&dyn Screen) -> R) -> Option<R> {
        let state = self.state.lock();
        state.current().map(|i| f(&*i.screen))
    }

    pub fn current_screen_name(&self) -> Option<String> {
        self.inspect(|s| s.base().name().to_string())
    }

    fn apply_alert_update(&self, state: &mut State) -> Result<()> {
        match self.alert_update.take() {
            None => {}
            Some(AlertUpdate::Discard) => {
                if state.alert.take().is_some() {
                    log::debug!("alert discarded");
                }
            }
            Some(AlertUpdate::Show {
                panel,
                width,
                height,
                thickness,
            }) => {
                let dialog = Widget::new(
                    WidgetClass::Dialog,
                    Layout::centered(width, height).thickness(thickness),
                )
                .child(panel);
                let mut root = Widget::root().child(dialog);
                root.assign_root_ids();
                let mut sizes = CharSizeMap::new();
                {
                    let mut adapter = self.adapter.lock();
                    root.resize(state.width, state.height, &mut *adapter, &mut sizes)?;
                }
                log::debug!("alert shown ({} widgets)", root.count());
                state.alert = Some(Alert { root, sizes });
            }
        }
        Ok(())
    }

    fn apply_activation(&self, state: &mut State) -> Result<()> {
        if self.pending_ups.load(Ordering::Acquire) > 0 {
            if self.activation.is_occupied() {
                log::debug!("activation deferred, a press is outstanding");
            }
            return Ok(());
        }
        let Some(Activation { key, reset }) = self.activation.take() else {
            return Ok(());
        };
        let (width, height) = (state.width, state.height);
        let Some(installed) = state.screens.get_mut(key) else {
            log::warn!("activation of a screen that no longer exists");
            return Ok(());
        };
        let screen = &mut *installed.screen;
        screen.base_mut().reset_modal_state();
        screen.base_mut().clear_focus();
        screen.reset_widgets();
        reset(&mut *screen);
        screen
            .base_mut()
            .resize(width, height)
            .map_err(|e| screen.base().wrap("Activating", e))?;
        log::info!(
            "activated screen '{}' ({})",
            screen.base().name(),
            installed.type_name
        );
        state.current = Some(key);
        Ok(())
    }

    /// Apply posted alert changes and any pending activation, then paint the
    /// current screen and the alert over it.
    pub fn draw(&self) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        self.apply_alert_update(state)?;
        self.apply_activation(state)?;
        self.dirty.store(false, Ordering::Release);
        if let Some(installed) = state.current() {
            installed.screen.base().draw()?;
        }
        if let Some(alert) = &state.alert {
            let mut adapter = self.adapter.lock();
            alert.root.draw(&mut *adapter)?;
        }
        Ok(())
    }

    /// Offer a press to the alert if one is shown, else to the current
    /// screen. While the returned [`PendingUp`] is alive no activation is
    /// applied.
    pub fn down_event(self: &Arc<Self>, x: f64, y: f64) -> Option<PendingUp> {
        let at = Point { x, y };
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let (target, callback) = match &mut state.alert {
            Some(alert) => (Target::Alert, alert.root.down_event(at)?),
            None => {
                let key = state.current?;
                let installed = state.screens.get_mut(key)?;
                (Target::Screen(key), installed.screen.base_mut().down_event(at)?)
            }
        };
        self.pending_ups.fetch_add(1, Ordering::AcqRel);
        Some(PendingUp {
            router: Arc::clone(self),
            target,
            callback: Some(callback),
        })
    }

    fn deliver_up(&self, target: Target, callback: UpEventCb, at: Point) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let delivered = match target {
            Target::Alert => match &mut state.alert {
                Some(alert) => {
                    callback(&mut UpEvent::new(at, &mut alert.root));
                    true
                }
                None => false,
            },
            Target::Screen(key) if state.current == Some(key) => {
                match state.screens.get_mut(key) {
                    Some(installed) => {
                        installed.screen.base_mut().deliver_up(callback, at);
                        true
                    }
                    None => false,
                }
            }
            Target::Screen(_) => false,
        };
        if !delivered {
            log::debug!("stale up-event at ({}, {}) dropped", at.x, at.y);
        }
        self.pending_ups.fetch_sub(1, Ordering::AcqRel);
        self.dirty.store(true, Ordering::Release);
        delivered
    }

    /// Feed a key to the current screen's focus. Keys are ignored while an
    /// alert is shown.
    pub fn input_event(&self, ch: char) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.alert.is_some() {
            return false;
        }
        let Some(installed) = state.current_mut() else {
            return false;
        };
        let consumed = installed.screen.base_mut().input_event(ch);
        if consumed {
            self.dirty.store(true, Ordering::Release);
        }
        consumed
    }

    /// Lay the current screen and the alert out at a new size. Other screens
    /// catch up when activated.
    pub fn resize(&self, width: f64, height: f64) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.width = width;
        state.height = height;
        if let Some(installed) = state.current_mut() {
            installed.screen.base_mut().resize(width, height)?;
        }
        if let Some(alert) = &mut state.alert {
            let mut adapter = self.adapter.lock();
            alert
                .root
                .resize(width, height, &mut *adapter, &mut alert.sizes)?;
        }
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    /// Spend at least `min_interval`, firing the current screen's timed
    /// event if it falls due meanwhile. Returns whether a redraw is needed.
    ///
    /// The lock is not held while sleeping.
    pub fn tick(&self, min_interval: Duration) -> bool {
        let end = Instant::now() + min_interval;
        let deadline = {
            let state = self.state.lock();
            state
                .current()
                .and_then(|i| i.screen.base().timer_deadline())
        };
        if let Some(deadline) = deadline
            && deadline <= end
        {
            sleep_until(deadline);
            let mut guard = self.state.lock();
            if let Some(installed) = guard.current_mut()
                && fire_due_timer(&mut *installed.screen, Instant::now())
            {
                self.dirty.store(true, Ordering::Release);
            }
        }
        sleep_until(end);
        self.dirty.load(Ordering::Acquire)
    }

    /// Post an alert: `panel` inside a centered dialog of `width` by `height`
    /// of the screen. It replaces any alert at the next draw, and takes every
    /// press until discarded.
    pub fn show_alert(&self, panel: Widget, width: f64, height: f64, thickness: i32) -> Result<()> {
        if !(width > 0.1 && width <= 1.0 && height > 0.1 && height <= 1.0) {
            return Err(Error::InvalidDialogSize { width, height });
        }
        self.alert_update.put(AlertUpdate::Show {
            panel,
            width,
            height,
            thickness,
        });
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    pub fn discard_alert(&self) {
        self.alert_update.put(AlertUpdate::Discard);
        self.dirty.store(true, Ordering::Release);
    }

    /// Whether an alert is applied. Posted changes count after the next draw.
    pub fn has_alert(&self) -> bool {
        self.state.lock().alert.is_some()
    }

    pub fn alert_dump(&self) -> Option<String> {
        self.state.lock().alert.as_ref().map(|a| a.root.to_dump())
    }

    /// Whether a press is waiting for its release.
    pub fn is_down_active(&self) -> bool {
        self.pending_ups.load(Ordering::Acquire) > 0
    }

    pub fn shutting_down(&self) {
        log::info!("router shutting down");
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

/// A press waiting for its release. Dropping it without [`release`] ends the
/// press without running the continuation.
///
/// [`release`]: PendingUp::release
#[must_use = "an unreleased press only ends when dropped"]
pub struct PendingUp {
    router: Arc<EventRouter>,
    target: Target,
    callback: Option<UpEventCb>,
}

impl PendingUp {
    /// Run the continuation at `(x, y)` if the screen or alert that took the
    /// press is still shown. Returns whether it ran.
    pub fn release(mut self, x: f64, y: f64) -> bool {
        match self.callback.take() {
            Some(callback) => self.router.deliver_up(self.target, callback, Point { x, y }),
            None => false,
        }
    }
}

impl fmt::Debug for PendingUp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingUp")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl Drop for PendingUp {
    fn drop(&mut self) {
        if self.callback.take().is_some() {
            log::debug!("press abandoned without release");
            self.router.pending_ups.fetch_sub(1, Ordering::AcqRel);
        }
    }
}
