//! Widget factories: panels, labels, buttons, dialogs, lists and text entry.
//!
//! Every factory returns a plain [`Widget`] with the right class and hooks,
//! ready to be composed into a screen.

pub mod entry;
pub mod list;

pub use entry::{EntryState, TextEntry, text_entry};
pub use list::{ListKind, list, selected_rows};

use std::sync::Arc;

use tilekit_core::*;

/// Char-size group shared by the buttons of one bar.
pub const BAR_GROUP: u8 = 250;

pub type ClickFn = Arc<dyn Fn(&mut UpEvent<'_>) + Send + Sync>;
pub type ToggleFn = Arc<dyn Fn(&mut UpEvent<'_>, bool) + Send + Sync>;

pub fn panel(layout: Layout, children: impl IntoIterator<Item = Widget>) -> Widget {
    Widget::new(WidgetClass::Panel, layout).with_children(children)
}

pub fn label(layout: Layout, text: impl Into<Text>) -> Widget {
    Widget::new(WidgetClass::Label, layout).with_text(text.into())
}

/// A button that fires `on_click` when released inside the rectangle it was
/// pressed in.
pub fn push_button(
    layout: Layout,
    text: impl Into<Text>,
    on_click: impl Fn(&mut UpEvent<'_>) + Send + Sync + 'static,
) -> Widget {
    let on_click: ClickFn = Arc::new(on_click);
    Widget::new(WidgetClass::Push, layout)
        .with_text(text.into())
        .on_down_event(move |w, at| {
            if !w.accepts(at) {
                return None;
            }
            let pressed = w.hit_rect();
            let on_click = on_click.clone();
            Some(Box::new(move |up: &mut UpEvent<'_>| {
                if pressed.contains(up.at) {
                    on_click(up);
                }
            }))
        })
}

/// A label with a bullet mark that toggles its selected state on click and
/// reports the new state.
pub fn bullet_button(
    layout: Layout,
    text: impl Into<Text>,
    mark: BulletMark,
    on_click: impl Fn(&mut UpEvent<'_>, bool) + Send + Sync + 'static,
) -> Widget {
    let on_click: ToggleFn = Arc::new(on_click);
    let text = text.into();
    let left = text.left_align_mark;
    Widget::new(WidgetClass::Bullet, layout)
        .with_text(text.mark(mark, left))
        .on_down_event(move |w, at| {
            if !w.accepts(at) {
                return None;
            }
            let pressed = w.hit_rect();
            let id = w.id();
            let on_click = on_click.clone();
            Some(Box::new(move |up: &mut UpEvent<'_>| {
                if !pressed.contains(up.at) {
                    return;
                }
                let Some(w) = up.widget_mut(id) else {
                    log::debug!("bullet {id} vanished before release");
                    return;
                };
                let selected = !w.is_selected();
                w.set_selected(selected);
                on_click(up, selected);
            }))
        })
}

/// A row of push buttons spread evenly across `layout`, sharing one
/// character size.
pub fn button_bar(
    layout: Layout,
    thickness: i32,
    buttons: impl IntoIterator<Item = Widget>,
) -> Widget {
    let mut buttons: Vec<Widget> = buttons.into_iter().collect();
    let n = buttons.len().max(1) as f64;
    let gap = 0.1 / n;
    for (i, b) in buttons.iter_mut().enumerate() {
        let i = i as f64;
        *b.layout_mut() = Layout::new(
            Position::new(-1.0 + 2.0 * i / n + gap, -1.0),
            Position::new(-1.0 + 2.0 * (i + 1.0) / n - gap, 1.0),
        )
        .thickness(thickness);
        if let Some(t) = b.text_mut() {
            t.group = Some(BAR_GROUP);
        }
    }
    Widget::new(WidgetClass::Panel, layout.thickness(0)).with_children(buttons)
}

/// A centered dialog covering `width` by `height` of the screen, for
/// [`Widget::push_dialog`].
pub fn dialog_box(width: f64, height: f64, children: impl IntoIterator<Item = Widget>) -> Widget {
    Widget::new(WidgetClass::Dialog, Layout::centered(width, height)).with_children(children)
}
