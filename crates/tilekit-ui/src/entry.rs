//! Single line text entry.
//!
//! The entered text lives in an [`EntryState`] shared between the widget's
//! hooks and the [`TextEntry`] handle the application keeps. Editing works on
//! grapheme clusters, so a backspace never splits a combined character.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tilekit_core::*;
use unicode_segmentation::UnicodeSegmentation;

const BACKSPACE: char = '\u{8}';
const DELETE: char = '\u{7f}';

/// Start of the last grapheme before `byte`.
fn prev_grapheme_boundary(text: &str, byte: usize) -> usize {
    let mut last = 0usize;
    for (i, _) in text.grapheme_indices(true) {
        if i >= byte {
            break;
        }
        last = i;
    }
    last
}

#[derive(Clone, Debug)]
pub struct EntryState {
    text: String,
    max_chars: usize,
    cursor_shown: bool,
}

impl EntryState {
    pub fn new(max_chars: usize) -> Self {
        Self {
            text: String::new(),
            max_chars,
            cursor_shown: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of graphemes entered.
    pub fn len(&self) -> usize {
        self.text.graphemes(true).count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Replace the text, keeping at most `max_chars` graphemes.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.graphemes(true).take(self.max_chars).collect();
    }

    /// Append `ch`. Returns `false` when the entry is full. A combining mark
    /// joins the last grapheme and is accepted even then.
    pub fn insert(&mut self, ch: char) -> bool {
        let before = self.len();
        self.text.push(ch);
        if self.len() > self.max_chars {
            self.text.pop();
            return false;
        }
        before < self.max_chars || self.len() == before
    }

    pub fn delete_backward(&mut self) {
        let end = self.text.len();
        if end > 0 {
            let prev = prev_grapheme_boundary(&self.text, end);
            self.text.truncate(prev);
        }
    }

    pub fn cursor_shown(&self) -> bool {
        self.cursor_shown
    }

    pub fn toggle_cursor(&mut self) {
        self.cursor_shown = !self.cursor_shown;
    }

    /// The label to draw: the text plus the cursor glyph while shown.
    pub fn display(&self, cursor: char) -> String {
        let mut s = self.text.clone();
        if self.cursor_shown {
            s.push(cursor);
        }
        s
    }
}

/// The application's handle on a text entry's contents.
#[derive(Clone, Debug)]
pub struct TextEntry(Arc<Mutex<EntryState>>);

impl TextEntry {
    pub fn text(&self) -> String {
        self.0.lock().text.clone()
    }

    /// Replace the text. The widget shows it after its next layout or input.
    pub fn set_text(&self, text: &str) {
        self.0.lock().set_text(text);
    }

    pub fn state(&self) -> MutexGuard<'_, EntryState> {
        self.0.lock()
    }
}

/// A left aligned entry of at most `max_chars` graphemes. A click asks for
/// the focus; Enter calls `on_enter` with the text and gives the focus up.
///
/// The character size is chosen for a full entry, so it does not change
/// while typing.
pub fn text_entry(
    layout: Layout,
    max_chars: usize,
    on_enter: impl Fn(&str) + Send + Sync + 'static,
) -> (Widget, TextEntry) {
    let state = Arc::new(Mutex::new(EntryState::new(max_chars)));
    let handle = TextEntry(state.clone());

    let live = {
        let state = state.clone();
        LabelView::dynamic(move || state.lock().display(environment().glyphs.cursor))
    };
    let sample = {
        let widest = "W".repeat(max_chars.max(1) + 1);
        LabelView::dynamic(move || widest.clone())
    };

    let widget = Widget::new(WidgetClass::Label, layout)
        .with_text(
            Text::new(live)
                .align(TextAlign::Left)
                .baseline_align(),
        )
        .on_layout(move |w, cx| {
            let Some(live) = w.text().map(|t| t.view.clone()) else {
                return w.default_layout(cx);
            };
            if let Some(t) = w.text_mut() {
                t.view = sample.clone();
            }
            let result = w.default_layout(cx);
            if let Some(t) = w.text_mut() {
                t.view = live;
            }
            w.refresh_label();
            result
        })
        .on_down_event(|w, at| {
            if !w.accepts(at) {
                return None;
            }
            let id = w.id();
            Some(Box::new(move |up: &mut UpEvent<'_>| up.request_focus(id)))
        })
        .on_input(move |w, ch| {
            let focus_change = environment().glyphs.focus_change;
            let mut entry = state.lock();
            let entered = match ch {
                c if c == focus_change => {
                    entry.toggle_cursor();
                    None
                }
                '\r' | '\n' => {
                    entry.cursor_shown = false;
                    Some(entry.text.clone())
                }
                BACKSPACE | DELETE => {
                    entry.delete_backward();
                    None
                }
                c if c.is_control() => None,
                c => {
                    if !entry.insert(c) {
                        log::trace!("entry {} is full", w.id());
                    }
                    None
                }
            };
            drop(entry);
            w.refresh_label();
            match entered {
                Some(text) => {
                    on_enter(&text);
                    false
                }
                None => true,
            }
        });
    (widget, handle)
}
