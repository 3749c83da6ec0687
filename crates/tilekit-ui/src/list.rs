//! Lists of `item` rows with check, radio, select or pick behavior.

use std::sync::Arc;

use tilekit_core::*;

/// Char-size group shared by the rows of a list.
pub const LIST_GROUP: u8 = 251;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    /// Rows toggle independently.
    CheckList,
    /// Exactly one row stays selected.
    RadioList,
    /// At most one row is selected; clicking it again clears it.
    SelectList,
    /// Clicking a row only reports it.
    PickList,
}

impl ListKind {
    fn mark(self) -> BulletMark {
        match self {
            ListKind::CheckList => BulletMark::Square,
            ListKind::RadioList => BulletMark::Round,
            ListKind::SelectList | ListKind::PickList => BulletMark::None,
        }
    }

    /// Apply a click on `row`; returns the row's new state.
    fn click(self, rows: &mut [Widget], row: usize) -> bool {
        match self {
            ListKind::CheckList => {
                let on = !rows[row].is_selected();
                rows[row].set_selected(on);
                on
            }
            ListKind::RadioList => {
                for (i, r) in rows.iter_mut().enumerate() {
                    r.set_selected(i == row);
                }
                true
            }
            ListKind::SelectList => {
                let on = !rows[row].is_selected();
                for (i, r) in rows.iter_mut().enumerate() {
                    r.set_selected(on && i == row);
                }
                on
            }
            ListKind::PickList => true,
        }
    }
}

pub type SelectFn = Arc<dyn Fn(&mut UpEvent<'_>, usize, bool) + Send + Sync>;

fn row_layout(row: usize, rows: usize) -> Layout {
    let n = rows.max(1) as f64;
    let i = row as f64;
    Layout::slice(false, -1.0 + 2.0 * i / n, -1.0 + 2.0 * (i + 1.0) / n).thickness(0)
}

/// A list whose rows split its height evenly. Rows added later with
/// [`Widget::add_child`] are re-spaced by the list.
pub fn list(
    layout: Layout,
    kind: ListKind,
    items: impl IntoIterator<Item = impl Into<LabelView>>,
    on_select: impl Fn(&mut UpEvent<'_>, usize, bool) + Send + Sync + 'static,
) -> Widget {
    let on_select: SelectFn = Arc::new(on_select);
    let rows = items.into_iter().map(|item| {
        Widget::new(WidgetClass::Item, Layout::fill()).with_text(
            Text::new(item)
                .align(TextAlign::Left)
                .group(LIST_GROUP)
                .mark(kind.mark(), true),
        )
    });
    Widget::new(WidgetClass::List, layout)
        .on_new_child(|list, row| {
            let n = list.children().len() + 1;
            for (i, r) in list.children_mut().iter_mut().enumerate() {
                *r.layout_mut() = row_layout(i, n);
            }
            *row.layout_mut() = row_layout(n - 1, n);
        })
        .on_down_event(move |list, at| {
            if !list.accepts(at) {
                return None;
            }
            let row = list.children().iter().rposition(|r| r.accepts(at))?;
            let pressed = list.children()[row].hit_rect();
            let id = list.id();
            let on_select = on_select.clone();
            Some(Box::new(move |up: &mut UpEvent<'_>| {
                if !pressed.contains(up.at) {
                    return;
                }
                let Some(list) = up.widget_mut(id) else {
                    log::debug!("list {id} vanished before release");
                    return;
                };
                if row >= list.children().len() {
                    return;
                }
                let on = kind.click(list.children_mut(), row);
                on_select(up, row, on);
            }))
        })
        .with_children(rows)
}

/// Indices of the selected rows of a list.
pub fn selected_rows(list: &Widget) -> Vec<usize> {
    list.children()
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_selected())
        .map(|(i, _)| i)
        .collect()
}
