//! The layout resolver.
//!
//! Layout is a two-pass, pre-order walk from the root:
//!
//! 1. The first pass resolves every rectangle against what is already known
//!    (parent, root, earlier siblings, widgets placed earlier in the walk) and
//!    asks the draw protocol for the largest character size fitting each
//!    label. Members of a char-size group lower the group's size to their fit.
//! 2. Group members whose rectangle was still unresolved in the first pass
//!    are not measured there. When there are any, a settle pass resolves
//!    their rectangles and lets them lower their group.
//! 3. The second pass repeats the resolution with every rectangle of the
//!    first pass available, so forward references resolve, and gives each
//!    group member the group's final size before placing labels.
//!
//! A reference that still cannot be resolved in the second pass is an error.
//! An inverted rectangle is not: the widget is flagged and skipped when
//! drawing.

use std::collections::BTreeMap;

use crate::layout::Anchor;
use crate::{
    BulletMark, CharSizeMap, Dimensions, DrawData, DrawProtocol, Error, GroupKey, Point,
    Position, Rectangle, Result, TextAlign, Vertex, Widget, WidgetClass, WidgetFlags, WidgetId,
    WidgetRef, environment,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    First,
    /// Only fits group members deferred by the first pass.
    Settle,
    Second,
}

/// Rectangles resolved so far, by absolute identifier.
pub type RectTable = BTreeMap<WidgetId, Rectangle>;

/// The view a layout method has of the tree around the widget it places.
pub struct LayoutCx<'a> {
    adapter: &'a mut dyn DrawProtocol,
    sizes: &'a mut CharSizeMap,
    table: &'a mut RectTable,
    pass: Pass,
    root: Rectangle,
    root_id: WidgetId,
    parent: Rectangle,
    parent_id: WidgetId,
    scope: WidgetId,
    earlier: &'a [Widget],
    later: &'a [Widget],
}

impl<'a> LayoutCx<'a> {
    pub fn pass(&self) -> Pass {
        self.pass
    }

    pub fn parent_rect(&self) -> Rectangle {
        self.parent
    }

    pub fn root_rect(&self) -> Rectangle {
        self.root
    }

    pub fn adapter(&mut self) -> &mut dyn DrawProtocol {
        &mut *self.adapter
    }

    /// Border thickness in pixels for a per-mille value; negative values
    /// take the class default.
    pub fn scaled_border(&self, thickness: i32, class: WidgetClass) -> f64 {
        scaled_border(thickness, class, self.root)
    }

    fn missing(
        &self,
        widget: WidgetId,
        reference: &WidgetRef,
    ) -> Result<Option<(Rectangle, bool)>> {
        match self.pass {
            Pass::First => Ok(None),
            Pass::Settle | Pass::Second => Err(Error::BadLayoutReference {
                widget,
                reference: reference.to_string(),
            }),
        }
    }

    /// The referent's rectangle and whether it is the parent. `None` defers
    /// resolution to the second pass.
    fn referent(
        &self,
        widget: WidgetId,
        reference: &WidgetRef,
    ) -> Result<Option<(Rectangle, bool)>> {
        let Some(id) = reference.id() else {
            return self.missing(widget, reference);
        };
        if id.is_parent() || id == self.parent_id {
            return Ok(Some((self.parent, true)));
        }
        if id.is_root() || id == self.root_id {
            return Ok(Some((self.root, self.parent_id == self.root_id)));
        }
        if let Some(index) = id.child_index() {
            let me = self.earlier.len();
            return match index {
                i if i < me => Ok(Some((self.earlier[i].draw.rect, false))),
                i if i > me && i - me - 1 < self.later.len() => match self.pass {
                    Pass::First => Ok(None),
                    _ => Ok(Some((self.later[i - me - 1].draw.rect, false))),
                },
                _ => Err(Error::BadLayoutReference {
                    widget,
                    reference: reference.to_string(),
                }),
            };
        }
        match self.table.get(&id) {
            Some(r) => Ok(Some((*r, false))),
            None => self.missing(widget, reference),
        }
    }

    /// Resolve one vertex of `widget`'s layout.
    pub fn vertex(&self, widget: WidgetId, pos: &Position) -> Result<Option<Point>> {
        let Some((r, is_parent)) = self.referent(widget, &pos.widget_ref)? else {
            return Ok(None);
        };
        let c = r.center();
        let rx = (r.right() - c.x) - pos.norm_x.inset(r.border, is_parent);
        let ry = (r.bottom() - c.y) - pos.norm_y.inset(r.border, is_parent);
        Ok(Some(Point {
            x: c.x + pos.sx * rx,
            y: c.y + pos.sy * ry,
        }))
    }

    fn record(&mut self, id: WidgetId, rect: Rectangle) {
        if id.is_set() {
            self.table.insert(id, rect);
        }
    }
}

fn scaled_border(thickness: i32, class: WidgetClass, root: Rectangle) -> f64 {
    let t = if thickness < 0 {
        environment().defaults(class).thickness
    } else {
        thickness
    };
    let t = f64::from(t.max(0));
    ((t * root.width).max(t * root.height) / 1000.0).ceil()
}

fn measure(
    adapter: &mut dyn DrawProtocol,
    data: &DrawData,
    bounds: &mut Dimensions,
    char_size: &mut u16,
    upper_limit: u16,
) -> Result<()> {
    if adapter.get_text_metrics(bounds, char_size, data, upper_limit) {
        Ok(())
    } else {
        log::warn!("text metrics failed for widget {} ({:?})", data.id, data.label);
        Err(Error::DrawProtocolFailure {
            widget: data.id,
            label: data.label.clone(),
        })
    }
}

/// Largest size below `limit` fitting the label, leaving a square of the
/// same size for the bullet mark when there is one.
fn fit(
    adapter: &mut dyn DrawProtocol,
    data: &DrawData,
    interior: Dimensions,
    limit: u16,
) -> Result<u16> {
    let mut bounds = interior;
    let mut size = 0;
    measure(adapter, data, &mut bounds, &mut size, limit)?;
    if data.mark != BulletMark::None {
        let mut narrowed = Dimensions::new(interior.width - f64::from(size), interior.height);
        let mut marked = 0;
        measure(adapter, data, &mut narrowed, &mut marked, size.saturating_add(1))?;
        size = marked;
    }
    Ok(size)
}

fn pin_square(r: Rectangle, pin: Vertex) -> Rectangle {
    let side = ((r.width + r.height) / 2.0).min(r.width.min(r.height));
    let place = |anchor: Anchor, start: f64, extent: f64| match anchor {
        Anchor::Start => start,
        Anchor::Middle => start + (extent - side) / 2.0,
        Anchor::End => start + extent - side,
    };
    let (ax, ay) = pin.anchors();
    Rectangle::new(
        place(ax, r.ux, r.width),
        place(ay, r.uy, r.height),
        side,
        side,
        r.border,
    )
}

impl Widget {
    pub(crate) fn set_rect(&mut self, rect: Rectangle) {
        self.draw.rect = rect;
        let failed = rect.is_degenerate();
        if failed && self.successful_layout() {
            log::debug!("widget {} resolved to an inverted rectangle", self.draw.id);
        }
        self.flags.set(WidgetFlags::LAYOUT_FAILED, failed);
    }

    /// Resolve this widget's rectangle, border and label. Layout hooks
    /// usually call this and then adjust.
    pub fn default_layout(&mut self, cx: &mut LayoutCx<'_>) -> Result<()> {
        let id = self.draw.id;
        let border = cx.scaled_border(self.layout.thickness, self.class);
        let ul = cx.vertex(id, &self.layout.upper_left)?;
        let lr = cx.vertex(id, &self.layout.lower_right)?;
        if cx.pass == Pass::First
            && let Some(text) = self.text.as_mut()
        {
            text.deferred = ul.is_none() || lr.is_none();
        }
        if let (Some(ul), Some(lr)) = (ul, lr) {
            let mut rect = Rectangle::new(ul.x, ul.y, lr.x - ul.x, lr.y - ul.y, border);
            if let Some(pin) = self.layout.pin {
                rect = pin_square(rect, pin);
            }
            self.set_rect(rect);
        }
        cx.record(id, self.draw.rect);
        self.layout_text(cx)
    }

    /// Choose the character size and place the label and mark.
    pub fn layout_text(&mut self, cx: &mut LayoutCx<'_>) -> Result<()> {
        let Some(text) = self.text.as_mut() else {
            return Ok(());
        };
        let key = text.group.map(|group| GroupKey {
            scope: cx.scope,
            group,
        });
        match (cx.pass, key) {
            // The rectangle is stale; the settle pass measures it.
            (Pass::First, Some(_)) if text.deferred => {
                text.fitted = 0;
                return Ok(());
            }
            (Pass::Settle, Some(_)) if text.deferred => {}
            (Pass::Settle, _) => return Ok(()),
            _ => {}
        }
        self.draw.label = text.view.resolve();
        self.draw.mark = text.mark;
        let rect = self.draw.rect;
        let interior = rect.interior();
        let has_mark = text.mark != BulletMark::None;

        if (self.draw.label.is_empty() && !has_mark)
            || interior.width <= 0.0
            || interior.height <= 0.0
            || self.flags.contains(WidgetFlags::LAYOUT_FAILED)
        {
            text.fitted = 0;
            self.draw.char_size = 0;
            let c = rect.center();
            self.draw.label_bounds = Rectangle::new(c.x, c.y, 0.0, 0.0, 0.0);
            self.draw.mark_bounds = None;
            return Ok(());
        }

        let upper = (interior.height.floor() as u16).saturating_add(1);
        let size = if self.draw.label.is_empty() {
            interior.width.min(interior.height).floor() as u16
        } else {
            match (cx.pass, key) {
                (Pass::First | Pass::Settle, Some(key)) => {
                    let limit = cx.sizes.limit(key, upper);
                    let size = fit(&mut *cx.adapter, &self.draw, interior, limit)?;
                    text.fitted = size;
                    cx.sizes.record(key, size);
                    size
                }
                (Pass::Second, Some(key)) => cx.sizes.get(key).unwrap_or(text.fitted),
                (_, None) => {
                    let size = fit(&mut *cx.adapter, &self.draw, interior, upper)?;
                    text.fitted = size;
                    size
                }
            }
        };
        if cx.pass == Pass::Settle {
            return Ok(());
        }
        self.draw.char_size = size;

        let mut natural = Dimensions::default();
        if !self.draw.label.is_empty() {
            let mut at = size;
            measure(&mut *cx.adapter, &self.draw, &mut natural, &mut at, 0)?;
        }

        let side = f64::from(size);
        let left = rect.ux + rect.border + 1.0;
        let top = rect.uy + rect.border + 1.0;
        let (mut region_left, mut region_width) = (left, interior.width);
        self.draw.mark_bounds = None;
        if has_mark {
            region_width -= side;
            let mx = if text.left_align_mark {
                region_left += side;
                left
            } else {
                left + interior.width - side
            };
            let my = top + (interior.height - side) / 2.0;
            self.draw.mark_bounds = Some(Rectangle::new(mx, my, side, side, 0.0));
        }
        let x = match text.align {
            TextAlign::Left => region_left,
            TextAlign::Center => region_left + (region_width - natural.width) / 2.0,
            TextAlign::Right => region_left + region_width - natural.width,
        };
        let height = if text.baseline_align {
            side
        } else {
            natural.height
        };
        let y = top + (interior.height - height) / 2.0;
        self.draw.label_bounds = Rectangle::new(x, y, natural.width, natural.height, 0.0);
        Ok(())
    }

    fn layout_node(&mut self, cx: &mut LayoutCx<'_>) -> Result<()> {
        match self.methods.layout.clone() {
            Some(hook) => hook(self, cx)?,
            None => self.default_layout(cx)?,
        }
        self.layout_children(cx)
    }

    fn layout_children(&mut self, cx: &mut LayoutCx<'_>) -> Result<()> {
        let parent = self.draw.rect;
        let parent_id = self.draw.id;
        let scope = if self.class == WidgetClass::Dialog {
            parent_id
        } else {
            cx.scope
        };
        for i in 0..self.children.len() {
            let (earlier, rest) = self.children.split_at_mut(i);
            let Some((child, later)) = rest.split_first_mut() else {
                break;
            };
            let mut child_cx = LayoutCx {
                adapter: &mut *cx.adapter,
                sizes: &mut *cx.sizes,
                table: &mut *cx.table,
                pass: cx.pass,
                root: cx.root,
                root_id: cx.root_id,
                parent,
                parent_id,
                scope,
                earlier,
                later,
            };
            child.layout_node(&mut child_cx)?;
        }
        Ok(())
    }

    fn root_pass(
        &mut self,
        pass: Pass,
        adapter: &mut dyn DrawProtocol,
        sizes: &mut CharSizeMap,
        table: &mut RectTable,
    ) -> Result<()> {
        let rect = self.draw.rect;
        let id = self.draw.id;
        let mut cx = LayoutCx {
            adapter,
            sizes,
            table,
            pass,
            root: rect,
            root_id: id,
            parent: rect,
            parent_id: id,
            scope: id,
            earlier: &[],
            later: &[],
        };
        cx.record(id, rect);
        self.layout_text(&mut cx)?;
        self.layout_children(&mut cx)
    }

    fn has_deferred_group_text(&self) -> bool {
        let mut any = false;
        self.for_each(&mut |w| {
            any |= w.text.as_ref().is_some_and(|t| t.deferred && t.group.is_some());
        });
        any
    }

    /// Resolve the whole tree for a `width` by `height` framebuffer. Called
    /// on the root.
    pub fn layout_root(
        &mut self,
        width: f64,
        height: f64,
        adapter: &mut dyn DrawProtocol,
        sizes: &mut CharSizeMap,
    ) -> Result<()> {
        let root = Rectangle::new(0.0, 0.0, width, height, 0.0);
        let border = scaled_border(self.layout.thickness, self.class, root);
        self.set_rect(Rectangle { border, ..root });
        let mut table = RectTable::new();
        log::trace!("layout pass 1 at {width}x{height}");
        self.root_pass(Pass::First, adapter, sizes, &mut table)?;
        if self.has_deferred_group_text() {
            log::trace!("settling deferred group members");
            self.root_pass(Pass::Settle, adapter, sizes, &mut table)?;
        }
        log::trace!("layout pass 2 at {width}x{height}");
        self.root_pass(Pass::Second, adapter, sizes, &mut table)
    }

    /// Replace the root rectangle and lay everything out again.
    pub fn resize(
        &mut self,
        width: f64,
        height: f64,
        adapter: &mut dyn DrawProtocol,
        sizes: &mut CharSizeMap,
    ) -> Result<()> {
        sizes.clear();
        self.layout_root(width, height, adapter, sizes)
    }

    /// Append a modal dialog to the root, number it after the existing tree,
    /// and lay it out. Returns the dialog subtree's first identifier.
    pub fn push_dialog(
        &mut self,
        dialog: Widget,
        adapter: &mut dyn DrawProtocol,
        sizes: &mut CharSizeMap,
    ) -> Result<WidgetId> {
        if dialog.class != WidgetClass::Dialog {
            return Err(Error::InvalidDialog("pushed widget is not a dialog"));
        }
        if self
            .children
            .last()
            .is_some_and(|c| c.class == WidgetClass::Dialog)
        {
            return Err(Error::InvalidDialog("a dialog is already active"));
        }
        let first = self.next_id;
        self.dialog_marks.push(first);
        let index = self.children.len();
        self.children.push(dialog);
        self.next_id = self.children[index].assign_widget_ids(first);

        let mut table = RectTable::new();
        self.for_each(&mut |w| {
            if w.draw.id.is_set() {
                table.insert(w.draw.id, w.draw.rect);
            }
        });
        let root = self.draw.rect;
        let root_id = self.draw.id;
        for pass in [Pass::First, Pass::Settle, Pass::Second] {
            if pass == Pass::Settle && !self.children[index].has_deferred_group_text() {
                continue;
            }
            let (earlier, rest) = self.children.split_at_mut(index);
            let Some((child, later)) = rest.split_first_mut() else {
                break;
            };
            let mut cx = LayoutCx {
                adapter: &mut *adapter,
                sizes: &mut *sizes,
                table: &mut table,
                pass,
                root,
                root_id,
                parent: root,
                parent_id: root_id,
                scope: root_id,
                earlier,
                later,
            };
            child.layout_node(&mut cx)?;
        }
        log::debug!("pushed dialog with ids {first}..{}", self.next_id);
        Ok(WidgetId::absolute(first))
    }

    /// Remove the active dialog and give its identifiers back.
    pub fn pop_dialog(&mut self, sizes: &mut CharSizeMap) -> Option<Widget> {
        if !self
            .children
            .last()
            .is_some_and(|c| c.class == WidgetClass::Dialog)
        {
            return None;
        }
        let dialog = self.children.pop()?;
        if let Some(mark) = self.dialog_marks.pop() {
            self.next_id = mark;
        }
        sizes.clear_scope(dialog.draw.id);
        if let Some(t) = &dialog.tracker {
            t.clear();
        }
        log::debug!("popped dialog {}", dialog.draw.id);
        Some(dialog)
    }
}
