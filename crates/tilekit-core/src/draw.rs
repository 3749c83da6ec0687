use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{Color, Dimensions, Rectangle, WidgetClass, WidgetId};

/// Glyph drawn next to a label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BulletMark {
    #[default]
    None,
    Square,
    Round,
    UpArrow,
    DownArrow,
    LeftArrow,
    RightArrow,
    Check,
}

impl BulletMark {
    pub fn as_str(self) -> &'static str {
        match self {
            BulletMark::None => "none",
            BulletMark::Square => "square",
            BulletMark::Round => "round",
            BulletMark::UpArrow => "up-arrow",
            BulletMark::DownArrow => "down-arrow",
            BulletMark::LeftArrow => "left-arrow",
            BulletMark::RightArrow => "right-arrow",
            BulletMark::Check => "check",
        }
    }
}

/// Colors a back end may honor for one widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawStyle {
    pub fill: Color,
    pub line: Color,
    pub text: Color,
    pub selected_fill: Color,
    pub bold: bool,
}

impl Default for DrawStyle {
    fn default() -> Self {
        Self {
            fill: Color::WHITE,
            line: Color::BLACK,
            text: Color::BLACK,
            selected_fill: Color::GREY,
            bold: false,
        }
    }
}

/// Back end specific settings carried by a draw record. The core never
/// looks inside.
#[derive(Clone, Default)]
pub enum Options {
    #[default]
    None,
    Style(DrawStyle),
    Extension(Arc<dyn Any + Send + Sync>),
}

impl Options {
    pub fn style(&self) -> Option<&DrawStyle> {
        match self {
            Options::Style(s) => Some(s),
            _ => None,
        }
    }

    pub fn extension<T: Any>(&self) -> Option<&T> {
        match self {
            Options::Extension(any) => any.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Options::None)
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Options::None => f.write_str("None"),
            Options::Style(s) => f.debug_tuple("Style").field(s).finish(),
            Options::Extension(_) => f.write_str("Extension(<opaque>)"),
        }
    }
}

/// Everything a back end needs to paint one widget.
#[derive(Clone, Debug, Default)]
pub struct DrawData {
    pub id: WidgetId,
    pub rect: Rectangle,
    pub label_bounds: Rectangle,
    /// Square reserved for the bullet mark, when there is one.
    pub mark_bounds: Option<Rectangle>,
    pub label: String,
    pub char_size: u16,
    pub mark: BulletMark,
    pub selected: bool,
    pub disable_effect: bool,
    pub options: Options,
    pub class: WidgetClass,
}

/// The drawing back end consumed by the core.
///
/// Implementations may keep mutable caches; the core only calls them while
/// holding whatever lock serializes access to the widget tree.
pub trait DrawProtocol {
    /// Rasterize one widget. Returning `false` skips the widget's children.
    fn draw(&mut self, data: &DrawData) -> bool;

    /// Measure `data.label`.
    ///
    /// With `upper_limit == 0`, set `bounds` to the natural extent of the
    /// label at `char_size`. Otherwise choose the largest size in
    /// `[1, upper_limit)` whose extent fits inside `bounds`, writing both the
    /// size and the fitted extent. Must be deterministic.
    fn get_text_metrics(
        &mut self,
        bounds: &mut Dimensions,
        char_size: &mut u16,
        data: &DrawData,
        upper_limit: u16,
    ) -> bool;
}

impl<P: DrawProtocol + ?Sized> DrawProtocol for Box<P> {
    fn draw(&mut self, data: &DrawData) -> bool {
        (**self).draw(data)
    }

    fn get_text_metrics(
        &mut self,
        bounds: &mut Dimensions,
        char_size: &mut u16,
        data: &DrawData,
        upper_limit: u16,
    ) -> bool {
        (**self).get_text_metrics(bounds, char_size, data, upper_limit)
    }
}

/// Headless metrics: every glyph advances `advance × size` and lines are
/// `line × size` tall. Drawing is a no-op.
#[derive(Clone, Copy, Debug)]
pub struct FixedPitch {
    pub advance: f64,
    pub line: f64,
}

impl Default for FixedPitch {
    fn default() -> Self {
        Self {
            advance: 0.6,
            line: 1.0,
        }
    }
}

impl FixedPitch {
    pub fn measure(&self, label: &str, char_size: u16) -> Dimensions {
        let glyphs = label.chars().count() as f64;
        let size = f64::from(char_size);
        Dimensions::new(glyphs * self.advance * size, self.line * size)
    }
}

impl DrawProtocol for FixedPitch {
    fn draw(&mut self, _data: &DrawData) -> bool {
        true
    }

    fn get_text_metrics(
        &mut self,
        bounds: &mut Dimensions,
        char_size: &mut u16,
        data: &DrawData,
        upper_limit: u16,
    ) -> bool {
        if upper_limit == 0 {
            *bounds = self.measure(&data.label, *char_size);
            return true;
        }
        let fits = |size: u16| {
            let d = self.measure(&data.label, size);
            d.width <= bounds.width && d.height <= bounds.height
        };
        let mut best = 1;
        let (mut lo, mut hi) = (1u16, upper_limit.saturating_sub(1));
        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            if fits(mid) {
                best = mid;
                lo = mid + 1;
            } else {
                hi = mid - 1;
            }
        }
        *char_size = best;
        *bounds = self.measure(&data.label, best);
        true
    }
}
