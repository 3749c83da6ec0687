/// A point in framebuffer pixels, origin at the top-left of the root.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A resolved widget rectangle.
///
/// `border` is the thickness already scaled to the current screen size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rectangle {
    pub ux: f64,
    pub uy: f64,
    pub width: f64,
    pub height: f64,
    pub border: f64,
}

impl Rectangle {
    pub fn new(ux: f64, uy: f64, width: f64, height: f64, border: f64) -> Self {
        Self {
            ux,
            uy,
            width,
            height,
            border,
        }
    }

    pub fn right(&self) -> f64 {
        self.ux + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.uy + self.height
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.ux + self.width / 2.0,
            y: self.uy + self.height / 2.0,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.ux && p.x < self.right() && p.y >= self.uy && p.y < self.bottom()
    }

    /// Space left for a label once the border and a one pixel pad are
    /// removed from both sides.
    pub fn interior(&self) -> Dimensions {
        Dimensions {
            width: self.width - 2.0 * self.border - 2.0,
            height: self.height - 2.0 * self.border - 2.0,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}
