// src/image/geom.rs

//! Integer rectangles in image coordinates.

/// Represents a 2D rectangle with integer coordinates.
///
/// The rectangle is defined by its top-left corner (`x`, `y`) and its `width` and `height`.
/// This struct is `Copy`, so it can be passed around cheaply by value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates an empty rectangle.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a rectangle from two opposite corners given in any order.
    ///
    /// The second corner is exclusive, so `from_corners(0, 0, 4, 3)` covers
    /// four columns and three rows.
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        let (x_min, x_max) = (x1.min(x2), x1.max(x2));
        let (y_min, y_max) = (y1.min(y2), y1.max(y2));
        Rect::new(
            x_min,
            y_min,
            x_max.abs_diff(x_min),
            y_max.abs_diff(y_min),
        )
    }

    /// A rectangle anchored at the origin.
    pub fn sized(width: u32, height: u32) -> Self {
        Rect::new(0, 0, width, height)
    }

    /// Returns the x-coordinate of the right edge (`x + width`).
    pub fn x_max(&self) -> i32 {
        self.x.saturating_add(self.width as i32)
    }

    /// Returns the y-coordinate of the bottom edge (`y + height`).
    pub fn y_max(&self) -> i32 {
        self.y.saturating_add(self.height as i32)
    }

    /// Checks if the rectangle has zero width or height.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Checks if a point is contained within the rectangle's bounds.
    /// The right and bottom edges are exclusive.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        !self.is_empty() && px >= self.x && px < self.x_max() && py >= self.y && py < self.y_max()
    }

    /// Returns a new rectangle that is the intersection of `self` and `other`.
    pub fn intersection(&self, other: &Rect) -> Rect {
        if self.is_empty() || other.is_empty() {
            return Rect::empty();
        }

        let x = self.x.max(other.x);
        let y = self.y.max(other.y);

        let x_max = self.x_max().min(other.x_max());
        let y_max = self.y_max().min(other.y_max());

        if x >= x_max || y >= y_max {
            Rect::empty()
        } else {
            Rect::new(x, y, (x_max - x) as u32, (y_max - y) as u32)
        }
    }

    /// Returns a new rectangle that is the smallest bounding box containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        let x = self.x.min(other.x);
        let y = self.y.min(other.y);

        let x_max = self.x_max().max(other.x_max());
        let y_max = self.y_max().max(other.y_max());

        Rect::new(x, y, (x_max - x) as u32, (y_max - y) as u32)
    }
}
