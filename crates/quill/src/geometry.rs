use glam::{IVec2, Vec2};

/// A point in canvas pixels. Integer coordinates name pixel centres.
pub type Point = Vec2;

/// A point on the integer pixel grid.
pub type IPoint = IVec2;

/// Width and height in pixels.
pub type Size = Vec2;

/// Axis-aligned rectangle defined by min and max corners (both inclusive pixel centres)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    /// Build a rectangle from two opposite corners given in any order.
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Rectangle covering `size` pixels starting at `min`.
    pub fn from_min_size(min: Point, size: Size) -> Self {
        Self {
            min,
            max: min + size - Vec2::ONE,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x + 1.0
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y + 1.0
    }

    pub fn center(&self) -> Point {
        (self.min + self.max) * 0.5
    }
}

/// Integer rectangle with inclusive corners, used for clip regions.
///
/// A rectangle whose `max` is below `min` on either axis is empty; this is what
/// intersecting two disjoint rectangles produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IRect {
    pub min: IPoint,
    pub max: IPoint,
}

impl IRect {
    pub const fn new(min: IPoint, max: IPoint) -> Self {
        Self { min, max }
    }

    /// Rectangle covering a `width x height` canvas starting at the origin.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            min: IPoint::ZERO,
            max: IPoint::new(width as i32 - 1, height as i32 - 1),
        }
    }

    pub fn from_min_size(min: IPoint, size: IVec2) -> Self {
        Self {
            min,
            max: min + size - IVec2::ONE,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y
    }

    /// Size in pixels, zero on both axes when empty.
    pub fn size(&self) -> [u32; 2] {
        if self.is_empty() {
            return [0, 0];
        }
        [
            (self.max.x - self.min.x + 1) as u32,
            (self.max.y - self.min.y + 1) as u32,
        ]
    }

    pub fn translate(self, offset: IPoint) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Overlapping region of both rectangles. May be empty.
    pub fn intersect(self, other: Self) -> Self {
        Self {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    pub fn contains(&self, p: IPoint) -> bool {
        p.x >= self.min.x && p.y >= self.min.y && p.x <= self.max.x && p.y <= self.max.y
    }
}
