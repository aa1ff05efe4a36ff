//! Screen-space geometry helpers. The y axis grows downward, matching the track canvas.

use serde::{Deserialize, Serialize};

const FULL_TURN_DEGREES: f32 = 360.0;

/// Wrap an angle in degrees into `[0, 360)`.
#[must_use]
pub fn wrap_degrees(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(FULL_TURN_DEGREES);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if wrapped >= FULL_TURN_DEGREES {
        0.0
    } else {
        wrapped
    }
}

/// Continuous 2D position on the canvas.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Construct a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Offset by `distance` along a heading in degrees (counter-clockwise, y down).
    #[must_use]
    pub fn advanced(self, heading_degrees: f32, distance: f32) -> Self {
        let radians = heading_degrees.to_radians();
        Self {
            x: self.x + radians.cos() * distance,
            y: self.y - radians.sin() * distance,
        }
    }
}

/// Axis-aligned integer rectangle. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[must_use]
    pub const fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn right(&self) -> i32 {
        self.left + self.width as i32
    }

    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.top + self.height as i32
    }

    /// Whether two rectangles share at least one cell. Empty rectangles never intersect.
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        if self.width == 0 || self.height == 0 || other.width == 0 || other.height == 0 {
            return false;
        }
        self.left < other.right()
            && other.left < self.right()
            && self.top < other.bottom()
            && other.top < self.bottom()
    }

    /// Whether the rectangle lies inside a `width` x `height` canvas, using the strict
    /// right/bottom bound the collision resolver applies.
    #[must_use]
    pub const fn inside_canvas(&self, width: u32, height: u32) -> bool {
        self.left >= 0
            && self.top >= 0
            && self.right() < width as i32
            && self.bottom() < height as i32
    }
}
