//! Pixel-accurate footprint testing against the occupancy grid and canvas bounds.

use crate::geometry::{Position, Rect};
use crate::track::OccupancyGrid;

/// Oriented rectangular vehicle footprint rasterised into its integer bounding box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footprint {
    bounds: Rect,
    mask: Vec<bool>,
}

impl Footprint {
    /// Rasterise a `width` x `height` rectangle rotated to `heading_degrees` and centred on
    /// `center` snapped to the nearest whole pixel. A pixel belongs to the footprint when its
    /// centre lies inside the rectangle; the bounding box spans the rectangle's full extent.
    #[must_use]
    pub fn oriented(center: Position, heading_degrees: f32, width: f32, height: f32) -> Self {
        let center = Position::new(center.x.round(), center.y.round());
        let radians = heading_degrees.to_radians();
        let (sin, cos) = radians.sin_cos();
        let half_extent_w = ((width * cos).abs() + (height * sin).abs()) / 2.0;
        let half_extent_h = ((width * sin).abs() + (height * cos).abs()) / 2.0;
        // Trim float noise so axis-aligned headings keep their exact extents.
        let left = (center.x - half_extent_w + 1e-3).floor() as i32;
        let right = (center.x + half_extent_w - 1e-3).ceil() as i32;
        let top = (center.y - half_extent_h + 1e-3).floor() as i32;
        let bottom = (center.y + half_extent_h - 1e-3).ceil() as i32;
        let box_w = (right - left).max(1) as u32;
        let box_h = (bottom - top).max(1) as u32;
        let bounds = Rect::new(left, top, box_w, box_h);

        let half_w = width / 2.0 + 1e-4;
        let half_h = height / 2.0 + 1e-4;
        let mut mask = Vec::with_capacity((box_w as usize) * (box_h as usize));
        for py in 0..box_h {
            let dy = (top + py as i32) as f32 + 0.5 - center.y;
            for px in 0..box_w {
                let dx = (left + px as i32) as f32 + 0.5 - center.x;
                // Project onto the forward (cos, -sin) and lateral (sin, cos) axes.
                let along = dx * cos - dy * sin;
                let across = dx * sin + dy * cos;
                mask.push(along.abs() <= half_w && across.abs() <= half_h);
            }
        }
        Self { bounds, mask }
    }

    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Number of pixels covered by the footprint.
    #[must_use]
    pub fn area(&self) -> usize {
        self.mask.iter().filter(|&&covered| covered).count()
    }

    /// Canvas coordinates of every covered pixel.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let width = self.bounds.width as usize;
        self.mask
            .iter()
            .enumerate()
            .filter(|(_, covered)| **covered)
            .map(move |(idx, _)| {
                (
                    self.bounds.left + (idx % width) as i32,
                    self.bounds.top + (idx / width) as i32,
                )
            })
    }

    /// Whether any covered pixel lands on a wall. Pixels off the grid are ignored.
    #[must_use]
    pub fn overlaps_walls(&self, grid: &OccupancyGrid) -> bool {
        self.cells().any(|(x, y)| grid.get(x, y) == Some(true))
    }
}

/// Outcome of validating a candidate footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionVerdict {
    Clear,
    OutOfBounds,
    Wall,
}

impl CollisionVerdict {
    #[must_use]
    pub const fn is_crash(self) -> bool {
        !matches!(self, Self::Clear)
    }
}

/// Test a candidate footprint against the canvas edge first, then against wall cells.
#[must_use]
pub fn check(footprint: &Footprint, grid: &OccupancyGrid) -> CollisionVerdict {
    if !footprint.bounds().inside_canvas(grid.width(), grid.height()) {
        CollisionVerdict::OutOfBounds
    } else if footprint.overlaps_walls(grid) {
        CollisionVerdict::Wall
    } else {
        CollisionVerdict::Clear
    }
}
