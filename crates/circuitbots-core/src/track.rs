//! Immutable circuit data: wall occupancy, finish region and ordered checkpoints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Position, Rect};

/// Largest checkpoint sequence the per-vehicle credit bitset can represent.
pub const MAX_CHECKPOINTS: usize = 64;

/// Errors raised while assembling track data.
#[derive(Debug, Error, PartialEq)]
pub enum TrackError {
    #[error("occupancy grid dimensions must be non-zero")]
    EmptyGrid,
    #[error("occupancy grid expects {expected} cells, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },
    #[error("track supports at most {max} checkpoints, got {count}")]
    TooManyCheckpoints { count: usize, max: usize },
    #[error("checkpoint {index} radius {radius} must be positive and finite")]
    InvalidCheckpoint { index: usize, radius: f32 },
    #[error("finish region {0:?} does not overlap the canvas")]
    FinishOffCanvas(Rect),
    #[error("track canvas {actual:?} does not match configured canvas {expected:?}")]
    CanvasMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// Binary wall map over the track canvas, one cell per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    /// Wrap a row-major wall vector.
    pub fn new(width: u32, height: u32, cells: Vec<bool>) -> Result<Self, TrackError> {
        if width == 0 || height == 0 {
            return Err(TrackError::EmptyGrid);
        }
        let expected = (width as usize) * (height as usize);
        if cells.len() != expected {
            return Err(TrackError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Grid without any walls.
    pub fn open(width: u32, height: u32) -> Result<Self, TrackError> {
        Self::new(width, height, vec![false; (width as usize) * (height as usize)])
    }

    /// Build a grid by evaluating `is_wall` for every cell.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut is_wall: impl FnMut(u32, u32) -> bool,
    ) -> Result<Self, TrackError> {
        let mut cells = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                cells.push(is_wall(x, y));
            }
        }
        Self::new(width, height, cells)
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Whether `(x, y)` lies on the canvas.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Wall lookup; cells off the canvas report `None`.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<bool> {
        if self.contains(x, y) {
            Some(self.cells[self.offset(x as u32, y as u32)])
        } else {
            None
        }
    }

    /// True for wall cells and for anything off the canvas.
    #[must_use]
    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        self.get(x, y).unwrap_or(true)
    }

    /// Number of wall cells.
    #[must_use]
    pub fn wall_count(&self) -> usize {
        self.cells.iter().filter(|&&wall| wall).count()
    }
}

/// A circular gate that must be driven through in racing order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl Checkpoint {
    #[must_use]
    pub const fn new(x: f32, y: f32, radius: f32) -> Self {
        Self { x, y, radius }
    }

    #[must_use]
    pub const fn center(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// Whether `position` is within the checkpoint radius (inclusive).
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        position.distance(self.center()) <= self.radius
    }
}

/// Checkpoint layout of the bundled 1280x720 circuit.
#[must_use]
pub fn default_checkpoints() -> Vec<Checkpoint> {
    [
        (407.0, 353.0),
        (618.0, 326.0),
        (782.0, 125.0),
        (944.0, 390.0),
        (1177.0, 529.0),
        (923.0, 642.0),
        (608.0, 560.0),
        (362.0, 636.0),
        (125.0, 520.0),
        (145.0, 281.0),
        (170.0, 75.0),
        (348.0, 136.0),
    ]
    .into_iter()
    .map(|(x, y)| Checkpoint::new(x, y, 50.0))
    .collect()
}

/// Everything a vehicle needs to know about the circuit. Shared read-only across a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    grid: OccupancyGrid,
    finish: Rect,
    checkpoints: Vec<Checkpoint>,
}

impl Track {
    /// Validate and assemble track data. An empty checkpoint list is allowed.
    pub fn new(
        grid: OccupancyGrid,
        finish: Rect,
        checkpoints: Vec<Checkpoint>,
    ) -> Result<Self, TrackError> {
        if checkpoints.len() > MAX_CHECKPOINTS {
            return Err(TrackError::TooManyCheckpoints {
                count: checkpoints.len(),
                max: MAX_CHECKPOINTS,
            });
        }
        if let Some((index, checkpoint)) = checkpoints
            .iter()
            .enumerate()
            .find(|(_, c)| !(c.radius.is_finite() && c.radius > 0.0))
        {
            return Err(TrackError::InvalidCheckpoint {
                index,
                radius: checkpoint.radius,
            });
        }
        let canvas = Rect::new(0, 0, grid.width(), grid.height());
        if !finish.intersects(&canvas) {
            return Err(TrackError::FinishOffCanvas(finish));
        }
        Ok(Self {
            grid,
            finish,
            checkpoints,
        })
    }

    #[must_use]
    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    #[must_use]
    pub const fn finish(&self) -> Rect {
        self.finish
    }

    #[must_use]
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Canvas size as `(width, height)`.
    #[must_use]
    pub const fn canvas(&self) -> (u32, u32) {
        (self.grid.width(), self.grid.height())
    }
}
