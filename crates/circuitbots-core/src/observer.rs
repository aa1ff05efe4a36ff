//! Read-only per-tick view handed to rendering and telemetry collaborators.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::track::Checkpoint;
use crate::vehicle::Vehicle;

/// Number of leaders reported in each telemetry block.
pub const LEADERBOARD_SIZE: usize = 3;

/// Textual telemetry for one tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Telemetry {
    pub generation: u32,
    pub tick: u64,
    pub elapsed_secs: f32,
    pub limit_secs: f32,
    /// Vehicles still racing that did not crash this tick.
    pub active: usize,
    pub best_fitness: f32,
    pub population: usize,
    /// `(vehicle id, fitness)` of the current leaders, best first.
    pub leaders: Vec<(u32, f32)>,
}

/// Everything an observer may draw or log for a tick.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub vehicles: &'a [Vehicle],
    /// Current fitness per vehicle, aligned with `vehicles`.
    pub fitness: &'a [f32],
    pub checkpoints: &'a [Checkpoint],
    pub finish: Rect,
    pub telemetry: &'a Telemetry,
}

/// Observer invoked once per tick after fitness has been recomputed. It has no way to
/// feed back into the simulation.
pub trait FrameObserver {
    fn on_tick(&mut self, frame: &Frame<'_>);

    /// Called once when a generation finishes scoring or aborts.
    fn on_generation_end(&mut self, _telemetry: &Telemetry) {}
}

/// No-op observer.
#[derive(Debug, Default)]
pub struct NullObserver;

impl FrameObserver for NullObserver {
    fn on_tick(&mut self, _frame: &Frame<'_>) {}
}
