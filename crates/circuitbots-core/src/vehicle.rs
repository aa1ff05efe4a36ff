//! A single vehicle and its two-phase tick update.

use tracing::{debug, info, trace};

use crate::collision::{self, CollisionVerdict, Footprint};
use crate::config::SimulationConfig;
use crate::geometry::{Position, wrap_degrees};
use crate::kinematics::{self, Controls};
use crate::progress::{FinishEvent, ProgressTracker};
use crate::sensors::SensorArray;
use crate::track::Track;

/// What happened to a vehicle during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub collision: CollisionVerdict,
    pub checkpoint: Option<usize>,
    pub finish: FinishEvent,
}

/// Simulation state for one vehicle. Each vehicle owns its state exclusively.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    id: u32,
    position: Position,
    heading: f32,
    speed: f32,
    crashed: bool,
    footprint: Footprint,
    progress: ProgressTracker,
    sensors: SensorArray,
}

impl Vehicle {
    /// Place a vehicle at the configured spawn pose and take an initial sensor scan.
    #[must_use]
    pub fn new(id: u32, config: &SimulationConfig, track: &Track) -> Self {
        let spawn = config.spawn;
        let position = Position::new(spawn.x, spawn.y);
        let heading = wrap_degrees(spawn.heading);
        let params = &config.vehicle;
        Self {
            id,
            position,
            heading,
            speed: 0.0,
            crashed: false,
            footprint: Footprint::oriented(position, heading, params.width, params.height),
            progress: ProgressTracker::new(),
            sensors: SensorArray::scan(
                position,
                heading,
                params.width,
                track.grid(),
                &config.sensors,
            ),
        }
    }

    /// Advance one tick: integrate, validate the candidate pose, commit all-or-nothing, then
    /// refresh sensors, finish-line occupancy and checkpoint credit.
    pub fn step(
        &mut self,
        controls: Controls,
        track: &Track,
        config: &SimulationConfig,
        now_secs: f32,
    ) -> StepOutcome {
        let params = &config.vehicle;
        let candidate =
            kinematics::propose(self.position, self.heading, self.speed, controls, params);
        let candidate_footprint =
            Footprint::oriented(candidate.position, candidate.heading, params.width, params.height);
        let collision = collision::check(&candidate_footprint, track.grid());

        // Orientation follows the new heading even when the move is rejected.
        self.heading = candidate.heading;
        if collision.is_crash() {
            trace!(vehicle = self.id, ?collision, "candidate pose rejected");
            self.crashed = true;
            self.speed = 0.0;
            self.footprint =
                Footprint::oriented(self.position, self.heading, params.width, params.height);
        } else {
            self.crashed = false;
            self.speed = candidate.speed;
            self.position = candidate.position;
            self.footprint = candidate_footprint;
        }

        self.sensors = SensorArray::scan(
            self.position,
            self.heading,
            params.width,
            track.grid(),
            &config.sensors,
        );

        let checkpoints = track.checkpoints();
        let on_finish = self.footprint.bounds().intersects(&track.finish());
        let finish = self.progress.check_finish(on_finish, checkpoints.len());
        match finish {
            FinishEvent::LapCompleted(laps) => {
                info!(vehicle = self.id, laps, "lap completed");
            }
            FinishEvent::Rejected { credited, required } => {
                debug!(
                    vehicle = self.id,
                    credited, required, "finish line reached before all checkpoints; ignored"
                );
            }
            FinishEvent::None => {}
        }

        let checkpoint = self
            .progress
            .check_checkpoints(self.position, checkpoints, now_secs);
        if let Some(index) = checkpoint {
            debug!(
                vehicle = self.id,
                checkpoint = index,
                this_lap = self.progress.credited().len(),
                total = checkpoints.len(),
                "checkpoint reached"
            );
            if self.progress.next_index() == 0 {
                debug!(vehicle = self.id, "all checkpoints reached; lap may be finished");
            }
        }

        StepOutcome {
            collision,
            checkpoint,
            finish,
        }
    }

    /// Return to the spawn pose with all counters cleared.
    pub fn reset(&mut self, config: &SimulationConfig, track: &Track) {
        *self = Self::new(self.id, config, track);
    }

    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Heading in degrees within `[0, 360)`.
    #[must_use]
    pub const fn heading(&self) -> f32 {
        self.heading
    }

    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    #[must_use]
    pub const fn crashed(&self) -> bool {
        self.crashed
    }

    #[must_use]
    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    #[must_use]
    pub fn sensors(&self) -> &SensorArray {
        &self.sensors
    }

    #[must_use]
    pub const fn laps(&self) -> u32 {
        self.progress.laps()
    }
}
