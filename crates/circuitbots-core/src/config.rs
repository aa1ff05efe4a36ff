//! Static configuration for a training run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when validating configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Driving characteristics shared by every vehicle in a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VehicleParams {
    /// Footprint length along the heading, in pixels.
    pub width: f32,
    /// Footprint breadth across the heading, in pixels.
    pub height: f32,
    /// Degrees turned per tick while steering.
    pub rotation_speed: f32,
    /// Speed gained per tick while accelerating.
    pub acceleration: f32,
    /// Forward speed cap. Reverse is capped at half of this.
    pub max_speed: f32,
    /// Speed lost per tick while coasting.
    pub friction: f32,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            width: 40.0,
            height: 20.0,
            rotation_speed: 3.0,
            acceleration: 0.5,
            max_speed: 30.0,
            friction: 0.05,
        }
    }
}

impl VehicleParams {
    /// Lowest speed reachable by braking into reverse.
    #[must_use]
    pub fn min_speed(&self) -> f32 {
        -self.max_speed / 2.0
    }
}

/// Ray sensor configuration. Ray count and angles are fixed; see [`crate::SENSOR_ANGLES`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SensorParams {
    /// Maximum ray length in unit steps.
    pub range: u32,
    /// Anchor distance ahead of the vehicle centre, as a fraction of vehicle width.
    pub anchor_offset: f32,
}

impl Default for SensorParams {
    fn default() -> Self {
        Self {
            range: 600,
            anchor_offset: 0.4,
        }
    }
}

/// Weights of the current-state fitness score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FitnessWeights {
    pub time_alive: f32,
    pub checkpoint: f32,
    pub lap: f32,
    pub speed: f32,
    pub crash_penalty: f32,
    pub progress: f32,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            time_alive: 3.0,
            checkpoint: 50.0,
            lap: 1_000.0,
            speed: 0.5,
            crash_penalty: 25.0,
            progress: 0.1,
        }
    }
}

/// One step of the staged time schedule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScheduleStage {
    /// Last generation (1-based, inclusive) this stage applies to.
    pub until_generation: u32,
    /// Simulated seconds each generation in this stage may run.
    pub budget_secs: f32,
}

/// Generation-indexed time budget: short evaluations early, longer ones later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeSchedule {
    pub stages: Vec<ScheduleStage>,
    /// Budget for generations beyond the last stage.
    pub final_budget_secs: f32,
}

impl Default for TimeSchedule {
    fn default() -> Self {
        Self {
            stages: vec![
                ScheduleStage {
                    until_generation: 5,
                    budget_secs: 15.0,
                },
                ScheduleStage {
                    until_generation: 15,
                    budget_secs: 30.0,
                },
            ],
            final_budget_secs: 60.0,
        }
    }
}

impl TimeSchedule {
    /// Budget in simulated seconds for the 1-based `generation`.
    #[must_use]
    pub fn budget_for(&self, generation: u32) -> f32 {
        self.stages
            .iter()
            .find(|stage| generation <= stage.until_generation)
            .map_or(self.final_budget_secs, |stage| stage.budget_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.final_budget_secs <= 0.0 || self.stages.iter().any(|s| s.budget_secs <= 0.0) {
            return Err(ConfigError::Invalid("time budgets must be positive"));
        }
        if self
            .stages
            .windows(2)
            .any(|pair| pair[0].until_generation >= pair[1].until_generation)
        {
            return Err(ConfigError::Invalid(
                "schedule stages must be ordered by generation",
            ));
        }
        Ok(())
    }
}

/// How the tick loop relates to wall-clock time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Sleep so each tick lasts `1 / tick_rate` seconds.
    Realtime,
    /// Run ticks back to back; simulated time still advances by `1 / tick_rate`.
    #[default]
    Unpaced,
}

/// Pose every vehicle starts a generation from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpawnPose {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
}

impl Default for SpawnPose {
    fn default() -> Self {
        Self {
            x: 400.0,
            y: 360.0,
            heading: 0.0,
        }
    }
}

/// Static configuration for a CircuitBots training run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Canvas width in pixels; the occupancy grid must match.
    pub canvas_width: u32,
    /// Canvas height in pixels; the occupancy grid must match.
    pub canvas_height: u32,
    /// Simulation ticks per simulated second.
    pub tick_rate: u32,
    pub pacing: Pacing,
    pub vehicle: VehicleParams,
    pub sensors: SensorParams,
    pub fitness: FitnessWeights,
    pub schedule: TimeSchedule,
    /// Vehicles stop being advanced once they complete this many laps.
    pub lap_target: u32,
    pub spawn: SpawnPose,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1_280,
            canvas_height: 720,
            tick_rate: 60,
            pacing: Pacing::default(),
            vehicle: VehicleParams::default(),
            sensors: SensorParams::default(),
            fitness: FitnessWeights::default(),
            schedule: TimeSchedule::default(),
            lap_target: 2,
            spawn: SpawnPose::default(),
        }
    }
}

impl SimulationConfig {
    /// Ensure every knob is usable by the simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(ConfigError::Invalid("canvas dimensions must be non-zero"));
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid("tick_rate must be non-zero"));
        }
        let vehicle = &self.vehicle;
        if vehicle.width <= 0.0 || vehicle.height <= 0.0 {
            return Err(ConfigError::Invalid("vehicle dimensions must be positive"));
        }
        if vehicle.max_speed <= 0.0
            || vehicle.acceleration < 0.0
            || vehicle.friction < 0.0
            || vehicle.rotation_speed < 0.0
        {
            return Err(ConfigError::Invalid(
                "max_speed must be positive; acceleration, friction and rotation non-negative",
            ));
        }
        if self.sensors.range == 0 {
            return Err(ConfigError::Invalid("sensor range must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.sensors.anchor_offset) {
            return Err(ConfigError::Invalid("sensor anchor_offset must be within [0, 1]"));
        }
        if self.fitness.progress < 0.0 {
            return Err(ConfigError::Invalid("progress weight must be non-negative"));
        }
        if self.lap_target == 0 {
            return Err(ConfigError::Invalid("lap_target must be at least one"));
        }
        let spawn = &self.spawn;
        if spawn.x < 0.0
            || spawn.y < 0.0
            || spawn.x >= self.canvas_width as f32
            || spawn.y >= self.canvas_height as f32
        {
            return Err(ConfigError::Invalid("spawn pose must lie on the canvas"));
        }
        self.schedule.validate()
    }

    /// Simulated seconds advanced by a single tick.
    #[must_use]
    pub fn tick_secs(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimulationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn schedule_lengthens_with_generation() {
        let schedule = TimeSchedule::default();
        assert_eq!(schedule.budget_for(1), 15.0);
        assert_eq!(schedule.budget_for(5), 15.0);
        assert_eq!(schedule.budget_for(6), 30.0);
        assert_eq!(schedule.budget_for(15), 30.0);
        assert_eq!(schedule.budget_for(16), 60.0);
        assert_eq!(schedule.budget_for(500), 60.0);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let config = SimulationConfig {
            tick_rate: 0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.schedule.stages.reverse();
        assert_eq!(
            config.validate(),
            Err(ConfigError::Invalid(
                "schedule stages must be ordered by generation"
            ))
        );

        let config = SimulationConfig {
            spawn: SpawnPose {
                x: 5_000.0,
                y: 10.0,
                heading: 0.0,
            },
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{"tick_rate": 30, "lap_target": 3}"#).expect("config");
        assert_eq!(config.tick_rate, 30);
        assert_eq!(config.lap_target, 3);
        assert_eq!(config.vehicle, VehicleParams::default());
    }

    #[test]
    fn nested_partial_json_keeps_sibling_defaults() {
        let config: SimulationConfig = serde_json::from_str(
            r#"{"vehicle": {"max_speed": 20}, "spawn": {"heading": 90}, "schedule": {"final_budget_secs": 45}}"#,
        )
        .expect("config");
        assert_eq!(config.vehicle.max_speed, 20.0);
        assert_eq!(config.vehicle.width, VehicleParams::default().width);
        assert_eq!(config.spawn.heading, 90.0);
        assert_eq!(config.spawn.x, SpawnPose::default().x);
        assert_eq!(config.schedule.final_budget_secs, 45.0);
        assert_eq!(config.schedule.stages, TimeSchedule::default().stages);
        assert_eq!(config.validate(), Ok(()));
    }
}
