//! Core types and the per-tick simulation engine shared across the CircuitBots workspace.
//!
//! The crate is organised leaves-first: [`track`] holds the immutable circuit data,
//! [`kinematics`], [`collision`], [`sensors`] and [`progress`] each own one stage of a
//! vehicle update, [`vehicle`] stitches those stages together, and [`generation`] drives a
//! whole cohort of policy-bound vehicles through a time-boxed evaluation.

pub mod collision;
pub mod config;
pub mod fitness;
pub mod generation;
pub mod geometry;
pub mod kinematics;
pub mod observer;
pub mod policy;
pub mod progress;
pub mod sensors;
pub mod track;
pub mod vehicle;

pub use collision::{CollisionVerdict, Footprint};
pub use config::{
    ConfigError, FitnessWeights, Pacing, ScheduleStage, SensorParams, SimulationConfig,
    SpawnPose, TimeSchedule, VehicleParams,
};
pub use fitness::evaluate_fitness;
pub use generation::{
    CancelToken, CohortEvaluator, ControllerPhase, GenerationController, GenerationOutcome,
    GenerationReport, TrainingError,
};
pub use geometry::{Position, Rect, wrap_degrees};
pub use kinematics::{CandidatePose, Controls, Steer};
pub use observer::{Frame, FrameObserver, NullObserver, Telemetry};
pub use policy::{Contender, INPUT_SIZE, OUTPUT_SIZE, Observation, Policy};
pub use progress::{CheckpointBits, FinishEvent, ProgressTracker};
pub use sensors::{SENSOR_ANGLES, SENSOR_COUNT, SensorArray, SensorRay};
pub use track::{Checkpoint, MAX_CHECKPOINTS, OccupancyGrid, Track, TrackError, default_checkpoints};
pub use vehicle::{StepOutcome, Vehicle};
