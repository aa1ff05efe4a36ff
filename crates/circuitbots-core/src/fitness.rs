//! Current-state fitness score.
//!
//! The score is recomputed from scratch every tick rather than summed over ticks: the
//! counters it reads (time alive, checkpoints, laps) only grow, while the speed, crash and
//! distance terms reflect the latest tick alone.

use crate::config::FitnessWeights;
use crate::track::Checkpoint;
use crate::vehicle::Vehicle;

/// Score `vehicle` after `time_alive_secs` of simulated time. Never negative.
#[must_use]
pub fn evaluate_fitness(
    vehicle: &Vehicle,
    time_alive_secs: f32,
    checkpoints: &[Checkpoint],
    weights: &FitnessWeights,
) -> f32 {
    let progress = vehicle.progress();
    let mut fitness = weights.time_alive * time_alive_secs
        + weights.checkpoint * progress.checkpoints_reached() as f32
        + weights.lap * progress.laps() as f32
        + weights.speed * vehicle.speed();
    if vehicle.crashed() {
        fitness -= weights.crash_penalty;
    }
    if let Some((distance, radius)) = progress.next_target(vehicle.position(), checkpoints) {
        fitness += weights.progress * (radius - distance).max(0.0);
    }
    fitness.max(0.0)
}
