//! Interface between the simulation and externally supplied driving policies.

use crate::config::SimulationConfig;
use crate::kinematics::{Controls, Steer};
use crate::sensors::SENSOR_COUNT;
use crate::vehicle::Vehicle;

/// Number of inputs presented to a policy: every sensor, speed, and heading.
pub const INPUT_SIZE: usize = SENSOR_COUNT + 2;
/// Number of raw outputs a network policy produces: accelerate, brake, steer.
pub const OUTPUT_SIZE: usize = 3;

const PEDAL_THRESHOLD: f32 = 0.5;
const STEER_DEADZONE: f32 = 0.33;

/// Normalised view of a vehicle handed to its policy each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Sensor readings divided by sensor range, each in `[0, 1]`.
    pub sensors: [f32; SENSOR_COUNT],
    /// Speed divided by max speed, in `[-0.5, 1]`.
    pub speed: f32,
    /// Heading divided by 360, in `[0, 1)`.
    pub heading: f32,
}

impl Observation {
    #[must_use]
    pub fn of(vehicle: &Vehicle, config: &SimulationConfig) -> Self {
        let range = config.sensors.range as f32;
        let mut sensors = [0.0; SENSOR_COUNT];
        for (slot, reading) in sensors.iter_mut().zip(vehicle.sensors().readings()) {
            *slot = reading / range;
        }
        Self {
            sensors,
            speed: vehicle.speed() / config.vehicle.max_speed,
            heading: vehicle.heading() / 360.0,
        }
    }

    /// Flatten into the network input layout: sensors, then speed, then heading.
    #[must_use]
    pub fn to_inputs(&self) -> [f32; INPUT_SIZE] {
        let mut inputs = [0.0; INPUT_SIZE];
        inputs[..SENSOR_COUNT].copy_from_slice(&self.sensors);
        inputs[SENSOR_COUNT] = self.speed;
        inputs[SENSOR_COUNT + 1] = self.heading;
        inputs
    }
}

impl Controls {
    /// Decode raw network outputs: pedals engage above 0.5, steering outside ±0.33.
    #[must_use]
    pub fn from_outputs(outputs: &[f32; OUTPUT_SIZE]) -> Self {
        let steer = Steer::from_sign(if outputs[2] < -STEER_DEADZONE {
            -1
        } else if outputs[2] > STEER_DEADZONE {
            1
        } else {
            0
        });
        Self {
            accelerate: outputs[0] > PEDAL_THRESHOLD,
            brake: outputs[1] > PEDAL_THRESHOLD,
            steer,
        }
    }
}

/// Decision function bound to one vehicle for a generation.
pub trait Policy: Send {
    /// Static identifier of the policy implementation.
    fn kind(&self) -> &'static str;

    /// Choose controls for the latest observation.
    fn decide(&mut self, observation: &Observation) -> Controls;
}

/// Member of an optimizer cohort: yields a policy and receives its fitness.
pub trait Contender {
    /// Instantiate the decision function driven during evaluation.
    fn policy(&self) -> Box<dyn Policy>;

    /// Record the score for the generation just evaluated.
    fn set_fitness(&mut self, fitness: f32);
}
