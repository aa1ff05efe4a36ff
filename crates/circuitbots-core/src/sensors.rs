//! Fixed-angle ray sensors measuring distance to the nearest wall or canvas edge.

use serde::{Deserialize, Serialize};

use crate::config::SensorParams;
use crate::geometry::Position;
use crate::track::OccupancyGrid;

/// Number of rays each vehicle casts.
pub const SENSOR_COUNT: usize = 9;
/// Ray directions in degrees relative to the vehicle heading.
pub const SENSOR_ANGLES: [f32; SENSOR_COUNT] =
    [-60.0, -45.0, -30.0, -15.0, 0.0, 15.0, 30.0, 45.0, 60.0];

/// Segment from the sensor anchor to the first hit (or full range).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SensorRay {
    pub origin: Position,
    pub end: Position,
    pub hit: bool,
}

/// Latest readings for every ray.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SensorArray {
    readings: [f32; SENSOR_COUNT],
    rays: [SensorRay; SENSOR_COUNT],
}

impl SensorArray {
    /// March every ray outward from an anchor ahead of `center` along `heading`.
    ///
    /// Samples are truncated to integer cells. Leaving the canvas counts as a hit, so each
    /// ray terminates within `params.range` steps and readings stay in `[0, range]`.
    #[must_use]
    pub fn scan(
        center: Position,
        heading: f32,
        vehicle_width: f32,
        grid: &OccupancyGrid,
        params: &SensorParams,
    ) -> Self {
        let anchor = center.advanced(heading, vehicle_width * params.anchor_offset);
        let mut readings = [params.range as f32; SENSOR_COUNT];
        let mut rays = [SensorRay::default(); SENSOR_COUNT];

        for (slot, offset) in SENSOR_ANGLES.iter().enumerate() {
            let radians = (heading + offset).to_radians();
            let (sin, cos) = radians.sin_cos();
            let mut ray = SensorRay {
                origin: anchor,
                end: anchor.advanced(heading + offset, params.range as f32),
                hit: false,
            };
            for step in 1..=params.range {
                let distance = step as f32;
                let sample_x = anchor.x + cos * distance;
                let sample_y = anchor.y - sin * distance;
                if grid.is_blocked(sample_x as i32, sample_y as i32) {
                    readings[slot] = distance;
                    ray.end = Position::new(sample_x.trunc(), sample_y.trunc());
                    ray.hit = true;
                    break;
                }
            }
            rays[slot] = ray;
        }

        Self { readings, rays }
    }

    #[must_use]
    pub const fn readings(&self) -> &[f32; SENSOR_COUNT] {
        &self.readings
    }

    #[must_use]
    pub const fn rays(&self) -> &[SensorRay; SENSOR_COUNT] {
        &self.rays
    }
}
