//! Discrete-time vehicle integration: speed, heading, and the candidate position handed to
//! the collision resolver.

use serde::{Deserialize, Serialize};

use crate::config::VehicleParams;
use crate::geometry::{Position, wrap_degrees};

/// Steering direction requested by a policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Steer {
    /// Turn counter-clockwise on screen (heading increases).
    Left,
    #[default]
    Straight,
    /// Turn clockwise on screen (heading decreases).
    Right,
}

impl Steer {
    /// Interpret the `{-1, 0, 1}` steering convention.
    #[must_use]
    pub const fn from_sign(sign: i8) -> Self {
        match sign {
            s if s < 0 => Self::Left,
            0 => Self::Straight,
            _ => Self::Right,
        }
    }

    #[must_use]
    pub const fn sign(self) -> i8 {
        match self {
            Self::Left => -1,
            Self::Straight => 0,
            Self::Right => 1,
        }
    }
}

/// Per-tick control tuple.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Controls {
    pub accelerate: bool,
    pub brake: bool,
    pub steer: Steer,
}

impl Controls {
    /// Controls that leave the vehicle coasting straight ahead.
    pub const COAST: Self = Self {
        accelerate: false,
        brake: false,
        steer: Steer::Straight,
    };

    #[must_use]
    pub const fn new(accelerate: bool, brake: bool, steer: Steer) -> Self {
        Self {
            accelerate,
            brake,
            steer,
        }
    }
}

/// Proposed next pose. Only `position` is subject to collision validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidatePose {
    pub position: Position,
    pub heading: f32,
    pub speed: f32,
}

/// Apply throttle, brake, and friction to `speed`.
#[must_use]
pub fn next_speed(speed: f32, controls: Controls, params: &VehicleParams) -> f32 {
    let mut speed = speed;
    if controls.accelerate {
        speed = (speed + params.acceleration).min(params.max_speed);
    }
    if controls.brake {
        speed = if speed > 0.0 {
            (speed - params.acceleration * 2.0).max(0.0)
        } else {
            (speed - params.acceleration * 0.5).max(params.min_speed())
        };
    }
    if !controls.accelerate && !controls.brake {
        speed = if speed > params.friction {
            speed - params.friction
        } else if speed < -params.friction {
            speed + params.friction
        } else {
            0.0
        };
    }
    speed
}

/// Rotate `heading` according to the steering request, wrapping into `[0, 360)`.
#[must_use]
pub fn next_heading(heading: f32, steer: Steer, params: &VehicleParams) -> f32 {
    wrap_degrees(heading - f32::from(steer.sign()) * params.rotation_speed)
}

/// Integrate one tick from the current pose. Nothing is committed here.
#[must_use]
pub fn propose(
    position: Position,
    heading: f32,
    speed: f32,
    controls: Controls,
    params: &VehicleParams,
) -> CandidatePose {
    let speed = next_speed(speed, controls, params);
    let heading = next_heading(heading, controls.steer, params);
    CandidatePose {
        position: position.advanced(heading, speed),
        heading,
        speed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> VehicleParams {
        VehicleParams::default()
    }

    #[test]
    fn acceleration_caps_at_max_speed() {
        let accelerate = Controls::new(true, false, Steer::Straight);
        assert_eq!(next_speed(0.0, accelerate, &params()), 0.5);
        assert_eq!(next_speed(29.8, accelerate, &params()), 30.0);
    }

    #[test]
    fn braking_stops_then_reverses_within_bounds() {
        let brake = Controls::new(false, true, Steer::Straight);
        assert_eq!(next_speed(5.0, brake, &params()), 4.0);
        assert_eq!(next_speed(0.5, brake, &params()), 0.0);
        assert_eq!(next_speed(0.0, brake, &params()), -0.25);

        let mut speed = 0.0;
        for _ in 0..200 {
            speed = next_speed(speed, brake, &params());
        }
        assert_eq!(speed, -15.0);
    }

    #[test]
    fn friction_snaps_to_zero() {
        let coast = Controls::COAST;
        assert!((next_speed(1.0, coast, &params()) - 0.95).abs() < 1e-6);
        assert!((next_speed(-1.0, coast, &params()) + 0.95).abs() < 1e-6);
        assert_eq!(next_speed(0.04, coast, &params()), 0.0);
        assert_eq!(next_speed(-0.05, coast, &params()), 0.0);
    }

    #[test]
    fn steering_wraps_heading() {
        assert_eq!(next_heading(359.0, Steer::Left, &params()), 2.0);
        assert_eq!(next_heading(1.0, Steer::Right, &params()), 358.0);
        assert_eq!(next_heading(90.0, Steer::Straight, &params()), 90.0);
        assert_eq!(Steer::from_sign(-1), Steer::Left);
        assert_eq!(Steer::from_sign(1).sign(), 1);
    }

    #[test]
    fn candidate_moves_along_screen_heading() {
        let candidate = propose(
            Position::new(100.0, 100.0),
            90.0,
            10.0,
            Controls::COAST,
            &params(),
        );
        assert!((candidate.speed - 9.95).abs() < 1e-5);
        assert!((candidate.position.x - 100.0).abs() < 1e-3);
        assert!((candidate.position.y - 90.05).abs() < 1e-3);
    }
}
