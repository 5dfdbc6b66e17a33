// src/pid/rate.rs

//! # Rate Loop PID Compute Function
//!
//! Compute callback for a `piddiy` rate controller. The derivative acts on
//! the measured rate rather than on the error, so a twitch step in the
//! setpoint does not kick the D term and the measured bounce-back comes
//! from the airframe, not from the controller.

use crate::number::Number;
use piddiy::PidController;

/// Control data for the rate loop compute callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RateLoopData {
    /// The current body rate, deg/s, typically reported by a gyro.
    pub rate: f32,
    /// The body rate of the previous computation.
    pub prev_rate: f32,
    /// The time delta since the last computation.
    pub dt: f32,
    /// The maximum magnitude of the integral term, used to prevent windup.
    pub integral_limit: f32,
    /// Flag to reset the integral term, typically used on the ground.
    pub reset_integral: bool,
}

/// Rate loop compute callback returning `(error, integral, derivative)`.
pub fn compute_rate_loop(
    pid: &mut PidController<f32, RateLoopData>,
    data: RateLoopData,
) -> (f32, f32, f32) {
    let error = pid.set_point - data.rate;
    let integral = if data.reset_integral {
        0.0
    } else {
        (pid.integral + error * data.dt).constrain(-data.integral_limit, data.integral_limit)
    };
    let derivative = if data.dt > 0.0 {
        (data.prev_rate - data.rate) / data.dt
    } else {
        0.0
    };

    (error, integral, derivative)
}
