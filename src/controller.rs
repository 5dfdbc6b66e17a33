// src/controller.rs

//! # Reference Attitude Controller
//!
//! A cascaded angle to rate controller that flies with the gains of an
//! autotune session. Angle errors become rate setpoints through angle P,
//! and a `piddiy` PID per axis closes the rate loop with rate P, I and D.
//!
//! While a session runs, the tuner's [`AxisCommand`] replaces the pilot
//! setpoint of the tested axis. Every other axis holds level (roll, pitch)
//! or zero rate (yaw).

use crate::axis::{Axis, PerAxis};
use crate::gains::{AxisGains, GainSet};
use crate::maneuver::{wrap_180_cd, AttitudeSample, AxisCommand, Setpoint};
use crate::number::Number;
use crate::pid::{compute_rate_loop, RateLoopData};
use piddiy::PidController;

/// Settings of the reference controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    /// Magnitude limit of the rate loop integral.
    pub i_limit: f32,
    /// Output scale applied to every axis.
    pub scale: f32,
    /// Rate setpoint limit, deg/s.
    pub max_rate: f32,
}

impl ControllerConfig {
    /// Integral limit 25, unit scale, 360 deg/s rate limit.
    pub fn new() -> Self {
        Self {
            i_limit: 25.0,
            scale: 1.0,
            max_rate: 360.0,
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Rate loop of one axis.
pub struct AxisController {
    pid: PidController<f32, RateLoopData>,
    prev_rate: f32,
}

impl AxisController {
    /// Creates a rate loop with zero gains.
    pub fn new() -> Self {
        let mut pid = PidController::new();
        pid.compute_fn(compute_rate_loop)
            .set_point(0.0)
            .kp(0.0)
            .ki(0.0)
            .kd(0.0);
        Self {
            pid,
            prev_rate: 0.0,
        }
    }

    /// Runs the rate loop once with `gains` and returns the unscaled output.
    pub fn update(
        &mut self,
        gains: &AxisGains<f32>,
        rate_target: f32,
        rate: f32,
        dt: f32,
        i_limit: f32,
        low_throttle: bool,
    ) -> f32 {
        self.pid
            .set_point(rate_target)
            .kp(gains.rate_p)
            .ki(gains.rate_i)
            .kd(gains.rate_d);
        let data = RateLoopData {
            rate,
            prev_rate: self.prev_rate,
            dt,
            integral_limit: i_limit,
            reset_integral: low_throttle,
        };
        self.prev_rate = rate;
        self.pid.compute(data)
    }
}

impl Default for AxisController {
    fn default() -> Self {
        Self::new()
    }
}

/// Three axis cascaded attitude controller.
pub struct AttitudeController {
    config: ControllerConfig,
    axes: PerAxis<AxisController>,
}

impl AttitudeController {
    /// Creates a controller using the provided configuration.
    pub fn with_config(config: ControllerConfig) -> Self {
        Self {
            config,
            axes: PerAxis::new(AxisController::new(), AxisController::new(), AxisController::new()),
        }
    }

    /// Creates a controller with default settings.
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::new())
    }

    /// Rate setpoint in deg/s for `axis` given its setpoint and the current
    /// attitude. Angle errors are in centidegrees, angle P maps degrees of
    /// error to deg/s.
    pub fn rate_target(
        &self,
        axis: Axis,
        gains: &AxisGains<f32>,
        setpoint: Setpoint<f32>,
        sample: &AttitudeSample<f32>,
    ) -> f32 {
        let target = match (setpoint, axis) {
            (Setpoint::Rate(rate), _) => rate,
            (Setpoint::Hold, Axis::Yaw) => 0.0,
            (Setpoint::Hold, _) => gains.stab_p * -sample.angle[axis] * 0.01,
            (Setpoint::Angle(heading), Axis::Yaw) => {
                gains.stab_p * wrap_180_cd(heading - sample.angle.yaw) * 0.01
            }
            (Setpoint::Angle(angle), _) => gains.stab_p * (angle - sample.angle[axis]) * 0.01,
        };
        target.constrain(-self.config.max_rate, self.config.max_rate)
    }

    /// Computes `(roll, pitch, yaw)` outputs. `command` drives its axis,
    /// the others hold.
    pub fn control(
        &mut self,
        gains: &GainSet<f32>,
        command: Option<AxisCommand<f32>>,
        sample: &AttitudeSample<f32>,
        dt: f32,
        low_throttle: bool,
    ) -> (f32, f32, f32) {
        let mut output = PerAxis::splat(0.0f32);
        for axis in Axis::ALL {
            let setpoint = match command {
                Some(command) if command.axis == axis => command.setpoint,
                _ => Setpoint::Hold,
            };
            let rate_target = self.rate_target(axis, &gains[axis], setpoint, sample);
            let out = self.axes[axis].update(
                &gains[axis],
                rate_target,
                sample.rate[axis],
                dt,
                self.config.i_limit,
                low_throttle,
            );
            output[axis] = self.config.scale * out;
        }
        output.to_tuple()
    }
}

impl Default for AttitudeController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn gains() -> GainSet<f32> {
        PerAxis::splat(AxisGains::new(0.1, 0.0, 4.0))
    }

    #[test]
    fn test_level_and_still_gives_zero_output() {
        let mut controller = AttitudeController::new();
        let output = controller.control(&gains(), None, &AttitudeSample::level(), 0.01, false);
        assert!(vector_close((0.0, 0.0, 0.0), output));
    }

    #[test]
    fn test_hold_levels_roll_and_pitch() {
        let controller = AttitudeController::new();
        let mut sample = AttitudeSample::level();
        sample.angle = PerAxis::new(500.0, -250.0, 9000.0);
        let gains = gains();
        assert!(value_close(-20.0, controller.rate_target(Axis::Roll, &gains.roll, Setpoint::Hold, &sample)));
        assert!(value_close(10.0, controller.rate_target(Axis::Pitch, &gains.pitch, Setpoint::Hold, &sample)));
        // Yaw holds rate, not heading.
        assert!(value_close(0.0, controller.rate_target(Axis::Yaw, &gains.yaw, Setpoint::Hold, &sample)));
    }

    #[test]
    fn test_yaw_angle_setpoint_takes_short_way_round() {
        let controller = AttitudeController::new();
        let mut sample = AttitudeSample::level();
        sample.angle.yaw = 17000.0;
        let target = controller.rate_target(Axis::Yaw, &gains().yaw, Setpoint::Angle(-17000.0), &sample);
        // 20 degrees clockwise, not 340 the other way.
        assert!(value_close(80.0, target));
    }

    #[test]
    fn test_rate_setpoint_is_limited() {
        let controller = AttitudeController::new();
        let target = controller.rate_target(
            Axis::Roll,
            &gains().roll,
            Setpoint::Rate(1000.0),
            &AttitudeSample::level(),
        );
        assert!(value_close(360.0, target));
    }

    #[test]
    fn test_command_drives_only_its_axis() {
        let mut controller = AttitudeController::new();
        let command = AxisCommand {
            axis: Axis::Pitch,
            setpoint: Setpoint::Rate(20.0),
        };
        let (roll, pitch, yaw) =
            controller.control(&gains(), Some(command), &AttitudeSample::level(), 0.01, false);
        assert!(value_close(0.0, roll));
        assert!(value_close(2.0, pitch));
        assert!(value_close(0.0, yaw));
    }

    #[test]
    fn test_rate_loop_follows_new_gains() {
        let mut axis = AxisController::new();
        let soft = AxisGains::new(0.1f32, 0.0, 4.0);
        let stiff = AxisGains::new(0.3f32, 0.0, 4.0);
        let first = axis.update(&soft, 10.0, 0.0, 0.01, 25.0, false);
        let second = axis.update(&stiff, 10.0, 0.0, 0.01, 25.0, false);
        assert!(value_close(1.0, first));
        assert!(value_close(3.0, second));
    }
}
