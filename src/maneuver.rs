// src/maneuver.rs

//! # Twitch Maneuver Driver
//!
//! Runs one bounded test input ("twitch") on one axis, one control tick at
//! a time. Each maneuver first holds the vehicle until it has been level for
//! a while, then commands a rate or angle step and records the peak of the
//! response and the minimum after that peak (bounce-back).
//!
//! While a maneuver is active the driver's [`AxisCommand`] is the only
//! setpoint source for the tested axis. Every other axis keeps flying on
//! the normal controller with centred sticks.
//!
//! Units: rates in deg/s, angles in centidegrees, time in seconds.

use crate::axis::{Axis, PerAxis};
use crate::number::Number;
use crate::policy::{ManeuverLimits, TunePhase};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fraction of the target the response must reach before its rise time is
/// used to shorten the twitch.
const RISE_FRACTION: f32 = 0.6321;

/// The twitch ends at this multiple of the time taken to reach `RISE_FRACTION`.
const RISE_TIME_MULTIPLIER: f32 = 3.0;

/// Bounce-back is only tracked once the peak passes this fraction of the target.
const BOUNCE_TRACKING_FRACTION: f32 = 0.5;

/// Rate target scaling applied when a rate twitch runs out of lean angle.
const SLOW_TWITCH_SCALE: f32 = 0.9;

/// Level threshold widening applied after every level timeout, and its cap.
const LEVEL_WIDENING: f32 = 1.5;
const LEVEL_WIDENING_MAX: f32 = 3.0;

/// Sign of the twitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Direction {
    /// Positive rate or angle step.
    Positive,
    /// Negative rate or angle step.
    Negative,
}

impl Direction {
    /// `1` or `-1`.
    pub fn sign<T: Number>(self) -> T {
        match self {
            Direction::Positive => T::one(),
            Direction::Negative => -T::one(),
        }
    }

    /// The opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            Direction::Positive => Direction::Negative,
            Direction::Negative => Direction::Positive,
        }
    }
}

/// Setpoint for the axis under test.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Setpoint<T> {
    /// Fly as with centred sticks: level for roll/pitch, zero rate for yaw.
    Hold,
    /// Body rate setpoint, deg/s.
    Rate(T),
    /// Attitude setpoint, centidegrees. Yaw is an absolute heading in
    /// (-18000, 18000].
    Angle(T),
}

/// Command the driver issues for the tested axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct AxisCommand<T> {
    /// Axis the setpoint applies to.
    pub axis: Axis,
    /// The setpoint.
    pub setpoint: Setpoint<T>,
}

/// Attitude estimate for one control tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct AttitudeSample<T> {
    /// Body rates, deg/s.
    pub rate: PerAxis<T>,
    /// Roll and pitch lean and yaw heading, centidegrees.
    pub angle: PerAxis<T>,
}

impl<T: Number> AttitudeSample<T> {
    /// Builds a sample from `(roll, pitch, yaw)` tuples.
    pub fn new(rate: (T, T, T), angle: (T, T, T)) -> Self {
        Self {
            rate: rate.into(),
            angle: angle.into(),
        }
    }

    /// A level, motionless vehicle.
    pub fn level() -> Self {
        Self {
            rate: PerAxis::splat(T::zero()),
            angle: PerAxis::splat(T::zero()),
        }
    }
}

/// Measured response of one twitch, normalised to a positive step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct AxisTestResult<T> {
    /// Commanded step size.
    pub target: T,
    /// Lowest response after the peak.
    pub measured_min: T,
    /// Peak response.
    pub measured_max: T,
    /// Peak angular acceleration, deg/s/s.
    pub peak_accel: T,
}

/// Outcome of one driver step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ManeuverStatus<T> {
    /// Keep calling `step`; send the command to the controller.
    InProgress(AxisCommand<T>),
    /// The twitch finished.
    Done(AxisTestResult<T>),
    /// The response on this axis passed the safety ceiling.
    Abort(Axis),
    /// The axis reached the lean limit while still rising, even with the
    /// smallest allowed step. No usable measurement was taken.
    StepTooLarge(Axis),
}

/// Quantity excited by a twitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TestKind {
    /// Rate step, measuring body rate.
    Rate,
    /// Angle step, measuring lean angle.
    Angle,
}

impl TestKind {
    /// The test a phase runs, `None` for `Complete`.
    pub fn for_phase(phase: TunePhase) -> Option<Self> {
        if phase.is_rate_test() {
            Some(TestKind::Rate)
        } else if phase.is_angle_test() {
            Some(TestKind::Angle)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage<T> {
    Idle,
    Leveling { held: T, waited: T },
    Twitching,
}

enum Twitch {
    Continue,
    Restart,
    TooLarge,
    Finished,
}

/// Drives one twitch at a time for the tuner.
#[derive(Debug, Clone)]
pub struct ManeuverDriver<T: Number> {
    limits: ManeuverLimits<T>,
    aggressiveness: T,
    axis: Axis,
    kind: TestKind,
    direction: Direction,
    stage: Stage<T>,
    level_scale: T,
    step_scale: T,
    target: T,
    start_heading: T,
    elapsed: T,
    time_limit: T,
    meas_max: T,
    meas_min: T,
    last_rate: T,
    peak_accel: T,
    lean: T,
    rate: T,
}

impl<T: Number> ManeuverDriver<T> {
    /// Creates an idle driver. `aggressiveness` is the bounce-back fraction
    /// that ends a rate twitch early.
    pub fn new(limits: ManeuverLimits<T>, aggressiveness: T) -> Self {
        Self {
            limits,
            aggressiveness,
            axis: Axis::Roll,
            kind: TestKind::Rate,
            direction: Direction::Positive,
            stage: Stage::Idle,
            level_scale: T::one(),
            step_scale: T::one(),
            target: T::zero(),
            start_heading: T::zero(),
            elapsed: T::zero(),
            time_limit: T::zero(),
            meas_max: T::zero(),
            meas_min: T::zero(),
            last_rate: T::zero(),
            peak_accel: T::zero(),
            lean: T::zero(),
            rate: T::zero(),
        }
    }

    /// Arms a new maneuver for `phase` on `axis`. The rate target scaling
    /// from slow twitches is kept while the axis and test kind stay the same.
    pub fn start(&mut self, axis: Axis, phase: TunePhase, direction: Direction) {
        let Some(kind) = TestKind::for_phase(phase) else {
            self.stop();
            return;
        };
        if axis != self.axis || kind != self.kind {
            self.step_scale = T::one();
        }
        self.axis = axis;
        self.kind = kind;
        self.direction = direction;
        self.level_scale = T::one();
        self.stage = Stage::Leveling {
            held: T::zero(),
            waited: T::zero(),
        };
        self.reset_measurement();
    }

    /// Stops any maneuver and forgets the target scaling.
    pub fn stop(&mut self) {
        self.stage = Stage::Idle;
        self.step_scale = T::one();
    }

    /// True while a maneuver is leveling or twitching.
    pub fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }

    /// True while the step input is being applied.
    pub fn is_twitching(&self) -> bool {
        self.stage == Stage::Twitching
    }

    /// Axis of the current maneuver.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Direction of the current maneuver.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Current rate target scaling, 1 unless twitches ran out of lean angle.
    pub fn step_scale(&self) -> T {
        self.step_scale
    }

    /// Normalised lean (cd) and rate (deg/s) of the last twitch tick.
    pub fn last_response(&self) -> Option<(T, T)> {
        if self.is_twitching() {
            Some((self.lean, self.rate))
        } else {
            None
        }
    }

    /// The setpoint for the tested axis right now.
    pub fn command(&self) -> AxisCommand<T> {
        let setpoint = match self.stage {
            Stage::Twitching => {
                let step = self.target * self.direction.sign();
                match (self.kind, self.axis) {
                    (TestKind::Rate, _) => Setpoint::Rate(step),
                    (TestKind::Angle, Axis::Yaw) => {
                        Setpoint::Angle(wrap_180_cd(self.start_heading + step))
                    }
                    (TestKind::Angle, _) => Setpoint::Angle(step),
                }
            }
            _ => Setpoint::Hold,
        };
        AxisCommand {
            axis: self.axis,
            setpoint,
        }
    }

    /// Advances the maneuver by one control tick.
    pub fn step(&mut self, sample: &AttitudeSample<T>, dt: T) -> ManeuverStatus<T> {
        if self.stage == Stage::Idle {
            return ManeuverStatus::InProgress(self.command());
        }
        if let Some(axis) = self.diverged(sample) {
            self.stop();
            return ManeuverStatus::Abort(axis);
        }
        if !(dt > T::zero()) {
            return ManeuverStatus::InProgress(self.command());
        }
        match self.stage {
            Stage::Idle => ManeuverStatus::InProgress(self.command()),
            Stage::Leveling { held, waited } => {
                let held = if self.is_level(sample) {
                    held + dt
                } else {
                    T::zero()
                };
                let mut waited = waited + dt;
                if held >= self.limits.level_time {
                    self.begin_twitch(sample);
                    return ManeuverStatus::InProgress(self.command());
                }
                if waited >= self.limits.level_timeout {
                    self.level_scale = (self.level_scale * T::lit(LEVEL_WIDENING))
                        .min(T::lit(LEVEL_WIDENING_MAX));
                    waited = T::zero();
                }
                self.stage = Stage::Leveling { held, waited };
                ManeuverStatus::InProgress(self.command())
            }
            Stage::Twitching => self.twitch(sample, dt),
        }
    }

    fn twitch(&mut self, sample: &AttitudeSample<T>, dt: T) -> ManeuverStatus<T> {
        self.elapsed = self.elapsed + dt;
        let rate = sample.rate[self.axis] * self.direction.sign();
        let lean = self.lean_of(sample);
        let accel = (rate - self.last_rate) / dt;
        if accel > self.peak_accel {
            self.peak_accel = accel;
        }
        self.last_rate = rate;
        self.lean = lean;
        self.rate = rate;

        let outcome = match self.kind {
            TestKind::Rate => self.track_rate(rate, lean),
            TestKind::Angle => self.track_angle(lean),
        };
        match outcome {
            Twitch::Continue => ManeuverStatus::InProgress(self.command()),
            Twitch::Restart => {
                self.stage = Stage::Leveling {
                    held: T::zero(),
                    waited: T::zero(),
                };
                self.reset_measurement();
                ManeuverStatus::InProgress(self.command())
            }
            Twitch::TooLarge => {
                let axis = self.axis;
                self.stop();
                ManeuverStatus::StepTooLarge(axis)
            }
            Twitch::Finished => {
                self.stage = Stage::Idle;
                ManeuverStatus::Done(AxisTestResult {
                    target: self.target,
                    measured_min: self.meas_min,
                    measured_max: self.meas_max,
                    peak_accel: self.peak_accel,
                })
            }
        }
    }

    fn track_rate(&mut self, rate: T, lean: T) -> Twitch {
        self.track_peak(rate);
        if lean >= self.limits.rate_test_angle_limit {
            // Still rising when the lean limit is hit: the step was too big
            // for this airframe, retry with a smaller one.
            if self.meas_min >= self.meas_max {
                if self.step_scale > self.limits.min_step_scale {
                    self.step_scale = (self.step_scale * T::lit(SLOW_TWITCH_SCALE))
                        .max(self.limits.min_step_scale);
                    return Twitch::Restart;
                }
                return Twitch::TooLarge;
            }
            return Twitch::Finished;
        }
        if self.meas_max > self.target {
            return Twitch::Finished;
        }
        if self.meas_max - self.meas_min > self.meas_max * self.aggressiveness {
            return Twitch::Finished;
        }
        self.timed_out()
    }

    fn track_angle(&mut self, lean: T) -> Twitch {
        self.track_peak(lean);
        if self.meas_max > self.target {
            return Twitch::Finished;
        }
        self.timed_out()
    }

    fn track_peak(&mut self, value: T) {
        if value > self.meas_max {
            self.meas_max = value;
            self.meas_min = value;
        }
        if value < self.meas_min && self.meas_max > self.target * T::lit(BOUNCE_TRACKING_FRACTION)
        {
            self.meas_min = value;
        }
        if self.meas_max < self.target * T::lit(RISE_FRACTION) {
            self.time_limit = (self.elapsed * T::lit(RISE_TIME_MULTIPLIER))
                .min(self.limits.step_timeout);
        }
    }

    fn timed_out(&self) -> Twitch {
        if self.elapsed >= self.time_limit {
            Twitch::Finished
        } else {
            Twitch::Continue
        }
    }

    fn begin_twitch(&mut self, sample: &AttitudeSample<T>) {
        self.stage = Stage::Twitching;
        self.reset_measurement();
        self.start_heading = sample.angle.yaw;
        self.last_rate = sample.rate[self.axis] * self.direction.sign();
        self.target = match self.kind {
            TestKind::Rate => self.limits.rate_target[self.axis] * self.step_scale,
            TestKind::Angle => self.limits.angle_target[self.axis],
        };
    }

    fn reset_measurement(&mut self) {
        self.elapsed = T::zero();
        self.time_limit = self.limits.step_timeout;
        self.meas_max = T::zero();
        self.meas_min = T::zero();
        self.peak_accel = T::zero();
        self.lean = T::zero();
        self.rate = T::zero();
    }

    fn lean_of(&self, sample: &AttitudeSample<T>) -> T {
        let raw = match self.axis {
            Axis::Yaw => wrap_180_cd(sample.angle.yaw - self.start_heading),
            axis => sample.angle[axis],
        };
        raw * self.direction.sign()
    }

    fn is_level(&self, sample: &AttitudeSample<T>) -> bool {
        let angle_limit = self.limits.level_angle * self.level_scale;
        if sample.angle.roll.abs() > angle_limit || sample.angle.pitch.abs() > angle_limit {
            return false;
        }
        Axis::ALL
            .iter()
            .all(|&axis| sample.rate[axis].abs() <= self.limits.level_rate[axis] * self.level_scale)
    }

    fn diverged(&self, sample: &AttitudeSample<T>) -> Option<Axis> {
        // Written as negated comparisons so NaN counts as divergence.
        for axis in Axis::ALL {
            if !(sample.rate[axis].abs() <= self.limits.abort_rate) {
                return Some(axis);
            }
        }
        for axis in [Axis::Roll, Axis::Pitch] {
            if !(sample.angle[axis].abs() <= self.limits.abort_angle) {
                return Some(axis);
            }
        }
        None
    }
}

/// Wraps a centidegree angle into (-18000, 18000].
pub fn wrap_180_cd<T: Number>(angle: T) -> T {
    let full = T::lit(36000.0);
    let half = T::lit(18000.0);
    let mut wrapped = angle % full;
    if wrapped > half {
        wrapped = wrapped - full;
    } else if wrapped <= -half {
        wrapped = wrapped + full;
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    const DT: f32 = 0.01;

    fn test_limits() -> ManeuverLimits<f32> {
        let mut limits = ManeuverLimits::new();
        limits.rate_target = PerAxis::splat(20.0);
        limits.level_time = 0.05;
        limits.level_timeout = 0.5;
        limits
    }

    fn rate_sample(axis: Axis, rate: f32) -> AttitudeSample<f32> {
        let mut sample = AttitudeSample::level();
        sample.rate[axis] = rate;
        sample
    }

    /// Steps a level vehicle until the twitch starts.
    fn level_until_twitch(driver: &mut ManeuverDriver<f32>) -> AxisCommand<f32> {
        for _ in 0..1000 {
            match driver.step(&AttitudeSample::level(), DT) {
                ManeuverStatus::InProgress(command) if command.setpoint != Setpoint::Hold => {
                    return command
                }
                ManeuverStatus::InProgress(_) => {}
                other => panic!("unexpected status {:?}", other),
            }
        }
        panic!("twitch never started");
    }

    #[test]
    fn test_holds_until_level_then_twitches() {
        let mut driver = ManeuverDriver::new(test_limits(), 0.1);
        driver.start(Axis::Roll, TunePhase::RateDUp, Direction::Positive);

        // Tilted past the level threshold keeps holding.
        let mut tilted = AttitudeSample::level();
        tilted.angle.roll = 900.0;
        for _ in 0..20 {
            assert_eq!(
                driver.step(&tilted, DT),
                ManeuverStatus::InProgress(AxisCommand {
                    axis: Axis::Roll,
                    setpoint: Setpoint::Hold
                })
            );
        }

        let command = level_until_twitch(&mut driver);
        assert_eq!(command.axis, Axis::Roll);
        assert_eq!(command.setpoint, Setpoint::Rate(20.0));
        assert!(driver.is_twitching());
    }

    #[test]
    fn test_rate_twitch_ends_when_target_passed() {
        let mut driver = ManeuverDriver::new(test_limits(), 0.1);
        driver.start(Axis::Pitch, TunePhase::RatePUp, Direction::Positive);
        level_until_twitch(&mut driver);

        assert!(matches!(
            driver.step(&rate_sample(Axis::Pitch, 12.0), DT),
            ManeuverStatus::InProgress(_)
        ));
        match driver.step(&rate_sample(Axis::Pitch, 21.0), DT) {
            ManeuverStatus::Done(result) => {
                assert!(value_close(20.0, result.target));
                assert!(value_close(21.0, result.measured_max));
                assert!(value_close(21.0, result.measured_min));
                assert!(value_close(1200.0, result.peak_accel));
            }
            other => panic!("expected done, got {:?}", other),
        }
        assert!(!driver.is_active());
    }

    #[test]
    fn test_rate_twitch_ends_on_bounce_back() {
        let mut driver = ManeuverDriver::new(test_limits(), 0.1);
        driver.start(Axis::Roll, TunePhase::RateDUp, Direction::Positive);
        level_until_twitch(&mut driver);

        driver.step(&rate_sample(Axis::Roll, 15.0), DT);
        // 0.5 deg/s of bounce is below the 1.5 deg/s threshold.
        assert!(matches!(
            driver.step(&rate_sample(Axis::Roll, 14.5), DT),
            ManeuverStatus::InProgress(_)
        ));
        match driver.step(&rate_sample(Axis::Roll, 13.0), DT) {
            ManeuverStatus::Done(result) => {
                assert!(value_close(15.0, result.measured_max));
                assert!(value_close(13.0, result.measured_min));
            }
            other => panic!("expected done, got {:?}", other),
        }
    }

    #[test]
    fn test_rate_twitch_times_out() {
        let mut limits = test_limits();
        limits.step_timeout = 0.2;
        let mut driver = ManeuverDriver::new(limits, 0.1);
        driver.start(Axis::Roll, TunePhase::RatePUp, Direction::Positive);
        level_until_twitch(&mut driver);

        let mut ticks = 0;
        let result = loop {
            ticks += 1;
            assert!(ticks < 100, "twitch never timed out");
            if let ManeuverStatus::Done(result) = driver.step(&rate_sample(Axis::Roll, 5.0), DT) {
                break result;
            }
        };
        assert!((19..=21).contains(&ticks), "finished after {} ticks", ticks);
        assert!(value_close(5.0, result.measured_max));
    }

    #[test]
    fn test_negative_twitch_is_normalised() {
        let mut driver = ManeuverDriver::new(test_limits(), 0.1);
        driver.start(Axis::Yaw, TunePhase::RatePUp, Direction::Negative);
        let command = level_until_twitch(&mut driver);
        assert_eq!(command.setpoint, Setpoint::Rate(-20.0));

        match driver.step(&rate_sample(Axis::Yaw, -25.0), DT) {
            ManeuverStatus::Done(result) => assert!(value_close(25.0, result.measured_max)),
            other => panic!("expected done, got {:?}", other),
        }
    }

    #[test]
    fn test_divergence_aborts() {
        let mut driver = ManeuverDriver::new(test_limits(), 0.1);
        driver.start(Axis::Roll, TunePhase::RateDUp, Direction::Positive);
        level_until_twitch(&mut driver);
        assert_eq!(
            driver.step(&rate_sample(Axis::Pitch, 800.0), DT),
            ManeuverStatus::Abort(Axis::Pitch)
        );
        assert!(!driver.is_active());

        let mut nan = AttitudeSample::level();
        nan.angle.roll = f32::NAN;
        driver.start(Axis::Roll, TunePhase::RateDUp, Direction::Positive);
        assert_eq!(driver.step(&nan, DT), ManeuverStatus::Abort(Axis::Roll));
    }

    #[test]
    fn test_yaw_angle_twitch_wraps_heading() {
        let mut driver = ManeuverDriver::new(test_limits(), 0.1);
        driver.start(Axis::Yaw, TunePhase::AnglePUp, Direction::Positive);
        let mut heading = AttitudeSample::level();
        heading.angle.yaw = 17000.0;
        let mut command = None;
        for _ in 0..100 {
            if let ManeuverStatus::InProgress(c) = driver.step(&heading, DT) {
                if c.setpoint != Setpoint::Hold {
                    command = Some(c);
                    break;
                }
            }
        }
        // 170 degrees plus a 45 degree step lands at -145 degrees.
        assert_eq!(command.unwrap().setpoint, Setpoint::Angle(-14500.0));

        // Crossing the wrap: 30 degrees past the start is still short of the target.
        heading.angle.yaw = -16000.0;
        assert!(matches!(
            driver.step(&heading, DT),
            ManeuverStatus::InProgress(AxisCommand {
                setpoint: Setpoint::Angle(_),
                ..
            })
        ));
        heading.angle.yaw = -13000.0;
        match driver.step(&heading, DT) {
            ManeuverStatus::Done(result) => {
                assert!(value_close(4500.0, result.target));
                assert!(value_close(6000.0, result.measured_max));
            }
            other => panic!("expected done, got {:?}", other),
        }
    }

    #[test]
    fn test_slow_twitch_reduces_rate_target() {
        let mut driver = ManeuverDriver::new(test_limits(), 0.1);
        driver.start(Axis::Roll, TunePhase::RateDUp, Direction::Positive);
        level_until_twitch(&mut driver);

        let mut leaning = rate_sample(Axis::Roll, 10.0);
        leaning.angle.roll = 2100.0;
        let status = driver.step(&leaning, DT);
        assert_eq!(
            status,
            ManeuverStatus::InProgress(AxisCommand {
                axis: Axis::Roll,
                setpoint: Setpoint::Hold
            })
        );
        assert!(value_close(0.9, driver.step_scale()));

        match level_until_twitch(&mut driver).setpoint {
            Setpoint::Rate(rate) => assert!(value_close(18.0, rate)),
            other => panic!("expected rate setpoint, got {:?}", other),
        }
    }

    #[test]
    fn test_lean_limited_twitch_at_smallest_step_is_not_a_result() {
        let mut driver = ManeuverDriver::new(test_limits(), 0.1);
        driver.start(Axis::Roll, TunePhase::RateDUp, Direction::Positive);
        let mut leaning = rate_sample(Axis::Roll, 10.0);
        leaning.angle.roll = 2100.0;

        let mut restarts = 0;
        let status = loop {
            level_until_twitch(&mut driver);
            match driver.step(&leaning, DT) {
                ManeuverStatus::InProgress(_) => restarts += 1,
                other => break other,
            }
            assert!(restarts < 20, "step scale never bottomed out");
        };
        // 0.9, 0.81, ... down to 0.531, then clamped to 0.5.
        assert_eq!(restarts, 7);
        assert_eq!(status, ManeuverStatus::StepTooLarge(Axis::Roll));
        assert!(!driver.is_active());
    }

    #[test]
    fn test_level_thresholds_widen_after_timeout() {
        let mut driver = ManeuverDriver::new(test_limits(), 0.1);
        driver.start(Axis::Roll, TunePhase::AnglePDown, Direction::Positive);
        // 6 degrees of lean never counts as level at the base 5 degrees.
        let mut tilted = AttitudeSample::level();
        tilted.angle.pitch = 600.0;
        let mut started = false;
        for _ in 0..200 {
            if let ManeuverStatus::InProgress(c) = driver.step(&tilted, DT) {
                if c.setpoint != Setpoint::Hold {
                    started = true;
                    break;
                }
            }
        }
        assert!(started, "widened level threshold should accept 6 degrees");
    }

    #[test]
    fn test_wrap_180_cd() {
        assert!(value_close(-14500.0, wrap_180_cd(21500.0f32)));
        assert!(value_close(18000.0, wrap_180_cd(-18000.0f32)));
        assert!(value_close(100.0, wrap_180_cd(36100.0f32)));
    }
}
