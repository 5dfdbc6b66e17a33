// src/policy.rs

//! # Vehicle Family Tuning Policy
//!
//! Everything that differs between vehicle families lives in a
//! [`FamilyPolicy`]: the phase sequence, the gain bounds table, the search
//! criteria and the maneuver limits. A policy is chosen once at startup and
//! handed to the tuner by reference. New families are new policy values.
//!
//! Units: rates are deg/s, angles are centidegrees, times are seconds.

use crate::axis::{Axis, AxisOrder, PerAxis};
use crate::error::ConfigError;
use crate::gains::GainKind;
use crate::number::Number;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Search range and step size for one gain.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct GainBounds<T> {
    /// Smallest value the search may use.
    pub min: T,
    /// Largest value the search may use.
    pub max: T,
    /// Fraction of the current value added or removed per step.
    pub step_ratio: T,
}

impl<T: Number> GainBounds<T> {
    /// Creates bounds.
    pub fn new(min: T, max: T, step_ratio: T) -> Self {
        Self {
            min,
            max,
            step_ratio,
        }
    }

    /// Returns true when the range is ordered, non-negative and the step
    /// ratio lies in (0, 1).
    pub fn is_valid(&self) -> bool {
        self.min >= T::zero()
            && self.min <= self.max
            && self.step_ratio > T::zero()
            && self.step_ratio < T::one()
            && self.max.is_finite()
    }

    /// Returns true if `value` lies inside the range.
    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }

    /// Clamps `value` into the range.
    pub fn clamp(&self, value: T) -> T {
        value.constrain(self.min, self.max)
    }

    /// One step up from `value`. A zero gain restarts at `step_ratio` of the
    /// maximum, since a multiplicative step cannot leave zero.
    pub fn raise(&self, value: T) -> T {
        let next = if value > T::zero() {
            value + value * self.step_ratio
        } else {
            self.max * self.step_ratio
        };
        self.clamp(next)
    }

    /// One step down from `value`.
    pub fn lower(&self, value: T) -> T {
        self.clamp(value - value * self.step_ratio)
    }

    /// Undoes one `raise` of `value`.
    pub fn back_off(&self, value: T) -> T {
        self.clamp(value / (T::one() + self.step_ratio))
    }

    /// Returns true if `value` is at or above the maximum.
    pub fn at_max(&self, value: T) -> bool {
        value >= self.max
    }

    /// Returns true if `value` is at or below the minimum.
    pub fn at_min(&self, value: T) -> bool {
        value <= self.min
    }
}

/// Gain bounds per `(axis, kind)`. Missing entries are unsupported gains.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct BoundsTable<T> {
    entries: [[Option<GainBounds<T>>; 3]; 3],
}

impl<T: Number> BoundsTable<T> {
    /// A table with no supported gains.
    pub fn empty() -> Self {
        Self {
            entries: [[None; 3]; 3],
        }
    }

    /// Sets the bounds for one axis.
    pub fn with(mut self, axis: Axis, kind: GainKind, bounds: GainBounds<T>) -> Self {
        self.entries[axis.index()][kind.index()] = Some(bounds);
        self
    }

    /// Sets the same bounds on every axis.
    pub fn with_all_axes(mut self, kind: GainKind, bounds: GainBounds<T>) -> Self {
        for axis in Axis::ALL {
            self.entries[axis.index()][kind.index()] = Some(bounds);
        }
        self
    }

    /// Removes the bounds for one axis, making the gain unsupported.
    pub fn without(mut self, axis: Axis, kind: GainKind) -> Self {
        self.entries[axis.index()][kind.index()] = None;
        self
    }

    /// Returns the bounds for a gain if the family supports it.
    pub fn get(&self, axis: Axis, kind: GainKind) -> Option<GainBounds<T>> {
        self.entries[axis.index()][kind.index()]
    }

    /// Returns the bounds for a gain, or a configuration error.
    pub fn lookup(&self, axis: Axis, kind: GainKind) -> Result<GainBounds<T>, ConfigError> {
        let bounds = self
            .get(axis, kind)
            .ok_or(ConfigError::UnsupportedGain { axis, kind })?;
        if !bounds.is_valid() {
            return Err(ConfigError::InvalidBounds { axis, kind });
        }
        Ok(bounds)
    }
}

/// One stage of the tuning sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[repr(u8)]
pub enum TunePhase {
    /// Raise rate D until a little bounce-back appears.
    RateDUp = 0,
    /// Lower rate D until bounce-back disappears.
    RateDDown = 1,
    /// Raise rate P until the rate target is reached, trimming D on bounce-back.
    RatePUp = 2,
    /// Lower angle P until the angle target is no longer reached.
    AnglePDown = 3,
    /// Raise angle P until the angle target is reached.
    AnglePUp = 4,
    /// End of the sequence for the current axis.
    Complete = 5,
}

impl TunePhase {
    /// Numeric identifier written to log records.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Human readable name used in announcements.
    pub const fn name(self) -> &'static str {
        match self {
            TunePhase::RateDUp => "Rate D Up",
            TunePhase::RateDDown => "Rate D Down",
            TunePhase::RatePUp => "Rate P Up",
            TunePhase::AnglePDown => "Angle P Down",
            TunePhase::AnglePUp => "Angle P Up",
            TunePhase::Complete => "Complete",
        }
    }

    /// True for phases that twitch the rate loop.
    pub const fn is_rate_test(self) -> bool {
        matches!(
            self,
            TunePhase::RateDUp | TunePhase::RateDDown | TunePhase::RatePUp
        )
    }

    /// True for phases that twitch the angle loop.
    pub const fn is_angle_test(self) -> bool {
        matches!(self, TunePhase::AnglePDown | TunePhase::AnglePUp)
    }
}

impl fmt::Display for TunePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const MAX_PHASES: usize = 6;

/// Ordered list of phases run on every axis, ending with `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct TuneSequence {
    phases: [TunePhase; MAX_PHASES],
    len: u8,
}

impl TuneSequence {
    /// Validates and stores a sequence. Phases must be distinct and the
    /// last one must be `Complete`.
    pub fn new(phases: &[TunePhase]) -> Result<Self, ConfigError> {
        if phases.is_empty() {
            return Err(ConfigError::EmptySequence);
        }
        if phases.len() > MAX_PHASES {
            return Err(ConfigError::SequenceTooLong);
        }
        if phases[phases.len() - 1] != TunePhase::Complete {
            return Err(ConfigError::SequenceNotTerminated);
        }
        let mut sequence = Self {
            phases: [TunePhase::Complete; MAX_PHASES],
            len: 0,
        };
        for &phase in phases {
            if sequence.as_slice().contains(&phase) {
                return Err(ConfigError::DuplicatePhase(phase));
            }
            sequence.phases[sequence.len as usize] = phase;
            sequence.len += 1;
        }
        Ok(sequence)
    }

    /// Rate D up, rate D down, rate P up, angle P down, angle P up.
    pub const fn standard() -> Self {
        Self {
            phases: [
                TunePhase::RateDUp,
                TunePhase::RateDDown,
                TunePhase::RatePUp,
                TunePhase::AnglePDown,
                TunePhase::AnglePUp,
                TunePhase::Complete,
            ],
            len: 6,
        }
    }

    /// Number of phases including `Complete`.
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Always false for a validated sequence.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Phase at `position`.
    pub fn get(&self, position: usize) -> Option<TunePhase> {
        self.as_slice().get(position).copied()
    }

    /// The phases as a slice.
    pub fn as_slice(&self) -> &[TunePhase] {
        &self.phases[..self.len as usize]
    }
}

/// Thresholds used by the gain search rules.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Criteria<T> {
    /// Bounce-back threshold as a fraction of the peak response.
    pub aggressiveness: T,
    /// A rate peak below `target * (1 - margin)` is too weak to judge D.
    pub d_up_down_margin: T,
    /// A rate peak above `target * overshoot_limit` calls for less P.
    pub overshoot_limit: T,
    /// Consecutive tests that must meet a phase criterion before advancing.
    pub success_count: u8,
    /// Tests allowed in one phase before it is forced to finish.
    pub max_iterations: u16,
}

impl<T: Number> Criteria<T> {
    /// Aggressiveness 0.1, margin 0.2, overshoot limit 1.25, two successes,
    /// sixty tests per phase.
    pub fn new() -> Self {
        Self {
            aggressiveness: T::lit(0.1),
            d_up_down_margin: T::lit(0.2),
            overshoot_limit: T::lit(1.25),
            success_count: 2,
            max_iterations: 60,
        }
    }

    /// Checks the ranges of every threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.aggressiveness > T::zero() && self.aggressiveness < T::one()) {
            return Err(ConfigError::InvalidParameter("aggressiveness"));
        }
        if !(self.d_up_down_margin >= T::zero() && self.d_up_down_margin < T::one()) {
            return Err(ConfigError::InvalidParameter("d_up_down_margin"));
        }
        if !(self.overshoot_limit > T::one()) {
            return Err(ConfigError::InvalidParameter("overshoot_limit"));
        }
        if self.success_count == 0 {
            return Err(ConfigError::InvalidParameter("success_count"));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidParameter("max_iterations"));
        }
        Ok(())
    }
}

impl<T: Number> Default for Criteria<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Targets, timing and safety limits of the twitch maneuvers.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct ManeuverLimits<T> {
    /// Commanded rate step for rate phases, deg/s.
    pub rate_target: PerAxis<T>,
    /// Commanded angle step for angle phases, centidegrees.
    pub angle_target: PerAxis<T>,
    /// Longest allowed twitch, seconds.
    pub step_timeout: T,
    /// Roll/pitch lean that ends a rate twitch early, centidegrees.
    pub rate_test_angle_limit: T,
    /// Lean angle considered level, centidegrees.
    pub level_angle: T,
    /// Body rate considered level, deg/s.
    pub level_rate: PerAxis<T>,
    /// Time the vehicle must stay level before a twitch, seconds.
    pub level_time: T,
    /// Time after which the level thresholds are widened, seconds.
    pub level_timeout: T,
    /// Roll/pitch lean that aborts the session, centidegrees.
    pub abort_angle: T,
    /// Body rate on any axis that aborts the session, deg/s.
    pub abort_rate: T,
    /// Smallest fraction of the rate target a slow twitch may be scaled to.
    pub min_step_scale: T,
}

impl<T: Number> ManeuverLimits<T> {
    /// Multirotor defaults: 180 deg/s and 20 degree roll/pitch twitches,
    /// 90 deg/s and 45 degree yaw twitches, one second twitch timeout.
    pub fn new() -> Self {
        Self {
            rate_target: PerAxis::new(T::lit(180.0), T::lit(180.0), T::lit(90.0)),
            angle_target: PerAxis::new(T::lit(2000.0), T::lit(2000.0), T::lit(4500.0)),
            step_timeout: T::one(),
            rate_test_angle_limit: T::lit(2000.0),
            level_angle: T::lit(500.0),
            level_rate: PerAxis::new(T::lit(10.0), T::lit(10.0), T::lit(7.5)),
            level_time: T::lit(0.5),
            level_timeout: T::lit(2.0),
            abort_angle: T::lit(4500.0),
            abort_rate: T::lit(720.0),
            min_step_scale: T::lit(0.5),
        }
    }

    /// Checks that every limit is positive and the safety ceilings sit above
    /// the twitch targets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for axis in Axis::ALL {
            if !(self.rate_target[axis] > T::zero()) {
                return Err(ConfigError::InvalidParameter("rate_target"));
            }
            if !(self.angle_target[axis] > T::zero()) {
                return Err(ConfigError::InvalidParameter("angle_target"));
            }
            if !(self.level_rate[axis] > T::zero()) {
                return Err(ConfigError::InvalidParameter("level_rate"));
            }
            if !(self.abort_rate > self.rate_target[axis]) {
                return Err(ConfigError::InvalidParameter("abort_rate"));
            }
        }
        if !(self.step_timeout > T::zero()) {
            return Err(ConfigError::InvalidParameter("step_timeout"));
        }
        if !(self.level_angle > T::zero()) {
            return Err(ConfigError::InvalidParameter("level_angle"));
        }
        if !(self.level_time > T::zero() && self.level_timeout > self.level_time) {
            return Err(ConfigError::InvalidParameter("level_timeout"));
        }
        if !(self.abort_angle > self.rate_test_angle_limit
            && self.abort_angle > self.angle_target.roll
            && self.abort_angle > self.angle_target.pitch)
        {
            return Err(ConfigError::InvalidParameter("abort_angle"));
        }
        if !(self.min_step_scale > T::zero() && self.min_step_scale <= T::one()) {
            return Err(ConfigError::InvalidParameter("min_step_scale"));
        }
        Ok(())
    }
}

impl<T: Number> Default for ManeuverLimits<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Adjustments applied when an axis finishes its sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Finalisation<T> {
    /// Multiplier applied to the tuned rate P.
    pub rate_p_backoff: T,
    /// Multiplier applied to the tuned rate D.
    pub rate_d_backoff: T,
    /// Multiplier applied to the tuned angle P.
    pub stab_p_backoff: T,
    /// Rate I as a fraction of rate P while the axis is being twitched.
    pub pi_ratio_for_testing: T,
    /// Lower limit of the final roll/pitch rate I as a fraction of rate P.
    pub pi_ratio_final: T,
    /// Final yaw rate I as a fraction of rate P.
    pub yaw_pi_ratio_final: T,
    /// Lower limit of the saved acceleration limit, centidegrees/s/s.
    pub accel_max_floor: PerAxis<T>,
}

impl<T: Number> Finalisation<T> {
    /// Backs angle P off to 90 %, keeps the rate gains as tuned.
    pub fn new() -> Self {
        Self {
            rate_p_backoff: T::one(),
            rate_d_backoff: T::one(),
            stab_p_backoff: T::lit(0.9),
            pi_ratio_for_testing: T::lit(0.1),
            pi_ratio_final: T::one(),
            yaw_pi_ratio_final: T::lit(0.1),
            accel_max_floor: PerAxis::new(T::lit(4000.0), T::lit(4000.0), T::lit(1000.0)),
        }
    }
}

impl<T: Number> Default for Finalisation<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Vehicle families with built-in presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum VehicleFamily {
    /// Multirotor, including single and coaxial copters.
    Multirotor,
    /// Traditional helicopter.
    Helicopter,
    /// Hand-built policy.
    Custom,
}

/// Complete tuning configuration of one vehicle family.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct FamilyPolicy<T> {
    /// Family this policy describes.
    pub family: VehicleFamily,
    /// Phases run on every axis.
    pub sequence: TuneSequence,
    /// Search ranges of the tuned gains.
    pub bounds: BoundsTable<T>,
    /// Whether rate P may be zero.
    pub allow_zero_rate_p: bool,
    /// Skip rate D down; the family's D topology has no bounce-back to remove.
    pub rate_d_down_pass_through: bool,
    /// Run the rate D phases on yaw.
    pub tune_yaw_rate_d: bool,
    /// Roll back a failed axis and carry on with the next instead of aborting.
    pub continue_after_axis_failure: bool,
    /// Search thresholds.
    pub criteria: Criteria<T>,
    /// Maneuver targets and limits.
    pub maneuver: ManeuverLimits<T>,
    /// End-of-axis adjustments.
    pub finalisation: Finalisation<T>,
    /// Seconds between progress announcements.
    pub announce_interval: T,
}

impl<T: Number> FamilyPolicy<T> {
    /// Standard multirotor: full five phase sequence, yaw D left alone, any
    /// convergence failure aborts the session.
    pub fn multirotor() -> Self {
        let step = T::lit(0.05);
        let bounds = BoundsTable::empty()
            .with_all_axes(
                GainKind::RateP,
                GainBounds::new(T::lit(0.01), T::lit(2.0), step),
            )
            .with_all_axes(
                GainKind::RateD,
                GainBounds::new(T::lit(0.001), T::lit(0.2), step),
            )
            .with_all_axes(
                GainKind::StabP,
                GainBounds::new(T::lit(0.5), T::lit(20.0), step),
            )
            .without(Axis::Yaw, GainKind::RateD);
        Self {
            family: VehicleFamily::Multirotor,
            sequence: TuneSequence::standard(),
            bounds,
            allow_zero_rate_p: false,
            rate_d_down_pass_through: false,
            tune_yaw_rate_d: false,
            continue_after_axis_failure: false,
            criteria: Criteria::new(),
            maneuver: ManeuverLimits::new(),
            finalisation: Finalisation::new(),
            announce_interval: T::lit(2.0),
        }
    }

    /// Helicopter: rate D down is a pass-through, rate P may be zero, and a
    /// failed axis keeps its original gains while the others are tuned.
    pub fn helicopter() -> Self {
        let step = T::lit(0.05);
        let bounds = BoundsTable::empty()
            .with_all_axes(
                GainKind::RateP,
                GainBounds::new(T::zero(), T::lit(0.6), step),
            )
            .with_all_axes(
                GainKind::RateD,
                GainBounds::new(T::lit(0.0001), T::lit(0.02), step),
            )
            .with_all_axes(
                GainKind::StabP,
                GainBounds::new(T::lit(3.0), T::lit(20.0), step),
            );
        let mut maneuver = ManeuverLimits::new();
        maneuver.rate_target = PerAxis::new(T::lit(90.0), T::lit(90.0), T::lit(90.0));
        maneuver.angle_target = PerAxis::new(T::lit(1500.0), T::lit(1500.0), T::lit(4500.0));
        Self {
            family: VehicleFamily::Helicopter,
            sequence: TuneSequence::standard(),
            bounds,
            allow_zero_rate_p: true,
            rate_d_down_pass_through: true,
            tune_yaw_rate_d: true,
            continue_after_axis_failure: true,
            criteria: Criteria::new(),
            maneuver,
            finalisation: Finalisation::new(),
            announce_interval: T::lit(2.0),
        }
    }

    /// Returns the bounds for a gain, or a configuration error.
    pub fn bounds(&self, axis: Axis, kind: GainKind) -> Result<GainBounds<T>, ConfigError> {
        self.bounds.lookup(axis, kind)
    }

    /// Returns true if `phase` runs on `axis` for this family.
    pub fn phase_applies(&self, axis: Axis, phase: TunePhase) -> bool {
        match phase {
            TunePhase::RateDUp => axis != Axis::Yaw || self.tune_yaw_rate_d,
            TunePhase::RateDDown => {
                !self.rate_d_down_pass_through && (axis != Axis::Yaw || self.tune_yaw_rate_d)
            }
            _ => true,
        }
    }

    /// Returns true if rate P up may trim rate D on `axis`.
    pub fn couples_rate_d(&self, axis: Axis) -> bool {
        (axis != Axis::Yaw || self.tune_yaw_rate_d) && self.bounds.get(axis, GainKind::RateD).is_some()
    }

    /// Checks that every gain needed to tune `axes` is supported and every
    /// threshold is in range.
    pub fn validate(&self, axes: &AxisOrder) -> Result<(), ConfigError> {
        self.criteria.validate()?;
        self.maneuver.validate()?;
        if !(self.announce_interval > T::zero()) {
            return Err(ConfigError::InvalidParameter("announce_interval"));
        }
        for axis in axes.iter() {
            for &phase in self.sequence.as_slice() {
                if !self.phase_applies(axis, phase) {
                    continue;
                }
                match phase {
                    TunePhase::RateDUp | TunePhase::RateDDown => {
                        self.rate_p_bounds(axis)?;
                        self.bounds(axis, GainKind::RateD)?;
                    }
                    TunePhase::RatePUp => {
                        self.rate_p_bounds(axis)?;
                        if self.couples_rate_d(axis) {
                            self.bounds(axis, GainKind::RateD)?;
                        }
                    }
                    TunePhase::AnglePDown | TunePhase::AnglePUp => {
                        self.bounds(axis, GainKind::StabP)?;
                    }
                    TunePhase::Complete => {}
                }
            }
        }
        Ok(())
    }

    fn rate_p_bounds(&self, axis: Axis) -> Result<GainBounds<T>, ConfigError> {
        let bounds = self.bounds(axis, GainKind::RateP)?;
        if !self.allow_zero_rate_p && !(bounds.min > T::zero()) {
            return Err(ConfigError::ZeroRatePNotAllowed(axis));
        }
        Ok(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_gain_bounds_steps_are_clamped() {
        let bounds = GainBounds::new(0.001f32, 0.02, 0.05);
        assert!(value_close(0.00105, bounds.raise(0.001)));
        assert!(value_close(0.02, bounds.raise(0.0199)));
        assert!(value_close(0.001, bounds.lower(0.00101)));
        assert!(value_close(0.001, bounds.back_off(0.00104)));
        assert!(bounds.at_max(0.02));
        assert!(bounds.at_min(0.001));
    }

    #[test]
    fn test_gain_bounds_raise_from_zero() {
        let bounds = GainBounds::new(0.0f32, 0.6, 0.05);
        assert!(value_close(0.03, bounds.raise(0.0)));
    }

    #[test]
    fn test_gain_bounds_validity() {
        assert!(GainBounds::new(0.1f32, 1.0, 0.05).is_valid());
        assert!(!GainBounds::new(1.0f32, 0.1, 0.05).is_valid());
        assert!(!GainBounds::new(0.1f32, 1.0, 0.0).is_valid());
        assert!(!GainBounds::new(-0.1f32, 1.0, 0.05).is_valid());
    }

    #[test]
    fn test_sequence_validation() {
        assert_eq!(TuneSequence::new(&[]), Err(ConfigError::EmptySequence));
        assert_eq!(
            TuneSequence::new(&[TunePhase::RateDUp]),
            Err(ConfigError::SequenceNotTerminated)
        );
        assert_eq!(
            TuneSequence::new(&[TunePhase::RatePUp, TunePhase::RatePUp, TunePhase::Complete]),
            Err(ConfigError::DuplicatePhase(TunePhase::RatePUp))
        );
        let sequence = TuneSequence::new(&[TunePhase::AnglePUp, TunePhase::Complete]).unwrap();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.get(1), Some(TunePhase::Complete));
    }

    #[test]
    fn test_multirotor_has_no_yaw_rate_d() {
        let policy = FamilyPolicy::<f32>::multirotor();
        assert_eq!(
            policy.bounds(Axis::Yaw, GainKind::RateD),
            Err(ConfigError::UnsupportedGain {
                axis: Axis::Yaw,
                kind: GainKind::RateD
            })
        );
        assert!(!policy.phase_applies(Axis::Yaw, TunePhase::RateDUp));
        assert!(policy.phase_applies(Axis::Roll, TunePhase::RateDDown));
        assert!(policy.validate(&AxisOrder::all()).is_ok());
    }

    #[test]
    fn test_helicopter_skips_rate_d_down() {
        let policy = FamilyPolicy::<f32>::helicopter();
        assert!(!policy.phase_applies(Axis::Roll, TunePhase::RateDDown));
        assert!(policy.phase_applies(Axis::Roll, TunePhase::RateDUp));
        assert!(policy.validate(&AxisOrder::all()).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_gain() {
        let mut policy = FamilyPolicy::<f32>::multirotor();
        policy.bounds = policy.bounds.without(Axis::Pitch, GainKind::StabP);
        assert_eq!(
            policy.validate(&AxisOrder::all()),
            Err(ConfigError::UnsupportedGain {
                axis: Axis::Pitch,
                kind: GainKind::StabP
            })
        );
        // Roll alone does not need pitch bounds.
        assert!(policy.validate(&AxisOrder::new(&[Axis::Roll]).unwrap()).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_rate_p_minimum() {
        let mut policy = FamilyPolicy::<f32>::multirotor();
        policy.bounds = policy
            .bounds
            .with(Axis::Roll, GainKind::RateP, GainBounds::new(0.0, 1.0, 0.05));
        assert_eq!(
            policy.validate(&AxisOrder::all()),
            Err(ConfigError::ZeroRatePNotAllowed(Axis::Roll))
        );
        policy.allow_zero_rate_p = true;
        assert!(policy.validate(&AxisOrder::all()).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_criteria() {
        let mut policy = FamilyPolicy::<f32>::multirotor();
        policy.criteria.overshoot_limit = 1.0;
        assert_eq!(
            policy.validate(&AxisOrder::all()),
            Err(ConfigError::InvalidParameter("overshoot_limit"))
        );
    }
}
