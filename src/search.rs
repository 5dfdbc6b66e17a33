// src/search.rs

//! # Gain Search Rules
//!
//! One update rule per tuning phase. Each rule looks at a single twitch
//! result, adjusts the gains of the axis under test by one multiplicative
//! step, and decides whether the phase repeats, advances, or has failed.
//!
//! Every comparison against a threshold is strict in the direction of
//! success: a measurement sitting exactly on a threshold has *not* met it,
//! so the search takes another step rather than converging early.
//!
//! All gain changes go through [`GainBounds`], so the tested values never
//! leave the family's search range.

use crate::gains::AxisGains;
use crate::maneuver::AxisTestResult;
use crate::number::Number;
use crate::policy::{Criteria, GainBounds};

/// How a phase finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Convergence {
    /// The phase criterion was met.
    Met,
    /// The gain hit its bound first; the bound is kept as the best effort.
    AtLimit,
}

/// What the tuner does after a twitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Decision {
    /// Twitch again with the updated gains.
    Repeat,
    /// Move to the next phase.
    Advance(Convergence),
    /// The phase cannot succeed.
    Abort,
}

/// Consecutive successes seen in the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchProgress {
    /// Number of back-to-back tests that met the phase criterion.
    pub successes: u8,
}

impl SearchProgress {
    /// Counts a success and returns true once `required` is reached.
    fn succeed(&mut self, required: u8) -> bool {
        self.successes = self.successes.saturating_add(1);
        self.successes >= required
    }

    fn miss(&mut self) {
        self.successes = 0;
    }
}

impl<T: Number> Criteria<T> {
    /// Bounce-back after the peak is larger than the aggressiveness threshold.
    pub fn bounce_back(&self, result: &AxisTestResult<T>) -> bool {
        result.measured_max - result.measured_min > result.measured_max * self.aggressiveness
    }

    /// Peak is far enough past the target that P must come down.
    pub fn excessive_overshoot(&self, result: &AxisTestResult<T>) -> bool {
        result.measured_max > result.target * self.overshoot_limit
    }

    /// Peak is too far below the target to judge bounce-back.
    pub fn too_weak(&self, result: &AxisTestResult<T>) -> bool {
        result.measured_max <= result.target * (T::one() - self.d_up_down_margin)
    }

    /// Peak passed the target.
    pub fn reached(&self, result: &AxisTestResult<T>) -> bool {
        result.measured_max > result.target
    }
}

/// Rate D up: raise D until a little bounce-back shows, trimming P so the
/// peak stays between the weak-response margin and the overshoot limit.
///
/// Advances with D rolled back one step once bounce-back is seen on
/// `success_count` consecutive twitches, or at the D maximum.
pub fn rate_d_up<T: Number>(
    gains: &mut AxisGains<T>,
    p: &GainBounds<T>,
    d: &GainBounds<T>,
    criteria: &Criteria<T>,
    result: &AxisTestResult<T>,
    progress: &mut SearchProgress,
) -> Decision {
    if let Some(decision) = trim_rate_p(gains, p, d, criteria, result, progress) {
        return decision;
    }
    if criteria.reached(result) || criteria.bounce_back(result) {
        if progress.succeed(criteria.success_count) {
            gains.rate_d = d.back_off(gains.rate_d);
            return Decision::Advance(Convergence::Met);
        }
        return Decision::Repeat;
    }
    progress.miss();
    gains.rate_d = d.raise(gains.rate_d);
    if d.at_max(gains.rate_d) {
        warn!("autotune: rate D reached its maximum");
        return Decision::Advance(Convergence::AtLimit);
    }
    Decision::Repeat
}

/// Rate D down: lower D until the bounce-back is gone, with the same P
/// trimming as rate D up. A peak past the target lowers P instead of D.
pub fn rate_d_down<T: Number>(
    gains: &mut AxisGains<T>,
    p: &GainBounds<T>,
    d: &GainBounds<T>,
    criteria: &Criteria<T>,
    result: &AxisTestResult<T>,
    progress: &mut SearchProgress,
) -> Decision {
    if let Some(decision) = trim_rate_p(gains, p, d, criteria, result, progress) {
        return decision;
    }
    // Past the target: bring P down before judging D.
    if criteria.reached(result) && !p.at_min(gains.rate_p) {
        progress.miss();
        gains.rate_p = p.lower(gains.rate_p);
        return Decision::Repeat;
    }
    let clean =
        result.measured_max - result.measured_min < result.measured_max * criteria.aggressiveness;
    if clean {
        if progress.succeed(criteria.success_count) {
            return Decision::Advance(Convergence::Met);
        }
        return Decision::Repeat;
    }
    progress.miss();
    gains.rate_d = d.lower(gains.rate_d);
    if d.at_min(gains.rate_d) {
        warn!("autotune: rate D reached its minimum");
        return Decision::Advance(Convergence::AtLimit);
    }
    Decision::Repeat
}

/// Shared P adjustment of the rate D phases. Returns a decision when the
/// twitch was unusable for judging D.
fn trim_rate_p<T: Number>(
    gains: &mut AxisGains<T>,
    p: &GainBounds<T>,
    d: &GainBounds<T>,
    criteria: &Criteria<T>,
    result: &AxisTestResult<T>,
    progress: &mut SearchProgress,
) -> Option<Decision> {
    if criteria.excessive_overshoot(result) {
        progress.miss();
        if !p.at_min(gains.rate_p) {
            gains.rate_p = p.lower(gains.rate_p);
            return Some(Decision::Repeat);
        }
        // P is on the floor, only less D can bring the peak down.
        gains.rate_d = d.lower(gains.rate_d);
        if d.at_min(gains.rate_d) {
            warn!("autotune: rate P and D reached their minimum");
            return Some(Decision::Advance(Convergence::AtLimit));
        }
        return Some(Decision::Repeat);
    }
    if criteria.too_weak(result) && !p.at_max(gains.rate_p) {
        progress.miss();
        gains.rate_p = p.raise(gains.rate_p);
        return Some(Decision::Repeat);
    }
    None
}

/// Rate P up: raise P until the rate target is reached on `success_count`
/// consecutive twitches. Bounce-back near the target lowers D first (down
/// to its minimum). Fails when P is already at its maximum and the target
/// is still not reached.
///
/// `d` is `None` on axes where rate D is not tuned.
pub fn rate_p_up<T: Number>(
    gains: &mut AxisGains<T>,
    p: &GainBounds<T>,
    d: Option<&GainBounds<T>>,
    criteria: &Criteria<T>,
    result: &AxisTestResult<T>,
    progress: &mut SearchProgress,
) -> Decision {
    if let Some(d) = d {
        let near_target = !criteria.too_weak(result);
        if near_target && criteria.bounce_back(result) && !d.at_min(gains.rate_d) {
            progress.miss();
            gains.rate_d = d.lower(gains.rate_d);
            return Decision::Repeat;
        }
    }
    if criteria.reached(result) {
        if progress.succeed(criteria.success_count) {
            return Decision::Advance(Convergence::Met);
        }
        return Decision::Repeat;
    }
    progress.miss();
    if p.at_max(gains.rate_p) {
        return Decision::Abort;
    }
    gains.rate_p = p.raise(gains.rate_p);
    Decision::Repeat
}

/// Angle P down: lower angle P until the angle target is reliably missed
/// within the twitch time. At the floor the minimum is used as the
/// reference.
pub fn angle_p_down<T: Number>(
    gains: &mut AxisGains<T>,
    stab: &GainBounds<T>,
    criteria: &Criteria<T>,
    result: &AxisTestResult<T>,
    progress: &mut SearchProgress,
) -> Decision {
    if result.measured_max < result.target {
        if progress.succeed(criteria.success_count) {
            return Decision::Advance(Convergence::Met);
        }
        return Decision::Repeat;
    }
    progress.miss();
    gains.stab_p = stab.lower(gains.stab_p);
    if stab.at_min(gains.stab_p) {
        return Decision::Advance(Convergence::AtLimit);
    }
    Decision::Repeat
}

/// Angle P up: raise angle P until the angle target is reached on
/// `success_count` consecutive twitches. Fails when angle P is already at
/// its maximum and the target is still missed.
pub fn angle_p_up<T: Number>(
    gains: &mut AxisGains<T>,
    stab: &GainBounds<T>,
    criteria: &Criteria<T>,
    result: &AxisTestResult<T>,
    progress: &mut SearchProgress,
) -> Decision {
    if criteria.reached(result) {
        if progress.succeed(criteria.success_count) {
            return Decision::Advance(Convergence::Met);
        }
        return Decision::Repeat;
    }
    progress.miss();
    if stab.at_max(gains.stab_p) {
        return Decision::Abort;
    }
    gains.stab_p = stab.raise(gains.stab_p);
    Decision::Repeat
}
