// src/tuner.rs

//! # Tuning Session State Machine
//!
//! [`AutoTuner`] owns one tuning session: it walks the selected axes in
//! order, runs the family's phase sequence on each, feeds every finished
//! twitch to the matching search rule and applies the decision.
//!
//! The session is advanced by calling [`AutoTuner::tick`] once per control
//! cycle. Nothing blocks and nothing is allocated. The controller reads the
//! gains to fly from [`AutoTuner::gains`] and the setpoint of the tested
//! axis from the returned [`TickOutput`].
//!
//! ```text
//! Idle --begin--> Running --+--> Succeeded --save/reset--> Idle
//!                           +--> Aborted ------reset-----> Idle
//! ```
//!
//! Any abort restores the gains captured at `begin` before returning.

use crate::axis::{Axis, AxisOrder, PerAxis};
use crate::error::{AbortReason, ConfigError, TuneError};
use crate::gains::{GainKind, GainSet};
use crate::maneuver::{AttitudeSample, AxisCommand, AxisTestResult, Direction, ManeuverDriver, ManeuverStatus};
use crate::number::Number;
use crate::persist::{save_gains, ParamStore};
use crate::policy::{FamilyPolicy, TunePhase};
use crate::report::{Announcement, DetailSample, Severity, TuneEvent, TuneRecord, TuneReporter};
use crate::search::{self, Convergence, Decision, SearchProgress};
use core::fmt;

/// Lifecycle of a tuning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionStatus {
    /// No session.
    Idle,
    /// Twitching and adjusting gains.
    Running,
    /// Every selected axis was handled and at least one was tuned.
    Succeeded,
    /// Stopped early; the original gains are back in place.
    Aborted,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Running => "running",
            SessionStatus::Succeeded => "succeeded",
            SessionStatus::Aborted => "aborted",
        })
    }
}

/// Vehicle conditions checked when a session begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VehicleState {
    /// Motors armed.
    pub armed: bool,
    /// Airborne.
    pub flying: bool,
    /// Pilot sticks inside the deadband.
    pub sticks_centered: bool,
}

impl VehicleState {
    /// Armed, airborne, sticks centred.
    pub const fn ready() -> Self {
        Self {
            armed: true,
            flying: true,
            sticks_centered: true,
        }
    }
}

/// Inputs for one control tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInput<T> {
    /// Current attitude estimate.
    pub sample: AttitudeSample<T>,
    /// Seconds since the previous tick.
    pub dt: T,
    /// A pilot stick is outside the deadband.
    pub pilot_override: bool,
}

/// Result of one control tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput<T> {
    /// Session status after the tick.
    pub status: SessionStatus,
    /// Setpoint for the tested axis while the session runs.
    pub command: Option<AxisCommand<T>>,
}

/// Which gains to fly after a successful session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GainSelection {
    /// The gains in use before the session.
    Original,
    /// The tuned gains.
    #[default]
    Tuned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisOutcome {
    Pending,
    Complete,
    Failed,
}

/// In-flight autotune session.
#[derive(Debug, Clone)]
pub struct AutoTuner<'p, T: Number> {
    policy: &'p FamilyPolicy<T>,
    status: SessionStatus,
    abort_reason: Option<AbortReason>,
    last_failure: Option<AbortReason>,
    axes: AxisOrder,
    axis_pos: usize,
    phase_pos: usize,
    driver: ManeuverDriver<T>,
    direction: Direction,
    progress: SearchProgress,
    iteration: u16,
    angle_peak_accel: Option<T>,
    since_announce: T,
    gains: GainSet<T>,
    backup: GainSet<T>,
    outcome: PerAxis<AxisOutcome>,
    selection: GainSelection,
}

impl<'p, T: Number> AutoTuner<'p, T> {
    /// Creates an idle tuner for a family. Gain bounds are checked per axis
    /// selection in [`begin`](Self::begin).
    pub fn new(policy: &'p FamilyPolicy<T>) -> Result<Self, ConfigError> {
        policy.criteria.validate()?;
        policy.maneuver.validate()?;
        Ok(Self {
            policy,
            status: SessionStatus::Idle,
            abort_reason: None,
            last_failure: None,
            axes: AxisOrder::all(),
            axis_pos: 0,
            phase_pos: 0,
            driver: ManeuverDriver::new(policy.maneuver, policy.criteria.aggressiveness),
            direction: Direction::Positive,
            progress: SearchProgress::default(),
            iteration: 0,
            angle_peak_accel: None,
            since_announce: T::zero(),
            gains: GainSet::default(),
            backup: GainSet::default(),
            outcome: PerAxis::splat(AxisOutcome::Pending),
            selection: GainSelection::Tuned,
        })
    }

    /// Starts a session on `axes`, tuning from `current` gains.
    ///
    /// `current` is kept as the backup that every abort restores. Bounded
    /// gains of the selected axes are clamped into the family's range before
    /// the first twitch.
    pub fn begin<R>(
        &mut self,
        axes: AxisOrder,
        current: GainSet<T>,
        vehicle: VehicleState,
        reporter: &mut R,
    ) -> Result<(), TuneError>
    where
        R: TuneReporter<T> + ?Sized,
    {
        if self.status != SessionStatus::Idle {
            return Err(TuneError::NotIdle(self.status));
        }
        if !vehicle.armed {
            return Err(TuneError::NotArmed);
        }
        if !vehicle.flying {
            return Err(TuneError::NotFlying);
        }
        if !vehicle.sticks_centered {
            return Err(TuneError::SticksNotCentered);
        }
        self.policy.validate(&axes)?;

        self.clear();
        self.axes = axes;
        self.backup = current;
        self.gains = current;
        for axis in axes.iter() {
            for kind in GainKind::ALL {
                if let Some(bounds) = self.policy.bounds.get(axis, kind) {
                    let gains = &mut self.gains[axis];
                    gains.set(kind, bounds.clamp(gains.get(kind)));
                }
            }
        }
        self.status = SessionStatus::Running;
        info!("autotune: started on {} axes", axes.len() as u8);
        self.announce(reporter, Severity::Notice, None, None, TuneEvent::Started);
        self.enter_phase(reporter);
        Ok(())
    }

    /// Advances the session by one control tick.
    pub fn tick<R>(&mut self, input: &TickInput<T>, reporter: &mut R) -> TickOutput<T>
    where
        R: TuneReporter<T> + ?Sized,
    {
        if self.status != SessionStatus::Running {
            return self.output(None);
        }
        if input.pilot_override {
            self.abort(AbortReason::PilotOverride, reporter);
            return self.output(None);
        }
        if input.dt > T::zero() {
            self.since_announce = self.since_announce + input.dt;
        }

        let was_twitching = self.driver.is_twitching();
        match self.driver.step(&input.sample, input.dt) {
            ManeuverStatus::InProgress(command) => {
                if let (true, Some((lean, rate))) = (was_twitching, self.driver.last_response()) {
                    reporter.log_detail(&DetailSample {
                        angle_cd: lean,
                        rate_cds: rate * T::lit(100.0),
                    });
                }
                if self.since_announce >= self.policy.announce_interval {
                    self.since_announce = T::zero();
                    self.announce_progress(reporter);
                }
                self.output(Some(command))
            }
            ManeuverStatus::Abort(axis) => {
                self.abort(AbortReason::Divergence(axis), reporter);
                self.output(None)
            }
            ManeuverStatus::StepTooLarge(axis) => {
                self.abort(AbortReason::StepSizeFailed(axis), reporter);
                self.output(None)
            }
            ManeuverStatus::Done(result) => {
                self.finish_test(&result, reporter);
                if self.status == SessionStatus::Running {
                    self.output(Some(self.driver.command()))
                } else {
                    self.output(None)
                }
            }
        }
    }

    /// Aborts a running session and restores the original gains.
    pub fn cancel<R>(&mut self, reporter: &mut R)
    where
        R: TuneReporter<T> + ?Sized,
    {
        if self.status == SessionStatus::Running {
            self.abort(AbortReason::Cancelled, reporter);
        }
    }

    /// Handles a disarm: a running session is aborted, a succeeded one is
    /// saved. The tuner is then idle. If saving fails the session is kept
    /// so the save can be retried.
    pub fn on_disarm<S, R>(&mut self, store: &mut S, reporter: &mut R) -> Result<(), TuneError>
    where
        S: ParamStore<T> + ?Sized,
        R: TuneReporter<T> + ?Sized,
    {
        match self.status {
            SessionStatus::Running => self.abort(AbortReason::Disarmed, reporter),
            SessionStatus::Succeeded => {
                self.save(store)?;
                self.announce(reporter, Severity::Notice, None, None, TuneEvent::Saved);
                for axis in self.axes.iter() {
                    if self.outcome[axis] == AxisOutcome::Complete {
                        self.backup[axis] = self.gains[axis];
                    }
                }
            }
            SessionStatus::Idle | SessionStatus::Aborted => {}
        }
        self.reset();
        Ok(())
    }

    /// Writes the tuned gains of every completed axis. Axes that failed or
    /// were not selected are left untouched. Saving twice writes the same
    /// values twice.
    pub fn save<S>(&self, store: &mut S) -> Result<(), TuneError>
    where
        S: ParamStore<T> + ?Sized,
    {
        if self.status != SessionStatus::Succeeded {
            return Err(TuneError::NotSucceeded(self.status));
        }
        for axis in self.axes.iter() {
            if self.outcome[axis] == AxisOutcome::Complete {
                save_gains(store, axis, &self.gains[axis])?;
            }
        }
        Ok(())
    }

    /// Chooses between original and tuned gains after a successful session.
    pub fn select_gains(&mut self, selection: GainSelection) -> Result<(), TuneError> {
        if self.status != SessionStatus::Succeeded {
            return Err(TuneError::NotSucceeded(self.status));
        }
        self.selection = selection;
        Ok(())
    }

    /// Returns to idle. Unsaved tuned gains are discarded and the original
    /// gains are flown again.
    pub fn reset(&mut self) {
        self.clear();
        self.gains = self.backup;
        self.status = SessionStatus::Idle;
    }

    /// Session status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Why the last session aborted.
    pub fn abort_reason(&self) -> Option<AbortReason> {
        self.abort_reason
    }

    /// Axis being tuned.
    pub fn active_axis(&self) -> Option<Axis> {
        if self.status != SessionStatus::Running {
            return None;
        }
        self.axes.get(self.axis_pos)
    }

    /// Phase being run.
    pub fn active_phase(&self) -> Option<TunePhase> {
        self.active_axis()?;
        self.policy.sequence.get(self.phase_pos)
    }

    /// Twitches completed in the current phase.
    pub fn iteration(&self) -> u16 {
        self.iteration
    }

    /// True once `axis` finished its sequence in this session.
    pub fn is_axis_tuned(&self, axis: Axis) -> bool {
        self.outcome[axis] == AxisOutcome::Complete
    }

    /// Gains the controller should fly right now.
    pub fn gains(&self) -> &GainSet<T> {
        if self.status == SessionStatus::Succeeded && self.selection == GainSelection::Original {
            &self.backup
        } else {
            &self.gains
        }
    }

    /// Gains captured when the session began.
    pub fn backup(&self) -> &GainSet<T> {
        &self.backup
    }

    fn clear(&mut self) {
        self.driver.stop();
        self.abort_reason = None;
        self.last_failure = None;
        self.axis_pos = 0;
        self.phase_pos = 0;
        self.direction = Direction::Positive;
        self.progress = SearchProgress::default();
        self.iteration = 0;
        self.angle_peak_accel = None;
        self.since_announce = T::zero();
        self.outcome = PerAxis::splat(AxisOutcome::Pending);
        self.selection = GainSelection::Tuned;
    }

    fn output(&self, command: Option<AxisCommand<T>>) -> TickOutput<T> {
        TickOutput {
            status: self.status,
            command,
        }
    }

    /// Moves forward to the next phase that runs, finishing axes and the
    /// session on the way.
    fn enter_phase<R>(&mut self, reporter: &mut R)
    where
        R: TuneReporter<T> + ?Sized,
    {
        loop {
            let Some(axis) = self.axes.get(self.axis_pos) else {
                self.finish_session(reporter);
                return;
            };
            let phase = self
                .policy
                .sequence
                .get(self.phase_pos)
                .unwrap_or(TunePhase::Complete);
            if phase == TunePhase::Complete {
                self.complete_axis(axis, reporter);
                self.next_axis();
                continue;
            }
            if !self.policy.phase_applies(axis, phase) {
                self.announce(reporter, Severity::Info, Some(axis), Some(phase), TuneEvent::PhaseSkipped);
                self.phase_pos += 1;
                continue;
            }
            self.progress = SearchProgress::default();
            self.iteration = 0;
            self.since_announce = T::zero();
            self.load_test_gains(axis);
            self.driver.start(axis, phase, self.direction);
            debug!("autotune: {} phase {}", axis, phase.id());
            self.announce(reporter, Severity::Notice, Some(axis), Some(phase), TuneEvent::PhaseStarted);
            return;
        }
    }

    fn next_axis(&mut self) {
        self.axis_pos += 1;
        self.phase_pos = 0;
        self.angle_peak_accel = None;
    }

    fn load_test_gains(&mut self, axis: Axis) {
        let gains = &mut self.gains[axis];
        gains.rate_i = gains.rate_p * self.policy.finalisation.pi_ratio_for_testing;
    }

    /// Applies backoffs and the final I and acceleration settings.
    fn complete_axis<R>(&mut self, axis: Axis, reporter: &mut R)
    where
        R: TuneReporter<T> + ?Sized,
    {
        let policy = self.policy;
        let finalisation = &policy.finalisation;
        let backup = self.backup[axis];
        let tunes_rate = self.runs_any(axis, TunePhase::is_rate_test);
        let tunes_angle = self.runs_any(axis, TunePhase::is_angle_test);
        let backoff = |kind: GainKind, value: T, factor: T| match policy.bounds.get(axis, kind) {
            Some(bounds) => bounds.clamp(value * factor),
            None => value,
        };

        let mut gains = self.gains[axis];
        if tunes_rate {
            gains.rate_p = backoff(GainKind::RateP, gains.rate_p, finalisation.rate_p_backoff);
            if policy.couples_rate_d(axis) {
                gains.rate_d = backoff(GainKind::RateD, gains.rate_d, finalisation.rate_d_backoff);
            }
        }
        if tunes_angle {
            gains.stab_p = backoff(GainKind::StabP, gains.stab_p, finalisation.stab_p_backoff);
        }
        gains.rate_i = match axis {
            Axis::Yaw => gains.rate_p * finalisation.yaw_pi_ratio_final,
            _ => backup.rate_i.max(gains.rate_p * finalisation.pi_ratio_final),
        };
        gains.accel_max = match self.angle_peak_accel {
            // Measured in deg/s/s, stored in centidegrees/s/s.
            Some(peak) => (peak * T::lit(100.0)).max(finalisation.accel_max_floor[axis]),
            None => backup.accel_max,
        };
        self.gains[axis] = gains;
        self.outcome[axis] = AxisOutcome::Complete;
        info!("autotune: {} complete", axis);
        self.announce(reporter, Severity::Notice, Some(axis), None, TuneEvent::AxisComplete(gains));
    }

    fn runs_any(&self, axis: Axis, test: fn(TunePhase) -> bool) -> bool {
        self.policy
            .sequence
            .as_slice()
            .iter()
            .any(|&phase| test(phase) && self.policy.phase_applies(axis, phase))
    }

    fn finish_session<R>(&mut self, reporter: &mut R)
    where
        R: TuneReporter<T> + ?Sized,
    {
        let any_tuned = self
            .axes
            .iter()
            .any(|axis| self.outcome[axis] == AxisOutcome::Complete);
        if !any_tuned {
            let reason = self.last_failure.unwrap_or(AbortReason::Cancelled);
            self.abort(reason, reporter);
            return;
        }
        self.driver.stop();
        self.status = SessionStatus::Succeeded;
        info!("autotune: success");
        self.announce(reporter, Severity::Notice, None, None, TuneEvent::Succeeded);
    }

    /// Routes a finished twitch to the phase's search rule and applies the
    /// decision. Writes exactly one test record.
    fn finish_test<R>(&mut self, result: &AxisTestResult<T>, reporter: &mut R)
    where
        R: TuneReporter<T> + ?Sized,
    {
        let (Some(axis), Some(phase)) = (self.active_axis(), self.active_phase()) else {
            return;
        };
        self.direction = self.direction.reversed();
        if phase == TunePhase::AnglePUp {
            let peak = self.angle_peak_accel.unwrap_or_else(T::zero);
            self.angle_peak_accel = Some(peak.max(result.peak_accel));
        }

        let mut decision = self.update_gains(axis, phase, result);
        self.iteration = self.iteration.saturating_add(1);
        if decision == Decision::Repeat && self.iteration >= self.policy.criteria.max_iterations {
            warn!("autotune: {} iteration limit", axis);
            decision = match phase {
                TunePhase::RateDUp | TunePhase::RateDDown | TunePhase::AnglePDown => {
                    Decision::Advance(Convergence::AtLimit)
                }
                _ => Decision::Abort,
            };
        }

        let gains = self.gains[axis];
        let d_step = match self.policy.bounds.get(axis, GainKind::RateD) {
            Some(bounds) if self.policy.couples_rate_d(axis) => gains.rate_d * bounds.step_ratio,
            _ => T::zero(),
        };
        reporter.log_test(&TuneRecord {
            axis_id: axis.id(),
            phase_id: phase.id(),
            target: result.target,
            measured_min: result.measured_min,
            measured_max: result.measured_max,
            new_rate_p: gains.rate_p,
            new_rate_d: gains.rate_d,
            new_stab_p: gains.stab_p,
            new_rate_d_step: d_step,
        });

        match decision {
            Decision::Repeat => {
                self.load_test_gains(axis);
                self.driver.start(axis, phase, self.direction);
            }
            Decision::Advance(convergence) => {
                if convergence == Convergence::AtLimit {
                    self.announce(reporter, Severity::Warning, Some(axis), Some(phase), TuneEvent::ReachedLimit);
                }
                self.phase_pos += 1;
                self.enter_phase(reporter);
            }
            Decision::Abort => self.fail_axis(axis, phase, reporter),
        }
    }

    fn update_gains(&mut self, axis: Axis, phase: TunePhase, result: &AxisTestResult<T>) -> Decision {
        let policy = self.policy;
        let bounds = &policy.bounds;
        let criteria = &policy.criteria;
        let gains = &mut self.gains[axis];
        let progress = &mut self.progress;
        let p = bounds.get(axis, GainKind::RateP);
        let d = bounds.get(axis, GainKind::RateD);
        let stab = bounds.get(axis, GainKind::StabP);
        match (phase, p, d, stab) {
            (TunePhase::RateDUp, Some(p), Some(d), _) => {
                search::rate_d_up(gains, &p, &d, criteria, result, progress)
            }
            (TunePhase::RateDDown, Some(p), Some(d), _) => {
                search::rate_d_down(gains, &p, &d, criteria, result, progress)
            }
            (TunePhase::RatePUp, Some(p), d, _) => {
                let d = d.filter(|_| policy.couples_rate_d(axis));
                search::rate_p_up(gains, &p, d.as_ref(), criteria, result, progress)
            }
            (TunePhase::AnglePDown, _, _, Some(stab)) => {
                search::angle_p_down(gains, &stab, criteria, result, progress)
            }
            (TunePhase::AnglePUp, _, _, Some(stab)) => {
                search::angle_p_up(gains, &stab, criteria, result, progress)
            }
            // Bounds are checked at begin, so only Complete lands here.
            _ => Decision::Abort,
        }
    }

    fn fail_axis<R>(&mut self, axis: Axis, phase: TunePhase, reporter: &mut R)
    where
        R: TuneReporter<T> + ?Sized,
    {
        let reason = AbortReason::ConvergenceFailure { axis, phase };
        if !self.policy.continue_after_axis_failure {
            self.abort(reason, reporter);
            return;
        }
        warn!("autotune: {} failed, keeping original gains", axis);
        self.gains[axis] = self.backup[axis];
        self.outcome[axis] = AxisOutcome::Failed;
        self.last_failure = Some(reason);
        self.announce(reporter, Severity::Warning, Some(axis), Some(phase), TuneEvent::AxisFailed);
        self.next_axis();
        self.enter_phase(reporter);
    }

    fn abort<R>(&mut self, reason: AbortReason, reporter: &mut R)
    where
        R: TuneReporter<T> + ?Sized,
    {
        let axis = self.active_axis();
        let phase = self.active_phase();
        self.driver.stop();
        self.gains = self.backup;
        self.status = SessionStatus::Aborted;
        self.abort_reason = Some(reason);
        let severity = match reason {
            AbortReason::Divergence(_) => Severity::Critical,
            AbortReason::PilotOverride => Severity::Info,
            AbortReason::ConvergenceFailure { .. } | AbortReason::StepSizeFailed(_) => {
                Severity::Warning
            }
            AbortReason::Cancelled | AbortReason::Disarmed => Severity::Notice,
        };
        error!("autotune: aborted, {}", reason);
        self.announce(reporter, severity, axis, phase, TuneEvent::Aborted(reason));
    }

    fn announce_progress<R>(&mut self, reporter: &mut R)
    where
        R: TuneReporter<T> + ?Sized,
    {
        let (Some(axis), Some(phase)) = (self.active_axis(), self.active_phase()) else {
            return;
        };
        let event = TuneEvent::Progress {
            iteration: self.iteration,
            gains: self.gains[axis],
        };
        self.announce(reporter, Severity::Info, Some(axis), Some(phase), event);
    }

    fn announce<R>(
        &self,
        reporter: &mut R,
        severity: Severity,
        axis: Option<Axis>,
        phase: Option<TunePhase>,
        event: TuneEvent<T>,
    ) where
        R: TuneReporter<T> + ?Sized,
    {
        reporter.announce(&Announcement {
            severity,
            axis,
            phase,
            event,
        });
    }
}
