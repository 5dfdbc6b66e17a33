// src/report.rs

//! # Ground Station Reporting
//!
//! The tuner never formats text or writes logs itself. Everything a ground
//! station or flight log needs is handed to a [`TuneReporter`]:
//!
//! - [`Announcement`]: a short operator message with a severity, rendered by
//!   its `Display` impl without allocating.
//! - [`TuneRecord`]: one structured record per completed twitch.
//! - [`DetailSample`]: one raw response sample per twitch tick, for plotting.

use crate::axis::Axis;
use crate::error::AbortReason;
use crate::gains::AxisGains;
use crate::number::Number;
use crate::policy::TunePhase;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Importance of an announcement, mapped onto ground station severities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Severity {
    /// Routine progress.
    Info,
    /// Phase and axis transitions.
    Notice,
    /// Degraded results and convergence failures.
    Warning,
    /// Safety aborts.
    Critical,
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TuneEvent<T> {
    /// A session began.
    Started,
    /// A phase began on the axis.
    PhaseStarted,
    /// A phase does not apply to this axis and family.
    PhaseSkipped,
    /// A phase ended with its gain at a bound.
    ReachedLimit,
    /// Periodic progress while twitching.
    Progress {
        /// Twitches completed in the phase.
        iteration: u16,
        /// Gains currently under test.
        gains: AxisGains<T>,
    },
    /// The axis finished its sequence with these final gains.
    AxisComplete(AxisGains<T>),
    /// The axis failed and was restored to its original gains.
    AxisFailed,
    /// Every selected axis has been handled.
    Succeeded,
    /// The session stopped and the original gains were restored.
    Aborted(AbortReason),
    /// Tuned gains were written to the parameter store.
    Saved,
}

/// One operator message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Announcement<T> {
    /// How important the message is.
    pub severity: Severity,
    /// Axis the message refers to.
    pub axis: Option<Axis>,
    /// Phase the message refers to.
    pub phase: Option<TunePhase>,
    /// The event.
    pub event: TuneEvent<T>,
}

impl<T: Number> fmt::Display for Announcement<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AutoTune:")?;
        if let Some(axis) = self.axis {
            write!(f, " {}", axis)?;
        }
        if let Some(phase) = self.phase {
            write!(f, " {}", phase)?;
        }
        if self.axis.is_some() || self.phase.is_some() {
            f.write_str(":")?;
        }
        match &self.event {
            TuneEvent::Started => f.write_str(" started"),
            TuneEvent::PhaseStarted => f.write_str(" started"),
            TuneEvent::PhaseSkipped => f.write_str(" skipped"),
            TuneEvent::ReachedLimit => f.write_str(" reached limit"),
            TuneEvent::Progress { iteration, gains } => write!(f, " ({}) {}", iteration, gains),
            TuneEvent::AxisComplete(gains) => write!(f, " complete {}", gains),
            TuneEvent::AxisFailed => f.write_str(" failed, original gains kept"),
            TuneEvent::Succeeded => f.write_str(" success"),
            TuneEvent::Aborted(reason) => write!(f, " aborted, {}", reason),
            TuneEvent::Saved => f.write_str(" gains saved"),
        }
    }
}

/// Structured result of one twitch, written after the gain update.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct TuneRecord<T> {
    /// [`Axis::id`] of the tested axis.
    pub axis_id: u8,
    /// [`TunePhase::id`] of the phase.
    pub phase_id: u8,
    /// Commanded step size.
    pub target: T,
    /// Lowest response after the peak.
    pub measured_min: T,
    /// Peak response.
    pub measured_max: T,
    /// Rate P after the update.
    pub new_rate_p: T,
    /// Rate D after the update.
    pub new_rate_d: T,
    /// Angle P after the update.
    pub new_stab_p: T,
    /// Size of the next rate D step, zero where D is not tuned.
    pub new_rate_d_step: T,
}

/// Raw response of the twitching axis for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct DetailSample<T> {
    /// Normalised angle response, centidegrees.
    pub angle_cd: T,
    /// Normalised rate response, centidegrees per second.
    pub rate_cds: T,
}

/// Sink for announcements and log records.
pub trait TuneReporter<T> {
    /// Delivers an operator message.
    fn announce(&mut self, announcement: &Announcement<T>);

    /// Writes the record of one completed twitch.
    fn log_test(&mut self, record: &TuneRecord<T>);

    /// Writes one raw response sample. Ignored by default.
    fn log_detail(&mut self, _sample: &DetailSample<T>) {}
}

/// Reporter that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl<T> TuneReporter<T> for NullReporter {
    fn announce(&mut self, _announcement: &Announcement<T>) {}

    fn log_test(&mut self, _record: &TuneRecord<T>) {}
}
