// src/error.rs

//! Error and abort taxonomy for the tuning engine.
//!
//! None of these ever cross into the control loop as a panic. Configuration
//! and session-control errors are returned from the call that caused them,
//! in-flight failures end the session with an [`AbortReason`].

use crate::axis::Axis;
use crate::gains::GainKind;
use crate::policy::TunePhase;
use crate::tuner::SessionStatus;
use core::fmt;

/// A policy or request that can never be tuned. Fatal at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The bounds table has no entry for a gain the sequence needs.
    UnsupportedGain {
        /// Axis being looked up.
        axis: Axis,
        /// Gain being looked up.
        kind: GainKind,
    },
    /// A bounds entry is inverted, negative, or has an unusable step ratio.
    InvalidBounds {
        /// Axis of the bad entry.
        axis: Axis,
        /// Gain of the bad entry.
        kind: GainKind,
    },
    /// The family forbids zero rate P but its minimum allows it.
    ZeroRatePNotAllowed(Axis),
    /// The tune sequence has no phases.
    EmptySequence,
    /// The tune sequence is longer than the phase list.
    SequenceTooLong,
    /// The tune sequence does not finish with `Complete`.
    SequenceNotTerminated,
    /// A phase appears more than once.
    DuplicatePhase(TunePhase),
    /// No axes were selected.
    NoAxes,
    /// An axis was selected twice.
    DuplicateAxis(Axis),
    /// A search criterion or maneuver limit is out of range.
    InvalidParameter(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedGain { axis, kind } => {
                write!(f, "no bounds for {} {}", axis, kind)
            }
            ConfigError::InvalidBounds { axis, kind } => {
                write!(f, "invalid bounds for {} {}", axis, kind)
            }
            ConfigError::ZeroRatePNotAllowed(axis) => {
                write!(f, "{} rate P minimum must be above zero", axis)
            }
            ConfigError::EmptySequence => f.write_str("tune sequence is empty"),
            ConfigError::SequenceTooLong => f.write_str("tune sequence is too long"),
            ConfigError::SequenceNotTerminated => {
                f.write_str("tune sequence must end with Complete")
            }
            ConfigError::DuplicatePhase(phase) => write!(f, "phase {} repeated", phase),
            ConfigError::NoAxes => f.write_str("no axes selected"),
            ConfigError::DuplicateAxis(axis) => write!(f, "axis {} selected twice", axis),
            ConfigError::InvalidParameter(name) => write!(f, "invalid parameter {}", name),
        }
    }
}

/// Failure reported by a parameter store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// The store refused the key or value.
    Rejected,
    /// The backing storage could not be written.
    WriteFailed,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Rejected => f.write_str("parameter rejected"),
            StoreError::WriteFailed => f.write_str("parameter write failed"),
        }
    }
}

/// Error returned by the session control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TuneError {
    /// The policy or axis selection cannot be tuned.
    Config(ConfigError),
    /// `begin` requires an idle tuner.
    NotIdle(SessionStatus),
    /// The vehicle is not armed.
    NotArmed,
    /// The vehicle is not airborne.
    NotFlying,
    /// The pilot sticks are outside the deadband.
    SticksNotCentered,
    /// Gains can only be saved or compared after a successful session.
    NotSucceeded(SessionStatus),
    /// The parameter store failed.
    Store(StoreError),
}

impl fmt::Display for TuneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuneError::Config(err) => write!(f, "configuration error: {}", err),
            TuneError::NotIdle(status) => write!(f, "autotune already {}", status),
            TuneError::NotArmed => f.write_str("vehicle not armed"),
            TuneError::NotFlying => f.write_str("vehicle not flying"),
            TuneError::SticksNotCentered => f.write_str("pilot sticks not centered"),
            TuneError::NotSucceeded(status) => write!(f, "autotune {}, nothing to save", status),
            TuneError::Store(err) => write!(f, "save failed: {}", err),
        }
    }
}

impl From<ConfigError> for TuneError {
    fn from(err: ConfigError) -> Self {
        TuneError::Config(err)
    }
}

impl From<StoreError> for TuneError {
    fn from(err: StoreError) -> Self {
        TuneError::Store(err)
    }
}

/// Why a running session stopped without success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AbortReason {
    /// The measured response passed the hard safety ceiling.
    Divergence(Axis),
    /// The axis ran out of lean angle before finishing a twitch, even at the
    /// smallest step size.
    StepSizeFailed(Axis),
    /// The pilot moved a stick outside the deadband.
    PilotOverride,
    /// A gain reached its bound without meeting the phase criterion.
    ConvergenceFailure {
        /// Axis that failed.
        axis: Axis,
        /// Phase that failed.
        phase: TunePhase,
    },
    /// The session was cancelled by the operator.
    Cancelled,
    /// The vehicle was disarmed mid-session.
    Disarmed,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Divergence(axis) => write!(f, "{} response diverged", axis),
            AbortReason::StepSizeFailed(axis) => {
                write!(f, "{} twitch size determination failed", axis)
            }
            AbortReason::PilotOverride => f.write_str("pilot override"),
            AbortReason::ConvergenceFailure { axis, phase } => {
                write!(f, "{} {} failed to converge", axis, phase)
            }
            AbortReason::Cancelled => f.write_str("cancelled"),
            AbortReason::Disarmed => f.write_str("disarmed"),
        }
    }
}
