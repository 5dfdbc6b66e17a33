// src/lib.rs

//! # In-Flight Attitude Autotune
//!
//! A `no_std`, no-alloc engine that tunes the attitude controller gains of
//! a flying vehicle. It applies short step inputs ("twitches") one axis at a
//! time, measures the response, and adjusts rate D, rate P and angle P with
//! bounded multiplicative steps until each phase's criterion is met.
//!
//! - [`policy`]: per family phase sequence, gain bounds and thresholds.
//! - [`maneuver`]: the twitch driver, one control tick at a time.
//! - [`search`]: the gain update rule of each phase.
//! - [`tuner`]: the session state machine tying them together.
//! - [`report`] and [`persist`]: reporting and saving through injected traits.
//! - [`controller`]: a reference `piddiy` attitude controller to fly with.
//!
//! The tuner never owns the controller. Each tick the caller passes in the
//! attitude estimate, flies the returned setpoint with
//! [`AutoTuner::gains`](tuner::AutoTuner::gains), and decides when to save.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

#[macro_use]
mod fmt;

pub mod axis;
pub mod controller;
pub mod error;
pub mod gains;
pub mod maneuver;
pub mod number;
pub mod persist;
pub mod pid;
pub mod policy;
pub mod report;
pub mod search;
pub mod tuner;

#[doc(inline)]
pub use axis::{Axis, AxisOrder, PerAxis};
#[doc(inline)]
pub use error::{AbortReason, ConfigError, StoreError, TuneError};
#[doc(inline)]
pub use gains::{AxisGains, GainKind, GainSet};
#[doc(inline)]
pub use number::Number;
#[doc(inline)]
pub use policy::{FamilyPolicy, TunePhase, VehicleFamily};
#[doc(inline)]
pub use report::{Announcement, NullReporter, Severity, TuneRecord, TuneReporter};
#[doc(inline)]
pub use tuner::{AutoTuner, SessionStatus, TickInput, TickOutput, VehicleState};

#[cfg(test)]
mod test_utils;
