// src/persist.rs

//! # Gain Persistence
//!
//! The tuner only writes gains through a [`ParamStore`], and only when told
//! to save a successful session. Keys follow the ArduPilot attitude
//! controller parameter names so a store can map them onto an existing
//! parameter table.

use crate::axis::Axis;
use crate::error::StoreError;
use crate::gains::AxisGains;
use crate::number::Number;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A persisted gain of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum ParamKind {
    /// Rate loop P.
    RateP,
    /// Rate loop I.
    RateI,
    /// Rate loop D.
    RateD,
    /// Angle loop P.
    StabP,
    /// Angular acceleration limit.
    AccelMax,
}

impl ParamKind {
    /// Every persisted gain, in write order.
    pub const ALL: [ParamKind; 5] = [
        ParamKind::RateP,
        ParamKind::RateI,
        ParamKind::RateD,
        ParamKind::StabP,
        ParamKind::AccelMax,
    ];
}

/// Identifies one stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct ParamKey {
    /// Axis the value belongs to.
    pub axis: Axis,
    /// Which gain.
    pub kind: ParamKind,
}

impl ParamKey {
    /// Creates a key.
    pub const fn new(axis: Axis, kind: ParamKind) -> Self {
        Self { axis, kind }
    }

    /// Parameter name, e.g. `ATC_RAT_RLL_P`.
    pub const fn name(&self) -> &'static str {
        use Axis::*;
        use ParamKind::*;
        match (self.axis, self.kind) {
            (Roll, RateP) => "ATC_RAT_RLL_P",
            (Roll, RateI) => "ATC_RAT_RLL_I",
            (Roll, RateD) => "ATC_RAT_RLL_D",
            (Roll, StabP) => "ATC_ANG_RLL_P",
            (Roll, AccelMax) => "ATC_ACCEL_R_MAX",
            (Pitch, RateP) => "ATC_RAT_PIT_P",
            (Pitch, RateI) => "ATC_RAT_PIT_I",
            (Pitch, RateD) => "ATC_RAT_PIT_D",
            (Pitch, StabP) => "ATC_ANG_PIT_P",
            (Pitch, AccelMax) => "ATC_ACCEL_P_MAX",
            (Yaw, RateP) => "ATC_RAT_YAW_P",
            (Yaw, RateI) => "ATC_RAT_YAW_I",
            (Yaw, RateD) => "ATC_RAT_YAW_D",
            (Yaw, StabP) => "ATC_ANG_YAW_P",
            (Yaw, AccelMax) => "ATC_ACCEL_Y_MAX",
        }
    }
}

/// Persistent parameter storage.
pub trait ParamStore<T> {
    /// Stores one value.
    fn set(&mut self, key: ParamKey, value: T) -> Result<(), StoreError>;
}

/// Writes every persisted gain of `axis`. Stops at the first store error.
pub fn save_gains<T, S>(store: &mut S, axis: Axis, gains: &AxisGains<T>) -> Result<(), StoreError>
where
    T: Number,
    S: ParamStore<T> + ?Sized,
{
    for kind in ParamKind::ALL {
        let value = match kind {
            ParamKind::RateP => gains.rate_p,
            ParamKind::RateI => gains.rate_i,
            ParamKind::RateD => gains.rate_d,
            ParamKind::StabP => gains.stab_p,
            ParamKind::AccelMax => gains.accel_max,
        };
        store.set(ParamKey::new(axis, kind), value)?;
    }
    debug!("autotune: saved {} gains", axis.id());
    Ok(())
}
