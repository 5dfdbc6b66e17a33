// src/gains.rs

//! Attitude controller gains that the autotune adjusts.

use crate::axis::PerAxis;
use crate::number::Number;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The gains tuned for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct AxisGains<T> {
    /// Proportional gain on angular rate error.
    pub rate_p: T,
    /// Integral gain on angular rate error.
    pub rate_i: T,
    /// Derivative gain on angular rate error.
    pub rate_d: T,
    /// Proportional gain on angle error, producing a rate setpoint.
    pub stab_p: T,
    /// Maximum angular acceleration in centidegrees/s/s used to shape setpoints.
    pub accel_max: T,
}

/// Gains for roll, pitch and yaw.
pub type GainSet<T> = PerAxis<AxisGains<T>>;

/// The gains that have search bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum GainKind {
    /// Rate loop proportional gain.
    RateP,
    /// Rate loop derivative gain.
    RateD,
    /// Angle loop proportional gain.
    StabP,
}

impl GainKind {
    /// All bounded gains.
    pub const ALL: [GainKind; 3] = [GainKind::RateP, GainKind::RateD, GainKind::StabP];

    /// Index into per-kind tables.
    pub const fn index(self) -> usize {
        match self {
            GainKind::RateP => 0,
            GainKind::RateD => 1,
            GainKind::StabP => 2,
        }
    }

    /// Human readable name.
    pub const fn name(self) -> &'static str {
        match self {
            GainKind::RateP => "Rate P",
            GainKind::RateD => "Rate D",
            GainKind::StabP => "Angle P",
        }
    }
}

impl fmt::Display for GainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<T: Number> AxisGains<T> {
    /// Creates gains with zero integral and acceleration limit.
    pub fn new(rate_p: T, rate_d: T, stab_p: T) -> Self {
        Self {
            rate_p,
            rate_i: T::zero(),
            rate_d,
            stab_p,
            accel_max: T::zero(),
        }
    }

    /// Returns the value of a bounded gain.
    pub fn get(&self, kind: GainKind) -> T {
        match kind {
            GainKind::RateP => self.rate_p,
            GainKind::RateD => self.rate_d,
            GainKind::StabP => self.stab_p,
        }
    }

    /// Sets the value of a bounded gain.
    pub fn set(&mut self, kind: GainKind, value: T) {
        match kind {
            GainKind::RateP => self.rate_p = value,
            GainKind::RateD => self.rate_d = value,
            GainKind::StabP => self.stab_p = value,
        }
    }
}

impl<T: Number> fmt::Display for AxisGains<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rate P:{:.4} I:{:.4} D:{:.5} Angle P:{:.3}",
            self.rate_p, self.rate_i, self.rate_d, self.stab_p
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_axis_gains_get_set_by_kind() {
        let mut gains = AxisGains::new(0.135f32, 0.0036, 4.5);
        assert!(value_close(0.0036, gains.get(GainKind::RateD)));
        gains.set(GainKind::StabP, 6.0);
        assert!(value_close(6.0, gains.stab_p));
        assert!(value_close(0.0, gains.rate_i));
    }

    #[test]
    fn test_axis_gains_display() {
        let gains = AxisGains::new(0.135f32, 0.0036, 4.5);
        assert_eq!(
            std::format!("{}", gains),
            "Rate P:0.1350 I:0.0000 D:0.00360 Angle P:4.500"
        );
    }
}
