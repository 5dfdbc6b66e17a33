// src/number.rs

//! Numeric requirements shared by the tuning engine.

use core::fmt::{Debug, Display};
use num_traits::{Float, NumCast};

/// Custom trait to encapsulate base number requirements.
///
/// Implemented for every floating point type with the usual formatting
/// traits, in practice `f32` and `f64`.
pub trait Number: Float + Default + Debug + Display {
    /// Clamps a value within a given range.
    fn constrain(self, min: Self, max: Self) -> Self {
        if self < min {
            min
        } else if max < self {
            max
        } else {
            self
        }
    }

    /// Converts an `f32` literal into this number type.
    fn lit(value: f32) -> Self {
        <Self as NumCast>::from(value).unwrap_or_else(Self::zero)
    }
}

impl<T: Float + Default + Debug + Display> Number for T {}
