// src/axis.rs

//! Rotational axes and fixed-size per-axis storage.

use crate::error::ConfigError;
use core::fmt;
use core::ops::{Index, IndexMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the three rotational degrees of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[repr(u8)]
pub enum Axis {
    /// Rotation about the longitudinal axis.
    Roll = 0,
    /// Rotation about the lateral axis.
    Pitch = 1,
    /// Rotation about the vertical axis.
    Yaw = 2,
}

impl Axis {
    /// All axes in the conventional tuning order.
    pub const ALL: [Axis; 3] = [Axis::Roll, Axis::Pitch, Axis::Yaw];

    /// Index of the axis in `PerAxis` storage.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Numeric identifier written to log records.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Bit used for this axis in an axis selection mask.
    pub const fn mask_bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Human readable name used in announcements.
    pub const fn name(self) -> &'static str {
        match self {
            Axis::Roll => "Roll",
            Axis::Pitch => "Pitch",
            Axis::Yaw => "Yaw",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value for each of roll, pitch and yaw.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct PerAxis<T> {
    /// Roll value.
    pub roll: T,
    /// Pitch value.
    pub pitch: T,
    /// Yaw value.
    pub yaw: T,
}

impl<T> PerAxis<T> {
    /// Creates per-axis storage from the three values.
    pub const fn new(roll: T, pitch: T, yaw: T) -> Self {
        Self { roll, pitch, yaw }
    }

    /// Returns a reference to the value for `axis`.
    pub fn get(&self, axis: Axis) -> &T {
        match axis {
            Axis::Roll => &self.roll,
            Axis::Pitch => &self.pitch,
            Axis::Yaw => &self.yaw,
        }
    }

    /// Returns a mutable reference to the value for `axis`.
    pub fn get_mut(&mut self, axis: Axis) -> &mut T {
        match axis {
            Axis::Roll => &mut self.roll,
            Axis::Pitch => &mut self.pitch,
            Axis::Yaw => &mut self.yaw,
        }
    }
}

impl<T: Copy> PerAxis<T> {
    /// Uses the same value for every axis.
    pub const fn splat(value: T) -> Self {
        Self {
            roll: value,
            pitch: value,
            yaw: value,
        }
    }

    /// Returns the values as a `(roll, pitch, yaw)` tuple.
    pub fn to_tuple(self) -> (T, T, T) {
        (self.roll, self.pitch, self.yaw)
    }
}

impl<T> From<(T, T, T)> for PerAxis<T> {
    fn from((roll, pitch, yaw): (T, T, T)) -> Self {
        Self { roll, pitch, yaw }
    }
}

impl<T> Index<Axis> for PerAxis<T> {
    type Output = T;

    fn index(&self, axis: Axis) -> &T {
        self.get(axis)
    }
}

impl<T> IndexMut<Axis> for PerAxis<T> {
    fn index_mut(&mut self, axis: Axis) -> &mut T {
        self.get_mut(axis)
    }
}

/// The ordered list of axes a session tunes. Each axis appears at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisOrder {
    axes: [Axis; 3],
    len: u8,
}

impl AxisOrder {
    /// Builds an order from a slice, rejecting empty and repeated entries.
    pub fn new(axes: &[Axis]) -> Result<Self, ConfigError> {
        if axes.is_empty() {
            return Err(ConfigError::NoAxes);
        }
        let mut order = Self {
            axes: Axis::ALL,
            len: 0,
        };
        for &axis in axes {
            if order.contains(axis) {
                return Err(ConfigError::DuplicateAxis(axis));
            }
            order.axes[order.len as usize] = axis;
            order.len += 1;
        }
        Ok(order)
    }

    /// Roll, then pitch, then yaw.
    pub const fn all() -> Self {
        Self {
            axes: Axis::ALL,
            len: 3,
        }
    }

    /// Builds an order from an axis bitmask (1 roll, 2 pitch, 4 yaw).
    /// Axes are visited roll, pitch, yaw.
    pub fn from_bitmask(mask: u8) -> Result<Self, ConfigError> {
        let mut order = Self {
            axes: Axis::ALL,
            len: 0,
        };
        for axis in Axis::ALL {
            if mask & axis.mask_bit() != 0 {
                order.axes[order.len as usize] = axis;
                order.len += 1;
            }
        }
        if order.len == 0 {
            return Err(ConfigError::NoAxes);
        }
        Ok(order)
    }

    /// Number of axes in the order.
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Always false for a successfully built order.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the axis at `position`.
    pub fn get(&self, position: usize) -> Option<Axis> {
        self.as_slice().get(position).copied()
    }

    /// Returns true if `axis` is part of the order.
    pub fn contains(&self, axis: Axis) -> bool {
        self.as_slice().contains(&axis)
    }

    /// The axes as a slice.
    pub fn as_slice(&self) -> &[Axis] {
        &self.axes[..self.len as usize]
    }

    /// Iterates over the axes in order.
    pub fn iter(&self) -> impl Iterator<Item = Axis> + '_ {
        self.as_slice().iter().copied()
    }
}
