// src/test_utils.rs

//! This module contains utilities for testing.

use crate::axis::Axis;
use crate::error::StoreError;
use crate::persist::{ParamKey, ParamKind, ParamStore};
use crate::report::{Announcement, DetailSample, TuneRecord, TuneReporter};
use std::vec::Vec;

/// A constant defining the tolerance within which floating-point values
/// are considered close enough to be equal.
pub const TEST_TOLERANCE: f32 = 1e-5;

/// Checks if two floating point numbers are close enough to be considered
/// equal.
///
/// # Arguments
/// * `target` - The target value.
/// * `value` - The value to compare against the target.
///
/// # Returns
/// `true` if the absolute difference between `target` and `value` is less than
/// `TEST_TOLERANCE`, otherwise `false`.
pub fn value_close(target: f32, value: f32) -> bool {
    (target - value).abs() < TEST_TOLERANCE
}

/// Checks if two floating point numbers are not close enough to be
/// considered equal.
pub fn value_not_close(target: f32, value: f32) -> bool {
    TEST_TOLERANCE <= (target - value).abs()
}

/// Checks if each of the components in a `(roll, pitch, yaw)` tuple is
/// close enough to be considered equal.
pub fn vector_close(target: (f32, f32, f32), value: (f32, f32, f32)) -> bool {
    value_close(target.0, value.0)
        && value_close(target.1, value.1)
        && value_close(target.2, value.2)
}

/// Reporter that keeps everything it is given.
#[derive(Debug, Clone)]
pub struct RecordingReporter<T> {
    /// Announcements in delivery order.
    pub announcements: Vec<Announcement<T>>,
    /// Test records in delivery order.
    pub records: Vec<TuneRecord<T>>,
    /// Raw response samples in delivery order.
    pub details: Vec<DetailSample<T>>,
}

impl<T> Default for RecordingReporter<T> {
    fn default() -> Self {
        Self {
            announcements: Vec::new(),
            records: Vec::new(),
            details: Vec::new(),
        }
    }
}

impl<T: Copy> TuneReporter<T> for RecordingReporter<T> {
    fn announce(&mut self, announcement: &Announcement<T>) {
        self.announcements.push(*announcement);
    }

    fn log_test(&mut self, record: &TuneRecord<T>) {
        self.records.push(*record);
    }

    fn log_detail(&mut self, sample: &DetailSample<T>) {
        self.details.push(*sample);
    }
}

/// Parameter store backed by a vector. Writing a key again replaces its
/// value.
#[derive(Debug, Clone)]
pub struct MemoryStore<T> {
    /// Stored values.
    pub values: Vec<(ParamKey, T)>,
    /// Number of `set` calls, including repeated keys.
    pub writes: usize,
    /// Fail every write.
    pub fail: bool,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            writes: 0,
            fail: false,
        }
    }
}

impl<T: Copy> MemoryStore<T> {
    /// Last value written for a key.
    pub fn get(&self, axis: Axis, kind: ParamKind) -> Option<T> {
        let key = ParamKey::new(axis, kind);
        self.values
            .iter()
            .find(|(stored, _)| *stored == key)
            .map(|&(_, value)| value)
    }
}

impl<T: Copy> ParamStore<T> for MemoryStore<T> {
    fn set(&mut self, key: ParamKey, value: T) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::WriteFailed);
        }
        self.writes += 1;
        match self.values.iter_mut().find(|(stored, _)| *stored == key) {
            Some(entry) => entry.1 = value,
            None => self.values.push((key, value)),
        }
        Ok(())
    }
}
