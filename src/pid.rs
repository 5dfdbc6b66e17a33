// src/pid.rs

//! # PID Control Module
//!
//! Compute functions and control data structures for the `piddiy` PID
//! controllers used by the reference attitude controller.

pub mod rate;
pub use rate::*;
