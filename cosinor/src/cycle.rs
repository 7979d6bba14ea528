//! Cycle geometry: period, angular frequency and re-anchoring of clock time
//!
//! Clock times are re-expressed as "time since the assumed cycle start":
//!
//! `t' = (t - start_offset) mod cycle_length`

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::CosinorError;

/// Default cycle length in hours
pub const DEFAULT_CYCLE_LENGTH: f64 = 24.0;

/// Wrap `value` into `[0, period)`.
///
/// `rem_euclid` can round up to exactly `period` for tiny negative inputs,
/// which is folded back to zero here.
pub fn wrap_to_cycle(value: f64, period: f64) -> f64 {
    let wrapped = value.rem_euclid(period);
    if wrapped >= period {
        0.0
    } else {
        wrapped
    }
}

/// Shortest distance between two points on a circle of circumference `period`
pub fn circular_distance(a: f64, b: f64, period: f64) -> f64 {
    let d = wrap_to_cycle(a - b, period);
    d.min(period - d)
}

/// Period plus assumed start of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Cycle length in hours
    pub cycle_length: f64,
    /// Assumed cycle start in hours, within `[0, cycle_length)`
    pub start_offset: f64,
}

impl CycleConfig {
    /// Create a validated cycle configuration
    ///
    /// # Errors
    /// * `CosinorError::InvalidConfig` - if the length is not finite and positive, or
    ///   the offset lies outside `[0, cycle_length)`
    pub fn new(cycle_length: f64, start_offset: f64) -> Result<Self, CosinorError> {
        validate_cycle_length(cycle_length)?;
        if !start_offset.is_finite() || !(0.0..cycle_length).contains(&start_offset) {
            return Err(CosinorError::InvalidConfig(format!(
                "start offset {start_offset} outside [0, {cycle_length})"
            )));
        }
        Ok(Self {
            cycle_length,
            start_offset,
        })
    }

    /// Angular frequency ω = 2π/λ in radians per hour
    pub fn angular_frequency(&self) -> f64 {
        angular_frequency(self.cycle_length)
    }

    /// Time since the assumed cycle start, in `[0, cycle_length)`
    pub fn reanchor(&self, time_value: f64) -> f64 {
        wrap_to_cycle(time_value - self.start_offset, self.cycle_length)
    }

    /// Map a cycle-relative time back onto the clock
    pub fn to_clock_time(&self, relative_time: f64) -> f64 {
        wrap_to_cycle(relative_time + self.start_offset, self.cycle_length)
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            cycle_length: DEFAULT_CYCLE_LENGTH,
            start_offset: 0.0,
        }
    }
}

/// Angular frequency for a cycle of length `cycle_length`
pub fn angular_frequency(cycle_length: f64) -> f64 {
    2.0 * PI / cycle_length
}

pub(crate) fn validate_cycle_length(cycle_length: f64) -> Result<(), CosinorError> {
    if !cycle_length.is_finite() || cycle_length <= 0.0 {
        return Err(CosinorError::InvalidConfig(format!(
            "cycle length must be finite and positive, got {cycle_length}"
        )));
    }
    Ok(())
}
