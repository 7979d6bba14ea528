//! Analysis configuration.
//!
//! Holds the cycle length, the assumed cycle-start offsets to sweep, the item
//! filter and the summary windows. Persisted as pretty-printed JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cycle::{validate_cycle_length, DEFAULT_CYCLE_LENGTH};
use crate::error::CosinorError;
use crate::io::TableIoError;

/// Default assumed cycle starts in hours
pub const DEFAULT_START_OFFSETS: [f64; 4] = [0.0, 6.0, 10.0, 12.0];

/// Default segment boundaries in hours (four segments)
pub const DEFAULT_SEGMENT_BOUNDARIES: [f64; 5] = [0.0, 6.0, 8.0, 22.0, 24.0];

/// Inclusive window `[lo, hi]` of phases counted by the mislocation summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlausibleWindow {
    pub lo: f64,
    pub hi: f64,
}

impl PlausibleWindow {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// True when `phase` lies in `[lo, hi]`
    pub fn contains(&self, phase: f64) -> bool {
        (self.lo..=self.hi).contains(&phase)
    }
}

impl Default for PlausibleWindow {
    fn default() -> Self {
        Self { lo: 6.0, hi: 18.0 }
    }
}

/// Complete set of options for one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Cycle length λ in hours
    pub cycle_length: f64,
    /// Assumed cycle starts, each within `[0, cycle_length)`
    pub start_offsets: Vec<f64>,
    /// Items to analyse, `None` for every item present
    pub items: Option<Vec<String>>,
    pub plausible_window: PlausibleWindow,
    /// Strictly increasing, from 0 to `cycle_length`
    pub segment_boundaries: Vec<f64>,
    /// Fit triples on the rayon pool
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cycle_length: DEFAULT_CYCLE_LENGTH,
            start_offsets: DEFAULT_START_OFFSETS.to_vec(),
            items: None,
            plausible_window: PlausibleWindow::default(),
            segment_boundaries: DEFAULT_SEGMENT_BOUNDARIES.to_vec(),
            parallel: true,
        }
    }
}

impl AnalysisConfig {
    /// Check every option against the cycle length
    ///
    /// # Errors
    /// * `CosinorError::InvalidConfig` - describing the first violated constraint
    pub fn validate(&self) -> Result<(), CosinorError> {
        let lambda = self.cycle_length;
        validate_cycle_length(lambda)?;

        if self.start_offsets.is_empty() {
            return Err(CosinorError::InvalidConfig(
                "at least one start offset is required".to_string(),
            ));
        }
        for &offset in &self.start_offsets {
            if !offset.is_finite() || !(0.0..lambda).contains(&offset) {
                return Err(CosinorError::InvalidConfig(format!(
                    "start offset {offset} outside [0, {lambda})"
                )));
            }
        }

        if let Some(items) = &self.items {
            if items.is_empty() {
                return Err(CosinorError::InvalidConfig(
                    "item filter is empty".to_string(),
                ));
            }
        }

        let window = self.plausible_window;
        if !(window.lo.is_finite() && window.hi.is_finite())
            || window.lo > window.hi
            || window.lo < 0.0
            || window.hi > lambda
        {
            return Err(CosinorError::InvalidConfig(format!(
                "plausible window [{}, {}] must be ordered and within [0, {lambda}]",
                window.lo, window.hi
            )));
        }

        let bounds = &self.segment_boundaries;
        if bounds.len() < 2 {
            return Err(CosinorError::InvalidConfig(
                "segment boundaries need at least two values".to_string(),
            ));
        }
        if bounds[0] != 0.0 || bounds[bounds.len() - 1] != lambda {
            return Err(CosinorError::InvalidConfig(format!(
                "segment boundaries must start at 0 and end at {lambda}"
            )));
        }
        if bounds.windows(2).any(|pair| !(pair[0] < pair[1])) {
            return Err(CosinorError::InvalidConfig(
                "segment boundaries must be strictly increasing".to_string(),
            ));
        }

        Ok(())
    }

    /// True when `item` passes the item filter
    pub fn includes_item(&self, item: &str) -> bool {
        match &self.items {
            Some(items) => items.iter().any(|i| i == item),
            None => true,
        }
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), TableIoError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from JSON file; absent fields take their defaults
    pub fn load_from_file(path: &Path) -> Result<Self, TableIoError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
