//! Row types flowing in and out of the batch runner.
//!
//! All rows are flat and serde-friendly so they can be written straight to CSV
//! for the plotting/reporting side.

use serde::{Deserialize, Serialize};

use crate::error::CosinorError;
use crate::fitter::HarmonicFit;
use crate::transform::{CosinorParameters, PhaseMethod, PhaseStatus};

/// One measurement in the long-format input table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub subject_id: String,
    /// Clock time in hours
    pub time_value: f64,
    pub item: String,
    pub value: f64,
}

impl Observation {
    pub fn new(
        subject_id: impl Into<String>,
        time_value: f64,
        item: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            time_value,
            item: item.into(),
            value,
        }
    }
}

/// Fitted cosinor estimate for one (subject, item, start offset, method)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosinorEstimate {
    pub subject_id: String,
    pub item: String,
    /// Assumed cycle start the times were re-anchored to
    pub start_offset: f64,
    pub method: PhaseMethod,
    pub mesor: f64,
    pub beta_cos: f64,
    pub beta_sin: f64,
    pub amplitude: f64,
    /// Peak time relative to `start_offset`, empty when undefined
    pub phase: Option<f64>,
    pub phase_status: PhaseStatus,
    pub r_squared: Option<f64>,
    pub n_observations: usize,
}

impl CosinorEstimate {
    pub(crate) fn from_fit(
        subject_id: &str,
        item: &str,
        start_offset: f64,
        fit: &HarmonicFit,
        params: CosinorParameters,
    ) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            item: item.to_string(),
            start_offset,
            method: params.method,
            mesor: fit.mesor,
            beta_cos: fit.beta_cos,
            beta_sin: fit.beta_sin,
            amplitude: params.amplitude,
            phase: params.phase,
            phase_status: params.status,
            r_squared: fit.r_squared,
            n_observations: fit.n_observations,
        }
    }

    /// Phase if it was computed without hitting a degenerate case
    pub fn resolved_phase(&self) -> Option<f64> {
        match self.phase_status {
            PhaseStatus::Resolved => self.phase,
            _ => None,
        }
    }
}

/// A (subject, item, start offset) triple that produced no estimates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Omission {
    pub subject_id: String,
    pub item: String,
    pub start_offset: f64,
    /// Error tag, e.g. `insufficient_data`
    pub kind: String,
    pub detail: String,
    pub n_observations: usize,
}

impl Omission {
    pub(crate) fn from_error(
        subject_id: &str,
        item: &str,
        start_offset: f64,
        n_observations: usize,
        error: &CosinorError,
    ) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            item: item.to_string(),
            start_offset,
            kind: error.kind().to_string(),
            detail: error.to_string(),
            n_observations,
        }
    }
}
