//! Harmonic regression at a known period
//!
//! Fits the cosinor model
//!
//! `y(t) = mesor + beta_cos * cos(ωt) + beta_sin * sin(ωt)`, with `ω = 2π / cycle_length`
//!
//! by ordinary least squares. The design matrix `[1, cos(ωt), sin(ωt)]` is solved
//! through an SVD so that irregular sampling is handled exactly and rank deficiency
//! is detected instead of producing meaningless coefficients.

use nalgebra::{DMatrix, DVector};
use ndarray::Array1;

use crate::cycle::{angular_frequency, validate_cycle_length, wrap_to_cycle};
use crate::error::{CosinorError, InsufficientData};

/// Number of model parameters (mesor, cosine and sine coefficients)
pub const MODEL_PARAMETERS: usize = 3;

/// Singular values below this fraction of the largest are treated as zero
const RANK_TOLERANCE: f64 = 1e-10;

/// Rhythm amplitudes below this fraction of the largest `|y|` are solver noise
const AMPLITUDE_TOLERANCE: f64 = 1e-10;

/// Total sum of squares below this fraction of `Σy²` means the data is flat
const VARIANCE_TOLERANCE: f64 = 1e-24;

/// Linear coefficients of a fitted cosinor model
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicFit {
    /// Regression intercept (rhythm-adjusted mean)
    pub mesor: f64,
    /// Coefficient of the cosine predictor
    pub beta_cos: f64,
    /// Coefficient of the sine predictor
    pub beta_sin: f64,
    /// Cycle length the predictors were built with
    pub cycle_length: f64,
    /// Coefficient of determination, `None` when the data has zero variance
    pub r_squared: Option<f64>,
    /// Number of observations in the fit
    pub n_observations: usize,
}

impl HarmonicFit {
    /// Evaluate the fitted curve at cycle-relative time `t`
    pub fn predict(&self, t: f64) -> f64 {
        let omega = angular_frequency(self.cycle_length);
        self.mesor + self.beta_cos * (omega * t).cos() + self.beta_sin * (omega * t).sin()
    }

    /// Evaluate the fitted curve at each of `times`
    pub fn fitted_curve(&self, times: &[f64]) -> Vec<f64> {
        times.iter().map(|&t| self.predict(t)).collect()
    }
}

/// Fit the cosinor model to one group of observations
///
/// Times are wrapped to `t mod cycle_length` before the predictors are built, so
/// callers should pass times already re-anchored to the assumed cycle start.
///
/// # Arguments
/// * `times` - Observation times in hours
/// * `values` - Observed values, same length as `times`
/// * `cycle_length` - Period λ in hours
///
/// # Returns
/// * `Ok(HarmonicFit)` - Unique least-squares coefficients
/// * `Err(CosinorError::InsufficientData)` - Fewer than 3 distinct wrapped times, or
///   a rank-deficient design matrix
pub fn fit_harmonic(
    times: &[f64],
    values: &[f64],
    cycle_length: f64,
) -> Result<HarmonicFit, CosinorError> {
    validate_cycle_length(cycle_length)?;

    if times.len() != values.len() {
        return Err(CosinorError::LengthMismatch {
            times: times.len(),
            values: values.len(),
        });
    }

    if let Some(index) = times
        .iter()
        .zip(values)
        .position(|(t, y)| !t.is_finite() || !y.is_finite())
    {
        return Err(CosinorError::NonFiniteInput { index });
    }

    let wrapped: Vec<f64> = times
        .iter()
        .map(|&t| wrap_to_cycle(t, cycle_length))
        .collect();

    let distinct = count_distinct(&wrapped);
    if distinct < MODEL_PARAMETERS {
        return Err(InsufficientData::TooFewTimePoints {
            distinct,
            required: MODEL_PARAMETERS,
        }
        .into());
    }

    let n = wrapped.len();
    let omega = angular_frequency(cycle_length);
    let time = Array1::from_vec(wrapped);
    let cos_basis = (&time * omega).mapv(f64::cos);
    let sin_basis = (&time * omega).mapv(f64::sin);

    let design = DMatrix::from_fn(n, MODEL_PARAMETERS, |row, col| match col {
        0 => 1.0,
        1 => cos_basis[row],
        _ => sin_basis[row],
    });
    let observed = DVector::from_column_slice(values);

    let svd = design.svd(true, true);
    let tolerance = svd.singular_values.max() * RANK_TOLERANCE;
    let rank = svd.rank(tolerance);
    if rank < MODEL_PARAMETERS {
        return Err(InsufficientData::RankDeficient {
            rank,
            columns: MODEL_PARAMETERS,
        }
        .into());
    }

    let coefficients = svd
        .solve(&observed, tolerance)
        .map_err(|e| CosinorError::SolveFailed(e.to_string()))?;

    let mesor = coefficients[0];
    let data = Array1::from_vec(values.to_vec());
    let scale = data.fold(0.0_f64, |acc, y| acc.max(y.abs()));

    // A flat series solves to rounding-level coefficients with an arbitrary angle
    let (beta_cos, beta_sin) =
        if coefficients[1].hypot(coefficients[2]) <= AMPLITUDE_TOLERANCE * scale {
            (0.0, 0.0)
        } else {
            (coefficients[1], coefficients[2])
        };

    // R² against the plain mean of the data
    let mean = data.mean().unwrap_or(0.0);
    let centered = &data - mean;
    let ss_tot = (&centered * &centered).sum();
    let sum_squares = (&data * &data).sum();
    let fitted = &cos_basis * beta_cos + &sin_basis * beta_sin + mesor;
    let residuals = &data - &fitted;
    let ss_res = (&residuals * &residuals).sum();
    let r_squared = if ss_tot <= VARIANCE_TOLERANCE * sum_squares {
        None
    } else {
        Some(1.0 - ss_res / ss_tot)
    };

    Ok(HarmonicFit {
        mesor,
        beta_cos,
        beta_sin,
        cycle_length,
        r_squared,
        n_observations: n,
    })
}

fn count_distinct(times: &[f64]) -> usize {
    let mut sorted = times.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}
