//! Synthetic rhythm generation
//!
//! Produces observations from a known cosinor curve, optionally with seeded
//! Gaussian noise, for validating phase recovery and for demo datasets.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::error::CosinorError;
use crate::records::Observation;
use crate::transform::coefficients_for;

/// A noiseless rhythm `mesor + amplitude * cos(2π (t - peak_time) / cycle_length)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticRhythm {
    mesor: f64,
    amplitude: f64,
    peak_time: f64,
    cycle_length: f64,
}

impl SyntheticRhythm {
    /// Create a new rhythm
    ///
    /// # Arguments
    /// * `mesor` - Midline of the rhythm
    /// * `amplitude` - Half the peak-to-trough distance
    /// * `peak_time` - Clock time of the maximum in hours
    /// * `cycle_length` - Period in hours
    pub fn new(mesor: f64, amplitude: f64, peak_time: f64, cycle_length: f64) -> Self {
        Self {
            mesor,
            amplitude,
            peak_time,
            cycle_length,
        }
    }

    /// Value of the rhythm at clock time `t`
    pub fn sample_at(&self, t: f64) -> f64 {
        self.mesor
            + self.amplitude * (2.0 * PI * (t - self.peak_time) / self.cycle_length).cos()
    }

    /// The `(beta_cos, beta_sin)` pair a perfect fit of this rhythm produces
    pub fn coefficients(&self) -> (f64, f64) {
        coefficients_for(self.amplitude, self.peak_time, self.cycle_length)
    }

    pub fn mesor(&self) -> f64 {
        self.mesor
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn peak_time(&self) -> f64 {
        self.peak_time
    }

    pub fn cycle_length(&self) -> f64 {
        self.cycle_length
    }

    /// Noiseless observations of one subject/item at the given times
    pub fn observations(&self, subject_id: &str, item: &str, times: &[f64]) -> Vec<Observation> {
        times
            .iter()
            .map(|&t| Observation::new(subject_id, t, item, self.sample_at(t)))
            .collect()
    }

    /// Observations with additive Gaussian noise of standard deviation `noise_std`
    ///
    /// # Errors
    /// * `CosinorError::InvalidConfig` - if `noise_std` is negative or not finite
    pub fn noisy_observations<R: Rng>(
        &self,
        subject_id: &str,
        item: &str,
        times: &[f64],
        noise_std: f64,
        rng: &mut R,
    ) -> Result<Vec<Observation>, CosinorError> {
        let normal = Normal::new(0.0, noise_std).map_err(|e| {
            CosinorError::InvalidConfig(format!("noise standard deviation {noise_std}: {e}"))
        })?;
        Ok(times
            .iter()
            .map(|&t| Observation::new(subject_id, t, item, self.sample_at(t) + normal.sample(rng)))
            .collect())
    }
}

/// `n` sample times evenly spread over one cycle starting at zero
pub fn evenly_spaced_times(n: usize, cycle_length: f64) -> Vec<f64> {
    let step = cycle_length / n as f64;
    (0..n).map(|i| i as f64 * step).collect()
}

/// Parameters for a synthetic cohort
#[derive(Debug, Clone, PartialEq)]
pub struct CohortSpec {
    pub subjects: usize,
    pub items: Vec<String>,
    pub samples_per_subject: usize,
    pub cycle_length: f64,
    pub mesor: f64,
    pub amplitude: f64,
    /// Peak times are drawn uniformly from `[lo, hi)`
    pub peak_range: (f64, f64),
    pub noise_std: f64,
    pub seed: u64,
}

impl Default for CohortSpec {
    fn default() -> Self {
        Self {
            subjects: 20,
            items: vec!["item_a".to_string()],
            samples_per_subject: 12,
            cycle_length: 24.0,
            mesor: 50.0,
            amplitude: 10.0,
            peak_range: (0.0, 24.0),
            noise_std: 0.0,
            seed: 42,
        }
    }
}

/// Generate a reproducible cohort: every subject gets its own random peak per item
/// and samples at evenly spaced times with a random sub-step jitter.
///
/// # Errors
/// * `CosinorError::InvalidConfig` - on an empty or inverted peak range, zero
///   samples, or an invalid noise level
pub fn generate_cohort(spec: &CohortSpec) -> Result<Vec<Observation>, CosinorError> {
    let (lo, hi) = spec.peak_range;
    if !(lo < hi) {
        return Err(CosinorError::InvalidConfig(format!(
            "peak range [{lo}, {hi}) is empty"
        )));
    }
    if spec.samples_per_subject == 0 {
        return Err(CosinorError::InvalidConfig(
            "samples per subject must be positive".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let step = spec.cycle_length / spec.samples_per_subject as f64;
    let mut observations = Vec::with_capacity(
        spec.subjects * spec.items.len() * spec.samples_per_subject,
    );

    for subject in 0..spec.subjects {
        let subject_id = format!("S{:03}", subject + 1);
        for item in &spec.items {
            let peak = rng.random_range(lo..hi);
            let rhythm = SyntheticRhythm::new(spec.mesor, spec.amplitude, peak, spec.cycle_length);
            let times: Vec<f64> = evenly_spaced_times(spec.samples_per_subject, spec.cycle_length)
                .into_iter()
                .map(|t| t + rng.random_range(0.0..step * 0.5))
                .collect();
            observations.extend(rhythm.noisy_observations(
                &subject_id,
                item,
                &times,
                spec.noise_std,
                &mut rng,
            )?);
        }
    }

    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_peak_and_trough() {
        let rhythm = SyntheticRhythm::new(50.0, 10.0, 14.0, 24.0);

        assert_relative_eq!(rhythm.sample_at(14.0), 60.0, epsilon = 1e-10);
        assert_relative_eq!(rhythm.sample_at(2.0), 40.0, epsilon = 1e-10);
        assert_relative_eq!(rhythm.sample_at(38.0), 60.0, epsilon = 1e-10);
        assert_relative_eq!(rhythm.sample_at(8.0), 50.0, epsilon = 1e-10);
    }

    #[test]
    fn test_coefficients_reproduce_curve() {
        let rhythm = SyntheticRhythm::new(5.0, 3.0, 20.0, 24.0);
        let (beta_cos, beta_sin) = rhythm.coefficients();
        let omega = 2.0 * PI / 24.0;

        for i in 0..24 {
            let t = i as f64;
            let linear = 5.0 + beta_cos * (omega * t).cos() + beta_sin * (omega * t).sin();
            assert_relative_eq!(linear, rhythm.sample_at(t), epsilon = 1e-10);
        }
    }

    #[test]
    fn test_evenly_spaced_times() {
        let times = evenly_spaced_times(4, 24.0);
        assert_eq!(times, vec![0.0, 6.0, 12.0, 18.0]);
    }

    #[test]
    fn test_noise_is_seeded() {
        let rhythm = SyntheticRhythm::new(0.0, 1.0, 0.0, 24.0);
        let times = evenly_spaced_times(10, 24.0);

        let a = rhythm
            .noisy_observations("s", "i", &times, 0.5, &mut StdRng::seed_from_u64(7))
            .unwrap();
        let b = rhythm
            .noisy_observations("s", "i", &times, 0.5, &mut StdRng::seed_from_u64(7))
            .unwrap();

        assert_eq!(a, b);
        assert!(a
            .iter()
            .zip(&times)
            .any(|(obs, &t)| (obs.value - rhythm.sample_at(t)).abs() > 1e-6));
    }

    #[test]
    fn test_negative_noise_rejected() {
        let rhythm = SyntheticRhythm::new(0.0, 1.0, 0.0, 24.0);
        let result =
            rhythm.noisy_observations("s", "i", &[0.0], -1.0, &mut StdRng::seed_from_u64(1));
        assert!(matches!(result, Err(CosinorError::InvalidConfig(_))));
    }

    #[test]
    fn test_cohort_shape() {
        let spec = CohortSpec {
            subjects: 5,
            items: vec!["a".to_string(), "b".to_string()],
            samples_per_subject: 6,
            ..Default::default()
        };

        let observations = generate_cohort(&spec).unwrap();

        assert_eq!(observations.len(), 5 * 2 * 6);
        assert_eq!(observations[0].subject_id, "S001");
        assert!(observations.iter().all(|o| o.time_value < 24.0));
        assert_eq!(generate_cohort(&spec).unwrap(), observations);
    }

    #[test]
    fn test_cohort_rejects_empty_peak_range() {
        let spec = CohortSpec {
            peak_range: (10.0, 10.0),
            ..Default::default()
        };
        assert!(generate_cohort(&spec).is_err());
    }
}
