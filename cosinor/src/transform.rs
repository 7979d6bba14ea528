//! Amplitude and phase recovery from cosinor coefficients
//!
//! With `y = mesor + beta_cos * cos(ωt) + beta_sin * sin(ωt)` the curve can be
//! rewritten as `mesor + A * cos(ω(t - φ))` where
//!
//! ```text
//! A = sqrt(beta_cos² + beta_sin²)
//! φ = atan2(beta_sin, beta_cos) / ω   (mod λ)
//! ```
//!
//! The one-argument form `atan(beta_sin / beta_cos)` only covers (-π/2, π/2) and so
//! cannot tell opposite quadrants apart. Whenever `beta_cos < 0` it places the peak
//! half a cycle away from the true one. Both methods are provided so the error can
//! be measured.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cycle::{angular_frequency, wrap_to_cycle};

/// Inverse tangent used to turn coefficients into a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseMethod {
    /// `atan(beta_sin / beta_cos)`, quadrant-blind
    NaiveArctan,
    /// `atan2(beta_sin, beta_cos)`
    TwoArgumentArctan,
}

impl PhaseMethod {
    /// Both methods in output order
    pub const ALL: [PhaseMethod; 2] = [PhaseMethod::NaiveArctan, PhaseMethod::TwoArgumentArctan];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseMethod::NaiveArctan => "naive_arctan",
            PhaseMethod::TwoArgumentArctan => "two_argument_arctan",
        }
    }
}

impl fmt::Display for PhaseMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of a recovered phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// Phase computed normally
    Resolved,
    /// Naive method with `beta_cos == 0`: pinned to a quarter cycle, signed by `beta_sin`
    QuarterCycleBoundary,
    /// Both coefficients zero, no peak exists
    Undefined,
}

/// Amplitude and phase recovered by one method
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosinorParameters {
    /// Half the peak-to-trough distance, never negative
    pub amplitude: f64,
    /// Time of peak within `[0, cycle_length)`, `None` when undefined
    pub phase: Option<f64>,
    pub status: PhaseStatus,
    pub method: PhaseMethod,
}

/// Convert cosinor coefficients into amplitude and peak time
///
/// Edge cases are classified rather than left as `NaN`:
/// * `beta_cos == beta_sin == 0` gives amplitude 0 and [`PhaseStatus::Undefined`]
///   for either method.
/// * `beta_cos == 0` under [`PhaseMethod::NaiveArctan`] would divide by zero; the
///   phase is `+λ/4` when `beta_sin > 0` and `-λ/4` (i.e. `3λ/4`) when
///   `beta_sin < 0`, flagged [`PhaseStatus::QuarterCycleBoundary`]. This is the
///   value IEEE arithmetic gives for `atan(±∞)`. The test is an exact zero.
pub fn recover_parameters(
    beta_cos: f64,
    beta_sin: f64,
    cycle_length: f64,
    method: PhaseMethod,
) -> CosinorParameters {
    let amplitude = beta_cos.hypot(beta_sin);

    if beta_cos == 0.0 && beta_sin == 0.0 {
        return CosinorParameters {
            amplitude: 0.0,
            phase: None,
            status: PhaseStatus::Undefined,
            method,
        };
    }

    let omega = angular_frequency(cycle_length);
    let (angle, status) = match method {
        PhaseMethod::NaiveArctan if beta_cos == 0.0 => (
            std::f64::consts::FRAC_PI_2.copysign(beta_sin),
            PhaseStatus::QuarterCycleBoundary,
        ),
        PhaseMethod::NaiveArctan => ((beta_sin / beta_cos).atan(), PhaseStatus::Resolved),
        PhaseMethod::TwoArgumentArctan => (beta_sin.atan2(beta_cos), PhaseStatus::Resolved),
    };

    CosinorParameters {
        amplitude,
        phase: Some(wrap_to_cycle(angle / omega, cycle_length)),
        status,
        method,
    }
}

/// Coefficients `(beta_cos, beta_sin)` for a curve of the given amplitude peaking at `phase`
pub fn coefficients_for(amplitude: f64, phase: f64, cycle_length: f64) -> (f64, f64) {
    let angle = angular_frequency(cycle_length) * phase;
    (amplitude * angle.cos(), amplitude * angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::circular_distance;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(2.0)]
    #[case(5.5)]
    #[case(9.0)]
    #[case(14.0)]
    #[case(17.25)]
    #[case(20.0)]
    #[case(23.0)]
    fn test_two_argument_recovers_phase_in_every_quadrant(#[case] peak: f64) {
        let (beta_cos, beta_sin) = coefficients_for(10.0, peak, 24.0);

        let params = recover_parameters(beta_cos, beta_sin, 24.0, PhaseMethod::TwoArgumentArctan);

        assert_relative_eq!(params.amplitude, 10.0, epsilon = 1e-9);
        assert_eq!(params.status, PhaseStatus::Resolved);
        assert!(circular_distance(params.phase.unwrap(), peak, 24.0) < 1e-9);
    }

    #[rstest]
    #[case(7.0)]
    #[case(10.0)]
    #[case(14.0)]
    #[case(17.0)]
    fn test_naive_misplaces_by_half_cycle_when_cosine_negative(#[case] peak: f64) {
        let (beta_cos, beta_sin) = coefficients_for(10.0, peak, 24.0);
        assert!(beta_cos < 0.0);

        let naive = recover_parameters(beta_cos, beta_sin, 24.0, PhaseMethod::NaiveArctan);

        assert_relative_eq!(naive.amplitude, 10.0, epsilon = 1e-9);
        assert_relative_eq!(
            circular_distance(naive.phase.unwrap(), peak, 24.0),
            12.0,
            epsilon = 1e-9
        );
    }

    #[rstest]
    #[case(0.5)]
    #[case(3.0)]
    #[case(21.0)]
    #[case(23.5)]
    fn test_naive_agrees_when_cosine_positive(#[case] peak: f64) {
        let (beta_cos, beta_sin) = coefficients_for(4.0, peak, 24.0);
        assert!(beta_cos > 0.0);

        let naive = recover_parameters(beta_cos, beta_sin, 24.0, PhaseMethod::NaiveArctan);

        assert!(circular_distance(naive.phase.unwrap(), peak, 24.0) < 1e-9);
    }

    #[test]
    fn test_naive_zero_cosine_boundary() {
        let up = recover_parameters(0.0, 3.0, 24.0, PhaseMethod::NaiveArctan);
        assert_eq!(up.status, PhaseStatus::QuarterCycleBoundary);
        assert_relative_eq!(up.phase.unwrap(), 6.0, epsilon = 1e-12);
        assert_relative_eq!(up.amplitude, 3.0, epsilon = 1e-12);

        let down = recover_parameters(0.0, -3.0, 24.0, PhaseMethod::NaiveArctan);
        assert_eq!(down.status, PhaseStatus::QuarterCycleBoundary);
        assert_relative_eq!(down.phase.unwrap(), 18.0, epsilon = 1e-12);
    }

    #[test]
    fn test_two_argument_zero_cosine_is_ordinary() {
        let params = recover_parameters(0.0, -3.0, 24.0, PhaseMethod::TwoArgumentArctan);
        assert_eq!(params.status, PhaseStatus::Resolved);
        assert_relative_eq!(params.phase.unwrap(), 18.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_coefficients_undefined_for_both_methods() {
        for method in PhaseMethod::ALL {
            let params = recover_parameters(0.0, 0.0, 24.0, method);
            assert_eq!(params.amplitude, 0.0);
            assert_eq!(params.phase, None);
            assert_eq!(params.status, PhaseStatus::Undefined);
            assert_eq!(params.method, method);
        }
    }

    #[test]
    fn test_phase_always_in_cycle() {
        for i in 0..48 {
            let (beta_cos, beta_sin) = coefficients_for(1.0, i as f64 * 0.5, 24.0);
            for method in PhaseMethod::ALL {
                let phase = recover_parameters(beta_cos, beta_sin, 24.0, method)
                    .phase
                    .unwrap();
                assert!((0.0..24.0).contains(&phase), "{method} gave {phase}");
            }
        }
    }

    #[test]
    fn test_other_cycle_lengths() {
        let (beta_cos, beta_sin) = coefficients_for(2.0, 9.0, 12.0);
        let params = recover_parameters(beta_cos, beta_sin, 12.0, PhaseMethod::TwoArgumentArctan);
        assert!(circular_distance(params.phase.unwrap(), 9.0, 12.0) < 1e-9);
    }

    #[test]
    fn test_method_names() {
        assert_eq!(PhaseMethod::NaiveArctan.to_string(), "naive_arctan");
        assert_eq!(
            PhaseMethod::TwoArgumentArctan.to_string(),
            "two_argument_arctan"
        );
    }
}
