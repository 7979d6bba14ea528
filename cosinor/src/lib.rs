//! Cosinor regression on repeated-measures rhythm data.
//!
//! Fits `y = mesor + beta_cos * cos(ωt) + beta_sin * sin(ωt)` per subject, item and
//! assumed cycle start, recovers amplitude and peak time with both the naive
//! one-argument arctangent and the two-argument arctangent, and summarises how
//! often the recovered peaks land inside a reference window.
//!
//! ```
//! use cosinor::{run_batch, AnalysisConfig, SyntheticRhythm};
//! use cosinor::synthetic::evenly_spaced_times;
//!
//! let rhythm = SyntheticRhythm::new(50.0, 10.0, 14.0, 24.0);
//! let observations = rhythm.observations("s1", "cortisol", &evenly_spaced_times(12, 24.0));
//!
//! let config = AnalysisConfig { start_offsets: vec![0.0], ..Default::default() };
//! let output = run_batch(&observations, &config).unwrap();
//! assert_eq!(output.estimates.len(), 2);
//! ```

pub mod batch;
pub mod config;
pub mod cycle;
pub mod error;
pub mod fitter;
pub mod io;
pub mod records;
pub mod summary;
pub mod synthetic;
pub mod transform;

pub use batch::{run_batch, BatchOutput};
pub use config::{AnalysisConfig, PlausibleWindow};
pub use cycle::CycleConfig;
pub use error::{CosinorError, InsufficientData};
pub use fitter::{fit_harmonic, HarmonicFit};
pub use records::{CosinorEstimate, Observation, Omission};
pub use summary::{
    mislocation_summary, naive_disagreement_summary, segment_summary, subjects_per_item,
    MislocationSummary, NaiveDisagreement, SegmentSummary,
};
pub use synthetic::SyntheticRhythm;
pub use transform::{recover_parameters, CosinorParameters, PhaseMethod, PhaseStatus};
