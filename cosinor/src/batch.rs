//! Batch cosinor fitting over subjects, items and assumed cycle starts
//!
//! The observation table is partitioned by (subject, item). Every partition is
//! paired with every configured start offset; each triple is re-anchored, fitted
//! once and transformed with both phase methods. Triples are independent, so they
//! are evaluated on the rayon pool when `parallel` is set. Output is sorted by
//! subject, item, offset and method either way.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use itertools::iproduct;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::AnalysisConfig;
use crate::cycle::CycleConfig;
use crate::error::CosinorError;
use crate::fitter::fit_harmonic;
use crate::records::{CosinorEstimate, Observation, Omission};
use crate::transform::{recover_parameters, PhaseMethod};

/// Estimates plus the triples that could not be fitted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutput {
    /// Two records per fitted triple, one per [`PhaseMethod`]
    pub estimates: Vec<CosinorEstimate>,
    /// One record per skipped triple
    pub omissions: Vec<Omission>,
}

impl BatchOutput {
    /// Number of (subject, item, offset) triples that were attempted
    pub fn triples_attempted(&self) -> usize {
        self.estimates.len() / PhaseMethod::ALL.len() + self.omissions.len()
    }

    /// Estimates produced by one method
    pub fn estimates_for(&self, method: PhaseMethod) -> impl Iterator<Item = &CosinorEstimate> {
        self.estimates.iter().filter(move |e| e.method == method)
    }
}

/// Time series of one subject for one item
#[derive(Debug, Default)]
struct SubjectSeries {
    times: Vec<f64>,
    values: Vec<f64>,
}

enum TripleOutcome {
    Fitted(Vec<CosinorEstimate>),
    Omitted(Omission),
}

/// Run the cosinor fit for every (subject, item, start offset) triple
///
/// # Errors
/// * `CosinorError::InvalidConfig` - if `config` fails validation
///
/// Per-triple failures are not errors; they appear in [`BatchOutput::omissions`].
pub fn run_batch(
    observations: &[Observation],
    config: &AnalysisConfig,
) -> Result<BatchOutput, CosinorError> {
    config.validate()?;

    let groups = partition(observations, config);
    let cycles = config
        .start_offsets
        .iter()
        .map(|&offset| CycleConfig::new(config.cycle_length, offset))
        .collect::<Result<Vec<_>, _>>()?;

    let triples: Vec<_> = iproduct!(groups.iter(), cycles.iter()).collect();
    info!(
        "Fitting {} triples ({} subject/item series x {} offsets)",
        triples.len(),
        groups.len(),
        cycles.len()
    );

    let evaluate = |(group, cycle): &((&(String, String), &SubjectSeries), &CycleConfig)| {
        let ((subject, item), series) = *group;
        fit_triple(subject, item, series, cycle)
    };

    let outcomes: Vec<TripleOutcome> = if config.parallel {
        triples.par_iter().map(evaluate).collect()
    } else {
        triples.iter().map(evaluate).collect()
    };

    let mut output = BatchOutput::default();
    for outcome in outcomes {
        match outcome {
            TripleOutcome::Fitted(records) => output.estimates.extend(records),
            TripleOutcome::Omitted(omission) => output.omissions.push(omission),
        }
    }

    output.estimates.sort_by(compare_estimates);
    output.omissions.sort_by(|a, b| {
        a.subject_id
            .cmp(&b.subject_id)
            .then_with(|| a.item.cmp(&b.item))
            .then_with(|| a.start_offset.total_cmp(&b.start_offset))
    });

    info!(
        "Batch complete: {} estimates, {} omitted triples",
        output.estimates.len(),
        output.omissions.len()
    );

    Ok(output)
}

/// Sort order of the estimate table: subject, item, offset, method
pub fn compare_estimates(a: &CosinorEstimate, b: &CosinorEstimate) -> Ordering {
    a.subject_id
        .cmp(&b.subject_id)
        .then_with(|| a.item.cmp(&b.item))
        .then_with(|| a.start_offset.total_cmp(&b.start_offset))
        .then_with(|| a.method.cmp(&b.method))
}

fn partition(
    observations: &[Observation],
    config: &AnalysisConfig,
) -> BTreeMap<(String, String), SubjectSeries> {
    let mut groups: BTreeMap<(String, String), SubjectSeries> = BTreeMap::new();
    for obs in observations
        .iter()
        .filter(|obs| config.includes_item(&obs.item))
    {
        let series = groups
            .entry((obs.subject_id.clone(), obs.item.clone()))
            .or_default();
        series.times.push(obs.time_value);
        series.values.push(obs.value);
    }
    groups
}

fn fit_triple(
    subject: &str,
    item: &str,
    series: &SubjectSeries,
    cycle: &CycleConfig,
) -> TripleOutcome {
    // Regression always runs on cycle-start-relative time
    let relative_times: Vec<f64> = series.times.iter().map(|&t| cycle.reanchor(t)).collect();

    match fit_harmonic(&relative_times, &series.values, cycle.cycle_length) {
        Ok(fit) => {
            debug!(
                "{subject}/{item} @ {}: mesor={:.3} beta_cos={:.3} beta_sin={:.3}",
                cycle.start_offset, fit.mesor, fit.beta_cos, fit.beta_sin
            );
            let records = PhaseMethod::ALL
                .iter()
                .map(|&method| {
                    let params =
                        recover_parameters(fit.beta_cos, fit.beta_sin, cycle.cycle_length, method);
                    CosinorEstimate::from_fit(subject, item, cycle.start_offset, &fit, params)
                })
                .collect();
            TripleOutcome::Fitted(records)
        }
        Err(e) => {
            warn!(
                "Skipping {subject}/{item} @ offset {}: {e}",
                cycle.start_offset
            );
            TripleOutcome::Omitted(Omission::from_error(
                subject,
                item,
                cycle.start_offset,
                series.times.len(),
                &e,
            ))
        }
    }
}
