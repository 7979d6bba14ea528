//! Cohort-level comparison of recovered phases
//!
//! All percentages use a per-item denominator computed once up front by
//! [`subjects_per_item`]: the number of subjects with at least one resolved
//! two-argument phase for the item, whatever the offset. Keeping the base fixed
//! makes groups with different start offsets directly comparable. Undefined
//! phases are excluded from both numerator and denominator.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use log::warn;
use serde::Serialize;

use crate::config::PlausibleWindow;
use crate::cycle::circular_distance;
use crate::records::CosinorEstimate;
use crate::transform::PhaseMethod;

/// Share of subjects whose two-argument phase falls inside the plausible window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MislocationSummary {
    pub item: String,
    pub start_offset: f64,
    /// Subjects with a phase in `[lo, hi]`
    pub in_window: usize,
    /// Fixed per-item denominator
    pub subjects: usize,
    pub mislocation_percentage: f64,
}

/// Share of subjects whose two-argument phase lies in one cycle segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSummary {
    pub item: String,
    pub start_offset: f64,
    /// Segment bounds `[segment_start, segment_end)`
    pub segment_start: f64,
    pub segment_end: f64,
    pub count: usize,
    pub subjects: usize,
    pub percentage: f64,
}

/// How often the naive phase lands half a cycle from the two-argument phase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NaiveDisagreement {
    pub item: String,
    pub start_offset: f64,
    /// Subjects with both phases resolved
    pub compared: usize,
    /// Of those, naive phase misplaced by half a cycle
    pub misplaced: usize,
    pub misplaced_percentage: f64,
}

/// Distinct subjects per item with at least one resolved two-argument phase
pub fn subjects_per_item(estimates: &[CosinorEstimate]) -> BTreeMap<String, usize> {
    let mut subjects: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for estimate in two_argument_resolved(estimates) {
        subjects
            .entry(estimate.item.as_str())
            .or_default()
            .insert(estimate.subject_id.as_str());
    }
    subjects
        .into_iter()
        .map(|(item, ids)| (item.to_string(), ids.len()))
        .collect()
}

/// Percentage of subjects per (item, offset) whose two-argument phase is in `window`
///
/// Items absent from `subject_counts` (no resolved phase anywhere) are skipped.
pub fn mislocation_summary(
    estimates: &[CosinorEstimate],
    window: PlausibleWindow,
    subject_counts: &BTreeMap<String, usize>,
) -> Vec<MislocationSummary> {
    let mut rows = Vec::new();
    for ((item, start_offset), group) in &grouped_by_item_offset(estimates) {
        let Some(&subjects) = subject_counts.get(item).filter(|&&n| n > 0) else {
            warn!("No resolved phases for item {item}; skipping mislocation summary");
            continue;
        };
        let in_window = group
            .iter()
            .filter_map(|e| e.resolved_phase())
            .filter(|&phase| window.contains(phase))
            .count();
        rows.push(MislocationSummary {
            item: item.clone(),
            start_offset: *start_offset,
            in_window,
            subjects,
            mislocation_percentage: percentage(in_window, subjects),
        });
    }
    rows
}

/// Distribution of two-argument phases over the segments `[b_i, b_{i+1})`
///
/// `boundaries` must be strictly increasing; phases outside every segment are
/// not counted.
pub fn segment_summary(
    estimates: &[CosinorEstimate],
    boundaries: &[f64],
    subject_counts: &BTreeMap<String, usize>,
) -> Vec<SegmentSummary> {
    let mut rows = Vec::new();
    for ((item, start_offset), group) in &grouped_by_item_offset(estimates) {
        let Some(&subjects) = subject_counts.get(item).filter(|&&n| n > 0) else {
            warn!("No resolved phases for item {item}; skipping segment summary");
            continue;
        };
        let phases: Vec<f64> = group.iter().filter_map(|e| e.resolved_phase()).collect();
        for (&segment_start, &segment_end) in boundaries.iter().tuple_windows() {
            let count = phases
                .iter()
                .filter(|&&phase| (segment_start..segment_end).contains(&phase))
                .count();
            rows.push(SegmentSummary {
                item: item.clone(),
                start_offset: *start_offset,
                segment_start,
                segment_end,
                count,
                subjects,
                percentage: percentage(count, subjects),
            });
        }
    }
    rows
}

/// Per (item, offset), count subjects whose naive phase sits half a cycle away
/// from the two-argument phase, within `tolerance` hours
pub fn naive_disagreement_summary(
    estimates: &[CosinorEstimate],
    cycle_length: f64,
    tolerance: f64,
) -> Vec<NaiveDisagreement> {
    let mut naive: BTreeMap<(&str, &str, u64), f64> = BTreeMap::new();
    for estimate in estimates
        .iter()
        .filter(|e| e.method == PhaseMethod::NaiveArctan)
    {
        if let Some(phase) = estimate.resolved_phase() {
            naive.insert(
                (
                    estimate.subject_id.as_str(),
                    estimate.item.as_str(),
                    estimate.start_offset.to_bits(),
                ),
                phase,
            );
        }
    }

    let half_cycle = cycle_length / 2.0;
    let mut rows = Vec::new();
    for ((item, start_offset), group) in &grouped_by_item_offset(estimates) {
        let mut compared = 0;
        let mut misplaced = 0;
        for estimate in group {
            let Some(correct) = estimate.resolved_phase() else {
                continue;
            };
            let key = (
                estimate.subject_id.as_str(),
                estimate.item.as_str(),
                estimate.start_offset.to_bits(),
            );
            let Some(&naive_phase) = naive.get(&key) else {
                continue;
            };
            compared += 1;
            let distance = circular_distance(naive_phase, correct, cycle_length);
            if (distance - half_cycle).abs() <= tolerance {
                misplaced += 1;
            }
        }
        rows.push(NaiveDisagreement {
            item: item.clone(),
            start_offset: *start_offset,
            compared,
            misplaced,
            misplaced_percentage: percentage(misplaced, compared),
        });
    }
    rows
}

fn two_argument_resolved(
    estimates: &[CosinorEstimate],
) -> impl Iterator<Item = &CosinorEstimate> {
    estimates
        .iter()
        .filter(|e| e.method == PhaseMethod::TwoArgumentArctan && e.resolved_phase().is_some())
}

/// Two-argument estimates grouped by (item, offset), in item then offset order
fn grouped_by_item_offset(
    estimates: &[CosinorEstimate],
) -> Vec<((String, f64), Vec<&CosinorEstimate>)> {
    estimates
        .iter()
        .filter(|e| e.method == PhaseMethod::TwoArgumentArctan)
        .sorted_by(|a, b| {
            a.item
                .cmp(&b.item)
                .then_with(|| a.start_offset.total_cmp(&b.start_offset))
        })
        .group_by(|e| (e.item.clone(), e.start_offset))
        .into_iter()
        .map(|(key, group)| (key, group.collect()))
        .collect()
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * count as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::PhaseStatus;
    use approx::assert_relative_eq;

    fn estimate(
        subject: &str,
        item: &str,
        offset: f64,
        method: PhaseMethod,
        phase: Option<f64>,
    ) -> CosinorEstimate {
        CosinorEstimate {
            subject_id: subject.to_string(),
            item: item.to_string(),
            start_offset: offset,
            method,
            mesor: 0.0,
            beta_cos: 0.0,
            beta_sin: 0.0,
            amplitude: if phase.is_some() { 1.0 } else { 0.0 },
            phase,
            phase_status: if phase.is_some() {
                PhaseStatus::Resolved
            } else {
                PhaseStatus::Undefined
            },
            r_squared: None,
            n_observations: 12,
        }
    }

    fn two_arg(subject: &str, offset: f64, phase: Option<f64>) -> CosinorEstimate {
        estimate(subject, "hr", offset, PhaseMethod::TwoArgumentArctan, phase)
    }

    #[test]
    fn test_denominator_counts_subjects_once() {
        let estimates = vec![
            two_arg("a", 0.0, Some(3.0)),
            two_arg("a", 12.0, Some(15.0)),
            two_arg("b", 0.0, Some(9.0)),
            two_arg("c", 0.0, None),
            estimate("d", "hr", 0.0, PhaseMethod::NaiveArctan, Some(9.0)),
            estimate("a", "temp", 0.0, PhaseMethod::TwoArgumentArctan, Some(1.0)),
        ];

        let counts = subjects_per_item(&estimates);

        assert_eq!(counts.get("hr"), Some(&2));
        assert_eq!(counts.get("temp"), Some(&1));
    }

    #[test]
    fn test_mislocation_uses_fixed_denominator() {
        // Subject "b" is only fitted at offset 0; the base stays 2 at offset 12
        let estimates = vec![
            two_arg("a", 0.0, Some(10.0)),
            two_arg("b", 0.0, Some(4.0)),
            two_arg("a", 12.0, Some(22.0)),
        ];
        let counts = subjects_per_item(&estimates);

        let rows = mislocation_summary(&estimates, PlausibleWindow::default(), &counts);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].start_offset, 0.0);
        assert_eq!(rows[0].in_window, 1);
        assert_eq!(rows[0].subjects, 2);
        assert_relative_eq!(rows[0].mislocation_percentage, 50.0);
        assert_eq!(rows[1].start_offset, 12.0);
        assert_eq!(rows[1].in_window, 0);
        assert_relative_eq!(rows[1].mislocation_percentage, 0.0);
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let estimates = vec![
            two_arg("a", 0.0, Some(6.0)),
            two_arg("b", 0.0, Some(18.0)),
            two_arg("c", 0.0, Some(18.5)),
            two_arg("d", 0.0, None),
        ];
        let counts = subjects_per_item(&estimates);

        let rows = mislocation_summary(&estimates, PlausibleWindow::default(), &counts);

        assert_eq!(rows[0].in_window, 2);
        assert_eq!(rows[0].subjects, 3);
        assert_relative_eq!(rows[0].mislocation_percentage, 200.0 / 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_naive_estimates_do_not_feed_mislocation() {
        let estimates = vec![
            two_arg("a", 0.0, Some(2.0)),
            estimate("a", "hr", 0.0, PhaseMethod::NaiveArctan, Some(14.0)),
        ];
        let counts = subjects_per_item(&estimates);

        let rows = mislocation_summary(&estimates, PlausibleWindow::default(), &counts);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].in_window, 0);
    }

    #[test]
    fn test_item_without_resolved_phase_skipped() {
        let estimates = vec![two_arg("a", 0.0, None)];
        let counts = subjects_per_item(&estimates);

        assert!(mislocation_summary(&estimates, PlausibleWindow::default(), &counts).is_empty());
        assert!(segment_summary(&estimates, &[0.0, 12.0, 24.0], &counts).is_empty());
    }

    #[test]
    fn test_segments_half_open() {
        let estimates = vec![
            two_arg("a", 0.0, Some(0.0)),
            two_arg("b", 0.0, Some(6.0)),
            two_arg("c", 0.0, Some(7.9)),
            two_arg("d", 0.0, Some(22.0)),
            two_arg("e", 0.0, Some(12.0)),
        ];
        let counts = subjects_per_item(&estimates);

        let rows = segment_summary(&estimates, &[0.0, 6.0, 8.0, 22.0, 24.0], &counts);

        let counts_by_segment: Vec<(f64, usize)> =
            rows.iter().map(|r| (r.segment_start, r.count)).collect();
        assert_eq!(
            counts_by_segment,
            vec![(0.0, 1), (6.0, 2), (8.0, 1), (22.0, 1)]
        );
        let total: f64 = rows.iter().map(|r| r.percentage).sum();
        assert_relative_eq!(total, 100.0, epsilon = 1e-10);
    }

    #[test]
    fn test_naive_disagreement() {
        let estimates = vec![
            estimate("a", "hr", 0.0, PhaseMethod::NaiveArctan, Some(2.0)),
            two_arg("a", 0.0, Some(14.0)),
            estimate("b", "hr", 0.0, PhaseMethod::NaiveArctan, Some(3.0)),
            two_arg("b", 0.0, Some(3.0)),
            estimate("c", "hr", 0.0, PhaseMethod::NaiveArctan, None),
            two_arg("c", 0.0, None),
        ];

        let rows = naive_disagreement_summary(&estimates, 24.0, 1e-6);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].compared, 2);
        assert_eq!(rows[0].misplaced, 1);
        assert_relative_eq!(rows[0].misplaced_percentage, 50.0);
    }
}
