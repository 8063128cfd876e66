//! Translation of a band predicate `|L[a] - R[b]| < eps` into inequalities.
//!
//! The sorted right stage is cut into maximal runs spanning at most `eps`.
//! For a run `[s, e]`, left tuples in `[s - eps, s + eps)` can only fail the
//! band from below, so `L[a] > R[b] - eps` decides them; left tuples in
//! `[s + eps, e + eps]` can only fail it from above, so `L[a] < R[b] + eps`
//! decides them. Every other left tuple is out of reach of the run.
//!
//! The rewritten inequalities add `eps` where the band itself subtracts, so
//! the encoding matches `|L[a] - R[b]| < eps` exactly only when both sides
//! are computed without rounding. Values near the boundary with inexact
//! decimal parts (e.g. `6.1 - -20.4` against `26.5`) may land on either side.

use crate::{
    factorization::common::{binary_search_max, binary_search_min},
    graph::{NodeId, StateGraph},
    predicate::{Predicate, PredicateKind},
};

/// An inequality that covers the band on one left/right sub-range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandGroup<'a> {
    pub inequality: Predicate,
    pub left: &'a [NodeId],
    pub right: &'a [NodeId],
}

/// Both stages must be sorted on the band attributes.
pub fn band_grouping<'a>(
    graph: &StateGraph,
    left: &'a [NodeId],
    right: &'a [NodeId],
    band: &Predicate,
) -> Vec<BandGroup<'a>> {
    let epsilon = band.offset;
    let greater_than = Predicate::new(
        PredicateKind::Greater,
        band.left_attr,
        band.right_attr,
        -epsilon,
    );
    let less_than = Predicate::new(PredicateKind::Less, band.left_attr, band.right_attr, epsilon);

    let mut res = Vec::new();
    for right_group in split_by_epsilon(graph, right, band.right_attr, epsilon) {
        let (Some(&first), Some(&last)) = (right_group.first(), right_group.last()) else {
            continue;
        };
        let group_start_val = graph.value(first, band.right_attr);
        let group_end_val = graph.value(last, band.right_attr);

        let start = binary_search_min(graph, left, band.left_attr, group_start_val - epsilon, true);
        let end = binary_search_max(graph, left, band.left_attr, group_start_val + epsilon, false);
        if let (Some(start), Some(end)) = (start, end) {
            if start <= end {
                res.push(BandGroup {
                    inequality: greater_than,
                    left: &left[start..=end],
                    right: right_group,
                });
            }
        }

        let start = binary_search_min(graph, left, band.left_attr, group_start_val + epsilon, true);
        let end = binary_search_max(graph, left, band.left_attr, group_end_val + epsilon, true);
        if let (Some(start), Some(end)) = (start, end) {
            if start <= end {
                res.push(BandGroup {
                    inequality: less_than,
                    left: &left[start..=end],
                    right: right_group,
                });
            }
        }
    }
    log::trace!(
        "band_grouping: {} left, {} right -> {} inequality groups",
        left.len(),
        right.len(),
        res.len()
    );
    res
}

/// Cuts a sorted stage into maximal runs whose values lie within
/// `[run_start, run_start + epsilon]`. Runs are views into `stage`.
pub fn split_by_epsilon<'a>(
    graph: &StateGraph,
    stage: &'a [NodeId],
    attr: usize,
    epsilon: f64,
) -> Vec<&'a [NodeId]> {
    let mut res = Vec::new();
    let Some(&first) = stage.first() else {
        return res;
    };
    let mut group_start_idx = 0;
    let mut group_start_value = graph.value(first, attr);
    for (current_idx, &id) in stage.iter().enumerate().skip(1) {
        let current_val = graph.value(id, attr);
        if current_val > group_start_value + epsilon {
            res.push(&stage[group_start_idx..current_idx]);
            group_start_idx = current_idx;
            group_start_value = current_val;
        }
    }
    res.push(&stage[group_start_idx..]);
    res
}
