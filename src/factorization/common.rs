//! Search, sort and partition helpers shared by the factorizers.
//!
//! "Stages" are slices of payload node ids. Unless stated otherwise a stage
//! passed here must already be sorted ascending on the attribute in question;
//! right-side values are always shifted by the predicate offset.

use crate::{
    factorization::{
        connector::NodeConnector,
        errors::{FactorizationError, FactorizationResult, Factorizer, GraphResultExt},
    },
    graph::{errors::GraphError, NodeId, StateGraph},
    predicate::{split_leading_equalities, Predicate, PredicateKind},
};

/// Largest index whose value is `< max_val` (or `<=` when `inclusive`).
pub fn binary_search_max(
    graph: &StateGraph,
    stage: &[NodeId],
    attr: usize,
    max_val: f64,
    inclusive: bool,
) -> Option<usize> {
    let end = stage.partition_point(|&id| {
        let v = graph.value(id, attr);
        if inclusive {
            v <= max_val
        } else {
            v < max_val
        }
    });
    end.checked_sub(1)
}

/// Smallest index whose value is `> min_val` (or `>=` when `inclusive`).
pub fn binary_search_min(
    graph: &StateGraph,
    stage: &[NodeId],
    attr: usize,
    min_val: f64,
    inclusive: bool,
) -> Option<usize> {
    let start = stage.partition_point(|&id| {
        let v = graph.value(id, attr);
        if inclusive {
            v < min_val
        } else {
            v <= min_val
        }
    });
    (start < stage.len()).then_some(start)
}

/// Stable in-place sort on one attribute.
pub fn sort_stage(graph: &StateGraph, stage: &mut [NodeId], attr: usize) {
    stage.sort_by(|&a, &b| graph.value(a, attr).total_cmp(&graph.value(b, attr)));
}

/// A sorted copy, leaving the caller's order untouched.
pub fn sorted_view(graph: &StateGraph, stage: &[NodeId], attr: usize) -> Vec<NodeId> {
    let mut copy = stage.to_vec();
    sort_stage(graph, &mut copy, attr);
    copy
}

/// Walks two sorted stages in merged value order. On ties the right side
/// goes first.
struct MergedValues<'a> {
    graph: &'a StateGraph,
    left: &'a [NodeId],
    right: &'a [NodeId],
    left_attr: usize,
    right_attr: usize,
    right_offset: f64,
    i: usize,
    j: usize,
}

impl<'a> MergedValues<'a> {
    fn new(
        graph: &'a StateGraph,
        left: &'a [NodeId],
        right: &'a [NodeId],
        left_attr: usize,
        right_attr: usize,
        right_offset: f64,
    ) -> Self {
        Self {
            graph,
            left,
            right,
            left_attr,
            right_attr,
            right_offset,
            i: 0,
            j: 0,
        }
    }

    fn peek(&self) -> Option<(bool, f64)> {
        let next_left = self.left.get(self.i).map(|&id| self.graph.value(id, self.left_attr));
        let next_right = self
            .right
            .get(self.j)
            .map(|&id| self.graph.value(id, self.right_attr) + self.right_offset);
        match (next_left, next_right) {
            (None, None) => None,
            (Some(l), None) => Some((true, l)),
            (None, Some(r)) => Some((false, r)),
            (Some(l), Some(r)) if l < r => Some((true, l)),
            (Some(_), Some(r)) => Some((false, r)),
        }
    }

    fn advance(&mut self, read_left: bool) {
        if read_left {
            self.i += 1;
        } else {
            self.j += 1;
        }
    }
}

impl Iterator for MergedValues<'_> {
    /// (read from left, value)
    type Item = (bool, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.peek()?;
        self.advance(next.0);
        Some(next)
    }
}

/// Number of distinct values across both sorted stages, with `right_offset`
/// added to every right value.
pub fn count_distinct_vals(
    graph: &StateGraph,
    left: &[NodeId],
    right: &[NodeId],
    left_attr: usize,
    right_attr: usize,
    right_offset: f64,
) -> usize {
    let mut last_val: Option<f64> = None;
    let mut cnt = 0;
    for (_, val) in MergedValues::new(graph, left, right, left_attr, right_attr, right_offset) {
        if last_val != Some(val) {
            cnt += 1;
            last_val = Some(val);
        }
    }
    cnt
}

/// A contiguous left/right range of two sorted stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition<'a> {
    pub left: &'a [NodeId],
    pub right: &'a [NodeId],
}

/// Splits two sorted stages into at most `no_partitions` ranges ordered by
/// value, the first ones holding `max_values_per_partition` distinct values
/// each and the last one the remainder. Equal values never straddle a
/// boundary, so every value in partition `i` is strictly below every value
/// in partition `i + 1`.
pub fn split_by_distinct<'a>(
    graph: &StateGraph,
    left: &'a [NodeId],
    right: &'a [NodeId],
    inequality: &Predicate,
    no_partitions: usize,
    max_values_per_partition: usize,
) -> Vec<Partition<'a>> {
    let max_values_per_partition = max_values_per_partition.max(1);
    let mut res = Vec::with_capacity(no_partitions.max(1));
    let mut merged = MergedValues::new(
        graph,
        left,
        right,
        inequality.left_attr,
        inequality.right_attr,
        inequality.offset,
    );
    let (mut pstart_left, mut pstart_right) = (0, 0);
    let mut current_distinct_cnt = 0;
    let mut last_val: Option<f64> = None;

    // All but the last partition come out of one merged scan
    while no_partitions > 1 {
        let Some((read_left, val)) = merged.peek() else {
            break;
        };
        if last_val != Some(val) {
            if current_distinct_cnt == max_values_per_partition {
                res.push(Partition {
                    left: &left[pstart_left..merged.i],
                    right: &right[pstart_right..merged.j],
                });
                current_distinct_cnt = 0;
                pstart_left = merged.i;
                pstart_right = merged.j;
                if res.len() == no_partitions - 1 {
                    break;
                }
            }
            current_distinct_cnt += 1;
        }
        last_val = Some(val);
        merged.advance(read_left);
    }

    res.push(Partition {
        left: &left[pstart_left..],
        right: &right[pstart_right..],
    });
    res
}

/// Splits a conjunction into its leading equalities and the single
/// predicate that must follow them, which has to be one of `accepted`.
pub(crate) fn single_trailing_predicate<'p>(
    predicates: &'p [Predicate],
    accepted: &[PredicateKind],
    factorizer: Factorizer,
) -> FactorizationResult<(&'p [Predicate], &'p Predicate)> {
    let (equalities, rest) = split_leading_equalities(predicates);
    match rest {
        [] => Err(FactorizationError::malformed(
            factorizer,
            "expected a predicate after the equalities",
        )),
        [last] if accepted.contains(&last.kind) => Ok((equalities, last)),
        [last] => Err(FactorizationError::unsupported(
            factorizer,
            last,
            format!("{factorizer} does not handle {:?} predicates here", last.kind),
        )),
        [_, extra, ..] => Err(FactorizationError::unsupported(
            factorizer,
            extra,
            "only a single predicate may follow the equalities",
        )),
    }
}

/// Checks everything the factorizers assume about their input before any
/// edge gets added: node ids exist and carry payloads, predicate attributes
/// are in range and not NaN, offsets are not NaN, and left nodes own the
/// branch the connector writes to.
pub(crate) fn check_inputs(
    conn: &NodeConnector<'_>,
    left: &[NodeId],
    right: &[NodeId],
    predicates: &[Predicate],
    factorizer: Factorizer,
) -> FactorizationResult<()> {
    let graph = conn.graph();
    if let Some(p) = predicates.iter().find(|p| p.offset.is_nan()) {
        return Err(FactorizationError::malformed(
            factorizer,
            format!("predicate `{p}` has a NaN offset"),
        ));
    }
    let branch = conn.left_branch();
    for &id in left {
        check_node(graph, id, predicates.iter().map(|p| p.left_attr), factorizer)?;
        let branches = graph
            .node(id)
            .map_or(0, |node| node.decisions().branches());
        if branch >= branches {
            return Err(FactorizationError::graph(
                factorizer,
                GraphError::BranchOutOfRange {
                    node: id,
                    branch,
                    branches,
                },
            ));
        }
    }
    for &id in right {
        check_node(graph, id, predicates.iter().map(|p| p.right_attr), factorizer)?;
    }
    Ok(())
}

fn check_node(
    graph: &StateGraph,
    id: NodeId,
    attrs: impl Iterator<Item = usize>,
    factorizer: Factorizer,
) -> FactorizationResult<()> {
    if graph.tuple(id).is_none() {
        // Distinguishes unknown ids from payload-less ones.
        graph.attribute(id, 0).in_factorizer(factorizer)?;
    }
    for attr in attrs {
        let val = graph.attribute(id, attr).in_factorizer(factorizer)?;
        if val.is_nan() {
            return Err(FactorizationError::malformed(
                factorizer,
                format!("node {id} has a NaN value in attribute {attr}"),
            ));
        }
    }
    Ok(())
}
