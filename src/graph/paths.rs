//! Exhaustive walk over factorized join paths.
//!
//! Starting from a set of payload nodes, follows decisions through
//! payload-less nodes only and stops at the first payload node reached.
//! Each walk yields one (source, target, cost) triple, where the cost is the
//! sum of the edge costs along the way. Enumerates every path, so the output
//! is as large as the join result; meant for diagnostics and tests.

use crate::graph::{NodeId, StateGraph};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinPath {
    pub source: NodeId,
    pub target: NodeId,
    pub cost: f64,
}

pub fn join_paths(graph: &StateGraph, sources: &[NodeId]) -> Vec<JoinPath> {
    let mut res = Vec::new();
    // (node, cost so far)
    let mut stack: Vec<(NodeId, f64)> = Vec::new();
    for &source in sources {
        let Some(node) = graph.node(source) else {
            continue;
        };
        stack.extend(node.decisions().iter().map(|d| (d.target, d.cost)));
        while let Some((current, cost)) = stack.pop() {
            let Some(node) = graph.node(current) else {
                continue;
            };
            if !node.is_intermediate() {
                res.push(JoinPath {
                    source,
                    target: current,
                    cost,
                });
                continue;
            }
            stack.extend(node.decisions().iter().map(|d| (d.target, cost + d.cost)));
        }
    }
    res
}

/// Reached (source, target) pairs, sorted, duplicates kept.
pub fn reachable_pairs(graph: &StateGraph, sources: &[NodeId]) -> Vec<(NodeId, NodeId)> {
    let mut pairs: Vec<_> = join_paths(graph, sources)
        .into_iter()
        .map(|p| (p.source, p.target))
        .collect();
    pairs.sort();
    pairs
}

/// Path costs in non-decreasing order.
pub fn sorted_path_costs(graph: &StateGraph, sources: &[NodeId]) -> Vec<f64> {
    let mut costs: Vec<f64> = join_paths(graph, sources).iter().map(|p| p.cost).collect();
    costs.sort_by(f64::total_cmp);
    costs
}
