//! Equality grouping.
//!
//! Tuples of both sides are hashed on the ordered tuple of their equality
//! attributes; each key present on both sides becomes one left/right group.
//! Bridging every group through a single intermediate node encodes an
//! equijoin with one intermediate layer in O(n) expected time and space.

use std::collections::HashMap;

use crate::{
    factorization::{
        common::check_inputs,
        connector::NodeConnector,
        errors::{FactorizationError, FactorizationResult, Factorizer, GraphResultExt},
    },
    graph::{NodeId, StateGraph},
    predicate::Predicate,
};

/// Left and right nodes that share one equality key.
pub type EqualityGroup = (Vec<NodeId>, Vec<NodeId>);

/// Hash key: the bit patterns of the join values. `+ 0.0` folds -0.0 into 0.0.
type JoinKey = Vec<u64>;

fn join_key(values: impl Iterator<Item = f64>) -> JoinKey {
    values.map(|v| (v + 0.0).to_bits()).collect()
}

/// Builds one intermediate node per matching equality group and connects
/// the group's left nodes to it and it to the group's right nodes.
pub fn factorize_equality(
    conn: &mut NodeConnector<'_>,
    left: &[NodeId],
    right: &[NodeId],
    equalities: &[Predicate],
) -> FactorizationResult<()> {
    check_inputs(conn, left, right, equalities, Factorizer::Equality)?;
    log::debug!(
        "factorize_equality: {} left, {} right, {} equalities",
        left.len(),
        right.len(),
        equalities.len()
    );

    let groups = split_by_equality(conn.graph(), left, right, equalities)?;
    for (intmd_cnt, (left_group, right_group)) in groups.iter().enumerate() {
        if left_group.is_empty() || right_group.is_empty() {
            continue;
        }
        let label = format!("I{intmd_cnt}");
        let intermediate = conn
            .connect_left_to_intermediate(left_group, None, &label)
            .in_factorizer(Factorizer::Equality)?;
        conn.connect_intermediate_to_right(Some(intermediate), right_group, &label)
            .in_factorizer(Factorizer::Equality)?;
    }
    Ok(())
}

/// Partitions both sides into disjoint groups with equal join keys.
///
/// Without equalities the result is a single group holding everything.
/// Groups come out in the order their key first appears on the left, node
/// order inside a group follows the input order. The right side is shifted
/// by each predicate's offset, so `L[a] = R[b] + c` groups `L[a]` with
/// `R[b] + c`.
pub fn split_by_equality(
    graph: &StateGraph,
    left: &[NodeId],
    right: &[NodeId],
    equalities: &[Predicate],
) -> FactorizationResult<Vec<EqualityGroup>> {
    if equalities.is_empty() {
        return Ok(vec![(left.to_vec(), right.to_vec())]);
    }
    if let Some(p) = equalities.iter().find(|p| !p.is_equality()) {
        return Err(FactorizationError::malformed(
            Factorizer::Equality,
            format!("expected only equality predicates, found `{p}`"),
        ));
    }

    let mut right_hash: HashMap<JoinKey, Vec<NodeId>> = HashMap::new();
    for &id in right {
        let key = join_key(
            equalities
                .iter()
                .map(|p| graph.value(id, p.right_attr) + p.offset),
        );
        right_hash.entry(key).or_default().push(id);
    }

    let mut left_index: HashMap<JoinKey, usize> = HashMap::new();
    let mut left_groups: Vec<(JoinKey, Vec<NodeId>)> = Vec::new();
    for &id in left {
        let key = join_key(equalities.iter().map(|p| graph.value(id, p.left_attr)));
        match left_index.get(&key) {
            Some(&idx) => left_groups[idx].1.push(id),
            None => {
                left_index.insert(key.clone(), left_groups.len());
                left_groups.push((key, vec![id]));
            }
        }
    }

    let res = left_groups
        .into_iter()
        .filter_map(|(key, left_group)| {
            right_hash
                .remove(&key)
                .map(|right_group| (left_group, right_group))
        })
        .collect();
    Ok(res)
}
