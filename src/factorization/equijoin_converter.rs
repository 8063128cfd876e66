//! Rewrites a one-layer factorization as an equijoin between two relations.
//!
//! Every intermediate node reached from the left stage gets a number. The
//! left relation gains one tuple per (left node, intermediate) edge and the
//! right relation one tuple per (intermediate, right node) edge, both
//! extended by a column `V<join_no>` holding that number. An equijoin on
//! the new column yields exactly the pairs the graph encodes, so any
//! equijoin engine can consume a theta-join this way.

use std::collections::{hash_map::Entry, HashMap};

use crate::{
    factorization::errors::{FactorizationError, FactorizationResult, Factorizer, GraphResultExt},
    graph::{errors::GraphError, NodeId, StateGraph},
    relation::Relation,
};

const FACTORIZER: Factorizer = Factorizer::EquijoinConverter;

/// Name of the join column added for the `join_no`-th join.
pub fn join_column(join_no: usize) -> String {
    format!("V{join_no}")
}

/// Converts the factorization hanging off `left_nodes` into a pair of
/// relations to be equijoined on [`join_column`].
///
/// Only graphs where every left edge enters an intermediate node and every
/// intermediate edge enters a payload node are accepted, which is what the
/// equality factorizer and binary partitioning of a single inequality build.
pub fn convert_to_equijoin(
    graph: &StateGraph,
    left_nodes: &[NodeId],
    left_relation: &Relation,
    right_relation: &Relation,
    join_no: usize,
) -> FactorizationResult<(Relation, Relation)> {
    let column = join_column(join_no);

    let mut left_schema = left_relation.schema.clone();
    left_schema.push(column.clone());
    let mut new_left = Relation::new(left_relation.id.clone(), left_schema);

    let mut right_schema = right_relation.schema.clone();
    right_schema.push(column);
    let mut new_right = Relation::new(format!("{}{join_no}'", right_relation.id), right_schema);

    // Intermediate nodes in the order they are first reached
    let mut numbering: HashMap<NodeId, usize> = HashMap::new();
    let mut intermediates: Vec<NodeId> = Vec::new();

    for &left_id in left_nodes {
        let node = graph
            .node(left_id)
            .ok_or(GraphError::UnknownNode(left_id))
            .in_factorizer(FACTORIZER)?;
        let tuple = node
            .payload()
            .ok_or(GraphError::MissingPayload(left_id))
            .in_factorizer(FACTORIZER)?;
        for decision in node.decisions().iter() {
            let middle = decision.target;
            if graph.tuple(middle).is_some() {
                return Err(FactorizationError::malformed(
                    FACTORIZER,
                    format!("left node {left_id} is directly connected to payload node {middle}"),
                ));
            }
            let middle_val = match numbering.entry(middle) {
                Entry::Occupied(e) => *e.get(),
                Entry::Vacant(e) => {
                    intermediates.push(middle);
                    *e.insert(intermediates.len() - 1)
                }
            };
            let mut values = tuple.values.clone();
            values.push(middle_val as f64);
            new_left.insert(values, tuple.cost);
        }
    }

    for (middle_val, &middle) in intermediates.iter().enumerate() {
        let node = graph
            .node(middle)
            .ok_or(GraphError::UnknownNode(middle))
            .in_factorizer(FACTORIZER)?;
        for decision in node.decisions().iter() {
            let Some(tuple) = graph.tuple(decision.target) else {
                return Err(FactorizationError::malformed(
                    FACTORIZER,
                    format!(
                        "intermediate node {middle} leads to intermediate node {}",
                        decision.target
                    ),
                ));
            };
            let mut values = tuple.values.clone();
            values.push(middle_val as f64);
            new_right.insert(values, tuple.cost);
        }
    }

    log::debug!(
        "convert_to_equijoin: {} intermediates, {} left tuples, {} right tuples",
        intermediates.len(),
        new_left.len(),
        new_right.len()
    );
    Ok((new_left, new_right))
}
