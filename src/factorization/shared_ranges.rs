//! Shared ranges: a chain of intermediate nodes for one Less predicate.
//!
//! A single merged sweep over both sorted sides keeps one current node. Every
//! node of the chain stands for a range of values and points at the next
//! (larger) range, so a left tuple attached to a node reaches every right
//! tuple hanging off that node or any later one. Linear in nodes and edges
//! after sorting.

use crate::{
    factorization::{
        common::{check_inputs, single_trailing_predicate, sort_stage},
        connector::NodeConnector,
        equality::split_by_equality,
        errors::{FactorizationError, FactorizationResult, Factorizer, GraphResultExt},
    },
    graph::{NodeId, StateGraph},
    predicate::{Predicate, PredicateKind},
};

const FACTORIZER: Factorizer = Factorizer::SharedRanges;

/// `predicates` holds equalities followed by exactly one inequality.
/// Only Less is supported.
pub fn factorize_inequality(
    conn: &mut NodeConnector<'_>,
    left: &[NodeId],
    right: &[NodeId],
    predicates: &[Predicate],
) -> FactorizationResult<()> {
    let (equalities, inequality) = single_trailing_predicate(
        predicates,
        &[PredicateKind::Less, PredicateKind::Greater],
        FACTORIZER,
    )?;
    if inequality.kind != PredicateKind::Less {
        return Err(FactorizationError::unsupported(
            FACTORIZER,
            inequality,
            "greater-than is not supported by shared ranges",
        ));
    }
    check_inputs(conn, left, right, predicates, FACTORIZER)?;
    log::debug!(
        "shared ranges: {} left, {} right, {} equalities, then `{inequality}`",
        left.len(),
        right.len(),
        equalities.len()
    );

    let mut sharer = RangeSharer {
        conn,
        intermediate_cnt: 0,
    };
    for (mut left_group, mut right_group) in
        split_by_equality(sharer.conn.graph(), left, right, equalities)?
    {
        sort_stage(sharer.conn.graph(), &mut left_group, inequality.left_attr);
        sort_stage(sharer.conn.graph(), &mut right_group, inequality.right_attr);
        sharer.share_inequality(&left_group, &right_group, inequality)?;
    }
    Ok(())
}

struct RangeSharer<'c, 'g> {
    conn: &'c mut NodeConnector<'g>,
    intermediate_cnt: usize,
}

impl RangeSharer<'_, '_> {
    fn next_label(&mut self) -> String {
        let label = format!("S{}", self.intermediate_cnt);
        self.intermediate_cnt += 1;
        label
    }

    /// Both sides must be sorted on the inequality attributes.
    fn share_inequality(
        &mut self,
        left: &[NodeId],
        right: &[NodeId],
        inequality: &Predicate,
    ) -> FactorizationResult<()> {
        let Some(&first_left) = left.first() else {
            return Ok(());
        };
        let left_val = |graph: &StateGraph, id: NodeId| graph.value(id, inequality.left_attr);
        let right_val = |graph: &StateGraph, id: NodeId| {
            graph.value(id, inequality.right_attr) + inequality.offset
        };

        // Right tuples at or below the smallest left value join nothing
        let start_val = left_val(self.conn.graph(), first_left);
        let skipped = right.partition_point(|&id| right_val(self.conn.graph(), id) <= start_val);
        if skipped == right.len() {
            return Ok(());
        }
        let right = &right[skipped..];

        let label = self.next_label();
        let mut current = self.conn.create_intermediate_node(&label);
        let (mut left_idx, mut right_idx) = (0, 0);
        // Whether `current` already feeds a right tuple
        let mut visited_right = false;

        while let Some(&right_node) = right.get(right_idx) {
            let read_left = left.get(left_idx).is_some_and(|&id| {
                let graph = self.conn.graph();
                left_val(graph, id) < right_val(graph, right_node)
            });

            if read_left {
                let left_node = left[left_idx];
                if visited_right {
                    // The next range hangs off the current one
                    let label = self.next_label();
                    let (_, next) = self
                        .conn
                        .connect_intermediate_nodes(Some(current), None, &label)
                        .in_factorizer(FACTORIZER)?;
                    current = next;
                    visited_right = false;
                }
                self.conn
                    .connect_left_to_intermediate(&[left_node], Some(current), "")
                    .in_factorizer(FACTORIZER)?;
                left_idx += 1;
            } else {
                self.conn
                    .connect_intermediate_to_right(Some(current), &[right_node], "")
                    .in_factorizer(FACTORIZER)?;
                visited_right = true;
                right_idx += 1;
            }
        }
        log::trace!(
            "share_inequality: {} chained nodes for {} left, {} right",
            self.intermediate_cnt,
            left.len(),
            right.len()
        );
        Ok(())
    }
}
