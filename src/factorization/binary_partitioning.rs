//! Binary partitioning: factorizes a whole conjunction of predicates.
//!
//! Each inequality is handled by recursively halving both sides on distinct
//! values. At every level the pair of halves that satisfies the inequality
//! is passed on to the next predicate of the conjunction; once no predicate
//! is left the surviving ranges are bridged through one intermediate node.
//! With `p` non-equality predicates this takes O(n (log n)^p) time and space.

use crate::{
    factorization::{
        band::band_grouping,
        common::{check_inputs, count_distinct_vals, sorted_view, split_by_distinct},
        connector::NodeConnector,
        equality::split_by_equality,
        errors::{FactorizationError, FactorizationResult, Factorizer, GraphResultExt},
    },
    graph::NodeId,
    predicate::{split_leading_equalities, Predicate, PredicateKind},
};

const FACTORIZER: Factorizer = Factorizer::BinaryPartitioning;

/// Factorizes `left ⋈ right` under `predicates`, a conjunction with all
/// equalities at its head.
pub fn factorize_conjunction(
    conn: &mut NodeConnector<'_>,
    left: &[NodeId],
    right: &[NodeId],
    predicates: &[Predicate],
) -> FactorizationResult<()> {
    check_inputs(conn, left, right, predicates, FACTORIZER)?;
    log::debug!(
        "factorize_conjunction: {} left, {} right, predicates [{}]",
        left.len(),
        right.len(),
        predicates
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let (equalities, rest) = split_leading_equalities(predicates);
    if let Some(p) = rest.iter().find(|p| p.is_equality()) {
        return Err(FactorizationError::malformed(
            FACTORIZER,
            format!("equality `{p}` must precede all other predicates"),
        ));
    }

    let mut rec = BinaryPartitioner {
        conn,
        rec_step_id: 0,
    };
    for (left_group, right_group) in split_by_equality(rec.conn.graph(), left, right, equalities)? {
        rec.factorize_next_condition(&left_group, &right_group, rest)?;
    }
    Ok(())
}

struct BinaryPartitioner<'c, 'g> {
    conn: &'c mut NodeConnector<'g>,
    /// Names the intermediate nodes.
    rec_step_id: u64,
}

impl BinaryPartitioner<'_, '_> {
    /// Handles the first of `predicates` or, when none is left, connects the
    /// two ranges, which then satisfy the whole conjunction.
    fn factorize_next_condition(
        &mut self,
        left: &[NodeId],
        right: &[NodeId],
        predicates: &[Predicate],
    ) -> FactorizationResult<()> {
        if left.is_empty() || right.is_empty() {
            return Ok(());
        }
        let Some((next, rest)) = predicates.split_first() else {
            self.rec_step_id += 1;
            let label = format!("X{}", self.rec_step_id);
            let intermediate = self
                .conn
                .connect_left_to_intermediate(left, None, &label)
                .in_factorizer(FACTORIZER)?;
            self.conn
                .connect_intermediate_to_right(Some(intermediate), right, &label)
                .in_factorizer(FACTORIZER)?;
            return Ok(());
        };

        // The caller's ranges stay sorted on the previous predicate
        let graph = self.conn.graph();
        let sorted_left = sorted_view(graph, left, next.left_attr);
        let sorted_right = sorted_view(graph, right, next.right_attr);

        match next.kind {
            PredicateKind::Less | PredicateKind::Greater => {
                self.partition_inequality_rec(&sorted_left, &sorted_right, next, rest)
            }
            PredicateKind::NotEqual => {
                let less_than = next.with_kind(PredicateKind::Less);
                self.partition_inequality_rec(&sorted_left, &sorted_right, &less_than, rest)?;
                let greater_than = next.with_kind(PredicateKind::Greater);
                self.partition_inequality_rec(&sorted_left, &sorted_right, &greater_than, rest)
            }
            PredicateKind::Band => {
                let groups = band_grouping(self.conn.graph(), &sorted_left, &sorted_right, next);
                for group in groups {
                    self.partition_inequality_rec(group.left, group.right, &group.inequality, rest)?;
                }
                Ok(())
            }
            PredicateKind::Equal => Err(FactorizationError::malformed(
                FACTORIZER,
                format!("equality `{next}` must precede all other predicates"),
            )),
        }
    }

    /// Both ranges must be sorted on the inequality attributes.
    fn partition_inequality_rec(
        &mut self,
        left: &[NodeId],
        right: &[NodeId],
        inequality: &Predicate,
        remaining: &[Predicate],
    ) -> FactorizationResult<()> {
        let graph = self.conn.graph();
        let distinct_cnt = count_distinct_vals(
            graph,
            left,
            right,
            inequality.left_attr,
            inequality.right_attr,
            inequality.offset,
        );
        if distinct_cnt <= 1 {
            return Ok(());
        }

        let partitions = split_by_distinct(graph, left, right, inequality, 2, distinct_cnt / 2);
        let [low, high] = partitions[..] else {
            return Err(FactorizationError::malformed(
                FACTORIZER,
                format!("expected 2 partitions, got {}", partitions.len()),
            ));
        };
        log::trace!(
            "partition_inequality_rec: {distinct_cnt} distinct values, low {}+{}, high {}+{}",
            low.left.len(),
            low.right.len(),
            high.left.len(),
            high.right.len()
        );

        match inequality.kind {
            // Everything in the low half is below everything in the high half
            PredicateKind::Less => self.factorize_next_condition(low.left, high.right, remaining)?,
            PredicateKind::Greater => {
                self.factorize_next_condition(high.left, low.right, remaining)?
            }
            _ => {
                return Err(FactorizationError::unsupported(
                    FACTORIZER,
                    inequality,
                    "expected an inequality",
                ));
            }
        }

        if !low.left.is_empty() && !low.right.is_empty() {
            self.partition_inequality_rec(low.left, low.right, inequality, remaining)?;
        }
        if !high.left.is_empty() && !high.right.is_empty() {
            self.partition_inequality_rec(high.left, high.right, inequality, remaining)?;
        }
        Ok(())
    }
}
