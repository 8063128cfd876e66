//! Multiway partitioning for a single inequality, non-equality or band.
//!
//! Instead of halving, every recursion level cuts the sorted ranges into
//! about `sqrt(d)` partitions of `sqrt(d)` distinct values each. Partition
//! `j` is linked to every partition `i` it dominates through one source node
//! per left partition and one target node per right partition, so a level
//! costs O(sqrt(d)) nodes and O(d) edges, and the recursion depth is
//! O(log log d). Unlike binary partitioning there is no support for further
//! predicates after the one handled here.

use crate::{
    factorization::{
        band::band_grouping,
        common::{
            check_inputs, count_distinct_vals, single_trailing_predicate, sort_stage,
            split_by_distinct,
        },
        connector::NodeConnector,
        equality::split_by_equality,
        errors::{FactorizationError, FactorizationResult, Factorizer, GraphResultExt},
    },
    graph::NodeId,
    predicate::{Predicate, PredicateKind},
};

const FACTORIZER: Factorizer = Factorizer::MultiwayPartitioning;

/// `predicates` holds equalities followed by exactly one Less or Greater.
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
    factorize_groups(conn, left, right, predicates, equalities, inequality, |rec, l, r| {
        rec.partition_inequality_rec(l, r, inequality)
    })
}

/// `predicates` holds equalities followed by exactly one NotEqual, handled
/// as a Less plus a Greater.
pub fn factorize_nonequality(
    conn: &mut NodeConnector<'_>,
    left: &[NodeId],
    right: &[NodeId],
    predicates: &[Predicate],
) -> FactorizationResult<()> {
    let (equalities, nonequality) =
        single_trailing_predicate(predicates, &[PredicateKind::NotEqual], FACTORIZER)?;
    let less_than = nonequality.with_kind(PredicateKind::Less);
    let greater_than = nonequality.with_kind(PredicateKind::Greater);
    factorize_groups(conn, left, right, predicates, equalities, nonequality, |rec, l, r| {
        rec.partition_inequality_rec(l, r, &less_than)?;
        rec.partition_inequality_rec(l, r, &greater_than)
    })
}

/// `predicates` holds equalities followed by exactly one Band, translated
/// into inequality groups first.
pub fn factorize_band(
    conn: &mut NodeConnector<'_>,
    left: &[NodeId],
    right: &[NodeId],
    predicates: &[Predicate],
) -> FactorizationResult<()> {
    let (equalities, band) =
        single_trailing_predicate(predicates, &[PredicateKind::Band], FACTORIZER)?;
    factorize_groups(conn, left, right, predicates, equalities, band, |rec, l, r| {
        for group in band_grouping(rec.conn.graph(), l, r, band) {
            rec.partition_inequality_rec(group.left, group.right, &group.inequality)?;
        }
        Ok(())
    })
}

/// Shared entry: validates, splits by equality, sorts each group on the
/// trailing predicate's attributes and hands it to `handle`.
fn factorize_groups<F>(
    conn: &mut NodeConnector<'_>,
    left: &[NodeId],
    right: &[NodeId],
    predicates: &[Predicate],
    equalities: &[Predicate],
    trailing: &Predicate,
    mut handle: F,
) -> FactorizationResult<()>
where
    F: FnMut(&mut MultiwayPartitioner<'_, '_>, &[NodeId], &[NodeId]) -> FactorizationResult<()>,
{
    check_inputs(conn, left, right, predicates, FACTORIZER)?;
    log::debug!(
        "multiway partitioning: {} left, {} right, {} equalities, then `{trailing}`",
        left.len(),
        right.len(),
        equalities.len()
    );

    let groups = split_by_equality(conn.graph(), left, right, equalities)?;
    let mut rec = MultiwayPartitioner { conn, rec_step: 0 };
    for (mut left_group, mut right_group) in groups {
        // Groups are owned copies, sorting them leaves the caller's order intact
        sort_stage(rec.conn.graph(), &mut left_group, trailing.left_attr);
        sort_stage(rec.conn.graph(), &mut right_group, trailing.right_attr);
        handle(&mut rec, &left_group, &right_group)?;
    }
    Ok(())
}

struct MultiwayPartitioner<'c, 'g> {
    conn: &'c mut NodeConnector<'g>,
    /// Names the intermediate nodes of one recursion step.
    rec_step: u64,
}

impl MultiwayPartitioner<'_, '_> {
    /// Both ranges must be sorted on the inequality attributes.
    fn partition_inequality_rec(
        &mut self,
        left: &[NodeId],
        right: &[NodeId],
        inequality: &Predicate,
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
        let sqrt = (distinct_cnt as f64).sqrt();
        let partitions = split_by_distinct(
            graph,
            left,
            right,
            inequality,
            sqrt.ceil() as usize,
            sqrt.floor() as usize,
        );
        self.rec_step += 1;
        let step = self.rec_step;
        log::trace!(
            "multiway step {step}: {distinct_cnt} distinct values in {} partitions",
            partitions.len()
        );

        // Lazily materialized per-partition nodes, reused across all pairs
        let mut sources: Vec<Option<NodeId>> = vec![None; partitions.len()];
        let mut targets: Vec<Option<NodeId>> = vec![None; partitions.len()];

        for (i, part_i) in partitions.iter().enumerate() {
            match inequality.kind {
                // Every earlier left partition reaches the current right partition
                PredicateKind::Less if !part_i.right.is_empty() => {
                    for (j, part_j) in partitions[..i].iter().enumerate() {
                        if part_j.left.is_empty() {
                            continue;
                        }
                        let source = self.source_node(&mut sources, j, part_j.left, step)?;
                        let target = self.target_node(&mut targets, i, part_i.right, step)?;
                        self.conn
                            .connect_intermediate_nodes(Some(source), Some(target), "")
                            .in_factorizer(FACTORIZER)?;
                    }
                }
                // The current left partition reaches every earlier right partition
                PredicateKind::Greater if !part_i.left.is_empty() => {
                    for (j, part_j) in partitions[..i].iter().enumerate() {
                        if part_j.right.is_empty() {
                            continue;
                        }
                        let source = self.source_node(&mut sources, i, part_i.left, step)?;
                        let target = self.target_node(&mut targets, j, part_j.right, step)?;
                        self.conn
                            .connect_intermediate_nodes(Some(source), Some(target), "")
                            .in_factorizer(FACTORIZER)?;
                    }
                }
                PredicateKind::Less | PredicateKind::Greater => {}
                _ => {
                    return Err(FactorizationError::unsupported(
                        FACTORIZER,
                        inequality,
                        "expected an inequality",
                    ));
                }
            }

            if !part_i.left.is_empty() && !part_i.right.is_empty() {
                self.partition_inequality_rec(part_i.left, part_i.right, inequality)?;
            }
        }
        Ok(())
    }

    fn source_node(
        &mut self,
        sources: &mut [Option<NodeId>],
        idx: usize,
        left: &[NodeId],
        step: u64,
    ) -> FactorizationResult<NodeId> {
        if let Some(id) = sources[idx] {
            return Ok(id);
        }
        let id = self
            .conn
            .connect_left_to_intermediate(left, None, &format!("X{step}_{idx}"))
            .in_factorizer(FACTORIZER)?;
        sources[idx] = Some(id);
        Ok(id)
    }

    fn target_node(
        &mut self,
        targets: &mut [Option<NodeId>],
        idx: usize,
        right: &[NodeId],
        step: u64,
    ) -> FactorizationResult<NodeId> {
        if let Some(id) = targets[idx] {
            return Ok(id);
        }
        let id = self
            .conn
            .connect_intermediate_to_right(None, right, &format!("Y{step}_{idx}"))
            .in_factorizer(FACTORIZER)?;
        targets[idx] = Some(id);
        Ok(id)
    }
}
