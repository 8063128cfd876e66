//! Randomized bijection and cost checks for every strategy.

use proptest::prelude::*;
use thetajoin::{
    factorization::NodeConnector,
    factorize,
    graph::paths::{join_paths, sorted_path_costs},
    FactorizationMethod, NodeId, Predicate, PredicateKind, StateGraph,
};

use super::fixtures::{assert_exact_encoding, brute_force_pairs, load_stage};

type Rows = Vec<(Vec<f64>, f64)>;

/// Two small-integer attributes, so ties are frequent and every offset
/// below is exactly representable.
fn arb_rows(max_len: usize) -> impl Strategy<Value = Rows> {
    prop::collection::vec(
        ((0u8..8, 0u8..5), 0u8..10)
            .prop_map(|((a, b), cost)| (vec![f64::from(a), f64::from(b)], f64::from(cost))),
        0..max_len,
    )
}

fn arb_offset() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), Just(1.0), Just(-2.0), Just(0.5)]
}

fn arb_single(kinds: &'static [PredicateKind]) -> impl Strategy<Value = Predicate> {
    (prop::sample::select(kinds), 0usize..2, 0usize..2, arb_offset()).prop_map(
        |(kind, la, ra, offset)| match kind {
            PredicateKind::Band => Predicate::band(la, ra, offset.abs() + 1.0),
            _ => Predicate::new(kind, la, ra, offset),
        },
    )
}

const TRAILING: &[PredicateKind] = &[
    PredicateKind::Less,
    PredicateKind::Greater,
    PredicateKind::NotEqual,
    PredicateKind::Band,
];

/// Up to one equality followed by `trailing` non-equality predicates.
fn arb_conjunction(trailing: usize) -> impl Strategy<Value = Vec<Predicate>> {
    (
        prop::option::of((0usize..2, 0usize..2)),
        prop::collection::vec(arb_single(TRAILING), trailing),
    )
        .prop_map(|(eq, rest)| {
            eq.map(|(la, ra)| Predicate::equal(la, ra))
                .into_iter()
                .chain(rest)
                .collect()
        })
}

fn build(left_rows: &Rows, right_rows: &Rows) -> (StateGraph, Vec<NodeId>, Vec<NodeId>) {
    let mut g = StateGraph::new();
    let left = load_stage(&mut g, "L", left_rows);
    let right = load_stage(&mut g, "R", right_rows);
    (g, left, right)
}

proptest! {
    #[test]
    fn binary_partitioning_encodes_conjunctions(
        left_rows in arb_rows(14),
        right_rows in arb_rows(14),
        conjunction in arb_conjunction(2),
    ) {
        let (mut g, left, right) = build(&left_rows, &right_rows);
        let mut conn = NodeConnector::plain(&mut g);
        factorize(&mut conn, &left, &right, &conjunction, FactorizationMethod::BinaryPart).unwrap();
        let expected = brute_force_pairs(&g, &left, &right, &conjunction);
        assert_exact_encoding(&g, &left, &expected);
    }

    #[test]
    fn multiway_partitioning_encodes_single_predicates(
        left_rows in arb_rows(20),
        right_rows in arb_rows(20),
        conjunction in arb_conjunction(1),
    ) {
        let (mut g, left, right) = build(&left_rows, &right_rows);
        let mut conn = NodeConnector::plain(&mut g);
        factorize(&mut conn, &left, &right, &conjunction, FactorizationMethod::MultiPart).unwrap();
        let expected = brute_force_pairs(&g, &left, &right, &conjunction);
        assert_exact_encoding(&g, &left, &expected);
    }

    #[test]
    fn strategies_agree_on_less_than(
        left_rows in arb_rows(20),
        right_rows in arb_rows(20),
        less in arb_single(&[PredicateKind::Less]),
        with_equality in any::<bool>(),
    ) {
        let conjunction: Vec<Predicate> = with_equality
            .then_some(Predicate::equal(1, 1))
            .into_iter()
            .chain([less])
            .collect();

        let mut costs = Vec::new();
        for method in [
            FactorizationMethod::BinaryPart,
            FactorizationMethod::MultiPart,
            FactorizationMethod::SharedRanges,
        ] {
            let (mut g, left, right) = build(&left_rows, &right_rows);
            let mut conn = NodeConnector::plain(&mut g);
            factorize(&mut conn, &left, &right, &conjunction, method).unwrap();
            let expected = brute_force_pairs(&g, &left, &right, &conjunction);
            assert_exact_encoding(&g, &left, &expected);
            costs.push(sorted_path_costs(&g, &left));
        }
        prop_assert_eq!(&costs[0], &costs[1]);
        prop_assert_eq!(&costs[1], &costs[2]);
    }

    #[test]
    fn chained_stages_sum_payload_costs(
        a_rows in arb_rows(8),
        b_rows in arb_rows(8),
        c_rows in arb_rows(8),
    ) {
        let mut g = StateGraph::new();
        let a = load_stage(&mut g, "A", &a_rows);
        let b = load_stage(&mut g, "B", &b_rows);
        let c = load_stage(&mut g, "C", &c_rows);
        let ab = [Predicate::less(0, 0)];
        let bc = [Predicate::equal(1, 1), Predicate::greater(0, 0)];

        let mut conn = NodeConnector::plain(&mut g);
        factorize(&mut conn, &a, &b, &ab, FactorizationMethod::Auto).unwrap();
        factorize(&mut conn, &b, &c, &bc, FactorizationMethod::Auto).unwrap();

        // Cost of a -> b -> c is b's cost plus c's cost
        let mut expected = Vec::new();
        for (source, mid) in brute_force_pairs(&g, &a, &b, &ab) {
            for (_, target) in brute_force_pairs(&g, &[mid], &c, &bc) {
                expected.push((source, target, g.entry_cost(mid) + g.entry_cost(target)));
            }
        }
        let mut actual = Vec::new();
        for first in join_paths(&g, &a) {
            for second in join_paths(&g, &[first.target]) {
                actual.push((first.source, second.target, first.cost + second.cost));
            }
        }
        let key = |t: &(NodeId, NodeId, f64)| (t.0, t.1, t.2.to_bits());
        expected.sort_by_key(key);
        actual.sort_by_key(key);
        prop_assert_eq!(actual, expected);
    }
}
