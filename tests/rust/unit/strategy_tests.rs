//! Cross-strategy agreement, size growth and branched stages.

use test_case::test_case;
use thetajoin::{
    factorization::NodeConnector,
    factorize, factorize_dnf,
    graph::paths::{reachable_pairs, sorted_path_costs},
    FactorizationConfig, FactorizationMethod, NodeMode, Predicate, StateGraph, Tuple,
};

use super::fixtures::{assert_exact_encoding, brute_force_pairs, load_stage, scalar_rows};

/// `n` rows with `n / 2` distinct values in a scrambled order.
fn scrambled_rows(n: usize) -> Vec<(f64, f64)> {
    (0..n)
        .map(|i| (((i * 37) % (n / 2).max(1)) as f64, (i % 7) as f64))
        .collect()
}

fn edges_for(method: FactorizationMethod, predicate: Predicate, n: usize) -> usize {
    let mut g = StateGraph::new();
    let rows: Vec<(f64, f64)> = (0..n).map(|i| (i as f64, 0.0)).collect();
    let left = load_stage(&mut g, "L", &scalar_rows(&rows));
    let right = load_stage(&mut g, "R", &scalar_rows(&rows));
    let mut conn = NodeConnector::plain(&mut g);
    factorize(&mut conn, &left, &right, &[predicate], method).unwrap();
    g.edge_count()
}

#[test]
fn test_strategies_agree_on_path_costs() {
    let mut costs = Vec::new();
    for method in [
        FactorizationMethod::BinaryPart,
        FactorizationMethod::MultiPart,
        FactorizationMethod::SharedRanges,
    ] {
        let mut g = StateGraph::new();
        let left = load_stage(&mut g, "L", &scalar_rows(&scrambled_rows(60)));
        let right = load_stage(&mut g, "R", &scalar_rows(&scrambled_rows(45)));
        let less = [Predicate::less(0, 0).with_offset(1.0)];

        let mut conn = NodeConnector::plain(&mut g);
        factorize(&mut conn, &left, &right, &less, method).unwrap();
        let expected = brute_force_pairs(&g, &left, &right, &less);
        assert_exact_encoding(&g, &left, &expected);
        costs.push(sorted_path_costs(&g, &left));
    }
    assert_eq!(costs[0], costs[1]);
    assert_eq!(costs[1], costs[2]);
}

#[test_case(FactorizationMethod::BinaryPart, 3.0 ; "binary partitioning")]
#[test_case(FactorizationMethod::MultiPart, 3.0 ; "multiway partitioning")]
#[test_case(FactorizationMethod::SharedRanges, 2.5 ; "shared ranges")]
fn test_edges_grow_subquadratically(method: FactorizationMethod, max_ratio: f64) {
    let less = Predicate::less(0, 0);
    let small = edges_for(method, less, 256);
    let large = edges_for(method, less, 512);

    assert!(small > 0);
    let ratio = large as f64 / small as f64;
    assert!(ratio < max_ratio, "{method}: {small} -> {large} edges");
    // The join itself has 512 * 511 / 2 pairs
    assert!(large < 512 * 511 / 8, "{method}: {large} edges");
}

#[test]
fn test_multiway_uses_fewer_edges_than_binary() {
    let less = Predicate::less(0, 0);
    let binary = edges_for(FactorizationMethod::BinaryPart, less, 1024);
    let multiway = edges_for(FactorizationMethod::MultiPart, less, 1024);
    let shared = edges_for(FactorizationMethod::SharedRanges, less, 1024);
    assert!(multiway < binary, "{multiway} >= {binary}");
    assert!(shared < multiway, "{shared} >= {multiway}");
}

#[test_case(vec![Predicate::equal(0, 0), Predicate::less(1, 1)] ; "equality then less")]
#[test_case(vec![Predicate::equal(0, 0), Predicate::not_equal(1, 1)] ; "equality then non-equality")]
#[test_case(vec![Predicate::greater(1, 1), Predicate::band(0, 0, 1.5)] ; "greater then band")]
#[test_case(vec![Predicate::less(0, 1), Predicate::greater(1, 0).with_offset(-2.0)] ; "crossed attributes")]
fn test_auto_encodes_conjunctions_exactly(conjunction: Vec<Predicate>) {
    let mut g = StateGraph::new();
    let rows: Vec<(Vec<f64>, f64)> = (0..24)
        .map(|i| (vec![(i % 4) as f64, ((i * 5) % 9) as f64], i as f64))
        .collect();
    let left = load_stage(&mut g, "L", &rows);
    let right = load_stage(&mut g, "R", &rows[..18]);

    let mut conn = NodeConnector::plain(&mut g);
    factorize(&mut conn, &left, &right, &conjunction, FactorizationMethod::Auto).unwrap();
    let expected = brute_force_pairs(&g, &left, &right, &conjunction);
    assert_exact_encoding(&g, &left, &expected);
}

#[test]
fn test_branched_stage_keeps_other_branches_untouched() {
    let mut g = StateGraph::new();
    let parents: Vec<_> = [1.0, 2.0, 3.0]
        .iter()
        .map(|&v| g.add_branched_tuple_node(Tuple::new(vec![v], 0.0, "P".into()), 2))
        .collect();
    let children: Vec<_> = [0.5, 2.0]
        .iter()
        .map(|&v| g.add_branched_tuple_node(Tuple::new(vec![v], v, "C".into()), 1))
        .collect();

    let config = FactorizationConfig {
        method: FactorizationMethod::BinaryPart,
        node_mode: NodeMode::Branched,
        branch: 1,
    };
    let mut conn = config.connector(&mut g);
    let greater = [Predicate::greater(0, 0)];
    factorize(&mut conn, &parents, &children, &greater, config.method).unwrap();

    assert_eq!(
        reachable_pairs(&g, &parents),
        vec![
            (parents[0], children[0]),
            (parents[1], children[0]),
            (parents[2], children[0]),
            (parents[2], children[1])
        ]
    );
    for &p in &parents {
        let decisions = g.node(p).unwrap().decisions();
        assert_eq!(decisions.branches(), 2);
        assert!(decisions.branch(0).is_empty());
    }
    assert!(g.dangling_intermediates().is_empty());
}

#[test]
fn test_dnf_shares_stages_between_conjuncts() {
    let mut g = StateGraph::new();
    let left = load_stage(&mut g, "L", &scalar_rows(&[(1.0, 0.0), (5.0, 0.0), (9.0, 0.0)]));
    let right = load_stage(&mut g, "R", &scalar_rows(&[(2.0, 1.0), (8.0, 2.0)]));
    let dnf = vec![
        vec![Predicate::less(0, 0).with_offset(-5.0)],
        vec![Predicate::greater(0, 0).with_offset(5.0)],
    ];

    let mut conn = NodeConnector::plain(&mut g);
    factorize_dnf(&mut conn, &left, &right, &dnf, FactorizationMethod::MultiPart).unwrap();
    // 1 < 8 - 5 and 9 > 2 + 5; nothing satisfies both
    assert_eq!(
        reachable_pairs(&g, &left),
        vec![(left[0], right[1]), (left[2], right[0])]
    );
}
