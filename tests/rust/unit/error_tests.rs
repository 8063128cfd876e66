//! Rejected inputs must leave the graph exactly as it was.

use thetajoin::{
    factorization::{Factorizer, NodeConnector},
    factorize,
    graph::errors::GraphError,
    FactorizationError, FactorizationMethod, NodeId, NodeMode, Predicate, StateGraph,
};

use super::fixtures::{load_stage, scalar_rows};

fn two_stages(g: &mut StateGraph) -> (Vec<NodeId>, Vec<NodeId>) {
    let left = load_stage(g, "L", &scalar_rows(&[(1.0, 0.0), (2.0, 0.0)]));
    let right = load_stage(g, "R", &scalar_rows(&[(3.0, 1.0)]));
    (left, right)
}

#[test]
fn test_equality_after_inequality_is_malformed() {
    let mut g = StateGraph::new();
    let (left, right) = two_stages(&mut g);
    let conjunction = [Predicate::less(0, 0), Predicate::equal(0, 0)];

    for method in [
        FactorizationMethod::Auto,
        FactorizationMethod::BinaryPart,
        FactorizationMethod::MultiPart,
        FactorizationMethod::SharedRanges,
    ] {
        let mut conn = NodeConnector::plain(&mut g);
        let err = factorize(&mut conn, &left, &right, &conjunction, method).unwrap_err();
        assert!(
            matches!(err, FactorizationError::MalformedInput { factorizer: Factorizer::Dispatcher, .. }),
            "{method}: {err}"
        );
    }
    assert_eq!(g.edge_count(), 0);
    assert_eq!(g.len(), 3);
}

#[test]
fn test_unknown_node_is_reported() {
    let mut other = StateGraph::new();
    let foreign = load_stage(&mut other, "X", &scalar_rows(&[(0.0, 0.0); 8]));

    let mut g = StateGraph::new();
    let (left, _) = two_stages(&mut g);
    let missing = *foreign.last().unwrap();

    let mut conn = NodeConnector::plain(&mut g);
    let err = factorize(&mut conn, &left, &[missing], &[Predicate::less(0, 0)], FactorizationMethod::Auto)
        .unwrap_err();
    assert_eq!(
        err,
        FactorizationError::Graph {
            factorizer: Factorizer::MultiwayPartitioning,
            source: GraphError::UnknownNode(missing),
        }
    );
    assert_eq!(g.edge_count(), 0);
}

#[test]
fn test_attribute_out_of_range() {
    let mut g = StateGraph::new();
    let (left, right) = two_stages(&mut g);
    let mut conn = NodeConnector::plain(&mut g);
    let err = factorize(
        &mut conn,
        &left,
        &right,
        &[Predicate::equal(0, 0), Predicate::greater(0, 4)],
        FactorizationMethod::BinaryPart,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        FactorizationError::Graph {
            source: GraphError::AttributeOutOfRange { attr: 4, arity: 1, .. },
            ..
        }
    ));
    assert_eq!(g.edge_count(), 0);
}

#[test]
fn test_nan_values_and_offsets_are_malformed() {
    let mut g = StateGraph::new();
    let (left, _) = two_stages(&mut g);
    let nan = load_stage(&mut g, "N", &scalar_rows(&[(f64::NAN, 0.0)]));

    let mut conn = NodeConnector::plain(&mut g);
    assert!(matches!(
        factorize(&mut conn, &left, &nan, &[Predicate::less(0, 0)], FactorizationMethod::Auto),
        Err(FactorizationError::MalformedInput { .. })
    ));
    assert!(matches!(
        factorize(
            &mut conn,
            &left,
            &left,
            &[Predicate::band(0, 0, f64::NAN)],
            FactorizationMethod::BinaryPart
        ),
        Err(FactorizationError::MalformedInput { .. })
    ));
    assert_eq!(g.edge_count(), 0);
}

#[test]
fn test_intermediate_node_as_input_is_rejected() {
    let mut g = StateGraph::new();
    let (left, _) = two_stages(&mut g);
    let steiner = g.add_intermediate_node("I".to_string(), NodeMode::Plain);

    let mut conn = NodeConnector::plain(&mut g);
    let err = factorize(&mut conn, &left, &[steiner], &[], FactorizationMethod::Auto).unwrap_err();
    assert_eq!(
        err,
        FactorizationError::Graph {
            factorizer: Factorizer::Equality,
            source: GraphError::MissingPayload(steiner),
        }
    );
}

#[test]
fn test_branch_missing_on_left_nodes() {
    let mut g = StateGraph::new();
    let (left, right) = two_stages(&mut g);
    // Plain payload nodes only have branch 0
    let mut conn = NodeConnector::branched(&mut g, 1);
    let err = factorize(&mut conn, &left, &right, &[Predicate::less(0, 0)], FactorizationMethod::SharedRanges)
        .unwrap_err();
    assert!(matches!(
        err,
        FactorizationError::Graph {
            factorizer: Factorizer::SharedRanges,
            source: GraphError::BranchOutOfRange { branch: 1, branches: 1, .. },
        }
    ));
    assert_eq!(g.edge_count(), 0);
}

#[test]
fn test_error_messages_name_the_component() {
    let err = FactorizationError::unsupported(
        Factorizer::SharedRanges,
        &Predicate::greater(0, 1),
        "greater-than is not supported by shared ranges",
    );
    assert_eq!(
        err.to_string(),
        "SharedRanges: predicate `L[0] > R[1]` is not supported: greater-than is not supported by shared ranges"
    );
}
