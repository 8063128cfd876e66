use thiserror::Error;

use crate::graph::NodeId;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphError {
    #[error("Node {0} does not exist in this graph")]
    UnknownNode(NodeId),
    #[error("Node {0} carries no tuple payload")]
    MissingPayload(NodeId),
    #[error("Attribute index {attr} is out of range for node {node} with arity {arity}")]
    AttributeOutOfRange {
        node: NodeId,
        attr: usize,
        arity: usize,
    },
    #[error("Branch {branch} is out of range for node {node} with {branches} branch(es)")]
    BranchOutOfRange {
        node: NodeId,
        branch: usize,
        branches: usize,
    },
}
