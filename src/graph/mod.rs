//! Arena-backed state graph produced by factorization.
//!
//! Every node lives in [`StateGraph`] and is addressed by a stable [`NodeId`].
//! Payload nodes wrap a [`Tuple`]; payload-less (intermediate) nodes only
//! exist to share structure between many qualifying pairs. Nodes and their
//! outgoing decisions are append-only: nothing is ever removed, so ids handed
//! out once stay valid for the lifetime of the graph.
//!
//! A node keeps its decisions either in one flat list ([`NodeMode::Plain`],
//! used by path queries) or in one list per branch ([`NodeMode::Branched`],
//! used by tree queries where a parent routes decisions per child).
//! Both expose the same `add_decision(branch, target, cost)` capability.

pub mod errors;
pub mod paths;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{graph::errors::GraphError, relation::Tuple};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A weighted outgoing edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub target: NodeId,
    pub cost: f64,
}

/// Node representation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeMode {
    #[default]
    Plain,
    Branched,
}

impl FromStr for NodeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "dp" => Ok(NodeMode::Plain),
            "branched" | "t-dp" | "tdp" => Ok(NodeMode::Branched),
            other => Err(format!(
                "unknown node mode '{other}', expected plain|branched"
            )),
        }
    }
}

impl fmt::Display for NodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeMode::Plain => write!(f, "plain"),
            NodeMode::Branched => write!(f, "branched"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decisions {
    Plain(Vec<Decision>),
    Branched(Vec<Vec<Decision>>),
}

impl Decisions {
    fn for_mode(mode: NodeMode, branches: usize) -> Self {
        match mode {
            NodeMode::Plain => Decisions::Plain(Vec::new()),
            NodeMode::Branched => Decisions::Branched(vec![Vec::new(); branches.max(1)]),
        }
    }

    pub fn branches(&self) -> usize {
        match self {
            Decisions::Plain(_) => 1,
            Decisions::Branched(per_branch) => per_branch.len(),
        }
    }

    /// Decisions of one branch. Plain nodes only have branch 0.
    pub fn branch(&self, branch: usize) -> &[Decision] {
        match self {
            Decisions::Plain(list) if branch == 0 => list,
            Decisions::Plain(_) => &[],
            Decisions::Branched(per_branch) => {
                per_branch.get(branch).map(Vec::as_slice).unwrap_or(&[])
            }
        }
    }

    /// All decisions across every branch, branch by branch.
    pub fn iter(&self) -> impl Iterator<Item = &Decision> + '_ {
        let lists: &[Vec<Decision>] = match self {
            Decisions::Plain(list) => std::slice::from_ref(list),
            Decisions::Branched(per_branch) => per_branch,
        };
        lists.iter().flatten()
    }

    pub fn len(&self) -> usize {
        match self {
            Decisions::Plain(list) => list.len(),
            Decisions::Branched(per_branch) => per_branch.iter().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, branch: usize, decision: Decision) -> Result<(), usize> {
        match self {
            Decisions::Plain(list) if branch == 0 => {
                list.push(decision);
                Ok(())
            }
            Decisions::Plain(_) => Err(1),
            Decisions::Branched(per_branch) => {
                let branches = per_branch.len();
                match per_branch.get_mut(branch) {
                    Some(list) => {
                        list.push(decision);
                        Ok(())
                    }
                    None => Err(branches),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateNode {
    label: Option<String>,
    payload: Option<Tuple>,
    decisions: Decisions,
}

impl StateNode {
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn payload(&self) -> Option<&Tuple> {
        self.payload.as_ref()
    }

    pub fn is_intermediate(&self) -> bool {
        self.payload.is_none()
    }

    pub fn decisions(&self) -> &Decisions {
        &self.decisions
    }

    pub fn out_degree(&self) -> usize {
        self.decisions.len()
    }
}

impl fmt::Display for StateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.payload, &self.label) {
            (Some(t), _) => write!(f, "{t}"),
            (None, Some(label)) => write!(f, "{label}"),
            (None, None) => Ok(()),
        }
    }
}

/// Node and edge counts of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphStats {
    pub nodes: usize,
    pub payload_nodes: usize,
    pub intermediate_nodes: usize,
    pub edges: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StateGraph {
    nodes: Vec<StateNode>,
}

impl StateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Adds a plain payload node for `tuple`.
    pub fn add_tuple_node(&mut self, tuple: Tuple) -> NodeId {
        self.push(StateNode {
            label: None,
            payload: Some(tuple),
            decisions: Decisions::for_mode(NodeMode::Plain, 1),
        })
    }

    /// Adds a payload node that routes its decisions through `branches` branches.
    pub fn add_branched_tuple_node(&mut self, tuple: Tuple, branches: usize) -> NodeId {
        self.push(StateNode {
            label: None,
            payload: Some(tuple),
            decisions: Decisions::for_mode(NodeMode::Branched, branches),
        })
    }

    /// Adds a payload-less node. Branched intermediates have a single branch.
    pub fn add_intermediate_node(&mut self, label: String, mode: NodeMode) -> NodeId {
        self.push(StateNode {
            label: Some(label),
            payload: None,
            decisions: Decisions::for_mode(mode, 1),
        })
    }

    fn push(&mut self, node: StateNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn add_decision(
        &mut self,
        from: NodeId,
        branch: usize,
        target: NodeId,
        cost: f64,
    ) -> Result<(), GraphError> {
        if target.0 >= self.nodes.len() {
            return Err(GraphError::UnknownNode(target));
        }
        let node = self
            .nodes
            .get_mut(from.0)
            .ok_or(GraphError::UnknownNode(from))?;
        node.decisions
            .push(branch, Decision { target, cost })
            .map_err(|branches| GraphError::BranchOutOfRange {
                node: from,
                branch,
                branches,
            })
    }

    pub fn node(&self, id: NodeId) -> Option<&StateNode> {
        self.nodes.get(id.0)
    }

    pub fn tuple(&self, id: NodeId) -> Option<&Tuple> {
        self.node(id).and_then(StateNode::payload)
    }

    /// Looks up a payload attribute, checking that the node and attribute exist.
    pub fn attribute(&self, id: NodeId, attr: usize) -> Result<f64, GraphError> {
        let tuple = match self.node(id) {
            None => return Err(GraphError::UnknownNode(id)),
            Some(node) => node.payload().ok_or(GraphError::MissingPayload(id))?,
        };
        tuple.value(attr).ok_or(GraphError::AttributeOutOfRange {
            node: id,
            attr,
            arity: tuple.arity(),
        })
    }

    /// Attribute lookup for ids already checked by [`StateGraph::attribute`].
    pub(crate) fn value(&self, id: NodeId, attr: usize) -> f64 {
        self.tuple(id)
            .and_then(|t| t.value(attr))
            .unwrap_or(f64::NAN)
    }

    /// Cost paid when an edge enters `id`: the row cost of a payload node, 0 otherwise.
    pub fn entry_cost(&self, id: NodeId) -> f64 {
        self.tuple(id).map_or(0.0, |t| t.cost)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(StateNode::out_degree).sum()
    }

    pub fn stats(&self) -> GraphStats {
        let intermediate_nodes = self.nodes.iter().filter(|n| n.is_intermediate()).count();
        GraphStats {
            nodes: self.nodes.len(),
            payload_nodes: self.nodes.len() - intermediate_nodes,
            intermediate_nodes,
            edges: self.edge_count(),
        }
    }

    pub fn in_degrees(&self) -> Vec<usize> {
        let mut in_degrees = vec![0; self.nodes.len()];
        for node in &self.nodes {
            for d in node.decisions.iter() {
                in_degrees[d.target.0] += 1;
            }
        }
        in_degrees
    }

    /// Intermediate nodes missing either an incoming or an outgoing edge.
    pub fn dangling_intermediates(&self) -> Vec<NodeId> {
        let in_degrees = self.in_degrees();
        self.nodes
            .iter()
            .enumerate()
            .filter(|(idx, node)| {
                node.is_intermediate() && (in_degrees[*idx] == 0 || node.out_degree() == 0)
            })
            .map(|(idx, _)| NodeId(idx))
            .collect()
    }
}
