//! Wires layers of nodes together through intermediate nodes.
//!
//! Every `connect_*` method takes its intermediate endpoints as `Option`s: a
//! `None` endpoint is materialized exactly once, wired, and handed back so
//! the caller can cache it and reuse it for later connections.
//!
//! Edge costs follow one rule: entering a payload node costs that node's row
//! cost, every structural edge costs 0.

use crate::graph::{errors::GraphError, NodeId, NodeMode, StateGraph};

pub struct NodeConnector<'g> {
    graph: &'g mut StateGraph,
    mode: NodeMode,
    /// Branch used by edges leaving left-side payload nodes in branched mode.
    branch: usize,
    intermediates_created: usize,
}

impl<'g> NodeConnector<'g> {
    pub fn new(graph: &'g mut StateGraph, mode: NodeMode, branch: usize) -> Self {
        Self {
            graph,
            mode,
            branch,
            intermediates_created: 0,
        }
    }

    pub fn plain(graph: &'g mut StateGraph) -> Self {
        Self::new(graph, NodeMode::Plain, 0)
    }

    pub fn branched(graph: &'g mut StateGraph, branch: usize) -> Self {
        Self::new(graph, NodeMode::Branched, branch)
    }

    pub fn graph(&self) -> &StateGraph {
        &*self.graph
    }

    pub fn mode(&self) -> NodeMode {
        self.mode
    }

    /// Branch index for edges leaving left nodes; always 0 in plain mode.
    pub fn left_branch(&self) -> usize {
        match self.mode {
            NodeMode::Plain => 0,
            NodeMode::Branched => self.branch,
        }
    }

    pub fn intermediates_created(&self) -> usize {
        self.intermediates_created
    }

    pub fn create_intermediate_node(&mut self, label: &str) -> NodeId {
        self.intermediates_created += 1;
        self.graph.add_intermediate_node(label.to_string(), self.mode)
    }

    /// Connects every left node to `intermediate` with cost 0.
    /// Returns the intermediate node, materialized here if `None` was passed.
    pub fn connect_left_to_intermediate(
        &mut self,
        left: &[NodeId],
        intermediate: Option<NodeId>,
        label: &str,
    ) -> Result<NodeId, GraphError> {
        let target = match intermediate {
            Some(id) => id,
            None => self.create_intermediate_node(label),
        };
        let branch = self.left_branch();
        for &node in left {
            self.graph.add_decision(node, branch, target, 0.0)?;
        }
        Ok(target)
    }

    /// Connects `intermediate` to every right node, each edge costing the
    /// right node's row cost.
    pub fn connect_intermediate_to_right(
        &mut self,
        intermediate: Option<NodeId>,
        right: &[NodeId],
        label: &str,
    ) -> Result<NodeId, GraphError> {
        let source = match intermediate {
            Some(id) => id,
            None => self.create_intermediate_node(label),
        };
        for &node in right {
            let cost = self.graph.entry_cost(node);
            self.graph.add_decision(source, 0, node, cost)?;
        }
        Ok(source)
    }

    /// Adds one structural edge `source -> target`, materializing whichever
    /// side is `None`. Returns `(source, target)`.
    pub fn connect_intermediate_nodes(
        &mut self,
        source: Option<NodeId>,
        target: Option<NodeId>,
        label: &str,
    ) -> Result<(NodeId, NodeId), GraphError> {
        let source = match source {
            Some(id) => id,
            None => self.create_intermediate_node(label),
        };
        let target = match target {
            Some(id) => id,
            None => self.create_intermediate_node(label),
        };
        self.graph.add_decision(source, 0, target, 0.0)?;
        Ok((source, target))
    }
}
