//! Directed graph over routing node ids
//!
//! Unit-weight, self-loop capable, with automatic pruning of nodes that lose
//! their last edge.

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use petgraph::{Incoming, Outgoing};
use sorted_vec::SortedSet;
use std::collections::HashMap;
use thiserror::Error;

use super::types::NodeId;

/// Errors raised by graph operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    /// A raw id could not be turned into a node id.
    #[error("invalid node id `{0}`: must be a non-negative integer")]
    InvalidNode(String),
    /// The node is not part of the graph.
    #[error("node {0} is not in the graph")]
    UnknownNode(NodeId),
    /// The target cannot be reached from the source.
    #[error("no path from {from} to {to}")]
    NoPath { from: NodeId, to: NodeId },
}

/// Directed graph keyed by [`NodeId`].
#[derive(Debug, Clone, Default)]
pub struct DirectedGraph {
    graph: DiGraphMap<NodeId, ()>,
}

impl DirectedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the edge `source -> target`, creating missing nodes.
    /// Adding an existing edge is a no-op.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId) {
        if self.graph.contains_edge(source, target) {
            return;
        }
        self.graph.add_edge(source, target, ());
    }

    /// Remove the edge `source -> target` and prune any endpoint left without edges.
    pub fn remove_edge(&mut self, source: NodeId, target: NodeId) {
        if self.graph.remove_edge(source, target).is_none() {
            return;
        }
        self.prune_if_orphaned(source);
        self.prune_if_orphaned(target);
    }

    /// Remove a node with every edge touching it, pruning neighbors that become orphaned.
    pub fn remove_node(&mut self, node: NodeId) {
        if !self.graph.contains_node(node) {
            return;
        }

        let neighbors: Vec<NodeId> = self
            .graph
            .neighbors_directed(node, Outgoing)
            .chain(self.graph.neighbors_directed(node, Incoming))
            .filter(|n| *n != node)
            .collect();

        self.graph.remove_node(node);

        for neighbor in neighbors {
            self.prune_if_orphaned(neighbor);
        }
    }

    fn prune_if_orphaned(&mut self, node: NodeId) {
        if self.graph.contains_node(node) && self.total_degree(node) == 0 {
            self.graph.remove_node(node);
        }
    }

    fn total_degree(&self, node: NodeId) -> usize {
        self.graph.neighbors_directed(node, Outgoing).count()
            + self.graph.neighbors_directed(node, Incoming).count()
    }

    fn ensure_node(&self, node: NodeId) -> Result<(), GraphError> {
        if self.graph.contains_node(node) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(node))
        }
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.graph.contains_node(node)
    }

    pub fn contains_edge(&self, source: NodeId, target: NodeId) -> bool {
        self.graph.contains_edge(source, target)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.nodes()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of edges ending at `node`
    pub fn in_degree(&self, node: NodeId) -> Result<usize, GraphError> {
        self.ensure_node(node)?;
        Ok(self.graph.neighbors_directed(node, Incoming).count())
    }

    /// Number of edges leaving `node`
    pub fn out_degree(&self, node: NodeId) -> Result<usize, GraphError> {
        self.ensure_node(node)?;
        Ok(self.graph.neighbors_directed(node, Outgoing).count())
    }

    /// Targets of all edges leaving `node`, in insertion order
    pub fn adjacent(&self, node: NodeId) -> Result<Vec<NodeId>, GraphError> {
        self.ensure_node(node)?;
        Ok(self.graph.neighbors_directed(node, Outgoing).collect())
    }

    /// Every node reachable from `source` by following edges forward.
    /// `source` itself is never part of the result, even on a cycle.
    pub fn reachable_from(&self, source: NodeId) -> Result<SortedSet<NodeId>, GraphError> {
        self.ensure_node(source)?;

        let mut dfs = Dfs::new(&self.graph, source);
        let mut reachable = Vec::new();
        while let Some(node) = dfs.next(&self.graph) {
            if node != source {
                reachable.push(node);
            }
        }

        Ok(SortedSet::from_unsorted(reachable))
    }

    /// Shortest path from `source` to `target`, both included.
    ///
    /// Frontiers are expanded level by level in ascending id order and the
    /// first predecessor to reach a node keeps it, so ties resolve toward
    /// lower ids.
    pub fn shortest_path(&self, source: NodeId, target: NodeId) -> Result<Vec<NodeId>, GraphError> {
        self.ensure_node(source)?;
        if source == target {
            return Ok(vec![source]);
        }
        if !self.graph.contains_node(target) {
            return Err(GraphError::NoPath {
                from: source,
                to: target,
            });
        }

        let mut previous: HashMap<NodeId, NodeId> = HashMap::new();
        let mut frontier = vec![source];

        while !frontier.is_empty() && !previous.contains_key(&target) {
            frontier.sort_unstable();
            let mut next = Vec::new();
            for &node in &frontier {
                for neighbor in self.graph.neighbors_directed(node, Outgoing) {
                    if neighbor == source || previous.contains_key(&neighbor) {
                        continue;
                    }
                    previous.insert(neighbor, node);
                    next.push(neighbor);
                }
            }
            frontier = next;
        }

        if !previous.contains_key(&target) {
            return Err(GraphError::NoPath {
                from: source,
                to: target,
            });
        }

        let mut path = vec![target];
        let mut current = target;
        while let Some(&prev) = previous.get(&current) {
            path.push(prev);
            current = prev;
        }
        path.reverse();
        Ok(path)
    }

    /// All edges as `(source, target)` pairs, grouped by source node
    pub fn serialize_edges(&self) -> Vec<(NodeId, NodeId)> {
        self.graph
            .nodes()
            .flat_map(|source| {
                self.graph
                    .neighbors_directed(source, Outgoing)
                    .map(move |target| (source, target))
            })
            .collect()
    }
}
