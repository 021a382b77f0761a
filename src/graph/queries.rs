use std::collections::BTreeMap;

use crate::errors::{Result, TraversalError};
use crate::graph::Graph;
use crate::types::*;

/// Metrics describing the connectivity around a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMetrics {
    /// Number of incoming edges, undirected edges included.
    pub incoming_edge_count: usize,
    /// Number of outgoing edges, undirected edges included.
    pub outgoing_edge_count: usize,
    /// Number of incident undirected edges.
    pub undirected_edge_count: usize,
    /// Number of self-loops on the node.
    pub self_loop_count: usize,
}

/// Read-only analytical queries over a graph.
pub struct GraphQueryManager<'a> {
    graph: &'a Graph,
}

impl<'a> GraphQueryManager<'a> {
    /// Creates a new `GraphQueryManager` over the given graph.
    pub fn new(graph: &'a Graph) -> Self {
        Self { graph }
    }

    /// Computes summary statistics for the whole graph.
    pub fn stats(&self) -> GraphStats {
        let mut histogram: BTreeMap<usize, usize> = BTreeMap::new();
        let mut max_out = 0;
        let mut max_in = 0;
        let mut isolated = 0;

        for (idx, _) in self.graph.nodes() {
            let out = self.graph.out_degree(idx);
            let inc = self.graph.in_degree(idx);
            *histogram.entry(out).or_insert(0) += 1;
            max_out = max_out.max(out);
            max_in = max_in.max(inc);
            if out == 0 && inc == 0 {
                isolated += 1;
            }
        }

        GraphStats {
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            directed_edge_count: self.graph.edges().filter(|(_, e)| e.directed).count(),
            isolated_node_count: isolated,
            max_out_degree: max_out,
            max_in_degree: max_in,
            out_degree_histogram: histogram,
        }
    }

    /// Computes metrics for a single node.
    pub fn node_metrics(&self, key: &NodeKey) -> Result<NodeMetrics> {
        let idx = self
            .graph
            .node_index(key)
            .ok_or_else(|| TraversalError::UnknownNode {
                key: key.to_string(),
            })?;

        let outgoing = self.graph.outgoing(idx);
        let incoming = self.graph.incoming(idx);

        let mut undirected = 0;
        let mut self_loops = 0;
        for &(edge_idx, neighbor) in outgoing {
            if neighbor == idx {
                self_loops += 1;
            }
            if self.graph.edge(edge_idx).is_some_and(|e| !e.directed) {
                undirected += 1;
            }
        }

        Ok(NodeMetrics {
            incoming_edge_count: incoming.len(),
            outgoing_edge_count: outgoing.len(),
            undirected_edge_count: undirected,
            self_loop_count: self_loops,
        })
    }

    /// Nodes with no incident edges at all.
    pub fn isolated_nodes(&self) -> Vec<&'a Node> {
        self.graph
            .nodes()
            .filter(|(idx, _)| self.graph.out_degree(*idx) == 0 && self.graph.in_degree(*idx) == 0)
            .map(|(_, n)| n)
            .collect()
    }

    /// Nodes with no incoming edges, in insertion order.
    ///
    /// Undirected edges count as incoming, so a node touched by one is never a root.
    pub fn roots(&self) -> Vec<&'a Node> {
        self.graph
            .nodes()
            .filter(|(idx, _)| self.graph.in_degree(*idx) == 0)
            .map(|(_, n)| n)
            .collect()
    }
}
