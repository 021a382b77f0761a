use std::collections::HashMap;

use crate::errors::{Result, TraversalError};
use crate::types::*;

/// An in-memory graph of nodes and edges.
///
/// Nodes and edges are stored in insertion order and addressed by dense
/// indices. Adjacency is kept per node so that incident edges can be listed
/// in O(degree). The graph holds no traversal state: visited markers live in
/// the iterator walking it, so any number of traversals may borrow the same
/// graph at once.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<NodeKey, NodeIndex>,
    // (edge, neighbour) pairs; only edges whose endpoints both resolve are listed.
    outgoing: Vec<Vec<(EdgeIndex, NodeIndex)>>,
    incoming: Vec<Vec<(EdgeIndex, NodeIndex)>>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with room for the given number of nodes and edges.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            edges: Vec::with_capacity(edges),
            index: HashMap::with_capacity(nodes),
            outgoing: Vec::with_capacity(nodes),
            incoming: Vec::with_capacity(nodes),
        }
    }

    /// Adds an unlabeled node. Fails if the key is already present.
    pub fn add_node(&mut self, key: impl Into<NodeKey>) -> Result<NodeIndex> {
        self.insert_node(Node {
            key: key.into(),
            label: None,
        })
    }

    /// Adds a node carrying a label. Fails if the key is already present.
    pub fn add_labeled_node(
        &mut self,
        key: impl Into<NodeKey>,
        label: impl Into<String>,
    ) -> Result<NodeIndex> {
        self.insert_node(Node {
            key: key.into(),
            label: Some(label.into()),
        })
    }

    /// Adds a directed edge `source -> target`.
    ///
    /// Both endpoints must already be members of this graph.
    pub fn add_edge(
        &mut self,
        source: impl Into<NodeKey>,
        target: impl Into<NodeKey>,
    ) -> Result<EdgeIndex> {
        self.insert_checked_edge(Edge {
            source: source.into(),
            target: target.into(),
            directed: true,
            label: None,
        })
    }

    /// Adds an undirected edge between `a` and `b`.
    pub fn add_undirected_edge(
        &mut self,
        a: impl Into<NodeKey>,
        b: impl Into<NodeKey>,
    ) -> Result<EdgeIndex> {
        self.insert_checked_edge(Edge {
            source: a.into(),
            target: b.into(),
            directed: false,
            label: None,
        })
    }

    /// Adds a directed edge carrying a label.
    pub fn add_labeled_edge(
        &mut self,
        source: impl Into<NodeKey>,
        target: impl Into<NodeKey>,
        label: impl Into<String>,
    ) -> Result<EdgeIndex> {
        self.insert_checked_edge(Edge {
            source: source.into(),
            target: target.into(),
            directed: true,
            label: Some(label.into()),
        })
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&Node> {
        self.nodes.get(idx.0)
    }

    pub fn edge(&self, idx: EdgeIndex) -> Option<&Edge> {
        self.edges.get(idx.0)
    }

    /// Looks up the index of the node with the given key.
    pub fn node_index(&self, key: &NodeKey) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeIndex(i), n))
    }

    /// Iterates over all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, &Edge)> + '_ {
        self.edges.iter().enumerate().map(|(i, e)| (EdgeIndex(i), e))
    }

    /// Edges leaving `idx` (including undirected edges), with the neighbour each leads to.
    pub fn outgoing(&self, idx: NodeIndex) -> &[(EdgeIndex, NodeIndex)] {
        self.outgoing.get(idx.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges entering `idx` (including undirected edges), with the neighbour each comes from.
    pub fn incoming(&self, idx: NodeIndex) -> &[(EdgeIndex, NodeIndex)] {
        self.incoming.get(idx.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn out_degree(&self, idx: NodeIndex) -> usize {
        self.outgoing(idx).len()
    }

    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.incoming(idx).len()
    }

    /// Lists the neighbours of `idx` reachable along `direction`.
    ///
    /// Order follows edge insertion order; for `Both`, outgoing edges come
    /// first. Undirected edges are recorded on both adjacency lists, so under
    /// `Both` they are taken from the outgoing list only.
    pub fn neighbors(
        &self,
        idx: NodeIndex,
        direction: Direction,
    ) -> Vec<(EdgeIndex, NodeIndex)> {
        match direction {
            Direction::Outgoing => self.outgoing(idx).to_vec(),
            Direction::Incoming => self.incoming(idx).to_vec(),
            Direction::Both => {
                let mut out = self.outgoing(idx).to_vec();
                for &(edge_idx, neighbor) in self.incoming(idx) {
                    if self.edge(edge_idx).is_some_and(|e| !e.directed) {
                        continue;
                    }
                    out.push((edge_idx, neighbor));
                }
                out
            }
        }
    }

    /// Checks that every edge references exactly two nodes of this graph.
    ///
    /// Reports the first offending edge in insertion order.
    pub fn validate(&self) -> Result<()> {
        for (i, edge) in self.edges.iter().enumerate() {
            for (role, key) in [("source", &edge.source), ("target", &edge.target)] {
                if !self.index.contains_key(key) {
                    return Err(TraversalError::GraphStructure {
                        edge: i,
                        message: format!(
                            "{} '{}' of edge {} is not a member of this graph",
                            role,
                            key,
                            edge.display_name()
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Converts the graph back into its serializable form.
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            nodes: self
                .nodes
                .iter()
                .map(|n| NodeSpec {
                    key: n.key.clone(),
                    label: n.label.clone(),
                })
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|e| EdgeSpec {
                    source: e.source.clone(),
                    target: e.target.clone(),
                    directed: e.directed,
                    label: e.label.clone(),
                })
                .collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    fn insert_node(&mut self, node: Node) -> Result<NodeIndex> {
        if self.index.contains_key(&node.key) {
            return Err(TraversalError::DuplicateNode {
                key: node.key.to_string(),
            });
        }
        let idx = NodeIndex(self.nodes.len());
        self.index.insert(node.key.clone(), idx);
        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        Ok(idx)
    }

    fn insert_checked_edge(&mut self, edge: Edge) -> Result<EdgeIndex> {
        for key in [&edge.source, &edge.target] {
            if !self.index.contains_key(key) {
                return Err(TraversalError::GraphStructure {
                    edge: self.edges.len(),
                    message: format!(
                        "endpoint '{}' of edge {} is not a member of this graph",
                        key,
                        edge.display_name()
                    ),
                });
            }
        }
        Ok(self.insert_edge(edge))
    }

    /// Stores an edge, wiring adjacency only when both endpoints resolve.
    fn insert_edge(&mut self, edge: Edge) -> EdgeIndex {
        let idx = EdgeIndex(self.edges.len());
        let source = self.index.get(&edge.source).copied();
        let target = self.index.get(&edge.target).copied();
        if let (Some(s), Some(t)) = (source, target) {
            self.outgoing[s.0].push((idx, t));
            self.incoming[t.0].push((idx, s));
            if !edge.directed && s != t {
                self.outgoing[t.0].push((idx, s));
                self.incoming[s.0].push((idx, t));
            }
        }
        self.edges.push(edge);
        idx
    }
}

impl TryFrom<GraphDocument> for Graph {
    type Error = TraversalError;

    /// Builds a graph from its document form.
    ///
    /// Duplicate node keys are rejected here. Edges with a missing endpoint are
    /// kept as-is and surface through [`Graph::validate`] when a traversal starts.
    fn try_from(doc: GraphDocument) -> Result<Self> {
        let mut graph = Graph::with_capacity(doc.nodes.len(), doc.edges.len());
        for spec in doc.nodes {
            graph.insert_node(Node {
                key: spec.key,
                label: spec.label,
            })?;
        }
        for spec in doc.edges {
            graph.insert_edge(Edge {
                source: spec.source,
                target: spec.target,
                directed: spec.directed,
                label: spec.label,
            });
        }
        Ok(graph)
    }
}

impl std::ops::Index<NodeIndex> for Graph {
    type Output = Node;

    /// Panics if `idx` does not belong to this graph.
    fn index(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx.0]
    }
}

impl std::ops::Index<EdgeIndex> for Graph {
    type Output = Edge;

    /// Panics if `idx` does not belong to this graph.
    fn index(&self, idx: EdgeIndex) -> &Edge {
        &self.edges[idx.0]
    }
}
