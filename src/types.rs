use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque key identifying a node within a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    pub fn new(key: impl Into<String>) -> Self {
        NodeKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeKey {
    fn from(s: &str) -> Self {
        NodeKey(s.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(s: String) -> Self {
        NodeKey(s)
    }
}

impl From<&NodeKey> for NodeKey {
    fn from(k: &NodeKey) -> Self {
        k.clone()
    }
}

/// Dense index of a node inside the graph that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub usize);

/// Dense index of an edge inside the graph that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIndex(pub usize);

/// A node in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub key: NodeKey,
    pub label: Option<String>,
}

/// A relation between two nodes. Undirected edges are followed both ways.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeKey,
    pub target: NodeKey,
    pub directed: bool,
    pub label: Option<String>,
}

impl Edge {
    /// Returns the endpoint opposite to `key`, or `None` if `key` is not an endpoint.
    pub fn opposite(&self, key: &NodeKey) -> Option<&NodeKey> {
        if &self.source == key {
            Some(&self.target)
        } else if &self.target == key {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// Kinds of visitable graph components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Node,
    Edge,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Node => "node",
            ComponentKind::Edge => "edge",
        }
    }
}

/// Anything a visitor can be handed: nodes and edges.
pub trait Graphable {
    /// The kind of component this is.
    fn kind(&self) -> ComponentKind;

    /// A short human-readable name used in logs and error messages.
    fn display_name(&self) -> String;
}

impl Graphable for Node {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Node
    }

    fn display_name(&self) -> String {
        self.key.to_string()
    }
}

impl Graphable for Edge {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Edge
    }

    fn display_name(&self) -> String {
        let arrow = if self.directed { "->" } else { "--" };
        format!("{}{}{}", self.source, arrow, self.target)
    }
}

/// A borrowed graph component handed to a visitor.
#[derive(Debug, Clone, Copy)]
pub enum Component<'g> {
    Node(NodeIndex, &'g Node),
    Edge(EdgeIndex, &'g Edge),
}

impl<'g> Component<'g> {
    /// Returns the node if this component is one.
    pub fn as_node(&self) -> Option<&'g Node> {
        match self {
            Component::Node(_, node) => Some(node),
            Component::Edge(..) => None,
        }
    }

    /// Returns the edge if this component is one.
    pub fn as_edge(&self) -> Option<&'g Edge> {
        match self {
            Component::Edge(_, edge) => Some(edge),
            Component::Node(..) => None,
        }
    }
}

impl Graphable for Component<'_> {
    fn kind(&self) -> ComponentKind {
        match self {
            Component::Node(_, node) => node.kind(),
            Component::Edge(_, edge) => edge.kind(),
        }
    }

    fn display_name(&self) -> String {
        match self {
            Component::Node(_, node) => node.display_name(),
            Component::Edge(_, edge) => edge.display_name(),
        }
    }
}

/// Which incident edges a traversal follows out of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Outgoing,
    Incoming,
    Both,
}

#[allow(clippy::should_implement_trait)]
impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outgoing => "outgoing",
            Direction::Incoming => "incoming",
            Direction::Both => "both",
        }
    }

    /// Parses a string into a `Direction`, returning `None` for unrecognized values.
    pub fn from_str(s: &str) -> Option<Direction> {
        match s {
            "outgoing" | "out" => Some(Direction::Outgoing),
            "incoming" | "in" => Some(Direction::Incoming),
            "both" => Some(Direction::Both),
            _ => None,
        }
    }
}

/// Frontier discipline used by a traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Stack frontier (LIFO).
    #[default]
    DepthFirst,
    /// Queue frontier (FIFO).
    BreadthFirst,
}

#[allow(clippy::should_implement_trait)]
impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::DepthFirst => "depth_first",
            Strategy::BreadthFirst => "breadth_first",
        }
    }

    /// Parses a string into a `Strategy`, returning `None` for unrecognized values.
    pub fn from_str(s: &str) -> Option<Strategy> {
        match s {
            "depth_first" | "depth-first" | "dfs" => Some(Strategy::DepthFirst),
            "breadth_first" | "breadth-first" | "bfs" => Some(Strategy::BreadthFirst),
            _ => None,
        }
    }
}

/// What the walker does when a visitor returns `Signal::Suspend`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspendPolicy {
    /// Park the calling thread until the walker's resume handle fires.
    #[default]
    Block,
    /// Log the request and keep walking.
    Continue,
}

/// The nodes a traversal starts from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seeds {
    /// Every node of the graph, in insertion order.
    #[default]
    AllNodes,
    /// Only the listed nodes, in the given order.
    Sources(Vec<NodeKey>),
}

/// Options controlling graph traversal behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalOptions {
    pub strategy: Strategy,
    pub direction: Direction,
    pub seeds: Seeds,
    /// Nodes at this depth (counted from their seed) are visited but not expanded.
    pub max_depth: Option<u32>,
}

/// Counters collected while a traversal runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalStats {
    pub nodes_visited: usize,
    /// Distinct neighbours queued by expansion, or edges handed to the
    /// visitor during an edge sweep.
    pub edges_followed: usize,
    pub branches_killed: usize,
    pub suspensions: usize,
    pub max_depth_reached: u32,
}

/// Serialized node entry of a `GraphDocument`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub key: NodeKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

fn default_directed() -> bool {
    true
}

/// Serialized edge entry of a `GraphDocument`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub source: NodeKey,
    pub target: NodeKey,
    #[serde(default = "default_directed")]
    pub directed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// On-disk representation of a graph (JSON or TOML).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

/// Statistics about a graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub directed_edge_count: usize,
    pub isolated_node_count: usize,
    pub max_out_degree: usize,
    pub max_in_degree: usize,
    pub out_degree_histogram: BTreeMap<usize, usize>,
}
