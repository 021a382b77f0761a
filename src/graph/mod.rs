/// The in-memory graph: nodes, edges and adjacency.
pub mod model;

/// Query operations for analyzing a graph.
pub mod queries;

/// Loading and saving graph documents.
pub mod io;

pub use io::{load_document, load_graph, save_graph};
pub use model::Graph;
pub use queries::{GraphQueryManager, NodeMetrics};
