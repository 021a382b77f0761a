use std::fs;
use std::io;
use std::path::Path;

use crate::errors::{Result, TraversalError};
use crate::graph::Graph;
use crate::types::GraphDocument;

/// Loads a graph document from a `.json` or `.toml` file.
pub fn load_document(path: &Path) -> Result<GraphDocument> {
    let contents = fs::read_to_string(path).map_err(|e| TraversalError::Format {
        message: format!("failed to read graph file: {}", e),
        path: path.display().to_string(),
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(serde_json::from_str(&contents)?),
        Some("toml") => Ok(toml::from_str(&contents)?),
        other => Err(TraversalError::Format {
            message: format!(
                "unsupported graph file extension {:?}; expected .json or .toml",
                other.unwrap_or("")
            ),
            path: path.display().to_string(),
        }),
    }
}

/// Loads a graph from a `.json` or `.toml` file.
///
/// Edges that reference unknown nodes are kept; they are reported when a
/// traversal over the graph starts.
pub fn load_graph(path: &Path) -> Result<Graph> {
    let doc = load_document(path)?;
    tracing::debug!(
        path = %path.display(),
        nodes = doc.nodes.len(),
        edges = doc.edges.len(),
        "loaded graph document"
    );
    Graph::try_from(doc)
}

/// Writes a graph as pretty-printed JSON, using a temporary file and a rename.
pub fn save_graph(path: &Path, graph: &Graph) -> Result<()> {
    let json = serde_json::to_string_pretty(&graph.to_document())?;
    write_atomic(path, &json)?;
    Ok(())
}

/// Replaces `path` with `contents` via a sibling `.tmp` file, so readers see
/// either the old or the new file.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)
}
