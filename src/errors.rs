use thiserror::Error;

/// Errors that can occur while building, loading or traversing a graph.
#[derive(Error, Debug)]
pub enum TraversalError {
    #[error("graph structure error: {message} (edge: {edge})")]
    GraphStructure { edge: usize, message: String },

    #[error("duplicate node key: {key}")]
    DuplicateNode { key: String },

    #[error("unknown node key: {key}")]
    UnknownNode { key: String },

    #[error("visitor failed at node {node}: {message}")]
    VisitorFailure { node: String, message: String },

    #[error("remove() called on an empty frontier")]
    EmptyFrontier,

    #[error("config error: {message}")]
    Config { message: String },

    #[error("format error: {message} (path: {path})")]
    Format { message: String, path: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience alias for results using `TraversalError`.
pub type Result<T> = std::result::Result<T, TraversalError>;
