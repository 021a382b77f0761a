pub mod config;
pub mod errors;
pub mod graph;
pub mod traversal;
pub mod types;
