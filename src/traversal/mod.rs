/// Stack and queue frontiers.
pub mod frontier;

/// The generic topological iterator and its visited set.
pub mod iterator;

/// Visitor contract and signals.
pub mod visitor;

/// Drivers that run iterators and apply visitor signals.
pub mod walker;

pub use frontier::{AnyFrontier, Frontier, FrontierFactory, Queue, Stack};
pub use iterator::{
    BreadthFirstIterator, DepthFirstIterator, Entry, IteratorState, TopologicalIterator,
    VisitedSet,
};
pub use visitor::{from_fn, try_from_fn, Recorder, Signal, VisitError, Visitor};
pub use walker::{ResumeHandle, RunStatus, Traversal, TraversalOutcome, Walker};
