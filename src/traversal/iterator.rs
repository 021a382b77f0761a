use std::collections::HashSet;

use crate::errors::{Result, TraversalError};
use crate::graph::Graph;
use crate::traversal::frontier::{Frontier, FrontierFactory, Queue, Stack};
use crate::types::*;

/// A pending frontier item: a node and its distance from the seed it was reached from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub node: NodeIndex,
    pub depth: u32,
}

/// Lifecycle of a [`TopologicalIterator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorState {
    Unstarted,
    Iterating,
    Done,
    Aborted,
}

/// Per-traversal record of which nodes have been visited.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    marks: Vec<bool>,
    count: usize,
}

impl VisitedSet {
    pub fn with_node_count(node_count: usize) -> Self {
        Self {
            marks: vec![false; node_count],
            count: 0,
        }
    }

    /// Marks `idx` visited. Returns `false` if it already was.
    pub fn insert(&mut self, idx: NodeIndex) -> bool {
        match self.marks.get_mut(idx.0) {
            Some(mark) if !*mark => {
                *mark = true;
                self.count += 1;
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, idx: NodeIndex) -> bool {
        self.marks.get(idx.0).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn clear(&mut self) {
        self.marks.iter_mut().for_each(|m| *m = false);
        self.count = 0;
    }
}

/// Walks a graph by repeatedly taking the next node from a frontier and
/// pushing its unvisited neighbours back onto it.
///
/// The frontier type alone decides the order: a [`Stack`] gives depth-first
/// order, a [`Queue`] breadth-first order. The iterator keeps its own
/// [`VisitedSet`], so the graph is only ever borrowed immutably.
///
/// Visiting is split in two steps so a driver can decide, between them,
/// whether the node gets expanded: [`next_node`](Self::next_node) yields the
/// next unvisited node and marks it, [`expand`](Self::expand) queues its
/// neighbours.
pub struct TopologicalIterator<'g, F> {
    graph: &'g Graph,
    frontier: F,
    visited: VisitedSet,
    seeds: Vec<NodeIndex>,
    direction: Direction,
    max_depth: Option<u32>,
    state: IteratorState,
}

/// Depth-first topological iterator.
pub type DepthFirstIterator<'g> = TopologicalIterator<'g, Stack<Entry>>;

/// Breadth-first topological iterator.
pub type BreadthFirstIterator<'g> = TopologicalIterator<'g, Queue<Entry>>;

impl<'g, F: FrontierFactory<Entry>> TopologicalIterator<'g, F> {
    /// Creates an iterator with a fresh frontier sized to the graph.
    ///
    /// `options.strategy` is ignored here; the frontier type decides the order.
    pub fn new(graph: &'g Graph, options: &TraversalOptions) -> Result<Self> {
        Self::with_frontier(graph, F::build(graph.node_count()), options)
    }
}

impl<'g, F: Frontier<Entry>> TopologicalIterator<'g, F> {
    /// Creates an iterator over `graph` driven by the given (empty) frontier.
    ///
    /// Fails with [`TraversalError::UnknownNode`] if a listed source is not in the graph.
    pub fn with_frontier(
        graph: &'g Graph,
        mut frontier: F,
        options: &TraversalOptions,
    ) -> Result<Self> {
        let seeds = match &options.seeds {
            Seeds::AllNodes => graph.nodes().map(|(idx, _)| idx).collect(),
            Seeds::Sources(keys) => keys
                .iter()
                .map(|key| {
                    graph
                        .node_index(key)
                        .ok_or_else(|| TraversalError::UnknownNode {
                            key: key.to_string(),
                        })
                })
                .collect::<Result<Vec<_>>>()?,
        };
        frontier.clear();

        Ok(Self {
            graph,
            frontier,
            visited: VisitedSet::with_node_count(graph.node_count()),
            seeds,
            direction: options.direction,
            max_depth: options.max_depth,
            state: IteratorState::Unstarted,
        })
    }

    pub fn state(&self) -> IteratorState {
        self.state
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    /// Number of entries waiting in the frontier, visited ones included.
    pub fn pending(&self) -> usize {
        self.frontier.len()
    }

    /// Takes the next unvisited node off the frontier and marks it visited.
    ///
    /// The first call seeds the frontier. Entries for nodes that were visited
    /// after being queued are dropped. Returns `None` once the frontier is
    /// drained (state `Done`) or after [`abort`](Self::abort).
    pub fn next_node(&mut self) -> Result<Option<Entry>> {
        match self.state {
            IteratorState::Done | IteratorState::Aborted => return Ok(None),
            IteratorState::Unstarted => {
                let batch = self
                    .seeds
                    .iter()
                    .map(|&node| Entry { node, depth: 0 })
                    .collect();
                self.frontier.add_batch(batch);
                self.state = IteratorState::Iterating;
            }
            IteratorState::Iterating => {}
        }

        while !self.frontier.is_empty() {
            let entry = self.frontier.remove()?;
            if self.visited.insert(entry.node) {
                return Ok(Some(entry));
            }
        }

        self.state = IteratorState::Done;
        Ok(None)
    }

    /// Queues the unvisited neighbours of `entry` as one batch and returns
    /// how many were queued. A neighbour reached over several edges is
    /// queued once.
    ///
    /// Nothing is queued once `entry` sits at the configured maximum depth.
    pub fn expand(&mut self, entry: Entry) -> usize {
        if self.state != IteratorState::Iterating {
            return 0;
        }
        if self.max_depth.is_some_and(|max| entry.depth >= max) {
            return 0;
        }

        let mut queued = HashSet::new();
        let batch: Vec<Entry> = self
            .graph
            .neighbors(entry.node, self.direction)
            .into_iter()
            .filter(|(_, neighbor)| {
                !self.visited.contains(*neighbor) && queued.insert(*neighbor)
            })
            .map(|(_, neighbor)| Entry {
                node: neighbor,
                depth: entry.depth + 1,
            })
            .collect();

        let followed = batch.len();
        self.frontier.add_batch(batch);
        followed
    }

    /// Stops the iteration; nothing further is dequeued.
    pub fn abort(&mut self) {
        self.frontier.clear();
        self.state = IteratorState::Aborted;
    }

    /// Forgets all visited state so the same graph can be walked again.
    pub fn reset(&mut self) {
        self.frontier.clear();
        self.visited.clear();
        self.state = IteratorState::Unstarted;
    }
}

impl<'g, F: Frontier<Entry>> Iterator for TopologicalIterator<'g, F> {
    type Item = NodeIndex;

    /// Yields nodes in traversal order, expanding every one of them.
    fn next(&mut self) -> Option<NodeIndex> {
        match self.next_node() {
            Ok(Some(entry)) => {
                self.expand(entry);
                Some(entry.node)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "iterator stopped on frontier error");
                self.abort();
                None
            }
        }
    }
}
