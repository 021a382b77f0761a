use std::collections::VecDeque;

use crate::errors::{Result, TraversalError};
use crate::types::Strategy;

/// The pending-work container of a traversal.
///
/// Which end `remove` takes from is the only thing that distinguishes a
/// depth-first walk from a breadth-first one.
pub trait Frontier<T> {
    /// Adds a single item.
    fn add(&mut self, item: T);

    /// Removes the next item.
    ///
    /// Calling this on an empty frontier is a caller bug and yields
    /// [`TraversalError::EmptyFrontier`].
    fn remove(&mut self) -> Result<T>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);

    /// Adds a batch of items such that, among themselves, they are removed in
    /// the order given.
    fn add_batch(&mut self, items: Vec<T>) {
        for item in items {
            self.add(item);
        }
    }
}

/// LIFO frontier: `remove` returns the most recently added item.
#[derive(Debug, Clone)]
pub struct Stack<T> {
    items: Vec<T>,
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Frontier<T> for Stack<T> {
    fn add(&mut self, item: T) {
        self.items.push(item);
    }

    fn remove(&mut self) -> Result<T> {
        self.items.pop().ok_or(TraversalError::EmptyFrontier)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn clear(&mut self) {
        self.items.clear();
    }

    // Reversed so the first item of the batch ends up on top.
    fn add_batch(&mut self, items: Vec<T>) {
        self.items.extend(items.into_iter().rev());
    }
}

/// FIFO frontier: `remove` returns the oldest item.
#[derive(Debug, Clone)]
pub struct Queue<T> {
    items: VecDeque<T>,
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
        }
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Frontier<T> for Queue<T> {
    fn add(&mut self, item: T) {
        self.items.push_back(item);
    }

    fn remove(&mut self) -> Result<T> {
        self.items.pop_front().ok_or(TraversalError::EmptyFrontier)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn clear(&mut self) {
        self.items.clear();
    }

    fn add_batch(&mut self, items: Vec<T>) {
        self.items.extend(items);
    }
}

/// A frontier chosen at runtime from a [`Strategy`].
#[derive(Debug, Clone)]
pub enum AnyFrontier<T> {
    Stack(Stack<T>),
    Queue(Queue<T>),
}

impl<T> AnyFrontier<T> {
    /// Builds a fresh, empty frontier for the given strategy.
    pub fn for_strategy(strategy: Strategy, capacity: usize) -> Self {
        match strategy {
            Strategy::DepthFirst => AnyFrontier::Stack(Stack::with_capacity(capacity)),
            Strategy::BreadthFirst => AnyFrontier::Queue(Queue::with_capacity(capacity)),
        }
    }
}

impl<T> Frontier<T> for AnyFrontier<T> {
    fn add(&mut self, item: T) {
        match self {
            AnyFrontier::Stack(s) => s.add(item),
            AnyFrontier::Queue(q) => q.add(item),
        }
    }

    fn remove(&mut self) -> Result<T> {
        match self {
            AnyFrontier::Stack(s) => s.remove(),
            AnyFrontier::Queue(q) => q.remove(),
        }
    }

    fn len(&self) -> usize {
        match self {
            AnyFrontier::Stack(s) => s.len(),
            AnyFrontier::Queue(q) => q.len(),
        }
    }

    fn clear(&mut self) {
        match self {
            AnyFrontier::Stack(s) => s.clear(),
            AnyFrontier::Queue(q) => q.clear(),
        }
    }

    fn add_batch(&mut self, items: Vec<T>) {
        match self {
            AnyFrontier::Stack(s) => s.add_batch(items),
            AnyFrontier::Queue(q) => q.add_batch(items),
        }
    }
}

/// Frontiers that can be built fresh for a traversal with a capacity hint.
pub trait FrontierFactory<T>: Frontier<T> + Sized {
    fn build(capacity: usize) -> Self;
}

impl<T> FrontierFactory<T> for Stack<T> {
    fn build(capacity: usize) -> Self {
        Stack::with_capacity(capacity)
    }
}

impl<T> FrontierFactory<T> for Queue<T> {
    fn build(capacity: usize) -> Self {
        Queue::with_capacity(capacity)
    }
}
