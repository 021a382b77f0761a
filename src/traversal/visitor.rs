use thiserror::Error;

use crate::types::{Component, NodeKey};

/// Feedback returned by a visitor after each visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Expand the component and keep walking.
    Continue,
    /// Pause the traversal; the walker decides how it is resumed.
    Suspend,
    /// Do not expand this component, but keep walking the rest of the frontier.
    KillBranch,
    /// Stop the whole traversal now.
    Abort,
}

/// Failure raised by a visitor. Ends the traversal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct VisitError {
    message: String,
}

impl VisitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for VisitError {
    fn from(s: &str) -> Self {
        VisitError::new(s)
    }
}

impl From<String> for VisitError {
    fn from(s: String) -> Self {
        VisitError::new(s)
    }
}

/// Application logic invoked on each component a traversal reaches.
pub trait Visitor {
    fn visit(&mut self, component: Component<'_>) -> Result<Signal, VisitError>;
}

impl<V: Visitor + ?Sized> Visitor for &mut V {
    fn visit(&mut self, component: Component<'_>) -> Result<Signal, VisitError> {
        (**self).visit(component)
    }
}

impl<V: Visitor + ?Sized> Visitor for Box<V> {
    fn visit(&mut self, component: Component<'_>) -> Result<Signal, VisitError> {
        (**self).visit(component)
    }
}

/// Visitor built from an infallible closure. See [`from_fn`].
pub struct FnVisitor<F>(F);

impl<F> Visitor for FnVisitor<F>
where
    F: FnMut(Component<'_>) -> Signal,
{
    fn visit(&mut self, component: Component<'_>) -> Result<Signal, VisitError> {
        Ok((self.0)(component))
    }
}

/// Wraps a closure returning a [`Signal`] as a visitor.
pub fn from_fn<F>(f: F) -> FnVisitor<F>
where
    F: FnMut(Component<'_>) -> Signal,
{
    FnVisitor(f)
}

/// Visitor built from a fallible closure. See [`try_from_fn`].
pub struct TryFnVisitor<F>(F);

impl<F> Visitor for TryFnVisitor<F>
where
    F: FnMut(Component<'_>) -> Result<Signal, VisitError>,
{
    fn visit(&mut self, component: Component<'_>) -> Result<Signal, VisitError> {
        (self.0)(component)
    }
}

/// Wraps a fallible closure as a visitor.
pub fn try_from_fn<F>(f: F) -> TryFnVisitor<F>
where
    F: FnMut(Component<'_>) -> Result<Signal, VisitError>,
{
    TryFnVisitor(f)
}

/// Records the key of every node it is handed and always continues.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    visited: Vec<NodeKey>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visited node keys, in visit order.
    pub fn visited(&self) -> &[NodeKey] {
        &self.visited
    }

    pub fn into_visited(self) -> Vec<NodeKey> {
        self.visited
    }
}

impl Visitor for Recorder {
    fn visit(&mut self, component: Component<'_>) -> Result<Signal, VisitError> {
        if let Some(node) = component.as_node() {
            self.visited.push(node.key.clone());
        }
        Ok(Signal::Continue)
    }
}
