use std::sync::{Arc, Condvar, Mutex, PoisonError};

use tracing::{debug, info, trace, warn};

use crate::config::WalkerConfig;
use crate::errors::{Result, TraversalError};
use crate::graph::Graph;
use crate::traversal::frontier::AnyFrontier;
use crate::traversal::iterator::{Entry, IteratorState, TopologicalIterator};
use crate::traversal::visitor::{Signal, Visitor};
use crate::types::*;

/// Final result of [`Walker::traverse`].
#[derive(Debug)]
pub enum TraversalOutcome {
    /// The frontier drained.
    Completed(TraversalStats),
    /// A visitor returned [`Signal::Abort`].
    Aborted(TraversalStats),
    /// The graph was malformed, a source was unknown, or a visitor failed.
    Failed(TraversalError),
}

impl TraversalOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TraversalOutcome::Completed(_))
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, TraversalOutcome::Aborted(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TraversalOutcome::Failed(_))
    }

    /// Counters of a traversal that ran, `None` for a failed one.
    pub fn stats(&self) -> Option<&TraversalStats> {
        match self {
            TraversalOutcome::Completed(stats) | TraversalOutcome::Aborted(stats) => Some(stats),
            TraversalOutcome::Failed(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TraversalOutcome::Completed(_) => "completed",
            TraversalOutcome::Aborted(_) => "aborted",
            TraversalOutcome::Failed(_) => "failed",
        }
    }
}

/// Where a [`Traversal`] stopped after a call to [`Traversal::resume`].
#[derive(Debug)]
pub enum RunStatus {
    Completed,
    Aborted,
    /// A visitor returned [`Signal::Suspend`]; call `resume` again to continue.
    Suspended,
    Failed(TraversalError),
}

/// Wakes a traversal parked on a [`Signal::Suspend`].
///
/// Resumes issued while nothing is parked are counted and each one is
/// consumed by a later suspension, so the two sides do not need to race.
#[derive(Debug, Clone, Default)]
pub struct ResumeHandle {
    gate: Arc<ResumeGate>,
}

impl ResumeHandle {
    /// Creates a handle with its own gate, not connected to any walker.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resume(&self) {
        self.gate.open();
    }

    /// Resumes granted but not yet consumed by a suspension.
    pub fn pending(&self) -> usize {
        *self.gate.permits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait(&self) {
        self.gate.wait();
    }
}

#[derive(Debug, Default)]
struct ResumeGate {
    permits: Mutex<usize>,
    cond: Condvar,
}

impl ResumeGate {
    fn open(&self) {
        let mut permits = self.permits.lock().unwrap_or_else(PoisonError::into_inner);
        *permits += 1;
        self.cond.notify_one();
    }

    fn wait(&self) {
        let mut permits = self.permits.lock().unwrap_or_else(PoisonError::into_inner);
        while *permits == 0 {
            permits = self
                .cond
                .wait(permits)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *permits -= 1;
    }
}

/// Drives topological iterators over graphs and applies visitor signals.
///
/// Each walker owns one resume gate, used by [`traverse`](Self::traverse)
/// and [`visit_edges`](Self::visit_edges). Clones get a gate of their own.
/// Threads sharing one walker whose visitors may suspend should use
/// [`traverse_with`](Self::traverse_with) with a handle per traversal.
#[derive(Debug, Default)]
pub struct Walker {
    options: TraversalOptions,
    suspend_policy: SuspendPolicy,
    resume: ResumeHandle,
}

impl Clone for Walker {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            suspend_policy: self.suspend_policy,
            resume: ResumeHandle::new(),
        }
    }
}

impl Walker {
    /// Creates a walker with the given options and the default suspend policy.
    pub fn new(options: TraversalOptions) -> Self {
        Self {
            options,
            suspend_policy: SuspendPolicy::default(),
            resume: ResumeHandle::default(),
        }
    }

    /// Creates a walker from a loaded configuration.
    pub fn from_config(config: &WalkerConfig) -> Self {
        Self::new(config.traversal_options()).with_suspend_policy(config.suspend_policy)
    }

    pub fn with_suspend_policy(mut self, policy: SuspendPolicy) -> Self {
        self.suspend_policy = policy;
        self
    }

    pub fn options(&self) -> &TraversalOptions {
        &self.options
    }

    pub fn suspend_policy(&self) -> SuspendPolicy {
        self.suspend_policy
    }

    /// Handle that wakes [`traverse`](Self::traverse) and
    /// [`visit_edges`](Self::visit_edges) when they are parked on a suspension.
    pub fn resume_handle(&self) -> ResumeHandle {
        self.resume.clone()
    }

    /// Validates `graph` and prepares a resumable traversal over it.
    ///
    /// Structural errors and unknown sources are reported here, before any
    /// visitor runs.
    pub fn start<'g>(&self, graph: &'g Graph) -> Result<Traversal<'g>> {
        graph.validate()?;
        let frontier = AnyFrontier::for_strategy(self.options.strategy, graph.node_count());
        let iter = TopologicalIterator::with_frontier(graph, frontier, &self.options)?;
        debug!(
            strategy = self.options.strategy.as_str(),
            direction = self.options.direction.as_str(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "starting traversal"
        );
        Ok(Traversal {
            iter,
            stats: TraversalStats::default(),
            failure: None,
        })
    }

    /// Walks `graph` to the end, calling `visitor` on every node reached.
    ///
    /// Suspensions are handled according to the walker's [`SuspendPolicy`];
    /// with [`SuspendPolicy::Block`] the calling thread parks until
    /// this walker's [`resume_handle`](Self::resume_handle) is resumed.
    pub fn traverse<V: Visitor>(&self, graph: &Graph, visitor: V) -> TraversalOutcome {
        self.traverse_with(graph, visitor, &self.resume)
    }

    /// Like [`traverse`](Self::traverse), but a blocking suspension waits on
    /// `resume` instead of the walker's own handle.
    pub fn traverse_with<V: Visitor>(
        &self,
        graph: &Graph,
        mut visitor: V,
        resume: &ResumeHandle,
    ) -> TraversalOutcome {
        let mut traversal = match self.start(graph) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "traversal rejected before the first visit");
                return TraversalOutcome::Failed(e);
            }
        };

        loop {
            match traversal.resume(&mut visitor) {
                RunStatus::Completed => return TraversalOutcome::Completed(traversal.stats),
                RunStatus::Aborted => return TraversalOutcome::Aborted(traversal.stats),
                RunStatus::Failed(e) => return TraversalOutcome::Failed(e),
                RunStatus::Suspended => self.on_suspend(resume),
            }
        }
    }

    /// Hands every edge of `graph`, in insertion order, to `visitor`.
    ///
    /// `Abort` ends the sweep, `KillBranch` behaves like `Continue` and
    /// `Suspend` follows the walker's policy. Edges seen are counted in
    /// `edges_followed`.
    pub fn visit_edges<V: Visitor>(&self, graph: &Graph, mut visitor: V) -> TraversalOutcome {
        if let Err(e) = graph.validate() {
            warn!(error = %e, "edge sweep rejected");
            return TraversalOutcome::Failed(e);
        }

        let mut stats = TraversalStats::default();
        for (idx, edge) in graph.edges() {
            stats.edges_followed += 1;
            match visitor.visit(Component::Edge(idx, edge)) {
                Ok(Signal::Continue | Signal::KillBranch) => {}
                Ok(Signal::Abort) => {
                    debug!(edge = %edge.display_name(), "edge sweep aborted by visitor");
                    return TraversalOutcome::Aborted(stats);
                }
                Ok(Signal::Suspend) => {
                    stats.suspensions += 1;
                    self.on_suspend(&self.resume);
                }
                Err(e) => {
                    warn!(edge = %edge.display_name(), error = %e, "visitor failed");
                    return TraversalOutcome::Failed(TraversalError::VisitorFailure {
                        node: edge.display_name(),
                        message: e.message().to_string(),
                    });
                }
            }
        }
        TraversalOutcome::Completed(stats)
    }

    fn on_suspend(&self, resume: &ResumeHandle) {
        match self.suspend_policy {
            SuspendPolicy::Block => {
                debug!("traversal suspended, waiting for resume");
                resume.wait();
                debug!("traversal resumed");
            }
            SuspendPolicy::Continue => {
                debug!("suspend requested, continuing per policy");
            }
        }
    }
}

/// A traversal in progress, owned by the caller between resumptions.
///
/// All visited state lives here; dropping the traversal discards it.
pub struct Traversal<'g> {
    iter: TopologicalIterator<'g, AnyFrontier<Entry>>,
    stats: TraversalStats,
    failure: Option<Failure>,
}

/// What ended a failed traversal, kept so later resumes can report it again.
#[derive(Debug, Clone)]
enum Failure {
    Visitor { node: String, message: String },
    Frontier,
}

impl Failure {
    fn to_error(&self) -> TraversalError {
        match self {
            Failure::Visitor { node, message } => TraversalError::VisitorFailure {
                node: node.clone(),
                message: message.clone(),
            },
            Failure::Frontier => TraversalError::EmptyFrontier,
        }
    }
}

impl<'g> Traversal<'g> {
    pub fn stats(&self) -> &TraversalStats {
        &self.stats
    }

    pub fn state(&self) -> IteratorState {
        self.iter.state()
    }

    /// Keys of the nodes visited so far, in graph insertion order.
    pub fn visited_keys(&self) -> Vec<&'g NodeKey> {
        let graph = self.iter.graph();
        graph
            .nodes()
            .filter(|(idx, _)| self.iter.visited().contains(*idx))
            .map(|(_, node)| &node.key)
            .collect()
    }

    /// Runs until the frontier drains, a visitor aborts, fails or suspends.
    ///
    /// Calling this again after `Suspended` continues from where the walk
    /// stopped. After a terminal status it returns that status again without
    /// visiting anything; a failed traversal keeps reporting `Failed`.
    pub fn resume<V: Visitor>(&mut self, mut visitor: V) -> RunStatus {
        if let Some(failure) = &self.failure {
            return RunStatus::Failed(failure.to_error());
        }
        match self.iter.state() {
            IteratorState::Done => return RunStatus::Completed,
            IteratorState::Aborted => return RunStatus::Aborted,
            IteratorState::Unstarted | IteratorState::Iterating => {}
        }

        let graph = self.iter.graph();
        loop {
            let entry = match self.iter.next_node() {
                Ok(Some(entry)) => entry,
                Ok(None) => {
                    info!(
                        visited = self.stats.nodes_visited,
                        edges = self.stats.edges_followed,
                        "traversal completed"
                    );
                    return RunStatus::Completed;
                }
                Err(e) => {
                    warn!(error = %e, "traversal stopped on frontier error");
                    self.iter.abort();
                    self.failure = Some(Failure::Frontier);
                    return RunStatus::Failed(e);
                }
            };

            self.stats.nodes_visited += 1;
            self.stats.max_depth_reached = self.stats.max_depth_reached.max(entry.depth);
            let node = &graph[entry.node];
            trace!(node = %node.key, depth = entry.depth, "visiting node");

            match visitor.visit(Component::Node(entry.node, node)) {
                Ok(Signal::Continue) => {
                    self.stats.edges_followed += self.iter.expand(entry);
                }
                Ok(Signal::KillBranch) => {
                    trace!(node = %node.key, "branch killed");
                    self.stats.branches_killed += 1;
                }
                Ok(Signal::Abort) => {
                    debug!(node = %node.key, "traversal aborted by visitor");
                    self.iter.abort();
                    return RunStatus::Aborted;
                }
                Ok(Signal::Suspend) => {
                    // The node itself was visited normally, so it is expanded before pausing.
                    self.stats.edges_followed += self.iter.expand(entry);
                    self.stats.suspensions += 1;
                    debug!(node = %node.key, "traversal suspended by visitor");
                    return RunStatus::Suspended;
                }
                Err(e) => {
                    warn!(node = %node.key, error = %e, "visitor failed");
                    self.iter.abort();
                    let failure = Failure::Visitor {
                        node: node.key.to_string(),
                        message: e.message().to_string(),
                    };
                    let error = failure.to_error();
                    self.failure = Some(failure);
                    return RunStatus::Failed(error);
                }
            }
        }
    }

    /// Forgets visited state and counters so the graph can be walked again
    /// from the same seeds.
    pub fn reset(&mut self) {
        self.iter.reset();
        self.stats = TraversalStats::default();
        self.failure = None;
    }

    /// Whether a visitor failure ended this traversal.
    pub fn has_failed(&self) -> bool {
        self.failure.is_some()
    }
}
