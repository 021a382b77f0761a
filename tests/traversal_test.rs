use std::collections::HashSet;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use topowalk::errors::TraversalError;
use topowalk::graph::Graph;
use topowalk::traversal::*;
use topowalk::types::*;

/// Helper: build a directed graph from node keys and (source, target) pairs.
fn build_graph(nodes: &[&str], edges: &[(&str, &str)]) -> Graph {
    let mut g = Graph::new();
    for key in nodes {
        g.add_node(*key).expect("failed to add node");
    }
    for (s, t) in edges {
        g.add_edge(*s, *t).expect("failed to add edge");
    }
    g
}

/// Diamond: A -> B, A -> C, B -> D, C -> D.
fn diamond() -> Graph {
    build_graph(
        &["A", "B", "C", "D"],
        &[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")],
    )
}

fn options(strategy: Strategy) -> TraversalOptions {
    TraversalOptions {
        strategy,
        ..TraversalOptions::default()
    }
}

fn from_sources(strategy: Strategy, sources: &[&str]) -> TraversalOptions {
    TraversalOptions {
        strategy,
        seeds: Seeds::Sources(sources.iter().map(|s| NodeKey::from(*s)).collect()),
        ..TraversalOptions::default()
    }
}

/// Runs a recording walk and returns (outcome, visited keys).
fn walk(graph: &Graph, opts: TraversalOptions) -> (TraversalOutcome, Vec<String>) {
    let mut recorder = Recorder::new();
    let outcome = Walker::new(opts).traverse(graph, &mut recorder);
    let keys = recorder
        .into_visited()
        .into_iter()
        .map(|k| k.to_string())
        .collect();
    (outcome, keys)
}

fn node_key(component: &Component<'_>) -> String {
    component
        .as_node()
        .map(|n| n.key.to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[test]
fn test_bfs_diamond_order() {
    let (outcome, visited) = walk(&diamond(), options(Strategy::BreadthFirst));
    assert!(outcome.is_completed(), "got {outcome:?}");
    assert_eq!(visited, vec!["A", "B", "C", "D"]);
}

#[test]
fn test_dfs_diamond_order() {
    let (outcome, visited) = walk(&diamond(), options(Strategy::DepthFirst));
    assert!(outcome.is_completed(), "got {outcome:?}");
    // D is reached through B first; expanding C finds it already visited.
    assert_eq!(visited, vec!["A", "B", "D", "C"]);
}

#[test]
fn test_dfs_and_bfs_visit_same_set_in_different_order() {
    let g = diamond();
    let (_, dfs) = walk(&g, options(Strategy::DepthFirst));
    let (_, bfs) = walk(&g, options(Strategy::BreadthFirst));

    let dfs_set: HashSet<_> = dfs.iter().collect();
    let bfs_set: HashSet<_> = bfs.iter().collect();
    assert_eq!(dfs_set, bfs_set);
    assert_ne!(dfs, bfs);
}

#[test]
fn test_every_node_visited_exactly_once() {
    // Cycle, self-loop, undirected edge and an isolated node.
    let mut g = build_graph(
        &["a", "b", "c", "d", "e", "lonely"],
        &[("a", "b"), ("b", "c"), ("c", "a"), ("c", "c"), ("d", "b")],
    );
    g.add_undirected_edge("d", "e").unwrap();

    for strategy in [Strategy::DepthFirst, Strategy::BreadthFirst] {
        for direction in [Direction::Outgoing, Direction::Incoming, Direction::Both] {
            let opts = TraversalOptions {
                strategy,
                direction,
                ..TraversalOptions::default()
            };
            let (outcome, visited) = walk(&g, opts);
            assert!(outcome.is_completed());
            assert_eq!(visited.len(), g.node_count(), "{strategy:?}/{direction:?}: {visited:?}");
            let unique: HashSet<_> = visited.iter().collect();
            assert_eq!(unique.len(), g.node_count(), "duplicate visit in {visited:?}");
            assert_eq!(outcome.stats().unwrap().nodes_visited, g.node_count());
        }
    }
}

#[test]
fn test_cycle_is_broken_by_visited_set() {
    let g = build_graph(&["x", "y", "z"], &[("x", "y"), ("y", "z"), ("z", "x")]);
    let (outcome, visited) = walk(&g, from_sources(Strategy::DepthFirst, &["y"]));
    assert!(outcome.is_completed());
    assert_eq!(visited, vec!["y", "z", "x"]);
}

#[test]
fn test_incoming_direction_walks_predecessors() {
    let g = build_graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
    let opts = TraversalOptions {
        direction: Direction::Incoming,
        ..from_sources(Strategy::BreadthFirst, &["c"])
    };
    let (_, visited) = walk(&g, opts);
    assert_eq!(visited, vec!["c", "b", "a"]);
}

#[test]
fn test_sources_restrict_reachable_set() {
    let g = build_graph(&["a", "b", "c", "d"], &[("a", "b"), ("c", "d")]);
    let (outcome, visited) = walk(&g, from_sources(Strategy::BreadthFirst, &["c"]));
    assert!(outcome.is_completed());
    assert_eq!(visited, vec!["c", "d"]);
}

#[test]
fn test_max_depth_stops_expansion() {
    let g = build_graph(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d")]);
    let opts = TraversalOptions {
        max_depth: Some(1),
        ..from_sources(Strategy::DepthFirst, &["a"])
    };
    let (outcome, visited) = walk(&g, opts);
    assert_eq!(visited, vec!["a", "b"]);
    assert_eq!(outcome.stats().unwrap().max_depth_reached, 1);
}

#[test]
fn test_iterator_yields_traversal_order() {
    let g = diamond();
    let bfs: Vec<String> = BreadthFirstIterator::new(&g, &TraversalOptions::default())
        .unwrap()
        .map(|idx| g[idx].key.to_string())
        .collect();
    assert_eq!(bfs, vec!["A", "B", "C", "D"]);

    let dfs: Vec<String> = DepthFirstIterator::new(&g, &TraversalOptions::default())
        .unwrap()
        .map(|idx| g[idx].key.to_string())
        .collect();
    assert_eq!(dfs, vec!["A", "B", "D", "C"]);
}

#[test]
fn test_iterator_state_machine() {
    let g = build_graph(&["only"], &[]);
    let mut it = DepthFirstIterator::new(&g, &TraversalOptions::default()).unwrap();
    assert_eq!(it.state(), IteratorState::Unstarted);

    let entry = it.next_node().unwrap().expect("one node");
    assert_eq!(it.state(), IteratorState::Iterating);
    assert_eq!(entry.depth, 0);
    assert_eq!(it.expand(entry), 0, "isolated node has nothing to expand");

    assert!(it.next_node().unwrap().is_none());
    assert_eq!(it.state(), IteratorState::Done);
    assert_eq!(it.visited().len(), 1);

    it.reset();
    assert_eq!(it.state(), IteratorState::Unstarted);
    assert!(it.visited().is_empty());
    assert!(it.next_node().unwrap().is_some());

    it.abort();
    assert_eq!(it.state(), IteratorState::Aborted);
    assert!(it.next_node().unwrap().is_none());
    assert_eq!(it.pending(), 0);
}

#[test]
fn test_iterator_unknown_source() {
    let g = diamond();
    let result = BreadthFirstIterator::new(&g, &from_sources(Strategy::BreadthFirst, &["Z"]));
    assert!(matches!(result, Err(TraversalError::UnknownNode { ref key }) if key == "Z"));
}

// ---------------------------------------------------------------------------
// Edge cases
// ---------------------------------------------------------------------------

#[test]
fn test_empty_graph_completes_with_no_visits() {
    let g = Graph::new();
    let (outcome, visited) = walk(&g, options(Strategy::BreadthFirst));
    assert!(outcome.is_completed());
    assert!(visited.is_empty());
    assert_eq!(outcome.stats().unwrap().nodes_visited, 0);
}

#[test]
fn test_single_isolated_node_visited_once() {
    let g = build_graph(&["solo"], &[]);
    let (outcome, visited) = walk(&g, options(Strategy::DepthFirst));
    assert!(outcome.is_completed());
    assert_eq!(visited, vec!["solo"]);
    assert_eq!(outcome.stats().unwrap().edges_followed, 0);
}

#[test]
fn test_structural_error_fails_before_any_visit() {
    let doc = GraphDocument {
        nodes: vec![
            NodeSpec {
                key: NodeKey::from("a"),
                label: None,
            },
        ],
        edges: vec![EdgeSpec {
            source: NodeKey::from("a"),
            target: NodeKey::from("nowhere"),
            directed: true,
            label: None,
        }],
    };
    let g = Graph::try_from(doc).unwrap();

    let mut calls = 0;
    let outcome = Walker::default().traverse(
        &g,
        from_fn(|_| {
            calls += 1;
            Signal::Continue
        }),
    );
    assert!(matches!(
        outcome,
        TraversalOutcome::Failed(TraversalError::GraphStructure { .. })
    ));
    assert_eq!(calls, 0, "visitor must not run on a malformed graph");
}

#[test]
fn test_unknown_source_fails_traversal() {
    let g = diamond();
    let outcome = Walker::new(from_sources(Strategy::DepthFirst, &["nope"]))
        .traverse(&g, Recorder::new());
    assert!(matches!(
        outcome,
        TraversalOutcome::Failed(TraversalError::UnknownNode { .. })
    ));
}

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

#[test]
fn test_abort_halts_dequeuing() {
    let g = diamond();
    let mut seen = Vec::new();
    let outcome = Walker::new(options(Strategy::BreadthFirst)).traverse(
        &g,
        from_fn(|c| {
            let key = node_key(&c);
            seen.push(key.clone());
            if key == "B" {
                Signal::Abort
            } else {
                Signal::Continue
            }
        }),
    );
    assert!(outcome.is_aborted(), "got {outcome:?}");
    assert_eq!(seen, vec!["A", "B"]);
    assert_eq!(outcome.stats().unwrap().nodes_visited, 2);
}

#[test]
fn test_kill_branch_skips_expansion_only() {
    // a -> b -> c, a -> d. Killing b keeps c unreached; d is still visited.
    let g = build_graph(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("a", "d")]);
    let mut seen = Vec::new();
    let outcome = Walker::new(from_sources(Strategy::DepthFirst, &["a"])).traverse(
        &g,
        from_fn(|c| {
            let key = node_key(&c);
            seen.push(key.clone());
            if key == "b" {
                Signal::KillBranch
            } else {
                Signal::Continue
            }
        }),
    );
    assert!(outcome.is_completed());
    assert_eq!(seen, vec!["a", "b", "d"]);
    assert_eq!(outcome.stats().unwrap().branches_killed, 1);
}

#[test]
fn test_kill_branch_with_all_node_seeds_still_visits_everything() {
    let g = build_graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
    let mut seen = Vec::new();
    let outcome = Walker::new(options(Strategy::BreadthFirst)).traverse(
        &g,
        from_fn(|c| {
            seen.push(node_key(&c));
            Signal::KillBranch
        }),
    );
    assert!(outcome.is_completed());
    assert_eq!(seen, vec!["a", "b", "c"], "seeds are queued independently of expansion");
    assert_eq!(outcome.stats().unwrap().edges_followed, 0);
}

#[test]
fn test_visitor_failure_reports_node() {
    let g = diamond();
    let mut seen = 0;
    let outcome = Walker::new(options(Strategy::BreadthFirst)).traverse(
        &g,
        try_from_fn(|c| {
            seen += 1;
            if node_key(&c) == "C" {
                Err(VisitError::new("bad feature"))
            } else {
                Ok(Signal::Continue)
            }
        }),
    );
    match outcome {
        TraversalOutcome::Failed(TraversalError::VisitorFailure { node, message }) => {
            assert_eq!(node, "C");
            assert_eq!(message, "bad feature");
        }
        other => panic!("expected VisitorFailure, got {other:?}"),
    }
    assert_eq!(seen, 3, "nothing is visited after the failing node");
}

#[test]
fn test_visitor_failure_leaves_traversal_failed_and_aborted() {
    let g = diamond();
    let walker = Walker::new(options(Strategy::BreadthFirst));
    let mut traversal = walker.start(&g).expect("diamond is well formed");

    let mut seen = Vec::new();
    let mut visitor = try_from_fn(|c| {
        let key = node_key(&c);
        seen.push(key.clone());
        if key == "B" {
            Err(VisitError::new("corrupt"))
        } else {
            Ok(Signal::Continue)
        }
    });

    let first = traversal.resume(&mut visitor);
    assert!(matches!(
        first,
        RunStatus::Failed(TraversalError::VisitorFailure { ref node, .. }) if node == "B"
    ));
    assert_eq!(traversal.state(), IteratorState::Aborted);
    assert!(traversal.has_failed());

    let again = traversal.resume(&mut visitor);
    match again {
        RunStatus::Failed(TraversalError::VisitorFailure { node, message }) => {
            assert_eq!(node, "B");
            assert_eq!(message, "corrupt");
        }
        other => panic!("failure must still be reported, got {other:?}"),
    }
    assert_eq!(traversal.stats().nodes_visited, 2);
    drop(visitor);
    assert_eq!(seen, vec!["A", "B"], "nothing is visited after a failure");

    traversal.reset();
    assert!(!traversal.has_failed());
    assert_eq!(traversal.state(), IteratorState::Unstarted);
}

#[test]
fn test_suspend_with_resumable_traversal() {
    let g = diamond();
    let walker = Walker::new(options(Strategy::BreadthFirst));
    let mut traversal = walker.start(&g).expect("diamond is well formed");

    let mut seen = Vec::new();
    let mut visitor = from_fn(|c| {
        let key = node_key(&c);
        let signal = if key == "B" {
            Signal::Suspend
        } else {
            Signal::Continue
        };
        seen.push(key);
        signal
    });

    assert!(matches!(traversal.resume(&mut visitor), RunStatus::Suspended));
    assert_eq!(traversal.state(), IteratorState::Iterating);
    assert_eq!(traversal.stats().nodes_visited, 2);
    assert_eq!(traversal.stats().suspensions, 1);

    assert!(matches!(traversal.resume(&mut visitor), RunStatus::Completed));
    assert_eq!(traversal.state(), IteratorState::Done);
    assert!(matches!(traversal.resume(&mut visitor), RunStatus::Completed));
    drop(visitor);
    assert_eq!(seen, vec!["A", "B", "C", "D"]);
}

#[test]
fn test_suspend_continue_policy_does_not_block() {
    let g = diamond();
    let walker = Walker::new(options(Strategy::DepthFirst)).with_suspend_policy(SuspendPolicy::Continue);
    let outcome = walker.traverse(&g, from_fn(|_| Signal::Suspend));
    assert!(outcome.is_completed());
    let stats = outcome.stats().unwrap();
    assert_eq!(stats.nodes_visited, 4);
    assert_eq!(stats.suspensions, 4);
}

#[test]
fn test_suspend_block_policy_waits_for_resume_handle() {
    let g = diamond();
    let walker = Walker::new(options(Strategy::BreadthFirst));
    assert_eq!(walker.suspend_policy(), SuspendPolicy::Block);
    let handle = walker.resume_handle();

    let resumer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        handle.resume();
    });

    let mut suspended_once = false;
    let outcome = walker.traverse(
        &g,
        from_fn(|_| {
            if suspended_once {
                Signal::Continue
            } else {
                suspended_once = true;
                Signal::Suspend
            }
        }),
    );
    resumer.join().unwrap();
    assert!(outcome.is_completed());
    assert_eq!(outcome.stats().unwrap().nodes_visited, 4);
}

#[test]
fn test_resume_issued_before_suspend_is_remembered() {
    let g = build_graph(&["a", "b"], &[("a", "b")]);
    let walker = Walker::new(options(Strategy::DepthFirst));
    walker.resume_handle().resume();

    let mut first = true;
    let outcome = walker.traverse(
        &g,
        from_fn(|_| {
            if std::mem::take(&mut first) {
                Signal::Suspend
            } else {
                Signal::Continue
            }
        }),
    );
    assert!(outcome.is_completed());
}

#[test]
fn test_each_early_resume_releases_one_suspension() {
    let g = build_graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
    let walker = Walker::new(options(Strategy::DepthFirst));
    let handle = walker.resume_handle();
    handle.resume();
    handle.resume();
    assert_eq!(handle.pending(), 2);

    let mut visits = 0;
    let outcome = walker.traverse(
        &g,
        from_fn(|_| {
            visits += 1;
            if visits <= 2 {
                Signal::Suspend
            } else {
                Signal::Continue
            }
        }),
    );
    assert!(outcome.is_completed());
    assert_eq!(outcome.stats().unwrap().suspensions, 2);
    assert_eq!(handle.pending(), 0);
}

#[test]
fn test_cloned_walker_has_its_own_resume_gate() {
    let g = build_graph(&["a", "b"], &[("a", "b")]);
    let walker = Walker::new(options(Strategy::DepthFirst));
    let clone = walker.clone();
    walker.resume_handle().resume();
    let clone_handle = clone.resume_handle();
    assert_eq!(clone_handle.pending(), 0);

    let (done_tx, done_rx) = mpsc::channel();
    thread::scope(|scope| {
        let g = &g;
        let clone = &clone;
        scope.spawn(move || {
            let mut first = true;
            let outcome = clone.traverse(
                g,
                from_fn(|_| {
                    if std::mem::take(&mut first) {
                        Signal::Suspend
                    } else {
                        Signal::Continue
                    }
                }),
            );
            done_tx.send(outcome.is_completed()).unwrap();
        });

        assert!(
            done_rx.recv_timeout(Duration::from_millis(100)).is_err(),
            "a resume on the original walker must not wake the clone"
        );
        clone_handle.resume();
        assert!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap());
    });
    assert_eq!(walker.resume_handle().pending(), 1);
}

#[test]
fn test_traverse_with_wakes_only_its_own_traversal() {
    let g = diamond();
    let walker = Walker::new(options(Strategy::BreadthFirst));
    let handles = [ResumeHandle::new(), ResumeHandle::new()];
    let (walker, g) = (&walker, &g);

    thread::scope(|scope| {
        let workers: Vec<_> = handles
            .iter()
            .map(|handle| {
                scope.spawn(move || {
                    let mut first = true;
                    walker.traverse_with(
                        g,
                        from_fn(|_| {
                            if std::mem::take(&mut first) {
                                Signal::Suspend
                            } else {
                                Signal::Continue
                            }
                        }),
                        handle,
                    )
                })
            })
            .collect();

        for handle in &handles {
            thread::sleep(Duration::from_millis(10));
            handle.resume();
        }
        for worker in workers {
            let outcome = worker.join().unwrap();
            assert!(outcome.is_completed());
            assert_eq!(outcome.stats().unwrap().nodes_visited, 4);
        }
    });
    assert!(handles.iter().all(|h| h.pending() == 0));
    assert_eq!(walker.resume_handle().pending(), 0);
}

#[test]
fn test_parallel_edges_queue_neighbour_once() {
    let g = build_graph(&["a", "b"], &[("a", "b"), ("a", "b"), ("b", "a")]);
    let opts = TraversalOptions {
        direction: Direction::Both,
        ..from_sources(Strategy::BreadthFirst, &["a"])
    };
    let (outcome, keys) = walk(&g, opts);
    assert_eq!(keys, vec!["a", "b"]);
    let stats = outcome.stats().unwrap();
    assert_eq!(stats.nodes_visited, 2);
    assert_eq!(stats.edges_followed, 1);
}

// ---------------------------------------------------------------------------
// Repetition and concurrency
// ---------------------------------------------------------------------------

#[test]
fn test_reset_reproduces_same_sequence() {
    let g = build_graph(
        &["a", "b", "c", "d", "e"],
        &[("a", "c"), ("c", "e"), ("b", "d"), ("d", "a")],
    );
    let walker = Walker::new(options(Strategy::DepthFirst));
    let mut traversal = walker.start(&g).unwrap();

    let mut first = Recorder::new();
    assert!(matches!(traversal.resume(&mut first), RunStatus::Completed));
    let first_stats = traversal.stats().clone();
    assert_eq!(traversal.visited_keys().len(), 5);

    traversal.reset();
    assert_eq!(traversal.state(), IteratorState::Unstarted);
    assert!(traversal.visited_keys().is_empty());

    let mut second = Recorder::new();
    assert!(matches!(traversal.resume(&mut second), RunStatus::Completed));
    assert_eq!(first.visited(), second.visited());
    assert_eq!(&first_stats, traversal.stats());

    let (_, fresh) = walk(&g, options(Strategy::DepthFirst));
    let fresh_keys: Vec<String> = first.visited().iter().map(|k| k.to_string()).collect();
    assert_eq!(fresh, fresh_keys);
}

#[test]
fn test_concurrent_traversals_of_same_graph() {
    let g = diamond();
    let walker = Walker::new(options(Strategy::BreadthFirst));
    let (walker, g) = (&walker, &g);

    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(move || {
                    let mut recorder = Recorder::new();
                    let outcome = walker.traverse(g, &mut recorder);
                    assert!(outcome.is_completed());
                    recorder.into_visited()
                })
            })
            .collect();
        for h in handles {
            let visited: Vec<String> = h.join().unwrap().iter().map(|k| k.to_string()).collect();
            assert_eq!(visited, vec!["A", "B", "C", "D"]);
        }
    });
}

// ---------------------------------------------------------------------------
// Edge sweep
// ---------------------------------------------------------------------------

#[test]
fn test_visit_edges_in_insertion_order() {
    let g = diamond();
    let mut names = Vec::new();
    let outcome = Walker::default().visit_edges(
        &g,
        from_fn(|c| {
            assert_eq!(c.kind(), ComponentKind::Edge);
            names.push(c.display_name());
            Signal::Continue
        }),
    );
    assert!(outcome.is_completed());
    assert_eq!(names, vec!["A->B", "A->C", "B->D", "C->D"]);
    assert_eq!(outcome.stats().unwrap().edges_followed, 4);
}

#[test]
fn test_visit_edges_abort() {
    let g = diamond();
    let mut count = 0;
    let outcome = Walker::default().visit_edges(
        &g,
        from_fn(|_| {
            count += 1;
            if count == 2 {
                Signal::Abort
            } else {
                Signal::KillBranch
            }
        }),
    );
    assert!(outcome.is_aborted());
    assert_eq!(count, 2);
}
