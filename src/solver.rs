//! Shortest-path solving over an immutable graph.
//!
//! Single-pair paths come from a Dijkstra relaxation with a binary heap;
//! edge weights are non-negative by builder invariant, so no negative-cycle
//! handling exists anywhere. A one-to-many request shares one search tree
//! seeded from the source; a paired many-to-many request fans its pairs out
//! across the rayon pool, each pair reading the shared graph and writing
//! only its own result.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use geo::Coord;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::graph::{EdgeId, Graph, NodeId};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SolveMode {
    OneToOne,
    OneToMany,
    /// Paired by list index, never a cross product.
    ManyToMany,
}

#[derive(Clone, Debug)]
pub struct SolveRequest {
    pub mode: SolveMode,
    pub sources: Vec<Coord<f64>>,
    pub destinations: Vec<Coord<f64>>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    #[error("source/destination list lengths ({sources}, {destinations}) do not fit the requested mode")]
    LengthMismatch { sources: usize, destinations: usize },
    #[error("solve request has an empty source or destination list")]
    EmptyInput,
}

/// Per-pair outcome. Unreachable and unresolved pairs are results, not
/// errors: one bad pair never aborts its siblings.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PathOutcome {
    Found,
    Unreachable,
    /// The query point could not be mapped to a graph node.
    Unresolved,
    /// Skipped because the request deadline passed or it was cancelled
    /// before this pair started.
    Aborted,
}

impl PathOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathOutcome::Found => "found",
            PathOutcome::Unreachable => "unreachable",
            PathOutcome::Unresolved => "unresolved",
            PathOutcome::Aborted => "aborted",
        }
    }
}

#[derive(Clone, Debug)]
pub struct SolutionPath {
    /// Index of the source/destination pair this path answers.
    pub pair: usize,
    pub source_point: Coord<f64>,
    pub destination_point: Coord<f64>,
    pub source: Option<NodeId>,
    pub destination: Option<NodeId>,
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
    /// Total accumulated weight; +inf unless the outcome is Found.
    pub cost: f64,
    pub outcome: PathOutcome,
}

impl SolutionPath {
    fn empty(pair: usize, s: Coord<f64>, d: Coord<f64>, outcome: PathOutcome) -> Self {
        Self {
            pair,
            source_point: s,
            destination_point: d,
            source: None,
            destination: None,
            nodes: Vec::new(),
            edges: Vec::new(),
            cost: f64::INFINITY,
            outcome,
        }
    }
}

/// Cooperative cancellation flag shared between a caller and an in-flight
/// solve. Pairs already computed when it fires are still returned.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::Relaxed)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SolveOptions {
    /// Pairs not yet started when the deadline passes are emitted as
    /// Aborted rows instead of being computed.
    pub timeout: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl SolveOptions {
    fn deadline(&self) -> Option<Instant> {
        self.timeout.map(|t| Instant::now() + t)
    }
}

fn expired(deadline: Option<Instant>, cancel: &Option<CancelToken>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
        || cancel.as_ref().is_some_and(CancelToken::is_cancelled)
}

/// Runs a solve request against a graph. Request-shape problems fail the
/// whole call; everything per-pair is reported in the returned paths, in
/// input pairing order.
pub fn solve(
    graph: &Graph,
    request: &SolveRequest,
    options: &SolveOptions,
) -> Result<Vec<SolutionPath>, SolveError> {
    if request.sources.is_empty() || request.destinations.is_empty() {
        return Err(SolveError::EmptyInput);
    }

    let shape_ok = match request.mode {
        SolveMode::OneToOne => request.sources.len() == 1 && request.destinations.len() == 1,
        SolveMode::OneToMany => request.sources.len() == 1,
        SolveMode::ManyToMany => request.sources.len() == request.destinations.len(),
    };
    if !shape_ok {
        return Err(SolveError::LengthMismatch {
            sources: request.sources.len(),
            destinations: request.destinations.len(),
        });
    }

    let deadline = options.deadline();
    let paths = match request.mode {
        SolveMode::OneToOne => vec![solve_pair(
            graph,
            0,
            request.sources[0],
            request.destinations[0],
            deadline,
            &options.cancel,
        )],
        SolveMode::OneToMany => solve_one_to_many(
            graph,
            request.sources[0],
            &request.destinations,
            deadline,
            &options.cancel,
        ),
        SolveMode::ManyToMany => (0..request.sources.len())
            .into_par_iter()
            .map(|i| {
                solve_pair(
                    graph,
                    i,
                    request.sources[i],
                    request.destinations[i],
                    deadline,
                    &options.cancel,
                )
            })
            .collect(),
    };

    debug!(
        "solved {} pair(s) against graph '{}'",
        paths.len(),
        graph.name()
    );
    Ok(paths)
}

fn solve_pair(
    graph: &Graph,
    pair: usize,
    source_point: Coord<f64>,
    destination_point: Coord<f64>,
    deadline: Option<Instant>,
    cancel: &Option<CancelToken>,
) -> SolutionPath {
    if expired(deadline, cancel) {
        return SolutionPath::empty(pair, source_point, destination_point, PathOutcome::Aborted);
    }

    let (source, destination) = match (
        graph.nearest_node(source_point),
        graph.nearest_node(destination_point),
    ) {
        (Ok(s), Ok(d)) => (s, d),
        _ => {
            return SolutionPath::empty(
                pair,
                source_point,
                destination_point,
                PathOutcome::Unresolved,
            )
        }
    };

    let (dist, prev) = shortest_path_tree(graph, source, &[destination]);
    finish_path(
        graph,
        pair,
        source_point,
        destination_point,
        source,
        destination,
        &dist,
        &prev,
    )
}

fn solve_one_to_many(
    graph: &Graph,
    source_point: Coord<f64>,
    destination_points: &[Coord<f64>],
    deadline: Option<Instant>,
    cancel: &Option<CancelToken>,
) -> Vec<SolutionPath> {
    if expired(deadline, cancel) {
        return destination_points
            .iter()
            .enumerate()
            .map(|(i, &d)| SolutionPath::empty(i, source_point, d, PathOutcome::Aborted))
            .collect();
    }

    let source = match graph.nearest_node(source_point) {
        Ok(s) => s,
        Err(_) => {
            return destination_points
                .iter()
                .enumerate()
                .map(|(i, &d)| {
                    SolutionPath::empty(i, source_point, d, PathOutcome::Unresolved)
                })
                .collect()
        }
    };

    let destinations: Vec<Option<NodeId>> = destination_points
        .iter()
        .map(|&d| graph.nearest_node(d).ok())
        .collect();
    let targets: Vec<NodeId> = destinations.iter().copied().flatten().collect();

    // One search tree answers every destination of the batch.
    let (dist, prev) = shortest_path_tree(graph, source, &targets);

    destination_points
        .iter()
        .enumerate()
        .map(|(pair, &destination_point)| match destinations[pair] {
            None => SolutionPath::empty(pair, source_point, destination_point, PathOutcome::Unresolved),
            Some(destination) => finish_path(
                graph,
                pair,
                source_point,
                destination_point,
                source,
                destination,
                &dist,
                &prev,
            ),
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn finish_path(
    graph: &Graph,
    pair: usize,
    source_point: Coord<f64>,
    destination_point: Coord<f64>,
    source: NodeId,
    destination: NodeId,
    dist: &[f64],
    prev: &[Option<EdgeId>],
) -> SolutionPath {
    match extract_path(graph, source, destination, dist, prev) {
        Some((nodes, edges, cost)) => SolutionPath {
            pair,
            source_point,
            destination_point,
            source: Some(source),
            destination: Some(destination),
            nodes,
            edges,
            cost,
            outcome: PathOutcome::Found,
        },
        None => SolutionPath {
            source: Some(source),
            destination: Some(destination),
            ..SolutionPath::empty(pair, source_point, destination_point, PathOutcome::Unreachable)
        },
    }
}

#[derive(Clone, Copy, Debug)]
struct QueueEntry {
    cost: f64,
    node: NodeId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Cost ties break on the lower node id so settle order, and with
        // it the whole result, is reproducible.
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.node.cmp(&other.node))
    }
}

/// Dijkstra from `source`, stopping early once every listed target has
/// settled. Returns per-node distance and the incoming tree edge.
fn shortest_path_tree(
    graph: &Graph,
    source: NodeId,
    targets: &[NodeId],
) -> (Vec<f64>, Vec<Option<EdgeId>>) {
    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<EdgeId>> = vec![None; n];
    let mut settled = vec![false; n];
    let mut remaining: HashSet<NodeId> = targets.iter().copied().collect();

    let mut heap = BinaryHeap::new();
    dist[source as usize] = 0.0;
    heap.push(Reverse(QueueEntry {
        cost: 0.0,
        node: source,
    }));

    while let Some(Reverse(QueueEntry { cost, node })) = heap.pop() {
        if settled[node as usize] {
            continue;
        }
        settled[node as usize] = true;
        remaining.remove(&node);
        if remaining.is_empty() {
            break;
        }

        for &edge_id in graph.out_edges(node) {
            let edge = graph.edge(edge_id);
            let next = edge.target as usize;
            let candidate = cost + edge.weight;
            if candidate < dist[next] {
                dist[next] = candidate;
                prev[next] = Some(edge_id);
                heap.push(Reverse(QueueEntry {
                    cost: candidate,
                    node: edge.target,
                }));
            }
        }
    }

    (dist, prev)
}

/// Walks the tree edges back from `target`. None when no path exists.
fn extract_path(
    graph: &Graph,
    source: NodeId,
    target: NodeId,
    dist: &[f64],
    prev: &[Option<EdgeId>],
) -> Option<(Vec<NodeId>, Vec<EdgeId>, f64)> {
    let cost = dist[target as usize];
    if !cost.is_finite() {
        return None;
    }

    let mut nodes = vec![target];
    let mut edges = Vec::new();
    let mut current = target;
    while current != source {
        let edge_id = prev[current as usize]?;
        edges.push(edge_id);
        current = graph.edge(edge_id).source;
        nodes.push(current);
    }
    nodes.reverse();
    edges.reverse();
    Some((nodes, edges, cost))
}
