//! Turns solver output into a flat result relation.
//!
//! One row per solution path, in input pairing order, so the caller can
//! correlate row i with the i-th source/destination pair. Path geometry is
//! reconstructed by walking the tree edges through their stored oriented
//! polylines.

use serde::Serialize;

use crate::graph::Graph;
use crate::solver::{PathOutcome, SolutionPath};

#[derive(Serialize, Clone, Debug)]
pub struct PathRow {
    pub path_id: usize,
    pub outcome: PathOutcome,
    pub source_x: f64,
    pub source_y: f64,
    pub target_x: f64,
    pub target_y: f64,
    /// None when the pair has no finite cost (unreachable, unresolved or
    /// aborted), which keeps the JSON rendering valid.
    pub cost: Option<f64>,
    pub node_count: usize,
    /// Full path polyline, joint points deduplicated.
    pub geometry: Vec<(f64, f64)>,
}

#[derive(Serialize, Clone, Debug)]
pub struct ResultRelation {
    pub graph_name: String,
    pub solve_name: String,
    pub rows: Vec<PathRow>,
}

impl ResultRelation {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn materialize(graph: &Graph, solve_name: &str, paths: &[SolutionPath]) -> ResultRelation {
    let rows = paths
        .iter()
        .map(|path| PathRow {
            path_id: path.pair,
            outcome: path.outcome,
            source_x: path.source_point.x,
            source_y: path.source_point.y,
            target_x: path.destination_point.x,
            target_y: path.destination_point.y,
            cost: path.cost.is_finite().then_some(path.cost),
            node_count: path.nodes.len(),
            geometry: path_geometry(graph, path),
        })
        .collect();

    ResultRelation {
        graph_name: graph.name().to_string(),
        solve_name: solve_name.to_string(),
        rows,
    }
}

fn path_geometry(graph: &Graph, path: &SolutionPath) -> Vec<(f64, f64)> {
    if path.outcome != PathOutcome::Found {
        return Vec::new();
    }

    // A zero-length path still has a position: the single settled node.
    if path.edges.is_empty() {
        return path
            .nodes
            .first()
            .map(|&id| {
                let c = graph.node(id).coord;
                vec![(c.x, c.y)]
            })
            .unwrap_or_default();
    }

    let mut points: Vec<(f64, f64)> = Vec::new();
    for &edge_id in &path.edges {
        let line = &graph.edge(edge_id).geometry;
        let skip = usize::from(!points.is_empty());
        points.extend(line.0.iter().skip(skip).map(|c| (c.x, c.y)));
    }
    points
}
