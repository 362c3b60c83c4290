//! Graph construction from raw edge records.
//!
//! Endpoints of each record polyline are canonicalized into node
//! identities; a two-way record contributes a forward and a reverse edge
//! sharing the weight. The builder is pure: it returns a fresh immutable
//! graph and never touches previously built ones.

use std::collections::HashMap;

use geo::{Coord, LineString};
use thiserror::Error;
use tracing::debug;

use crate::geometry::reversed;
use crate::graph::{Edge, EdgeId, Graph, Node, NodeId};

/// One raw edge row, as handed over by a loader.
#[derive(Clone, Debug)]
pub struct EdgeRecord {
    pub geometry: LineString<f64>,
    /// True for a two-way road: both directions are traversable at the
    /// same weight.
    pub two_way: bool,
    pub weight: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("record {record}: invalid weight {weight} (must be non-negative and finite)")]
    InvalidWeight { record: usize, weight: f64 },
    #[error("record {record}: geometry has fewer than 2 distinct points")]
    DegenerateGeometry { record: usize },
}

pub struct GraphBuilder {
    epsilon: f64,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self { epsilon: 0.0 }
    }

    /// Endpoints within `epsilon` of each other collapse to one node.
    /// Zero (the default) requires exact coordinate identity.
    pub fn with_epsilon(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.max(0.0),
        }
    }

    pub fn build(&self, name: &str, records: &[EdgeRecord]) -> Result<Graph, BuildError> {
        let mut nodes: Vec<Node> = Vec::new();
        let mut edges: Vec<Edge> = Vec::new();
        let mut seen: HashMap<(i64, i64), NodeId> = HashMap::new();

        for (record, rec) in records.iter().enumerate() {
            if !rec.weight.is_finite() || rec.weight < 0.0 {
                return Err(BuildError::InvalidWeight {
                    record,
                    weight: rec.weight,
                });
            }
            if !has_two_distinct_points(&rec.geometry) {
                return Err(BuildError::DegenerateGeometry { record });
            }

            // Endpoint canonicalization; interior polyline points are kept
            // as geometry only and never become nodes.
            let start = rec.geometry.0[0];
            let end = *rec.geometry.0.last().unwrap_or(&start);
            let source = intern_node(&mut nodes, &mut seen, start, self.epsilon);
            let target = intern_node(&mut nodes, &mut seen, end, self.epsilon);

            if source == target {
                debug!("record {} collapsed to a self-loop on node {}", record, source);
            }

            edges.push(Edge {
                id: edges.len() as EdgeId,
                source,
                target,
                weight: rec.weight,
                geometry: rec.geometry.clone(),
                record,
            });
            if rec.two_way {
                edges.push(Edge {
                    id: edges.len() as EdgeId,
                    source: target,
                    target: source,
                    weight: rec.weight,
                    geometry: reversed(&rec.geometry),
                    record,
                });
            }
        }

        let graph = Graph::assemble(name.to_string(), nodes, edges);
        debug!("built graph '{}': {}", name, graph.stats());
        Ok(graph)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn has_two_distinct_points(line: &LineString<f64>) -> bool {
    match line.0.first() {
        None => false,
        Some(first) => line.0.iter().any(|c| c != first),
    }
}

fn intern_node(
    nodes: &mut Vec<Node>,
    seen: &mut HashMap<(i64, i64), NodeId>,
    coord: Coord<f64>,
    epsilon: f64,
) -> NodeId {
    let key = snap_key(coord, epsilon);
    if let Some(&id) = seen.get(&key) {
        return id;
    }
    let id = nodes.len() as NodeId;
    nodes.push(Node { id, coord });
    seen.insert(key, id);
    id
}

fn snap_key(coord: Coord<f64>, epsilon: f64) -> (i64, i64) {
    if epsilon > 0.0 {
        ((coord.x / epsilon).floor() as i64, (coord.y / epsilon).floor() as i64)
    } else {
        (coord.x.to_bits() as i64, coord.y.to_bits() as i64)
    }
}
