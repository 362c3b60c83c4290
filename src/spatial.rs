//! Nearest-node resolution over a kd-tree of node coordinates.
//!
//! The tree is built once per graph, at assembly time. Queries descend the
//! splitting planes and only cross to the far side when the plane is
//! closer than the best candidate, so lookups stay logarithmic on balanced
//! input. Ties on distance resolve to the lowest node id, which keeps
//! repeated solves reproducible.

use geo::Coord;
use thiserror::Error;

use crate::geometry::distance_sq;
use crate::graph::{Node, NodeId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("cannot resolve a point against a graph with no nodes")]
    EmptyGraph,
}

#[derive(Clone, Copy, Debug)]
struct IndexEntry {
    coord: Coord<f64>,
    node: NodeId,
}

/// Balanced kd-tree stored flat: each subslice keeps its splitting entry
/// at the midpoint, with the left/right subtrees in the halves around it.
#[derive(Debug)]
pub struct NodeIndex {
    entries: Vec<IndexEntry>,
}

impl NodeIndex {
    pub fn build(nodes: &[Node]) -> Self {
        let mut entries: Vec<IndexEntry> = nodes
            .iter()
            .map(|n| IndexEntry {
                coord: n.coord,
                node: n.id,
            })
            .collect();
        arrange(&mut entries, 0);
        Self { entries }
    }

    /// The node nearest to `point` by Euclidean distance, lowest id on a
    /// tie.
    pub fn nearest(&self, point: Coord<f64>) -> Result<NodeId, ResolutionError> {
        if self.entries.is_empty() {
            return Err(ResolutionError::EmptyGraph);
        }
        let mut best: Option<(f64, NodeId)> = None;
        descend(&self.entries, 0, point, &mut best);
        Ok(best.map(|(_, id)| id).unwrap_or_default())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn axis_value(coord: Coord<f64>, depth: usize) -> f64 {
    if depth % 2 == 0 {
        coord.x
    } else {
        coord.y
    }
}

fn arrange(entries: &mut [IndexEntry], depth: usize) {
    if entries.len() <= 1 {
        return;
    }
    let mid = entries.len() / 2;
    entries.select_nth_unstable_by(mid, |a, b| {
        axis_value(a.coord, depth)
            .total_cmp(&axis_value(b.coord, depth))
            .then_with(|| a.node.cmp(&b.node))
    });
    let (left, rest) = entries.split_at_mut(mid);
    arrange(left, depth + 1);
    arrange(&mut rest[1..], depth + 1);
}

fn descend(
    entries: &[IndexEntry],
    depth: usize,
    point: Coord<f64>,
    best: &mut Option<(f64, NodeId)>,
) {
    if entries.is_empty() {
        return;
    }
    let mid = entries.len() / 2;
    let entry = entries[mid];

    let d2 = distance_sq(entry.coord, point);
    let better = match *best {
        None => true,
        Some((best_d2, best_id)) => {
            d2 < best_d2 || (d2 == best_d2 && entry.node < best_id)
        }
    };
    if better {
        *best = Some((d2, entry.node));
    }

    let delta = axis_value(point, depth) - axis_value(entry.coord, depth);
    let (near, far) = if delta < 0.0 {
        (&entries[..mid], &entries[mid + 1..])
    } else {
        (&entries[mid + 1..], &entries[..mid])
    };

    descend(near, depth + 1, point, best);
    // The far half can still hold the winner (or an equal-distance, lower
    // id) when the splitting plane is within the best radius.
    if best.map_or(true, |(best_d2, _)| delta * delta <= best_d2) {
        descend(far, depth + 1, point, best);
    }
}
