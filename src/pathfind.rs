//! Segment-graph pathfinding.
//!
//! Discovered segments become nodes of a directed graph, one node per
//! (segment, orientation) pair. An edge connects two oriented segments
//! when the first one's oriented end point lies within a metric tolerance
//! of the second one's oriented start point, so a path reads head-to-tail
//! in travel order. Breadth-first search finds a shortest such chain.

use std::collections::VecDeque;

use log::info;
use serde::{Deserialize, Serialize};

use crate::discovery::Segment;
use crate::error::{Result, SegmentError};
use crate::geo_utils::haversine_distance;
use crate::store::TrackStore;
use crate::GpsPoint;

/// Traversal direction of a segment within a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Forward,
    Reversed,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Forward => "forward",
            Orientation::Reversed => "reversed",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of a found path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSegment {
    /// Position of the segment in the input list
    pub segment_index: usize,
    /// Direction the segment is traversed in
    pub orientation: Orientation,
    /// The underlying segment
    pub segment: Segment,
}

/// Endpoints of an oriented segment, in travel order.
fn oriented_endpoints(segment: &Segment, orientation: Orientation, store: &TrackStore) -> (GpsPoint, GpsPoint) {
    let start = store.point(segment.first_index());
    let end = store.point(segment.last_index());
    match orientation {
        Orientation::Forward => (start, end),
        Orientation::Reversed => (end, start),
    }
}

fn node_orientation(node: usize, n: usize) -> Orientation {
    if node < n {
        Orientation::Forward
    } else {
        Orientation::Reversed
    }
}

/// Find a head-to-tail chain of segments from `start` to `end`.
///
/// `start` and `end` are positions in `segments`. Only segments with at
/// least `min_runs` supporting tracks participate in the graph; endpoint
/// pairs connect when they are within `tolerance_m` meters great-circle
/// distance. The search starts from `start` traversed forward.
///
/// # Errors
///
/// - [`SegmentError::PathNotFound`] if BFS exhausts the graph without
///   visiting the end segment in either orientation
/// - [`SegmentError::PathReconstruction`] if the parent chain does not
///   lead back to the start segment
/// - [`SegmentError::PathTooShort`] if the path has fewer than
///   `min_length` segments
pub fn find_path_between_segments(
    segments: &[Segment],
    start: usize,
    end: usize,
    store: &TrackStore,
    min_length: usize,
    min_runs: usize,
    tolerance_m: f64,
) -> Result<Vec<PathSegment>> {
    let n = segments.len();
    if start >= n || end >= n {
        return Err(SegmentError::InvalidParameter {
            message: format!(
                "segment indices ({}, {}) out of range for {} segments",
                start, end, n
            ),
        });
    }

    let eligible: Vec<bool> = segments.iter().map(|s| s.run_count() >= min_runs).collect();
    if !eligible[start] {
        return Err(SegmentError::PathNotFound);
    }

    // Node i is (segment i, forward); node i + n is (segment i, reversed)
    let endpoints: Vec<(GpsPoint, GpsPoint)> = (0..2 * n)
        .map(|node| {
            let seg = node % n;
            oriented_endpoints(&segments[seg], node_orientation(node, n), store)
        })
        .collect();

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); 2 * n];
    for (u, u_ends) in endpoints.iter().enumerate() {
        if !eligible[u % n] {
            continue;
        }
        for (w, w_ends) in endpoints.iter().enumerate() {
            if u % n == w % n || !eligible[w % n] {
                continue;
            }
            if haversine_distance(&u_ends.1, &w_ends.0) <= tolerance_m {
                adjacency[u].push(w);
            }
        }
    }

    // BFS from (start, forward); first visit of either end node terminates
    let source = start;
    let mut visited = vec![false; 2 * n];
    let mut parents: Vec<Option<usize>> = vec![None; 2 * n];
    let mut queue = VecDeque::new();
    visited[source] = true;
    queue.push_back(source);

    let mut terminal: Option<usize> = None;
    while let Some(node) = queue.pop_front() {
        if node % n == end {
            terminal = Some(node);
            break;
        }
        for &next in &adjacency[node] {
            if !visited[next] {
                visited[next] = true;
                parents[next] = Some(node);
                queue.push_back(next);
            }
        }
    }

    let terminal = terminal.ok_or(SegmentError::PathNotFound)?;

    // Reconstruct by unshifting from the terminal to the source
    let mut path_nodes = Vec::new();
    let mut node = terminal;
    loop {
        path_nodes.push(node);
        match parents[node] {
            Some(parent) => node = parent,
            None => break,
        }
    }
    path_nodes.reverse();

    if path_nodes[0] % n != start {
        return Err(SegmentError::PathReconstruction);
    }
    if path_nodes.len() < min_length {
        return Err(SegmentError::PathTooShort {
            found: path_nodes.len(),
            minimum_required: min_length,
        });
    }

    info!(
        "[Pathfind] Found {}-segment path from {} to {}",
        path_nodes.len(),
        start,
        end
    );

    Ok(path_nodes
        .into_iter()
        .map(|node| PathSegment {
            segment_index: node % n,
            orientation: node_orientation(node, n),
            segment: segments[node % n].clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_display() {
        assert_eq!(Orientation::Forward.to_string(), "forward");
        assert_eq!(Orientation::Reversed.to_string(), "reversed");
    }

    #[test]
    fn test_node_orientation() {
        assert_eq!(node_orientation(2, 3), Orientation::Forward);
        assert_eq!(node_orientation(3, 3), Orientation::Reversed);
        assert_eq!(node_orientation(5, 3), Orientation::Reversed);
    }
}
