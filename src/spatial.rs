//! R-tree spatial indexes over GPS points.
//!
//! Two flavors back the discovery engine: a [`GlobalIndex`] over the whole
//! point arena, and a per-track [`TrackIndex`] whose query hits translate
//! back to global arena indices in O(1). Both are immutable after
//! construction, so queries are safe from parallel workers.
//!
//! Queries are planar radius queries in degree space; the callers convert
//! metric margins to degrees before querying and never report degree
//! distances.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::store::TrackStore;
use crate::GpsPoint;

/// An indexed element: a planar `[lat, lng]` position carrying the arena
/// index it resolves to.
#[derive(Debug, Clone, Copy)]
pub struct ArenaPoint {
    global: u32,
    planar: [f64; 2],
}

impl ArenaPoint {
    fn new(global: u32, point: &GpsPoint) -> Self {
        Self {
            global,
            planar: [point.latitude, point.longitude],
        }
    }

    /// The arena index this element resolves to.
    pub fn global(&self) -> u32 {
        self.global
    }
}

impl RTreeObject for ArenaPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.planar)
    }
}

impl PointDistance for ArenaPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.planar
            .iter()
            .zip(point)
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

/// Spatial index over a single track's points.
///
/// Elements carry their global arena index, and the track's contiguous
/// arena range makes the position-within-track translation a constant-time
/// offset subtraction.
#[derive(Debug)]
pub struct TrackIndex {
    tree: RTree<ArenaPoint>,
    first_global: u32,
}

impl TrackIndex {
    /// Build an index for one track whose arena range starts at
    /// `first_global`.
    pub fn build(points: &[GpsPoint], first_global: u32) -> Self {
        let elements: Vec<ArenaPoint> = points
            .iter()
            .enumerate()
            .map(|(i, p)| ArenaPoint::new(first_global + i as u32, p))
            .collect();
        Self {
            tree: RTree::bulk_load(elements),
            first_global,
        }
    }

    /// All (track position, global index) pairs within `radius_deg` of
    /// `center` in planar degree space. Order is unspecified.
    pub fn inrange(&self, center: &GpsPoint, radius_deg: f64) -> Vec<(usize, u32)> {
        let query = [center.latitude, center.longitude];
        self.tree
            .locate_within_distance(query, radius_deg * radius_deg)
            .map(|e| ((e.global - self.first_global) as usize, e.global))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Spatial index over every point of every track in a store.
#[derive(Debug)]
pub struct GlobalIndex {
    tree: RTree<ArenaPoint>,
}

impl GlobalIndex {
    /// Build the index over the store's whole point arena.
    pub fn build(store: &TrackStore) -> Self {
        let elements: Vec<ArenaPoint> = store
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| ArenaPoint::new(i as u32, p))
            .collect();
        Self {
            tree: RTree::bulk_load(elements),
        }
    }

    /// Global indices of all points within `radius_deg` of `center` in
    /// planar degree space. Order is unspecified.
    pub fn inrange(&self, center: &GpsPoint, radius_deg: f64) -> Vec<u32> {
        let query = [center.latitude, center.longitude];
        self.tree
            .locate_within_distance(query, radius_deg * radius_deg)
            .map(|e| e.global)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
