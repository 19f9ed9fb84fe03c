//! # segtrace
//!
//! Repeated route-segment discovery for GPS activity tracks.
//!
//! Given many recorded activities over an overlapping road network, this
//! library finds the segments of a chosen reference track that recur in
//! other tracks within a geometric tolerance, records where each segment
//! recurs (its runs), and can stitch discovered segments into longer
//! directed paths.
//!
//! This library provides:
//! - Geo primitives: haversine distance, Douglas-Peucker simplification,
//!   discrete Fréchet distance
//! - An immutable track store over a dense point arena
//! - R-tree spatial indexing, global and per-track
//! - Hotspot-grid reference-ride selection
//! - The two-stage repeated-segment discovery engine
//! - A segment-graph pathfinder over oriented segments
//!
//! ## Features
//!
//! - **`parallel`** (default) - Parallel candidate counting with rayon
//! - **`synthetic`** - Seeded synthetic dataset generator for benchmarks
//!
//! ## Quick Start
//!
//! ```rust
//! use segtrace::{DiscoveryConfig, TrackPoint, TrackStore, find_overlapping_segments};
//!
//! // Two identical straight tracks
//! let track: Vec<TrackPoint> = (0..10)
//!     .map(|i| TrackPoint::new(46.5, 15.0 + i as f64 * 0.0001))
//!     .collect();
//! let store = TrackStore::build(vec![track.clone(), track]).unwrap();
//!
//! let config = DiscoveryConfig {
//!     max_length_m: 50.0,
//!     tol_m: 1.0,
//!     ..DiscoveryConfig::default()
//! };
//! let result = find_overlapping_segments(&store, 0, &config).unwrap();
//! assert!(!result.segments.is_empty());
//! assert_eq!(result.segments[0].run_count(), 2);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, SegmentError};

// Geographic utilities (distance, bounds, center calculations)
pub mod geo_utils;
pub use geo_utils::haversine_distance;

// Douglas-Peucker simplification with a metric tolerance
pub mod simplify;
pub use simplify::douglas_peucker;

// Discrete Fréchet distance
pub mod frechet;
pub use frechet::discrete_frechet;

// Immutable track storage
pub mod store;
pub use store::{Track, TrackPoint, TrackStore};

// R-tree spatial indexes
pub mod spatial;
pub use spatial::{GlobalIndex, TrackIndex};

// Reference-ride selection
pub mod reference;
pub use reference::{find_best_ref_ride, ReferenceConfig};

// Repeated-segment discovery engine
pub mod discovery;
pub use discovery::{
    find_overlapping_segments, find_overlapping_segments_with_progress, AtomicProgressTracker,
    DiscoveryConfig, DiscoveryPhase, DiscoveryProgressCallback, DiscoveryResult, NoopProgress,
    ProgressSnapshot, Segment, CONTIGUITY_SLACK,
};

// Segment-graph pathfinder
pub mod pathfind;
pub use pathfind::{find_path_between_segments, Orientation, PathSegment};

// Synthetic GPS data generator for stress testing and benchmarking
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use segtrace::GpsPoint;
/// let point = GpsPoint::new(46.5547, 15.6459); // Maribor
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box of a set of GPS points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points. Returns `None` for empty input.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(geo_utils::compute_bounds(points))
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}
