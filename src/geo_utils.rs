//! Geographic primitives for GPS track analysis.
//!
//! All distances surfaced by this module are in meters; degree-space
//! values are used only for spatial-index pruning and are labeled as such.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`polyline_length`] | Total length of a GPS track in meters |
//! | [`cumulative_distances`] | Running arc length along a track |
//! | [`compute_bounds`] | Bounding box of a GPS track |
//! | [`compute_center`] | Centroid of a GPS track |
//! | [`bounds_overlap`] | Buffered bounding-box intersection test |
//! | [`meters_to_degrees`] | Metric threshold to planar degrees |

use crate::{Bounds, GpsPoint};

/// Mean Earth radius in meters, as used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude for local metric/degree conversions.
///
/// Used only for pruning margins and grid quantization, never for
/// reported distances.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two GPS points in meters.
///
/// Uses the haversine formula with the `atan2(sqrt(a), sqrt(1-a))` form,
/// which stays numerically stable for very small separations.
///
/// # Example
///
/// ```rust
/// use segtrace::{geo_utils, GpsPoint};
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_900.0).abs() < 2_000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let dlat = (p2.latitude - p1.latitude).to_radians();
    let dlng = (p2.longitude - p1.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Calculate the total length of a polyline in meters.
///
/// Sums the haversine distance between consecutive points. Empty or
/// single-point tracks return 0.0.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Running arc length along a track.
///
/// Returns a vector where `out[i]` is the distance in meters from the
/// first point to point `i`; `out[0]` is 0.0.
pub fn cumulative_distances(points: &[GpsPoint]) -> Vec<f64> {
    let mut distances = Vec::with_capacity(points.len());
    if points.is_empty() {
        return distances;
    }
    distances.push(0.0);
    for i in 1..points.len() {
        let segment = haversine_distance(&points[i - 1], &points[i]);
        distances.push(distances[i - 1] + segment);
    }
    distances
}

/// Convert a metric threshold to planar degrees of latitude.
///
/// Pruning-only approximation: 1 degree ≈ 111 km.
#[inline]
pub fn meters_to_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

/// Convert a metric threshold to planar degrees of longitude at a latitude.
///
/// Longitude degrees shrink with `cos(latitude)`; the cosine is clamped
/// so the conversion stays finite near the poles.
#[inline]
pub fn meters_to_degrees_lon(meters: f64, latitude: f64) -> f64 {
    meters / (METERS_PER_DEGREE * latitude.to_radians().cos().max(0.1))
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Compute the bounding box of a GPS track.
///
/// For empty input the returned bounds carry MIN/MAX sentinels and fail
/// any overlap check.
pub fn compute_bounds(points: &[GpsPoint]) -> Bounds {
    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lng = f64::MAX;
    let mut max_lng = f64::MIN;

    for p in points {
        min_lat = min_lat.min(p.latitude);
        max_lat = max_lat.max(p.latitude);
        min_lng = min_lng.min(p.longitude);
        max_lng = max_lng.max(p.longitude);
    }

    Bounds {
        min_lat,
        max_lat,
        min_lng,
        max_lng,
    }
}

/// Check if two bounding boxes overlap when expanded by a metric buffer.
///
/// The latitude expansion is unscaled; the longitude expansion is
/// corrected for `reference_lat`. Two tracks with non-overlapping
/// buffered bounds cannot share a segment within that tolerance.
pub fn bounds_overlap(a: &Bounds, b: &Bounds, buffer_meters: f64, reference_lat: f64) -> bool {
    let lat_buffer = meters_to_degrees(buffer_meters);
    let lng_buffer = meters_to_degrees_lon(buffer_meters, reference_lat);

    !(a.max_lat + lat_buffer < b.min_lat
        || b.max_lat + lat_buffer < a.min_lat
        || a.max_lng + lng_buffer < b.min_lng
        || b.max_lng + lng_buffer < a.min_lng)
}

/// Compute the geographic center (centroid) of a GPS track.
///
/// Arithmetic mean of latitudes and longitudes; suitable for the small
/// areas this crate operates on. Returns (0, 0) for empty input.
pub fn compute_center(points: &[GpsPoint]) -> GpsPoint {
    if points.is_empty() {
        return GpsPoint::new(0.0, 0.0);
    }

    let sum_lat: f64 = points.iter().map(|p| p.latitude).sum();
    let sum_lng: f64 = points.iter().map(|p| p.longitude).sum();
    let n = points.len() as f64;

    GpsPoint::new(sum_lat / n, sum_lng / n)
}

// =============================================================================
// Unit Tests
// =============================================================================
