//! Douglas-Peucker polyline simplification with a metric tolerance.
//!
//! GPS points are projected into a locally linearized meter plane
//! (`x = lon * cos(mean_lat) * 111000`, `y = lat * 111000`) so the epsilon
//! can be given in meters. The projection is only valid for small areas,
//! which is the regime this crate operates in.

use crate::geo_utils::METERS_PER_DEGREE;
use crate::GpsPoint;

/// A point in the linearized meter plane.
#[derive(Debug, Clone, Copy)]
struct PlanePoint {
    x: f64,
    y: f64,
}

/// Project GPS points into the meter plane around their mean latitude.
fn linearize(points: &[GpsPoint]) -> Vec<PlanePoint> {
    let mean_lat = if points.is_empty() {
        0.0
    } else {
        points.iter().map(|p| p.latitude).sum::<f64>() / points.len() as f64
    };
    let lon_scale = METERS_PER_DEGREE * mean_lat.to_radians().cos();

    points
        .iter()
        .map(|p| PlanePoint {
            x: p.longitude * lon_scale,
            y: p.latitude * METERS_PER_DEGREE,
        })
        .collect()
}

/// Distance in meters from `p` to the segment `(a, b)` in the plane.
///
/// Degenerate chords (coincident endpoints) fall back to point-to-point
/// distance.
fn point_segment_distance(p: PlanePoint, a: PlanePoint, b: PlanePoint) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;

    if len_sq == 0.0 {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }

    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    let proj_x = a.x + t * dx;
    let proj_y = a.y + t * dy;
    ((p.x - proj_x).powi(2) + (p.y - proj_y).powi(2)).sqrt()
}

/// Simplify a polyline, keeping points farther than `epsilon_m` meters
/// from the chord between their retained neighbors.
///
/// The first and last points are always preserved. Inputs with fewer than
/// three points are returned unchanged.
///
/// # Example
///
/// ```rust
/// use segtrace::{simplify::douglas_peucker, GpsPoint};
///
/// let track = vec![
///     GpsPoint::new(46.5000, 15.0000),
///     GpsPoint::new(46.5001, 15.0010), // ~11m off the chord
///     GpsPoint::new(46.5000, 15.0020),
/// ];
/// assert_eq!(douglas_peucker(&track, 20.0).len(), 2);
/// assert_eq!(douglas_peucker(&track, 5.0).len(), 3);
/// ```
pub fn douglas_peucker(points: &[GpsPoint], epsilon_m: f64) -> Vec<GpsPoint> {
    douglas_peucker_indices(points, epsilon_m)
        .into_iter()
        .map(|i| points[i])
        .collect()
}

/// Simplify a polyline and return the indices of retained points.
///
/// Useful when the simplified points must stay associated with per-point
/// data such as timestamps.
pub fn douglas_peucker_indices(points: &[GpsPoint], epsilon_m: f64) -> Vec<usize> {
    let n = points.len();
    if n < 3 {
        return (0..n).collect();
    }

    let plane = linearize(points);
    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    simplify_recursive(&plane, 0, n - 1, epsilon_m, &mut keep);

    keep.iter()
        .enumerate()
        .filter_map(|(i, &k)| if k { Some(i) } else { None })
        .collect()
}

/// Recursive split on the point of maximum distance to the current chord.
fn simplify_recursive(plane: &[PlanePoint], start: usize, end: usize, epsilon_m: f64, keep: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;
    for i in (start + 1)..end {
        let dist = point_segment_distance(plane[i], plane[start], plane[end]);
        if dist > max_dist {
            max_dist = dist;
            max_idx = i;
        }
    }

    if max_dist > epsilon_m {
        keep[max_idx] = true;
        simplify_recursive(plane, start, max_idx, epsilon_m, keep);
        simplify_recursive(plane, max_idx, end, epsilon_m, keep);
    }
}
