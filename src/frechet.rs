//! Discrete Fréchet distance between GPS polylines.
//!
//! The discrete Fréchet distance is the minimum, over all monotone
//! couplings of the two vertex sequences, of the maximum paired
//! distance. Distances are great-circle meters.
//!
//! The dynamic program is filled bottom-up with two rolling rows, so the
//! memory cost is O(min side) per comparison and stack depth stays
//! constant regardless of window length.

use crate::geo_utils::haversine_distance;
use crate::GpsPoint;

/// Reusable scratch rows for the Fréchet dynamic program.
///
/// The discovery engine compares one candidate polyline against many
/// windows of the same width; keeping the rows in a buffer avoids a pair
/// of allocations per window.
#[derive(Debug, Default)]
pub struct FrechetBuffer {
    prev: Vec<f64>,
    curr: Vec<f64>,
}

impl FrechetBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discrete Fréchet distance in meters between polylines `p` and `q`.
    ///
    /// Returns 0.0 if either polyline is empty.
    pub fn distance(&mut self, p: &[GpsPoint], q: &[GpsPoint]) -> f64 {
        if p.is_empty() || q.is_empty() {
            return 0.0;
        }

        let m = q.len();
        self.prev.clear();
        self.prev.resize(m, 0.0);
        self.curr.clear();
        self.curr.resize(m, 0.0);

        // First row: couplings can only extend along q
        self.prev[0] = haversine_distance(&p[0], &q[0]);
        for j in 1..m {
            self.prev[j] = self.prev[j - 1].max(haversine_distance(&p[0], &q[j]));
        }

        for pi in p.iter().skip(1) {
            self.curr[0] = self.prev[0].max(haversine_distance(pi, &q[0]));
            for j in 1..m {
                let d = haversine_distance(pi, &q[j]);
                let reach = self.prev[j].min(self.curr[j - 1]).min(self.prev[j - 1]);
                self.curr[j] = reach.max(d);
            }
            std::mem::swap(&mut self.prev, &mut self.curr);
        }

        self.prev[m - 1]
    }
}

/// Discrete Fréchet distance in meters between two polylines.
///
/// One-shot convenience over [`FrechetBuffer::distance`].
///
/// # Example
///
/// ```rust
/// use segtrace::{frechet::discrete_frechet, GpsPoint};
///
/// let p: Vec<GpsPoint> = (0..5).map(|i| GpsPoint::new(46.5, 15.0 + i as f64 * 0.001)).collect();
/// assert_eq!(discrete_frechet(&p, &p), 0.0);
/// ```
pub fn discrete_frechet(p: &[GpsPoint], q: &[GpsPoint]) -> f64 {
    FrechetBuffer::new().distance(p, q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::haversine_distance;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn line(lat: f64, n: usize) -> Vec<GpsPoint> {
        (0..n)
            .map(|i| GpsPoint::new(lat, 15.0 + i as f64 * 0.001))
            .collect()
    }

    #[test]
    fn test_identical_polylines() {
        let p = line(46.5, 10);
        assert_eq!(discrete_frechet(&p, &p), 0.0);
    }

    #[test]
    fn test_parallel_lines() {
        // Two east-west lines ~111m apart in latitude
        let p = line(46.5, 10);
        let q = line(46.501, 10);
        let dist = discrete_frechet(&p, &q);
        let expected = haversine_distance(&p[0], &q[0]);
        assert!(approx_eq(dist, expected, 0.5));
    }

    #[test]
    fn test_symmetric() {
        let p = line(46.5, 8);
        let q = line(46.5005, 5);
        assert!(approx_eq(
            discrete_frechet(&p, &q),
            discrete_frechet(&q, &p),
            1e-9
        ));
    }

    #[test]
    fn test_reversal_invariance() {
        let p = vec![
            GpsPoint::new(46.5, 15.0),
            GpsPoint::new(46.501, 15.001),
            GpsPoint::new(46.5, 15.002),
        ];
        let q = vec![
            GpsPoint::new(46.5002, 15.0),
            GpsPoint::new(46.5002, 15.001),
            GpsPoint::new(46.5002, 15.002),
        ];
        let pr: Vec<_> = p.iter().rev().copied().collect();
        let qr: Vec<_> = q.iter().rev().copied().collect();
        assert!(approx_eq(
            discrete_frechet(&p, &q),
            discrete_frechet(&pr, &qr),
            1e-9
        ));
    }

    #[test]
    fn test_upper_bounds_hausdorff() {
        // Fréchet dominates the directed point-set distance
        let p = vec![
            GpsPoint::new(46.5, 15.0),
            GpsPoint::new(46.501, 15.001),
            GpsPoint::new(46.5, 15.002),
        ];
        let q = line(46.5, 3);

        let hausdorff = p
            .iter()
            .map(|a| {
                q.iter()
                    .map(|b| haversine_distance(a, b))
                    .fold(f64::INFINITY, f64::min)
            })
            .fold(0.0, f64::max);

        assert!(discrete_frechet(&p, &q) >= hausdorff - 1e-9);
    }

    #[test]
    fn test_different_lengths() {
        // Same geometry with every second vertex dropped: the skipped
        // vertices each couple to a neighbor one step away
        let p = line(46.5, 12);
        let q: Vec<GpsPoint> = p
            .iter()
            .step_by(2)
            .chain(std::iter::once(&p[11]))
            .copied()
            .collect();
        let step = haversine_distance(&p[0], &p[1]);
        assert!(approx_eq(discrete_frechet(&p, &q), step, 1.0));
    }

    #[test]
    fn test_empty_inputs() {
        let p = line(46.5, 3);
        assert_eq!(discrete_frechet(&p, &[]), 0.0);
        assert_eq!(discrete_frechet(&[], &p), 0.0);
    }

    #[test]
    fn test_buffer_reuse_matches_one_shot() {
        let p = line(46.5, 6);
        let q = line(46.5004, 9);
        let mut buf = FrechetBuffer::new();
        let first = buf.distance(&p, &q);
        let second = buf.distance(&p, &q);
        assert_eq!(first, second);
        assert!(approx_eq(first, discrete_frechet(&p, &q), 1e-12));
    }
}
