//! Synthetic GPS data generator for stress testing and benchmarking.
//!
//! Generates activity sets that share a known corridor, providing ground
//! truth for validating segment discovery. Feature-gated behind
//! `synthetic` — not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use segtrace::synthetic::{CorridorPattern, SyntheticScenario};
//! use segtrace::{GpsPoint, TrackStore};
//!
//! let scenario = SyntheticScenario {
//!     origin: GpsPoint::new(47.37, 8.55),
//!     activity_count: 10,
//!     corridor_length_m: 2_000.0,
//!     overlap_fraction: 0.8,
//!     pattern: CorridorPattern::Winding,
//!     approach_length_m: 300.0,
//!     gps_noise_sigma_m: 2.0,
//!     seed: 42,
//! };
//!
//! let dataset = scenario.generate();
//! assert_eq!(dataset.tracks.len(), 10);
//! let store = TrackStore::build(dataset.tracks).unwrap();
//! assert_eq!(store.track_count(), 10);
//! ```

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geo_utils::{meters_to_degrees, meters_to_degrees_lon};
use crate::store::TrackPoint;
use crate::GpsPoint;

// ============================================================================
// Types
// ============================================================================

/// Pattern for generating corridor polylines.
#[derive(Debug, Clone, Copy)]
pub enum CorridorPattern {
    /// Straight line with minor heading jitter.
    Straight,
    /// Winding road with distance-driven curvature.
    Winding,
}

/// A complete synthetic dataset with ground truth.
pub struct SyntheticDataset {
    /// Generated tracks, ready for `TrackStore::build`.
    pub tracks: Vec<Vec<TrackPoint>>,
    /// The shared corridor polyline (ground truth).
    pub corridor: Vec<GpsPoint>,
    /// Positions of the tracks that traverse the corridor.
    pub corridor_tracks: Vec<usize>,
}

/// Scenario configuration for generating synthetic data.
#[derive(Debug, Clone)]
pub struct SyntheticScenario {
    /// Origin point for all generated data.
    pub origin: GpsPoint,
    /// Number of activities to generate.
    pub activity_count: usize,
    /// Length of the shared corridor in meters.
    pub corridor_length_m: f64,
    /// Fraction of activities that traverse the corridor (0.0-1.0).
    pub overlap_fraction: f64,
    /// Shape pattern of the corridor.
    pub pattern: CorridorPattern,
    /// Length of random approach/departure routes in meters.
    pub approach_length_m: f64,
    /// GPS noise standard deviation in meters.
    pub gps_noise_sigma_m: f64,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

// ============================================================================
// Polyline Construction
// ============================================================================

/// Sample spacing along generated polylines (meters).
const SAMPLE_SPACING_M: f64 = 8.0;

/// Wavelength of the winding pattern's curvature oscillation (meters).
const WINDING_WAVELENGTH_M: f64 = 350.0;

/// Move a point `SAMPLE_SPACING_M` meters along `heading` (radians,
/// 0 = east, counterclockwise).
fn advance(point: &GpsPoint, heading: f64) -> GpsPoint {
    GpsPoint::new(
        point.latitude + meters_to_degrees(SAMPLE_SPACING_M * heading.sin()),
        point.longitude + meters_to_degrees_lon(SAMPLE_SPACING_M * heading.cos(), point.latitude),
    )
}

/// Offset a point by metric north/east components.
fn offset(point: &GpsPoint, north_m: f64, east_m: f64) -> GpsPoint {
    GpsPoint::new(
        point.latitude + meters_to_degrees(north_m),
        point.longitude + meters_to_degrees_lon(east_m, point.latitude),
    )
}

/// Approximate standard normal draw via the sum of twelve uniforms.
fn std_normal(rng: &mut StdRng) -> f64 {
    let sum: f64 = (0..12).map(|_| rng.gen::<f64>()).sum();
    sum - 6.0
}

/// Generate the shared corridor polyline from the origin.
///
/// The winding pattern curves with a cosine of the distance travelled,
/// giving S-bends of roughly [`WINDING_WAVELENGTH_M`] wavelength.
fn corridor_polyline(
    origin: &GpsPoint,
    length_m: f64,
    pattern: CorridorPattern,
    rng: &mut StdRng,
) -> Vec<GpsPoint> {
    let steps = (length_m / SAMPLE_SPACING_M).round() as usize;
    let mut points = Vec::with_capacity(steps + 1);

    let mut heading = rng.gen_range(0.0..(2.0 * PI));
    let mut current = *origin;
    points.push(current);

    for step in 0..steps {
        let travelled = step as f64 * SAMPLE_SPACING_M;
        let curvature = match pattern {
            CorridorPattern::Straight => 0.0,
            CorridorPattern::Winding => 0.2 * (travelled / WINDING_WAVELENGTH_M * 2.0 * PI).cos(),
        };
        heading += curvature + std_normal(rng) * 0.02;
        current = advance(&current, heading);
        points.push(current);
    }

    points
}

/// Generate a wandering approach/departure polyline with a persistent
/// per-segment turn bias on top of white heading jitter.
fn wander_polyline(
    start: &GpsPoint,
    length_m: f64,
    initial_heading: f64,
    rng: &mut StdRng,
) -> Vec<GpsPoint> {
    let steps = (length_m / SAMPLE_SPACING_M).round() as usize;
    let mut points = Vec::with_capacity(steps + 1);

    let bias = rng.gen_range(-0.15..0.15);
    let mut heading = initial_heading;
    let mut current = *start;
    points.push(current);

    for _ in 0..steps {
        heading += bias + std_normal(rng) * 0.05;
        current = advance(&current, heading);
        points.push(current);
    }

    points
}

/// Perturb a polyline with independent north/east Gaussian offsets.
fn jitter_polyline(points: &[GpsPoint], sigma_m: f64, rng: &mut StdRng) -> Vec<GpsPoint> {
    if sigma_m <= 0.0 {
        return points.to_vec();
    }

    points
        .iter()
        .map(|p| {
            let north = std_normal(rng) * sigma_m;
            let east = std_normal(rng) * sigma_m;
            offset(p, north, east)
        })
        .collect()
}

// ============================================================================
// Scenario Implementation
// ============================================================================

impl SyntheticScenario {
    /// Generate a complete synthetic dataset from this scenario.
    pub fn generate(&self) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let corridor = corridor_polyline(&self.origin, self.corridor_length_m, self.pattern, &mut rng);

        let mut tracks: Vec<Vec<TrackPoint>> = Vec::with_capacity(self.activity_count);
        let mut corridor_tracks: Vec<usize> = Vec::new();

        for activity_idx in 0..self.activity_count {
            let uses_corridor: f64 = rng.gen();
            let polyline = if uses_corridor < self.overlap_fraction {
                corridor_tracks.push(activity_idx);

                let approach_heading: f64 = rng.gen_range(0.0..(2.0 * PI));
                let approach_start = offset(
                    &corridor[0],
                    self.approach_length_m * approach_heading.sin(),
                    self.approach_length_m * approach_heading.cos(),
                );

                let mut full = wander_polyline(
                    &approach_start,
                    self.approach_length_m * 0.8,
                    approach_heading + PI,
                    &mut rng,
                );
                full.extend(jitter_polyline(&corridor, self.gps_noise_sigma_m, &mut rng));

                let departure_heading: f64 = rng.gen_range(0.0..(2.0 * PI));
                full.extend(wander_polyline(
                    corridor.last().unwrap(),
                    self.approach_length_m * 0.8,
                    departure_heading,
                    &mut rng,
                ));
                full
            } else {
                // Purely random route well away from the corridor
                let random_length: f64 = rng.gen_range(1_000.0..5_000.0);
                let random_heading: f64 = rng.gen_range(PI..(1.5 * PI));
                let far_start = offset(&self.origin, -5_000.0, -5_000.0);
                wander_polyline(&far_start, random_length, random_heading, &mut rng)
            };

            // One sample per second starting at a per-activity epoch
            let epoch = 1_700_000_000 + activity_idx as i64 * 86_400;
            let track: Vec<TrackPoint> = polyline
                .iter()
                .enumerate()
                .map(|(i, p)| TrackPoint::with_time(p.latitude, p.longitude, epoch + i as i64))
                .collect();
            tracks.push(track);
        }

        SyntheticDataset {
            tracks,
            corridor,
            corridor_tracks,
        }
    }
}
