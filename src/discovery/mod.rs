//! Repeated-segment discovery engine.
//!
//! Given a reference track, enumerates candidate sub-ranges of a target
//! geographic length and finds the tracks that repeat each candidate
//! within a Fréchet tolerance.
//!
//! ## Algorithm
//! 1. Select the close tracks: bounding box intersects the reference's
//!    margin-expanded box
//! 2. Build a per-track R-tree for every close track
//! 3. Stage 1 (parallel): for every candidate window, count supporting
//!    tracks using a broad-phase radius query and an early-exit windowed
//!    Fréchet check
//! 4. Promote candidates with enough support, ordered by support count
//!    descending then start ascending
//! 5. Stage 2 (sequential): drop candidates overlapping an accepted
//!    segment, then resolve the best-matching run range per track
//!
//! Stage 1 writes each candidate's count into its own slot, so the
//! parallel pass cannot perturb Stage 2's deterministic ordering.

mod progress;
mod window;

pub use progress::{
    AtomicProgressTracker, DiscoveryPhase, DiscoveryProgressCallback, NoopProgress,
    ProgressSnapshot,
};

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{info, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SegmentError};
use crate::frechet::FrechetBuffer;
use crate::geo_utils::{
    bounds_overlap, compute_bounds, cumulative_distances, meters_to_degrees, meters_to_degrees_lon,
};
use crate::spatial::TrackIndex;
use crate::store::TrackStore;
use crate::{Bounds, GpsPoint};

use window::{best_window, enumerate_candidates, first_match, CandidateWindow};

/// Slack allowed in the window contiguity gate: a window is admissible
/// when the spread of its extreme global indices is at most the window
/// size plus this constant. Rules out clearly non-contiguous windows
/// while tolerating a handful of skipped samples.
pub const CONTIGUITY_SLACK: usize = 5;

/// Configuration for segment discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryConfig {
    /// Target minimum geographic length of a candidate segment (meters).
    /// Default: 500.0
    pub max_length_m: f64,
    /// Fréchet tolerance for accepting a run (meters). Default: 5.0
    pub tol_m: f64,
    /// Stride between consecutive candidate starts on the reference.
    /// Default: 1
    pub window_step: usize,
    /// Minimum number of distinct tracks (reference included) that must
    /// repeat a candidate. Default: 2
    pub min_runs: usize,
    /// Broad-phase bounding expansion (meters). Default: 5.0
    pub prefilter_margin_m: f64,
    /// Overlap fraction on the reference range above which a candidate is
    /// dropped as a duplicate of an accepted segment. Default: 0.8
    pub dedup_overlap_frac: f64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_length_m: 500.0,
            tol_m: 5.0,
            window_step: 1,
            min_runs: 2,
            prefilter_margin_m: 5.0,
            dedup_overlap_frac: 0.8,
        }
    }
}

/// A repeated segment: a reference sub-range plus the matching run in
/// every supporting track.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// Global point indices of the reference sub-range, in track order
    pub ref_range: Vec<u32>,
    /// The representative polyline for `ref_range`
    pub candidate_polyline: Vec<GpsPoint>,
    /// Geographic length of the representative polyline in meters
    pub candidate_length_m: f64,
    /// Track position -> contiguous global indices of that track's run.
    /// The reference track always appears, mapped to `ref_range` itself.
    pub run_ranges: BTreeMap<usize, Vec<u32>>,
}

impl Segment {
    /// Number of tracks this segment recurs in.
    pub fn run_count(&self) -> usize {
        self.run_ranges.len()
    }

    /// Global index of the segment's first reference point.
    pub fn first_index(&self) -> u32 {
        self.ref_range[0]
    }

    /// Global index of the segment's last reference point.
    pub fn last_index(&self) -> u32 {
        *self.ref_range.last().expect("segments are never empty")
    }
}

/// Output of [`find_overlapping_segments`].
#[derive(Debug, Clone)]
pub struct DiscoveryResult {
    /// Discovered segments; order is not part of the contract
    pub segments: Vec<Segment>,
    /// Track positions whose bounding box intersects the expanded
    /// reference box (the reference itself included)
    pub close_tracks: Vec<usize>,
}

/// Discover repeated segments of the reference track.
///
/// See the module docs for the two-stage algorithm. Returns empty results
/// (not an error) when no candidate reaches `min_runs` support or the
/// reference is shorter than `max_length_m`.
pub fn find_overlapping_segments(
    store: &TrackStore,
    ref_ride_idx: usize,
    config: &DiscoveryConfig,
) -> Result<DiscoveryResult> {
    find_overlapping_segments_with_progress(store, ref_ride_idx, config, Arc::new(NoopProgress))
}

/// [`find_overlapping_segments`] with a progress callback for host UIs.
pub fn find_overlapping_segments_with_progress(
    store: &TrackStore,
    ref_ride_idx: usize,
    config: &DiscoveryConfig,
    progress: Arc<dyn DiscoveryProgressCallback>,
) -> Result<DiscoveryResult> {
    let ref_track = *store
        .track(ref_ride_idx)
        .ok_or_else(|| SegmentError::InvalidParameter {
            message: format!(
                "reference index {} out of range ({} tracks)",
                ref_ride_idx,
                store.track_count()
            ),
        })?;
    if config.window_step == 0 {
        return Err(SegmentError::InvalidParameter {
            message: "window_step must be at least 1".to_string(),
        });
    }
    if !(0.0..=1.0).contains(&config.dedup_overlap_frac) {
        return Err(SegmentError::InvalidParameter {
            message: format!(
                "dedup_overlap_frac must be within [0, 1], got {}",
                config.dedup_overlap_frac
            ),
        });
    }
    let min_runs = if config.min_runs < 1 {
        warn!("[Discovery] min_runs 0 treated as 1; the reference always supports itself");
        1
    } else {
        config.min_runs
    };

    let arena = store.points();
    let ref_points = store.track_points(ref_ride_idx);
    let ref_first = ref_track.first_index();

    // Broad-phase margins in degree space
    let ref_bounds = compute_bounds(ref_points);
    let mean_lat = (ref_bounds.min_lat + ref_bounds.max_lat) / 2.0;
    let tol_deg = meters_to_degrees(config.tol_m);
    let margin_lat_deg = meters_to_degrees(config.prefilter_margin_m);
    let margin_lng_deg = meters_to_degrees_lon(config.prefilter_margin_m, mean_lat);

    let expanded = Bounds {
        min_lat: ref_bounds.min_lat - margin_lat_deg,
        max_lat: ref_bounds.max_lat + margin_lat_deg,
        min_lng: ref_bounds.min_lng - margin_lng_deg,
        max_lng: ref_bounds.max_lng + margin_lng_deg,
    };

    let close_tracks: Vec<usize> = (0..store.track_count())
        .filter(|&t| {
            t == ref_ride_idx
                || bounds_overlap(
                    &compute_bounds(store.track_points(t)),
                    &expanded,
                    0.0,
                    mean_lat,
                )
        })
        .collect();

    info!(
        "[Discovery] {} of {} tracks are close to reference {}",
        close_tracks.len(),
        store.track_count(),
        ref_ride_idx
    );

    if close_tracks.is_empty() {
        warn!("[Discovery] No close tracks; returning empty results");
        return Ok(DiscoveryResult {
            segments: vec![],
            close_tracks,
        });
    }

    // Per-track spatial indexes for the close tracks
    progress.on_phase(DiscoveryPhase::BuildingIndexes, close_tracks.len() as u32);

    #[cfg(feature = "parallel")]
    let trees: Vec<TrackIndex> = close_tracks
        .par_iter()
        .map(|&t| {
            let tree = TrackIndex::build(store.track_points(t), store.tracks()[t].first_index());
            progress.on_progress();
            tree
        })
        .collect();

    #[cfg(not(feature = "parallel"))]
    let trees: Vec<TrackIndex> = close_tracks
        .iter()
        .map(|&t| {
            let tree = TrackIndex::build(store.track_points(t), store.tracks()[t].first_index());
            progress.on_progress();
            tree
        })
        .collect();

    // Candidate windows along the reference arc length
    let cum = cumulative_distances(ref_points);
    let candidates = enumerate_candidates(&cum, config.max_length_m, config.window_step);

    if candidates.is_empty() {
        info!(
            "[Discovery] Reference {} is shorter than {}m; no candidates",
            ref_ride_idx, config.max_length_m
        );
        return Ok(DiscoveryResult {
            segments: vec![],
            close_tracks,
        });
    }

    // Stage 1: count supporting tracks per candidate, one output slot each
    progress.on_phase(DiscoveryPhase::CountingCandidates, candidates.len() as u32);
    let count_candidate = |cand: &CandidateWindow| -> usize {
        let mut buffer = FrechetBuffer::new();
        let candidate_points = &ref_points[cand.start..=cand.end];
        // margin_lng_deg is the wider of the two axis margins, so the
        // isotropic circle widens the broad phase, never narrows it
        let (center, radius) = query_circle(candidate_points, tol_deg, margin_lng_deg);
        let window_size = cand.point_count();

        let mut count = 1; // the reference supports its own candidate
        for (pos, &t) in close_tracks.iter().enumerate() {
            if t == ref_ride_idx {
                continue;
            }
            let mut ids: Vec<u32> = trees[pos]
                .inrange(&center, radius)
                .into_iter()
                .map(|(_, global)| global)
                .collect();
            ids.sort_unstable();
            if first_match(arena, &ids, window_size, candidate_points, config.tol_m, &mut buffer) {
                count += 1;
            }
        }
        progress.on_progress();
        count
    };

    #[cfg(feature = "parallel")]
    let run_counts: Vec<usize> = candidates.par_iter().map(count_candidate).collect();

    #[cfg(not(feature = "parallel"))]
    let run_counts: Vec<usize> = candidates.iter().map(count_candidate).collect();

    // Promotion: enough support, best-supported first, earlier start on ties
    let mut promoted: Vec<(usize, usize)> = run_counts
        .iter()
        .enumerate()
        .filter(|(_, &count)| count >= min_runs)
        .map(|(idx, &count)| (idx, count))
        .collect();
    promoted.sort_by(|a, b| b.1.cmp(&a.1).then(candidates[a.0].start.cmp(&candidates[b.0].start)));

    info!(
        "[Discovery] Stage 1: {} of {} candidates reach {} runs",
        promoted.len(),
        candidates.len(),
        min_runs
    );

    // Stage 2: sequential dedup and run resolution
    progress.on_phase(DiscoveryPhase::ResolvingRuns, promoted.len() as u32);
    let mut segments: Vec<Segment> = Vec::new();
    let mut accepted: Vec<CandidateWindow> = Vec::new();
    let mut buffer = FrechetBuffer::new();

    for (cand_idx, _) in promoted {
        let cand = candidates[cand_idx];
        progress.on_progress();

        let duplicate = accepted
            .iter()
            .any(|prev| overlap_fraction(&cand, prev) >= config.dedup_overlap_frac);
        if duplicate {
            continue;
        }

        let candidate_points = &ref_points[cand.start..=cand.end];
        let (center, radius) = query_circle(candidate_points, tol_deg, margin_lng_deg);
        let window_size = cand.point_count();

        let mut run_ranges: BTreeMap<usize, Vec<u32>> = BTreeMap::new();
        for (pos, &t) in close_tracks.iter().enumerate() {
            if t == ref_ride_idx {
                let range = (ref_first + cand.start as u32..=ref_first + cand.end as u32).collect();
                run_ranges.insert(t, range);
                continue;
            }
            let mut ids: Vec<u32> = trees[pos]
                .inrange(&center, radius)
                .into_iter()
                .map(|(_, global)| global)
                .collect();
            ids.sort_unstable();
            if let Some((first, last)) = best_window(
                arena,
                &ids,
                window_size,
                candidate_points,
                config.tol_m,
                &mut buffer,
            ) {
                run_ranges.insert(t, (first..=last).collect());
            }
        }

        if run_ranges.len() < min_runs {
            continue;
        }

        segments.push(Segment {
            ref_range: (ref_first + cand.start as u32..=ref_first + cand.end as u32).collect(),
            candidate_polyline: candidate_points.to_vec(),
            candidate_length_m: cum[cand.end] - cum[cand.start],
            run_ranges,
        });
        accepted.push(cand);
    }

    info!("[Discovery] Stage 2: {} segments after dedup", segments.len());

    Ok(DiscoveryResult {
        segments,
        close_tracks,
    })
}

/// Broad-phase query circle for a candidate: bounding-box center plus a
/// radius of half the box diagonal, the tolerance, and the prefilter
/// margin, all in planar degrees. `margin_deg` must be the
/// longitude-corrected margin, which dominates the latitude one, so the
/// single radius over-covers both axes.
fn query_circle(candidate: &[GpsPoint], tol_deg: f64, margin_deg: f64) -> (GpsPoint, f64) {
    let bounds = compute_bounds(candidate);
    let center = bounds.center();
    let half_lat = (bounds.max_lat - bounds.min_lat) / 2.0;
    let half_lng = (bounds.max_lng - bounds.min_lng) / 2.0;
    let half_diagonal = (half_lat * half_lat + half_lng * half_lng).sqrt();
    (center, half_diagonal + tol_deg + margin_deg)
}

/// Jaccard-like overlap of two inclusive reference ranges: shared point
/// count over the smaller range's point count.
fn overlap_fraction(a: &CandidateWindow, b: &CandidateWindow) -> f64 {
    let lo = a.start.max(b.start);
    let hi = a.end.min(b.end);
    if hi < lo {
        return 0.0;
    }
    let common = (hi - lo + 1) as f64;
    common / a.point_count().min(b.point_count()) as f64
}
