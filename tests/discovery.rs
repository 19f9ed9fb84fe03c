//! End-to-end tests for the segment discovery engine: repetition,
//! partial overlap, tolerance behavior, deduplication, and boundary
//! semantics.

use std::sync::Arc;

use segtrace::{
    discrete_frechet, find_best_ref_ride, find_overlapping_segments,
    find_overlapping_segments_with_progress, geo_utils::polyline_length, AtomicProgressTracker,
    DiscoveryConfig, DiscoveryPhase, ReferenceConfig, SegmentError, TrackPoint, TrackStore,
};

/// ~20m steps of latitude
const LAT_STEP: f64 = 0.00018;

/// Straight east-west track: ~7.7m per 0.0001 degree of longitude at 46.5N
fn east_track(n: usize) -> Vec<TrackPoint> {
    (0..n)
        .map(|i| TrackPoint::new(46.5, 15.0 + i as f64 * 0.0001))
        .collect()
}

/// Straight northward track with ~20m steps
fn north_track(n: usize) -> Vec<TrackPoint> {
    (0..n)
        .map(|i| TrackPoint::new(46.5 + i as f64 * LAT_STEP, 15.0))
        .collect()
}

fn assert_no_excessive_overlap(result: &segtrace::DiscoveryResult, frac: f64) {
    let ranges: Vec<(u32, u32)> = result
        .segments
        .iter()
        .map(|s| (s.first_index(), s.last_index()))
        .collect();
    for (i, a) in ranges.iter().enumerate() {
        for b in ranges.iter().skip(i + 1) {
            let lo = a.0.max(b.0);
            let hi = a.1.min(b.1);
            let common = if hi >= lo { (hi - lo + 1) as f64 } else { 0.0 };
            let min_len = ((a.1 - a.0 + 1).min(b.1 - b.0 + 1)) as f64;
            assert!(
                common / min_len < frac,
                "segments {:?} and {:?} overlap beyond the dedup threshold",
                a,
                b
            );
        }
    }
}

#[test]
fn trivial_repetition_of_identical_tracks() {
    // S1: two identical 10-point tracks, segment of at least 50m expected
    let store = TrackStore::build(vec![east_track(10), east_track(10)]).unwrap();
    let config = DiscoveryConfig {
        max_length_m: 50.0,
        tol_m: 1.0,
        min_runs: 2,
        ..DiscoveryConfig::default()
    };

    let result = find_overlapping_segments(&store, 0, &config).unwrap();

    assert_eq!(result.close_tracks, vec![0, 1]);
    assert!(!result.segments.is_empty());

    for segment in &result.segments {
        // Both tracks recur, reference included with its own range
        assert!(segment.run_count() >= 2);
        assert!(segment.run_ranges.contains_key(&0));
        assert!(segment.run_ranges.contains_key(&1));
        assert_eq!(segment.run_ranges[&0], segment.ref_range);
        assert!(segment.candidate_length_m >= 50.0);

        // Reported length agrees with the haversine arc length
        let arc = polyline_length(&segment.candidate_polyline);
        assert!((segment.candidate_length_m - arc).abs() <= 0.5);

        // Identical geometry matches at distance zero
        for run in segment.run_ranges.values() {
            let run_poly = store.polyline(run);
            assert!(discrete_frechet(&segment.candidate_polyline, &run_poly) < 1e-9);
        }
    }

    assert_no_excessive_overlap(&result, config.dedup_overlap_frac);
}

#[test]
fn partial_overlap_yields_single_shared_segment() {
    // S2: track B shares exactly points 5..=15 of the reference, with a
    // far-west approach and a far-east exit
    let a = north_track(20);
    let mut b = Vec::new();
    for j in 0..5 {
        b.push(TrackPoint::new(46.5 + j as f64 * LAT_STEP, 15.0 - 0.004));
    }
    for j in 5..=15 {
        b.push(a[j].clone());
    }
    for j in 16..20 {
        b.push(TrackPoint::new(
            46.5 + 15.0 * LAT_STEP,
            15.0 + (j - 15) as f64 * 0.004,
        ));
    }

    let store = TrackStore::build(vec![a, b]).unwrap();
    let config = DiscoveryConfig {
        max_length_m: 150.0,
        tol_m: 2.0,
        min_runs: 2,
        dedup_overlap_frac: 0.7,
        ..DiscoveryConfig::default()
    };

    let result = find_overlapping_segments(&store, 0, &config).unwrap();

    assert_eq!(result.segments.len(), 1);
    let segment = &result.segments[0];

    // The segment sits on the shared portion of the reference
    assert!(segment.first_index() >= 4 && segment.first_index() <= 6);
    assert!(segment.last_index() <= 15);

    // B's run covers the same number of points as the reference range
    let run_b = &segment.run_ranges[&1];
    assert_eq!(run_b.len(), segment.ref_range.len());
    let run_poly = store.polyline(run_b);
    assert!(discrete_frechet(&segment.candidate_polyline, &run_poly) <= config.tol_m);
}

#[test]
fn frechet_tolerance_separates_offset_tracks() {
    // S3: same geometry, perturbed 3m orthogonally
    let a = north_track(20);
    let offset_3m = 3.0 / 76_600.0; // ~3m of longitude at 46.5N
    let b: Vec<TrackPoint> = a
        .iter()
        .map(|p| TrackPoint::new(p.latitude, p.longitude + offset_3m))
        .collect();
    let store = TrackStore::build(vec![a, b]).unwrap();

    let loose = DiscoveryConfig {
        max_length_m: 150.0,
        tol_m: 5.0,
        min_runs: 2,
        ..DiscoveryConfig::default()
    };
    let result = find_overlapping_segments(&store, 0, &loose).unwrap();
    assert!(!result.segments.is_empty());
    for segment in &result.segments {
        for run in segment.run_ranges.values() {
            let run_poly = store.polyline(run);
            assert!(discrete_frechet(&segment.candidate_polyline, &run_poly) <= loose.tol_m);
        }
    }

    let strict = DiscoveryConfig {
        tol_m: 1.0,
        ..loose
    };
    let result = find_overlapping_segments(&store, 0, &strict).unwrap();
    assert!(result.segments.is_empty());
}

#[test]
fn dedup_keeps_the_better_supported_candidate() {
    // S4: two candidates overlapping 8/9, one with support 4, one with
    // support 3; only the support-4 candidate survives
    let a = north_track(10);
    let b = north_track(10);
    let c = north_track(10);
    let mut d = north_track(9);
    d.push(TrackPoint::new(46.5 + 8.0 * LAT_STEP, 15.0 + 0.004));

    let store = TrackStore::build(vec![a, b, c, d]).unwrap();
    let config = DiscoveryConfig {
        max_length_m: 150.0,
        tol_m: 2.0,
        min_runs: 2,
        ..DiscoveryConfig::default()
    };

    let result = find_overlapping_segments(&store, 0, &config).unwrap();

    assert_eq!(result.segments.len(), 1);
    let segment = &result.segments[0];
    assert_eq!(segment.first_index(), 0);
    assert_eq!(segment.run_count(), 4);
    for track in 0..4 {
        assert!(segment.run_ranges.contains_key(&track));
    }
}

#[test]
fn reference_shorter_than_target_returns_empty() {
    let store = TrackStore::build(vec![east_track(5), east_track(5)]).unwrap();
    let config = DiscoveryConfig {
        max_length_m: 10_000.0,
        ..DiscoveryConfig::default()
    };
    let result = find_overlapping_segments(&store, 0, &config).unwrap();
    assert!(result.segments.is_empty());
    assert_eq!(result.close_tracks, vec![0, 1]);
}

#[test]
fn single_track_with_min_runs_one() {
    let store = TrackStore::build(vec![east_track(10)]).unwrap();
    let config = DiscoveryConfig {
        max_length_m: 50.0,
        tol_m: 1.0,
        min_runs: 1,
        ..DiscoveryConfig::default()
    };
    let result = find_overlapping_segments(&store, 0, &config).unwrap();
    assert!(!result.segments.is_empty());
    for segment in &result.segments {
        assert_eq!(segment.run_count(), 1);
        assert_eq!(segment.run_ranges[&0], segment.ref_range);
    }
}

#[test]
fn min_runs_zero_is_clamped_to_one() {
    let store = TrackStore::build(vec![east_track(10)]).unwrap();
    let config = DiscoveryConfig {
        max_length_m: 50.0,
        tol_m: 1.0,
        min_runs: 0,
        ..DiscoveryConfig::default()
    };
    let result = find_overlapping_segments(&store, 0, &config).unwrap();
    assert!(!result.segments.is_empty());
}

#[test]
fn two_point_tracks_are_admissible() {
    let short = |lon0: f64| {
        vec![
            TrackPoint::new(46.5, lon0),
            TrackPoint::new(46.5, lon0 + 0.0013), // ~100m
        ]
    };
    let store = TrackStore::build(vec![short(15.0), short(15.0)]).unwrap();
    let config = DiscoveryConfig {
        max_length_m: 50.0,
        tol_m: 1.0,
        min_runs: 2,
        ..DiscoveryConfig::default()
    };
    let result = find_overlapping_segments(&store, 0, &config).unwrap();
    assert_eq!(result.segments.len(), 1);
    assert_eq!(result.segments[0].ref_range, vec![0, 1]);
}

#[test]
fn far_tracks_are_not_close() {
    let far: Vec<TrackPoint> = (0..10)
        .map(|i| TrackPoint::new(48.5, 16.0 + i as f64 * 0.0001))
        .collect();
    let store = TrackStore::build(vec![east_track(10), east_track(10), far]).unwrap();
    let result =
        find_overlapping_segments(&store, 0, &DiscoveryConfig::default()).unwrap();
    assert_eq!(result.close_tracks, vec![0, 1]);
}

#[test]
fn invalid_parameters_are_rejected() {
    let store = TrackStore::build(vec![east_track(10)]).unwrap();

    let zero_step = DiscoveryConfig {
        window_step: 0,
        ..DiscoveryConfig::default()
    };
    assert!(matches!(
        find_overlapping_segments(&store, 0, &zero_step),
        Err(SegmentError::InvalidParameter { .. })
    ));

    let bad_frac = DiscoveryConfig {
        dedup_overlap_frac: 1.5,
        ..DiscoveryConfig::default()
    };
    assert!(find_overlapping_segments(&store, 0, &bad_frac).is_err());

    assert!(find_overlapping_segments(&store, 9, &DiscoveryConfig::default()).is_err());
}

#[test]
fn discovery_is_deterministic() {
    let store = TrackStore::build(vec![east_track(30), east_track(30), east_track(25)]).unwrap();
    let config = DiscoveryConfig {
        max_length_m: 80.0,
        tol_m: 1.0,
        min_runs: 2,
        ..DiscoveryConfig::default()
    };

    let first = find_overlapping_segments(&store, 0, &config).unwrap();
    let second = find_overlapping_segments(&store, 0, &config).unwrap();

    assert_eq!(first.close_tracks, second.close_tracks);
    assert_eq!(
        serde_json::to_string(&first.segments).unwrap(),
        serde_json::to_string(&second.segments).unwrap()
    );
}

#[test]
fn progress_callback_observes_all_phases() {
    let store = TrackStore::build(vec![east_track(10), east_track(10)]).unwrap();
    let config = DiscoveryConfig {
        max_length_m: 50.0,
        tol_m: 1.0,
        ..DiscoveryConfig::default()
    };
    let tracker = Arc::new(AtomicProgressTracker::new());

    find_overlapping_segments_with_progress(&store, 0, &config, tracker.clone()).unwrap();

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.phase, Some(DiscoveryPhase::ResolvingRuns));
    assert!(snapshot.total > 0);
    assert_eq!(snapshot.completed, snapshot.total);
}

#[test]
fn reference_selection_feeds_discovery() {
    // Three shared tracks and one outlier; the pipeline picks a corridor
    // track and finds a 3-run segment
    let far: Vec<TrackPoint> = (0..10)
        .map(|i| TrackPoint::new(48.5, 16.0 + i as f64 * 0.0001))
        .collect();
    let store =
        TrackStore::build(vec![east_track(10), east_track(10), east_track(10), far]).unwrap();

    let ref_config = ReferenceConfig {
        grid_size_m: 50.0,
        min_reps_for_hotspot: 3,
    };
    let ref_idx = find_best_ref_ride(&store, &ref_config).unwrap();
    assert!(ref_idx < 3);

    let config = DiscoveryConfig {
        max_length_m: 50.0,
        tol_m: 1.0,
        min_runs: 3,
        ..DiscoveryConfig::default()
    };
    let result = find_overlapping_segments(&store, ref_idx, &config).unwrap();
    assert!(!result.segments.is_empty());
    assert!(result.segments.iter().all(|s| s.run_count() >= 3));
}
