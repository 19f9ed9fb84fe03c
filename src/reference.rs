//! Reference-ride selection via hotspot grid cells.
//!
//! Every point is quantized to a metric grid cell; cells visited by many
//! distinct tracks are hotspots, and the track covering the most hotspot
//! cells becomes the reference for segment discovery.

use std::collections::{HashMap, HashSet};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SegmentError};
use crate::geo_utils::METERS_PER_DEGREE;
use crate::store::TrackStore;

/// Configuration for reference-ride selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceConfig {
    /// Hotspot grid cell size in meters. Default: 50.0
    pub grid_size_m: f64,
    /// Minimum distinct tracks visiting a cell to make it a hotspot.
    /// Default: 10
    pub min_reps_for_hotspot: usize,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            grid_size_m: 50.0,
            min_reps_for_hotspot: 10,
        }
    }
}

/// Metric grid cell on the quantized lat/lon plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GridCell {
    lat_idx: i64,
    lng_idx: i64,
}

impl GridCell {
    fn from_point(lat: f64, lng: f64, lng_meters_per_degree: f64, grid_size_m: f64) -> Self {
        Self {
            lat_idx: (lat * METERS_PER_DEGREE / grid_size_m).floor() as i64,
            lng_idx: (lng * lng_meters_per_degree / grid_size_m).floor() as i64,
        }
    }
}

/// Pick the track that traverses the most hotspot cells.
///
/// Ties break toward the lowest track position. If no cell reaches
/// `min_reps_for_hotspot` distinct tracks, the first track is returned
/// with a warning; that is a recoverable degradation, not an error.
pub fn find_best_ref_ride(store: &TrackStore, config: &ReferenceConfig) -> Result<usize> {
    if store.is_empty() {
        return Err(SegmentError::InvalidParameter {
            message: "cannot select a reference ride from an empty store".to_string(),
        });
    }
    if config.grid_size_m <= 0.0 || !config.grid_size_m.is_finite() {
        return Err(SegmentError::InvalidParameter {
            message: format!("grid_size_m must be positive, got {}", config.grid_size_m),
        });
    }

    let points = store.points();
    let mean_lat = points.iter().map(|p| p.latitude).sum::<f64>() / points.len() as f64;
    let lng_meters_per_degree = METERS_PER_DEGREE * mean_lat.to_radians().cos().max(0.1);

    // Cell -> distinct tracks visiting it; a track counts once per cell
    let mut cell_tracks: HashMap<GridCell, HashSet<usize>> = HashMap::new();
    for (track_idx, _) in store.tracks().iter().enumerate() {
        for p in store.track_points(track_idx) {
            let cell = GridCell::from_point(
                p.latitude,
                p.longitude,
                lng_meters_per_degree,
                config.grid_size_m,
            );
            cell_tracks.entry(cell).or_default().insert(track_idx);
        }
    }

    let hotspots: HashSet<GridCell> = cell_tracks
        .iter()
        .filter(|(_, tracks)| tracks.len() >= config.min_reps_for_hotspot)
        .map(|(cell, _)| *cell)
        .collect();

    if hotspots.is_empty() {
        warn!(
            "[Reference] No hotspot cells ({}+ tracks per {}m cell); falling back to track 0",
            config.min_reps_for_hotspot, config.grid_size_m
        );
        return Ok(0);
    }

    // Score each track by its points inside hotspot cells; first wins ties
    let mut best_idx = 0;
    let mut best_score = 0usize;
    for (track_idx, _) in store.tracks().iter().enumerate() {
        let score = store
            .track_points(track_idx)
            .iter()
            .filter(|p| {
                hotspots.contains(&GridCell::from_point(
                    p.latitude,
                    p.longitude,
                    lng_meters_per_degree,
                    config.grid_size_m,
                ))
            })
            .count();
        if score > best_score {
            best_score = score;
            best_idx = track_idx;
        }
    }

    info!(
        "[Reference] Track {} covers {} points in {} hotspot cells",
        best_idx,
        best_score,
        hotspots.len()
    );

    Ok(best_idx)
}
