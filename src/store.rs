//! Immutable track storage.
//!
//! All points from all tracks live in one dense arena indexed by `u32`;
//! a track is a contiguous range of arena indices in capture order.
//! Hot loops read [`GpsPoint`]s straight from the arena, while the full
//! [`TrackPoint`] records (time, altitude, extra properties) sit in a
//! parallel table that is only touched when a caller asks for them.

use std::collections::HashMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SegmentError};
use crate::GpsPoint;

/// A single recorded GPS sample.
///
/// Latitude and longitude are mandatory; everything else is optional and
/// stays out of the hot paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Capture time as Unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    /// Elevation in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Device-reported cumulative distance in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Additional free-form properties (surface type, sensor readings, ...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, String>,
}

impl TrackPoint {
    /// Create a track point from coordinates alone.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            time: None,
            altitude: None,
            distance: None,
            properties: HashMap::new(),
        }
    }

    /// Create a track point with a capture time.
    pub fn with_time(latitude: f64, longitude: f64, time: i64) -> Self {
        Self {
            time: Some(time),
            ..Self::new(latitude, longitude)
        }
    }

    /// Check that the coordinates are finite and within WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// The coordinate pair of this record.
    pub fn position(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// A contiguous range of arena indices representing one activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    start: u32,
    end: u32,
}

impl Track {
    /// First arena index of this track.
    pub fn first_index(&self) -> u32 {
        self.start
    }

    /// Last arena index of this track (inclusive).
    pub fn last_index(&self) -> u32 {
        self.end - 1
    }

    /// Number of points in this track.
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Half-open range of arena indices.
    pub fn indices(&self) -> Range<u32> {
        self.start..self.end
    }
}

/// Immutable collection of tracks over a dense point arena.
///
/// Constructed once via [`TrackStore::build`], read-only thereafter, and
/// safe to share across worker threads without locks.
#[derive(Debug, Clone)]
pub struct TrackStore {
    points: Vec<GpsPoint>,
    records: Vec<TrackPoint>,
    tracks: Vec<Track>,
}

impl TrackStore {
    /// Build a store from ordered per-track record sequences.
    ///
    /// Fails if any track has fewer than two points, or contains a record
    /// with non-finite or out-of-range coordinates.
    pub fn build(tracks_input: Vec<Vec<TrackPoint>>) -> Result<Self> {
        let total: usize = tracks_input.iter().map(|t| t.len()).sum();
        let mut points = Vec::with_capacity(total);
        let mut records = Vec::with_capacity(total);
        let mut tracks = Vec::with_capacity(tracks_input.len());

        for (track_idx, track_records) in tracks_input.into_iter().enumerate() {
            if track_records.len() < 2 {
                return Err(SegmentError::InsufficientPoints {
                    track: track_idx,
                    point_count: track_records.len(),
                    minimum_required: 2,
                });
            }

            let start = points.len() as u32;
            for record in track_records {
                if !record.is_valid() {
                    return Err(SegmentError::InvalidCoordinates {
                        track: track_idx,
                        message: format!(
                            "({}, {}) at point {}",
                            record.latitude,
                            record.longitude,
                            points.len() as u32 - start
                        ),
                    });
                }
                points.push(record.position());
                records.push(record);
            }
            let end = points.len() as u32;
            tracks.push(Track { start, end });
        }

        Ok(Self {
            points,
            records,
            tracks,
        })
    }

    /// Number of tracks in the store.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// All tracks in input order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// A track by its position in the input order.
    pub fn track(&self, idx: usize) -> Option<&Track> {
        self.tracks.get(idx)
    }

    /// The whole point arena; a global index is a position in this slice.
    pub fn points(&self) -> &[GpsPoint] {
        &self.points
    }

    /// Point by global index.
    ///
    /// Global indices come from this store's tracks and segments, so an
    /// out-of-range index is a caller bug and panics.
    #[inline]
    pub fn point(&self, global_idx: u32) -> GpsPoint {
        self.points[global_idx as usize]
    }

    /// Full record by global index.
    pub fn record(&self, global_idx: u32) -> &TrackPoint {
        &self.records[global_idx as usize]
    }

    /// The points of one track as a slice of the arena.
    pub fn track_points(&self, idx: usize) -> &[GpsPoint] {
        let track = &self.tracks[idx];
        &self.points[track.start as usize..track.end as usize]
    }

    /// Materialize the polyline for a contiguous run of global indices.
    pub fn polyline(&self, indices: &[u32]) -> Vec<GpsPoint> {
        indices.iter().map(|&i| self.point(i)).collect()
    }
}
