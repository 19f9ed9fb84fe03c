//! Candidate window enumeration and the narrow-phase window search.
//!
//! A candidate is a contiguous index range on the reference track; the
//! narrow phase slides same-sized windows over a track's broad-phase hit
//! set and gates them on index contiguity before paying for a Fréchet
//! comparison.

use crate::frechet::FrechetBuffer;
use crate::GpsPoint;

use super::CONTIGUITY_SLACK;

/// A candidate range on the reference track, as inclusive positions into
/// the reference point slice.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CandidateWindow {
    pub start: usize,
    pub end: usize,
}

impl CandidateWindow {
    pub fn point_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Enumerate candidate start positions along the reference.
///
/// For each start (stepping by `window_step`) the end is extended until
/// the cumulative arc length reaches `max_length_m`; starts whose
/// extension runs off the end of the track are discarded, which also ends
/// the enumeration since later starts have even less track left.
pub(crate) fn enumerate_candidates(
    cum: &[f64],
    max_length_m: f64,
    window_step: usize,
) -> Vec<CandidateWindow> {
    let n = cum.len();
    let mut candidates = Vec::new();
    if n < 2 {
        return candidates;
    }

    let mut end = 1;
    for start in (0..n).step_by(window_step) {
        if end <= start {
            end = start + 1;
        }
        while end < n && cum[end] - cum[start] < max_length_m {
            end += 1;
        }
        if end >= n {
            break;
        }
        candidates.push(CandidateWindow { start, end });
    }

    candidates
}

/// Whether the window's extreme indices are close enough to be one
/// contiguous traversal.
#[inline]
fn contiguous(first: u32, last: u32, window_size: usize) -> bool {
    (last - first) as usize <= window_size + CONTIGUITY_SLACK
}

/// Narrow phase, counting variant: does any admissible window of
/// `window_size` hits match the candidate within `tol_m`?
///
/// `sorted_ids` must be ascending global indices from a single track;
/// each window is materialized over its full contiguous `first..=last`
/// arena range so small index gaps cannot hide an off-route excursion.
/// Returns on the first match.
pub(crate) fn first_match(
    arena: &[GpsPoint],
    sorted_ids: &[u32],
    window_size: usize,
    candidate: &[GpsPoint],
    tol_m: f64,
    buffer: &mut FrechetBuffer,
) -> bool {
    if sorted_ids.len() < window_size {
        return false;
    }

    for k in 0..=(sorted_ids.len() - window_size) {
        let first = sorted_ids[k];
        let last = sorted_ids[k + window_size - 1];
        if !contiguous(first, last, window_size) {
            continue;
        }
        let run = &arena[first as usize..=last as usize];
        if buffer.distance(run, candidate) <= tol_m {
            return true;
        }
    }

    false
}

/// Narrow phase, detail variant: the admissible window with the smallest
/// Fréchet distance within `tol_m`, as its inclusive global index range.
pub(crate) fn best_window(
    arena: &[GpsPoint],
    sorted_ids: &[u32],
    window_size: usize,
    candidate: &[GpsPoint],
    tol_m: f64,
    buffer: &mut FrechetBuffer,
) -> Option<(u32, u32)> {
    if sorted_ids.len() < window_size {
        return None;
    }

    let mut best: Option<(u32, u32)> = None;
    let mut best_dist = f64::INFINITY;

    for k in 0..=(sorted_ids.len() - window_size) {
        let first = sorted_ids[k];
        let last = sorted_ids[k + window_size - 1];
        if !contiguous(first, last, window_size) {
            continue;
        }
        let run = &arena[first as usize..=last as usize];
        let dist = buffer.distance(run, candidate);
        if dist <= tol_m && dist < best_dist {
            best_dist = dist;
            best = Some((first, last));
        }
    }

    best
}
