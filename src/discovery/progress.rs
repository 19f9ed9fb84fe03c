//! Progress observation for segment discovery.
//!
//! The engine reports phase transitions and per-item completions through
//! a callback trait. Updates are emitted from parallel workers, so
//! implementations must be `Send + Sync`.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Discovery phases, ordered by execution sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryPhase {
    /// Building per-track spatial indexes for the close tracks
    BuildingIndexes,
    /// Stage 1: counting supporting tracks per candidate window
    CountingCandidates,
    /// Stage 2: deduplication and per-track run resolution
    ResolvingRuns,
}

impl DiscoveryPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryPhase::BuildingIndexes => "building_indexes",
            DiscoveryPhase::CountingCandidates => "counting_candidates",
            DiscoveryPhase::ResolvingRuns => "resolving_runs",
        }
    }

    // 0 is reserved for "no phase entered yet"
    fn ordinal(self) -> u8 {
        match self {
            DiscoveryPhase::BuildingIndexes => 1,
            DiscoveryPhase::CountingCandidates => 2,
            DiscoveryPhase::ResolvingRuns => 3,
        }
    }

    fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            1 => Some(DiscoveryPhase::BuildingIndexes),
            2 => Some(DiscoveryPhase::CountingCandidates),
            3 => Some(DiscoveryPhase::ResolvingRuns),
            _ => None,
        }
    }
}

/// Trait for receiving progress updates during discovery.
///
/// Called from parallel rayon threads. Implementations must be thread-safe.
pub trait DiscoveryProgressCallback: Send + Sync {
    /// Called when entering a new phase. `total` is the number of items in
    /// this phase.
    fn on_phase(&self, phase: DiscoveryPhase, total: u32);
    /// Called after completing one item in the current phase.
    fn on_progress(&self);
}

/// No-op implementation for callers that do not observe progress.
pub struct NoopProgress;

impl DiscoveryProgressCallback for NoopProgress {
    fn on_phase(&self, _phase: DiscoveryPhase, _total: u32) {}
    fn on_progress(&self) {}
}

/// Point-in-time view of an [`AtomicProgressTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Current phase; `None` before the first `on_phase` call
    pub phase: Option<DiscoveryPhase>,
    pub completed: u32,
    pub total: u32,
}

/// Lock-free progress tracker that can be polled from another thread.
///
/// The phase is stored as its ordinal in a single atomic and resolved
/// back to a [`DiscoveryPhase`] when read, so neither the engine nor the
/// polling side ever takes a lock.
#[derive(Debug, Default)]
pub struct AtomicProgressTracker {
    phase: AtomicU8,
    completed: AtomicU32,
    total: AtomicU32,
}

impl AtomicProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the current phase and counters.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            phase: DiscoveryPhase::from_ordinal(self.phase.load(Ordering::Acquire)),
            completed: self.completed.load(Ordering::Acquire),
            total: self.total.load(Ordering::Acquire),
        }
    }
}

impl DiscoveryProgressCallback for AtomicProgressTracker {
    fn on_phase(&self, phase: DiscoveryPhase, total: u32) {
        self.total.store(total, Ordering::Release);
        self.completed.store(0, Ordering::Release);
        self.phase.store(phase.ordinal(), Ordering::Release);
    }

    fn on_progress(&self) {
        self.completed.fetch_add(1, Ordering::AcqRel);
    }
}
