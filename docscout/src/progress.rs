//! Shared progress counters for a running scan.
//!
//! The tracker is a cheap, cloneable handle: the scan keeps one clone and
//! updates it, a display thread keeps another and polls [`ProgressTracker::snapshot`]
//! at whatever rate it likes. The counters only ever grow.
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Point-in-time view of a scan's progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    /// Files fully handled by a worker (matched, empty or failed)
    pub processed: usize,
    /// Files discovered by enumeration
    pub total: usize,
    /// Whether enumeration has finished, i.e. `total` is final
    pub discovery_complete: bool,
}

impl ProgressSnapshot {
    /// Fraction of work done in `0.0..=1.0`; an empty scan counts as done once discovery ends
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return if self.discovery_complete { 1.0 } else { 0.0 };
        }
        self.processed as f64 / self.total as f64
    }

    pub fn is_finished(&self) -> bool {
        self.discovery_complete && self.processed >= self.total
    }
}

/// Tracks discovered and processed file counts for one scan
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    total: Arc<AtomicUsize>,
    processed: Arc<AtomicUsize>,
    discovery_complete: Arc<AtomicBool>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the final candidate count; called once, before any worker starts
    pub(crate) fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::Release);
        self.discovery_complete.store(true, Ordering::Release);
    }

    /// Records that one more file has been handled
    pub(crate) fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::AcqRel);
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        // total is published before any processed increment, so load it last
        let processed = self.processed.load(Ordering::Acquire);
        let discovery_complete = self.discovery_complete.load(Ordering::Acquire);
        let total = self.total.load(Ordering::Acquire);
        ProgressSnapshot {
            processed,
            total,
            discovery_complete,
        }
    }
}
