//! Run-wide bubble counters.
//!
//! Emission counters are shared atomics bumped by the emitter. Rejection
//! counters are tallied per worker in a [`RejectionTally`] and folded in once
//! when the worker finishes.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use super::BranchingClass;

/// Per-worker counts of start pairs that did not lead to an emission.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RejectionTally {
    pub not_closed: u64,
    pub rejected_branching: u64,
    pub rejected_complexity: u64,
    /// Closed bubbles seen from their non-canonical orientation.
    pub duplicates: u64,
}

#[derive(Debug, Default)]
pub struct BubbleStats {
    nb_bubbles: AtomicU64,
    nb_bubbles_high: AtomicU64,
    nb_bubbles_low: AtomicU64,
    not_closed: AtomicU64,
    rejected_branching: AtomicU64,
    rejected_complexity: AtomicU64,
    duplicates: AtomicU64,
}

impl BubbleStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next bubble index (1-based).
    pub fn next_id(&self) -> u64 {
        self.nb_bubbles.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_class(&self, class: Option<BranchingClass>) {
        match class {
            Some(BranchingClass::High) => {
                self.nb_bubbles_high.fetch_add(1, Ordering::Relaxed);
            }
            Some(BranchingClass::Low) => {
                self.nb_bubbles_low.fetch_add(1, Ordering::Relaxed);
            }
            None => {}
        }
    }

    pub fn add_rejections(&self, tally: &RejectionTally) {
        self.not_closed.fetch_add(tally.not_closed, Ordering::Relaxed);
        self.rejected_branching
            .fetch_add(tally.rejected_branching, Ordering::Relaxed);
        self.rejected_complexity
            .fetch_add(tally.rejected_complexity, Ordering::Relaxed);
        self.duplicates.fetch_add(tally.duplicates, Ordering::Relaxed);
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            nb_bubbles: self.nb_bubbles.load(Ordering::Relaxed),
            nb_bubbles_high: self.nb_bubbles_high.load(Ordering::Relaxed),
            nb_bubbles_low: self.nb_bubbles_low.load(Ordering::Relaxed),
            not_closed: self.not_closed.load(Ordering::Relaxed),
            rejected_branching: self.rejected_branching.load(Ordering::Relaxed),
            rejected_complexity: self.rejected_complexity.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`BubbleStats`] taken at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub nb_bubbles: u64,
    pub nb_bubbles_high: u64,
    pub nb_bubbles_low: u64,
    pub not_closed: u64,
    pub rejected_branching: u64,
    pub rejected_complexity: u64,
    pub duplicates: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let stats = BubbleStats::new();
        assert_eq!(stats.next_id(), 1);
        assert_eq!(stats.next_id(), 2);
        assert_eq!(stats.summary().nb_bubbles, 2);
    }

    #[test]
    fn test_concurrent_counting() {
        let stats = BubbleStats::new();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..250 {
                        stats.next_id();
                        stats.record_class(Some(BranchingClass::Low));
                    }
                    stats.add_rejections(&RejectionTally {
                        not_closed: 3,
                        duplicates: 1,
                        ..Default::default()
                    });
                });
            }
        });
        let summary = stats.summary();
        assert_eq!(summary.nb_bubbles, 1000);
        assert_eq!(summary.nb_bubbles_low, 1000);
        assert_eq!(summary.nb_bubbles_high, 0);
        assert_eq!(summary.not_closed, 12);
        assert_eq!(summary.duplicates, 4);
    }

    #[test]
    fn test_unrecorded_class_not_counted() {
        let stats = BubbleStats::new();
        stats.record_class(None);
        stats.record_class(Some(BranchingClass::High));
        let summary = stats.summary();
        assert_eq!(summary.nb_bubbles_high, 1);
        assert_eq!(summary.nb_bubbles_low, 0);
    }
}
