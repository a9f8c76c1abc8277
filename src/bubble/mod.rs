//! Bubble search over a de Bruijn graph.
//!
//! For every node, in both orientations, two arms are grown in lock-step from
//! each pair of successors. An arm pair that reconverges after `k-1` shared
//! symbols is a bubble: two `2k-1` paths that differ only at their central
//! symbol. Closed bubbles go through the canonical-orientation check, the
//! low-complexity filter and optional flank extension before the emitter
//! writes them as a pair of FASTA records.
//!
//! Component layering (leaves first): [`branching`] and [`complexity`] are
//! pure queries, [`expander`] and [`extension`] walk the graph, [`emitter`]
//! owns the shared bank writes, and [`finder`] drives the worker threads.

pub mod branching;
pub mod complexity;
pub mod config;
pub mod emitter;
pub mod error;
pub mod expander;
pub mod extension;
pub mod finder;
pub mod stats;

pub use branching::{BranchSurveyor, Survey};
pub use complexity::{ComplexityScorer, dust_score};
pub use config::{BranchingPolicy, ClosingPolicy, ExtensionStyle, FinderConfig};
pub use emitter::BubbleEmitter;
pub use error::FinderError;
pub use expander::{Expansion, PathExpander};
pub use extension::{ExtensionBuilder, Flanks, Side, SideExtension, StopReason};
pub use finder::{BubbleFinder, NodeProcessor};
pub use stats::{BubbleStats, RejectionTally, StatsSummary};

/// Branching class reported for bubbles when branching is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchingClass {
    /// No arm k-mer branches.
    Low,
    /// At least one arm k-mer has several successors or predecessors.
    High,
}

impl BranchingClass {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

/// Sides of a bubble that carry flanking sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtensionSides {
    pub left: bool,
    pub right: bool,
}

impl ExtensionSides {
    /// `where_to_extend` code: 0 none, 1 left, 2 right, 3 both.
    pub fn code(self) -> u8 {
        (self.left as u8) | ((self.right as u8) << 1)
    }
}

/// A closed bubble: two core arms of `2k-1` symbols that differ only at
/// position `k-1`.
///
/// With the alternate closure the expander also records the symbol that
/// unambiguously precedes (`left_anchor`) or follows (`right_anchor`) both
/// arms; extension only happens on anchored sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BubblePair {
    /// Arm grown from the successor with the smaller appended symbol.
    pub higher: Vec<u8>,
    pub lower: Vec<u8>,
    pub left_anchor: Option<u8>,
    pub right_anchor: Option<u8>,
    /// Whether a branching k-mer was tolerated on either arm.
    pub branching: bool,
}

impl BubblePair {
    /// Offset of the variant symbol inside the core arms.
    pub fn snp_offset(&self) -> usize {
        self.higher.len() / 2
    }

    /// `(higher, lower)` variant symbols.
    pub fn alleles(&self) -> (u8, u8) {
        let pos = self.snp_offset();
        (self.higher[pos], self.lower[pos])
    }

    pub fn where_to_extend(&self) -> ExtensionSides {
        ExtensionSides {
            left: self.left_anchor.is_some(),
            right: self.right_anchor.is_some(),
        }
    }

    /// The higher arm with its anchoring symbols attached (`2k-1`, `2k` or
    /// `2k+1` symbols).
    pub fn anchored_higher(&self) -> Vec<u8> {
        let mut arm = Vec::with_capacity(self.higher.len() + 2);
        arm.extend(self.left_anchor);
        arm.extend_from_slice(&self.higher);
        arm.extend(self.right_anchor);
        arm
    }

    pub fn anchored_lower(&self) -> Vec<u8> {
        let mut arm = Vec::with_capacity(self.lower.len() + 2);
        arm.extend(self.left_anchor);
        arm.extend_from_slice(&self.lower);
        arm.extend(self.right_anchor);
        arm
    }
}
