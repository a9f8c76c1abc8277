//! Flank extension through unbranched sequence.
//!
//! Walks start from the outermost k-mer of an anchored arm. The right side
//! walks forward from the last k-mer; the left side walks forward from the
//! reverse complement of the first k-mer and is reverse complemented back at
//! the end. A step from `x` to `y` needs `x` to have a single successor and
//! `y` a single predecessor.

use std::collections::HashSet;

use ahash::RandomState;

use super::config::ExtensionStyle;
use super::{BubblePair, ExtensionSides};
use crate::graph::kmer::{decode_base, reverse_complement};
use crate::graph::kmer_set::fixed_hash_state;
use crate::graph::{DeBruijnGraph, KmerCodec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Why a walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    DeadEnd,
    Branching,
    /// The next k-mer belongs to the bubble or to an earlier walk.
    Reconverged,
    MaxLength,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideExtension {
    /// Symbols added outside the arm, in forward orientation.
    pub fragment: Vec<u8>,
    pub stop: StopReason,
}

/// Flanking sequence of an emitted bubble. Each flank includes its anchoring
/// symbol; `None` means the side was not extended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flanks {
    pub left: Option<Vec<u8>>,
    pub right: Option<Vec<u8>>,
}

impl Flanks {
    pub fn sides(&self) -> ExtensionSides {
        ExtensionSides {
            left: self.left.is_some(),
            right: self.right.is_some(),
        }
    }

    pub fn left_len(&self) -> usize {
        self.left.as_ref().map_or(0, Vec::len)
    }

    pub fn right_len(&self) -> usize {
        self.right.as_ref().map_or(0, Vec::len)
    }
}

pub struct ExtensionBuilder<'g, G> {
    graph: &'g G,
    codec: KmerCodec,
    max_length: usize,
    visited: HashSet<u64, RandomState>,
}

impl<'g, G: DeBruijnGraph> ExtensionBuilder<'g, G> {
    /// `max_length` caps each flank, anchor included.
    pub fn new(graph: &'g G, max_length: usize) -> Self {
        Self {
            graph,
            codec: *graph.codec(),
            max_length,
            visited: HashSet::with_hasher(fixed_hash_state()),
        }
    }

    /// Forget previous walks and mark the k-mers of `arms` as visited.
    pub fn reset(&mut self, arms: &[&[u8]]) {
        self.visited.clear();
        for arm in arms {
            self.visited
                .extend(self.codec.canonical_kmers(arm).map(|kmer| kmer.as_u64()));
        }
    }

    /// Walk outward from one end of `path`. Visited k-mers are remembered
    /// until the next [`reset`](Self::reset).
    pub fn extend(&mut self, path: &[u8], side: Side) -> SideExtension {
        let k = self.codec.k();
        let outermost = match side {
            Side::Right if path.len() >= k => self.codec.encode(&path[path.len() - k..]),
            Side::Left => self.codec.encode(path).map(|kmer| self.codec.reverse_complement(kmer)),
            Side::Right => None,
        };
        let Some(mut current) = outermost else {
            return SideExtension {
                fragment: Vec::new(),
                stop: StopReason::DeadEnd,
            };
        };

        let limit = self.max_length.saturating_sub(1);
        let mut fragment = Vec::new();
        let stop = loop {
            if fragment.len() >= limit {
                break StopReason::MaxLength;
            }
            let successors = self.graph.successors(current);
            let next = match successors.as_slice() {
                [] => break StopReason::DeadEnd,
                [next] => *next,
                _ => break StopReason::Branching,
            };
            if self.graph.in_degree(next) != 1 {
                break StopReason::Branching;
            }
            if !self.visited.insert(self.codec.canonical(next).as_u64()) {
                break StopReason::Reconverged;
            }
            fragment.push(decode_base(self.codec.last_symbol(next)));
            current = next;
        };

        if side == Side::Left {
            fragment = reverse_complement(&fragment);
        }
        SideExtension { fragment, stop }
    }

    /// Extend both anchored sides of `pair`. With the strict style a flank
    /// shorter than `min_length` is dropped.
    pub fn extend_bubble(
        &mut self,
        pair: &BubblePair,
        style: ExtensionStyle,
        min_length: usize,
    ) -> Flanks {
        let higher = pair.anchored_higher();
        let lower = pair.anchored_lower();
        self.reset(&[&higher, &lower]);

        let keep = |flank: Vec<u8>| match style {
            ExtensionStyle::Strict if flank.len() < min_length => None,
            _ => Some(flank),
        };

        let left = pair.left_anchor.and_then(|anchor| {
            let mut flank = self.extend(&higher, Side::Left).fragment;
            flank.push(anchor);
            keep(flank)
        });
        let right = pair.right_anchor.and_then(|anchor| {
            let mut flank = vec![anchor];
            flank.extend(self.extend(&higher, Side::Right).fragment);
            keep(flank)
        });
        Flanks { left, right }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
