//! Lock-step two-arm expansion.
//!
//! From an oriented start k-mer with successors `s1 < s2 < ...` (ordered by
//! appended symbol), every pair `(si, sj)` seeds two arms: the last `k-1`
//! symbols of the start followed by each seed's last symbol. Both arms then
//! receive the same symbol at each step (a common successor of their
//! trailing k-mers). After `k-1` steps the arms are `2k-1` symbols long and
//! their trailing k-mers differ only in their first symbol, so any successor
//! of one is a successor of the other: the bubble closes there.
//!
//! A step is taken only if, on each arm, the new k-mer differs canonically
//! from the two k-mers before it, and the two new k-mers differ canonically
//! from each other. Every branching k-mer met along the way is handed to the
//! [`BranchSurveyor`].

use smallvec::SmallVec;

use super::branching::{BranchSurveyor, Survey};
use super::config::{ClosingPolicy, FinderConfig};
use super::BubblePair;
use crate::graph::kmer::decode_base;
use crate::graph::{DeBruijnGraph, KmerCodec};

/// Result of expanding one successor pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// This many bubbles closed (more than one only when branching is
    /// tolerated).
    Closed(usize),
    /// Every candidate was cut by a forbidden branching k-mer.
    RejectedBranching,
    NotClosed,
}

pub struct PathExpander<'g, G> {
    graph: &'g G,
    codec: KmerCodec,
    surveyor: BranchSurveyor<'g, G>,
    closing: ClosingPolicy,
    step_bound: usize,
    // Scratch state of the pair being expanded.
    path1: Vec<u8>,
    path2: Vec<u8>,
    first1: u64,
    start: u64,
    steps: usize,
    closed: usize,
    rejected: bool,
}

impl<'g, G: DeBruijnGraph> PathExpander<'g, G> {
    pub fn new(graph: &'g G, config: &FinderConfig) -> Self {
        let k = graph.kmer_size();
        Self {
            graph,
            codec: *graph.codec(),
            surveyor: BranchSurveyor::new(graph, config.branching_policy),
            closing: config.closing_policy(),
            step_bound: config.step_bound(),
            path1: Vec::with_capacity(2 * k + 1),
            path2: Vec::with_capacity(2 * k + 1),
            first1: 0,
            start: 0,
            steps: 0,
            closed: 0,
            rejected: false,
        }
    }

    /// Expand every successor pair of the oriented k-mer `start`, appending
    /// closed bubbles to `out`. Returns one outcome per expanded pair.
    ///
    /// A pair is only expanded from the smallest k-mer preceding its seeds,
    /// so a bubble whose left end branches is still found once per
    /// orientation.
    pub fn expand_from(
        &mut self,
        start: u64,
        out: &mut Vec<BubblePair>,
    ) -> SmallVec<[Expansion; 6]> {
        let mut outcomes = SmallVec::new();
        let successors = self.graph.successors(start);
        if successors.len() < 2 {
            return outcomes;
        }
        let predecessors = self.graph.predecessors(successors[0]);
        if predecessors.first() != Some(&start) {
            return outcomes;
        }
        for i in 0..successors.len() {
            for j in i + 1..successors.len() {
                outcomes.push(self.expand_pair(start, successors[i], successors[j], out));
            }
        }
        outcomes
    }

    fn expand_pair(
        &mut self,
        start: u64,
        seed1: u64,
        seed2: u64,
        out: &mut Vec<BubblePair>,
    ) -> Expansion {
        if self.codec.canonical(seed1) == self.codec.canonical(seed2) {
            return Expansion::NotClosed;
        }

        self.path1.clear();
        self.path2.clear();
        self.codec.decode_into(seed1, &mut self.path1);
        self.codec.decode_into(seed2, &mut self.path2);
        self.start = start;
        self.first1 = seed1;
        self.steps = 0;
        self.closed = 0;
        self.rejected = false;

        self.expand(1, start, start, seed1, seed2, false, out);

        if self.closed > 0 {
            Expansion::Closed(self.closed)
        } else if self.rejected {
            Expansion::RejectedBranching
        } else {
            Expansion::NotClosed
        }
    }

    /// `pos` counts the k-mers on each arm so far; arms hold `k - 1 + pos`
    /// symbols.
    #[allow(clippy::too_many_arguments)]
    fn expand(
        &mut self,
        pos: usize,
        prev1: u64,
        prev2: u64,
        kmer1: u64,
        kmer2: u64,
        mut branching: bool,
        out: &mut Vec<BubblePair>,
    ) {
        if self.steps >= self.step_bound {
            return;
        }
        self.steps += 1;

        match self.surveyor.survey(kmer1, kmer2) {
            Survey::Clean => {}
            Survey::Branching => branching = true,
            Survey::Rejected => {
                self.rejected = true;
                return;
            }
        }

        if pos == self.codec.k() {
            self.close(kmer1, branching, out);
            return;
        }

        for code in 0..4u64 {
            let next1 = self.codec.push_right(kmer1, code);
            let next2 = self.codec.push_right(kmer2, code);
            if !self.graph.contains(next1) || !self.graph.contains(next2) {
                continue;
            }
            if !self.kmers_diverge(prev1, kmer1, next1)
                || !self.kmers_diverge(prev2, kmer2, next2)
            {
                continue;
            }
            if self.codec.canonical(next1) == self.codec.canonical(next2) {
                continue;
            }

            let symbol = decode_base(code);
            self.path1.push(symbol);
            self.path2.push(symbol);
            self.expand(pos + 1, kmer1, kmer2, next1, next2, branching, out);
            self.path1.pop();
            self.path2.pop();
        }
    }

    /// `next` must not fold back onto either of the two k-mers before it.
    fn kmers_diverge(&self, prev: u64, cur: u64, next: u64) -> bool {
        let next = self.codec.canonical(next);
        next != self.codec.canonical(cur) && next != self.codec.canonical(prev)
    }

    fn close(&mut self, last1: u64, branching: bool, out: &mut Vec<BubblePair>) {
        let closing = self.graph.successors(last1);
        if closing.is_empty() {
            return;
        }

        let (left_anchor, right_anchor) = match self.closing {
            ClosingPolicy::Plain => (None, None),
            ClosingPolicy::WithAlternateClosure => {
                // Seeds share their first k-1 symbols, so they have the same
                // predecessors; trailing k-mers have the same successors.
                let left = (self.graph.in_degree(self.first1) == 1)
                    .then(|| decode_base(self.codec.first_symbol(self.start)));
                let right = (closing.len() == 1)
                    .then(|| decode_base(self.codec.last_symbol(closing[0])));
                (left, right)
            }
        };

        self.closed += 1;
        out.push(BubblePair {
            higher: self.path1.clone(),
            lower: self.path2.clone(),
            left_anchor,
            right_anchor,
            branching,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bubble::config::BranchingPolicy;
    use crate::graph::KmerSetGraph;

    const K: usize = 7;

    // 6 + 13 + 6 symbols, SNP at offset 12 (A in the reference).
    const GENOME: &[u8] = b"TCGGATCAAGTCATGGCTTACCGAT";

    fn alternate() -> Vec<u8> {
        let mut alt = GENOME.to_vec();
        alt[12] = b'G';
        alt
    }

    fn config(extension: bool) -> FinderConfig {
        FinderConfig {
            kmer_size: K,
            extension_enabled: extension,
            ..Default::default()
        }
    }

    fn start_kmer(graph: &KmerSetGraph) -> u64 {
        graph.codec().encode(&GENOME[5..5 + K]).unwrap()
    }

    #[test]
    fn test_clean_snp_closes() {
        let graph = KmerSetGraph::from_sequences(K, [GENOME.to_vec(), alternate()]);
        let mut expander = PathExpander::new(&graph, &config(false));
        let mut out = Vec::new();

        let outcomes = expander.expand_from(start_kmer(&graph), &mut out);

        assert_eq!(outcomes.as_slice(), &[Expansion::Closed(1)]);
        assert_eq!(out.len(), 1);
        let pair = &out[0];
        assert_eq!(pair.higher.len(), 2 * K - 1);
        assert_eq!(pair.higher, &GENOME[6..19]);
        assert_eq!(pair.lower, &alternate()[6..19]);
        assert_eq!(pair.alleles(), (b'A', b'G'));
        assert_eq!(pair.where_to_extend().code(), 0);
        assert!(!pair.branching);
    }

    #[test]
    fn test_alternate_closure_anchors() {
        let graph = KmerSetGraph::from_sequences(K, [GENOME.to_vec(), alternate()]);
        let mut expander = PathExpander::new(&graph, &config(true));
        let mut out = Vec::new();

        expander.expand_from(start_kmer(&graph), &mut out);

        assert_eq!(out.len(), 1);
        let pair = &out[0];
        assert_eq!(pair.left_anchor, Some(GENOME[5]));
        assert_eq!(pair.right_anchor, Some(GENOME[19]));
        assert_eq!(pair.where_to_extend().code(), 3);
        assert_eq!(pair.anchored_higher(), &GENOME[5..20]);
    }

    #[test]
    fn test_non_branching_start_is_ignored() {
        let graph = KmerSetGraph::from_sequences(K, [GENOME.to_vec(), alternate()]);
        let mut expander = PathExpander::new(&graph, &config(false));
        let mut out = Vec::new();
        let kmer = graph.codec().encode(&GENOME[0..K]).unwrap();
        assert!(expander.expand_from(kmer, &mut out).is_empty());
        assert!(out.is_empty());
    }

    #[test]
    fn test_dead_end_arm_does_not_close() {
        // The alternate allele is only supported by a short read that stops
        // before the arms can reconverge.
        let short_read = alternate()[5..16].to_vec();
        let graph = KmerSetGraph::from_sequences(K, [GENOME.to_vec(), short_read]);
        let mut out = Vec::new();

        for policy in [BranchingPolicy::Forbidden, BranchingPolicy::AcceptedUnrecorded] {
            let config = FinderConfig {
                branching_policy: policy,
                ..config(false)
            };
            let mut expander = PathExpander::new(&graph, &config);
            let outcomes = expander.expand_from(start_kmer(&graph), &mut out);
            // The tip at the end of the read is not a branching k-mer.
            assert_eq!(outcomes.as_slice(), &[Expansion::NotClosed]);
        }
        assert!(out.is_empty());
    }

    /// Both alleles followed by a closing branch (`T...`) and a bushy
    /// dead-end subtree on the symbols explored before it.
    fn crowded_fork(k: usize, with_dead_ends: bool) -> (KmerSetGraph, u64) {
        let left = b"TTAGTTGTGCCG";
        let right = b"CAGCGAAGTAGTGCTT";
        let mut seqs = Vec::new();
        for allele in [b'A', b'C'] {
            let mut closing = left.to_vec();
            closing.push(allele);
            closing.push(b'T');
            closing.extend_from_slice(right);
            seqs.push(closing);
            if with_dead_ends {
                for i in 0..27 {
                    let mut dead = left.to_vec();
                    dead.push(allele);
                    dead.extend([i / 9, (i / 3) % 3, i % 3].map(|c| b"ACG"[c]));
                    seqs.push(dead);
                }
            }
        }
        let graph = KmerSetGraph::from_sequences(k, seqs);
        let start = graph.codec().encode(&left[left.len() - k..]).unwrap();
        (graph, start)
    }

    #[test]
    fn test_step_bound_stops_expansion() {
        let k = 11;
        let config = FinderConfig {
            kmer_size: k,
            branching_policy: BranchingPolicy::AcceptedUnrecorded,
            ..Default::default()
        };
        let mut out = Vec::new();

        let (graph, start) = crowded_fork(k, false);
        let mut expander = PathExpander::new(&graph, &config);
        let outcomes = expander.expand_from(start, &mut out);
        assert_eq!(outcomes.as_slice(), &[Expansion::Closed(1)]);
        assert_eq!(expander.steps, k);

        // 40 steps go into the dead ends before the closing branch, which
        // needs 10 more: over the 4k budget.
        let (graph, start) = crowded_fork(k, true);
        let mut expander = PathExpander::new(&graph, &config);
        let outcomes = expander.expand_from(start, &mut out);
        assert_eq!(outcomes.as_slice(), &[Expansion::NotClosed]);
        assert_eq!(expander.step_bound, config.step_bound());
        assert_eq!(expander.steps, expander.step_bound);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_forbidden_branching_rejects() {
        // Extra successor on the reference arm, three k-mers after the seed.
        let mut fork = GENOME[8..8 + K].to_vec();
        fork.push(if GENOME[8 + K] == b'T' { b'C' } else { b'T' });
        let graph = KmerSetGraph::from_sequences(K, [GENOME.to_vec(), alternate(), fork]);
        let mut out = Vec::new();

        let mut forbidden = PathExpander::new(&graph, &config(false));
        let outcomes = forbidden.expand_from(start_kmer(&graph), &mut out);
        assert_eq!(outcomes.as_slice(), &[Expansion::RejectedBranching]);
        assert!(out.is_empty());

        let recorded = FinderConfig {
            branching_policy: BranchingPolicy::AcceptedRecorded,
            ..config(false)
        };
        let mut tolerant = PathExpander::new(&graph, &recorded);
        let outcomes = tolerant.expand_from(start_kmer(&graph), &mut out);
        assert_eq!(outcomes.as_slice(), &[Expansion::Closed(1)]);
        assert!(out[0].branching);
    }
}
