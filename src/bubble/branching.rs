//! Branching checks along bubble arms.

use super::config::BranchingPolicy;
use crate::graph::DeBruijnGraph;

/// Outcome of checking a pair of arm k-mers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Survey {
    /// Neither k-mer branches.
    Clean,
    /// A branching k-mer was met and the policy tolerates it.
    Branching,
    /// A branching k-mer was met and the policy forbids it.
    Rejected,
}

pub struct BranchSurveyor<'g, G> {
    graph: &'g G,
    policy: BranchingPolicy,
}

impl<'g, G: DeBruijnGraph> BranchSurveyor<'g, G> {
    pub fn new(graph: &'g G, policy: BranchingPolicy) -> Self {
        Self { graph, policy }
    }

    pub fn policy(&self) -> BranchingPolicy {
        self.policy
    }

    /// Exactly one successor and exactly one predecessor.
    pub fn has_single_extension(&self, kmer: u64) -> bool {
        self.graph.out_degree(kmer) == 1 && self.graph.in_degree(kmer) == 1
    }

    pub fn both_singly_extending(&self, kmer1: u64, kmer2: u64) -> bool {
        self.has_single_extension(kmer1) && self.has_single_extension(kmer2)
    }

    /// More than one successor or more than one predecessor. A tip is not
    /// branching.
    pub fn is_branching(&self, kmer: u64) -> bool {
        self.graph.out_degree(kmer) > 1 || self.graph.in_degree(kmer) > 1
    }

    pub fn survey(&self, kmer1: u64, kmer2: u64) -> Survey {
        if !self.is_branching(kmer1) && !self.is_branching(kmer2) {
            Survey::Clean
        } else if self.policy == BranchingPolicy::Forbidden {
            Survey::Rejected
        } else {
            Survey::Branching
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::KmerSetGraph;

    #[test]
    fn test_single_extension() {
        // GATTACAGG: interior 5-mers have one neighbour on each side.
        let graph = KmerSetGraph::from_sequences(5, [b"GATTACAGG"]);
        let codec = *graph.codec();
        let surveyor = BranchSurveyor::new(&graph, BranchingPolicy::Forbidden);

        assert!(surveyor.has_single_extension(codec.encode(b"ATTAC").unwrap()));
        // Ends of the sequence are tips.
        assert!(!surveyor.has_single_extension(codec.encode(b"GATTA").unwrap()));
        assert!(!surveyor.has_single_extension(codec.encode(b"ACAGG").unwrap()));
    }

    #[test]
    fn test_tips_are_not_branching() {
        let graph = KmerSetGraph::from_sequences(5, [&b"GATTACAGG"[..], b"ATTACT"]);
        let codec = *graph.codec();
        let surveyor = BranchSurveyor::new(&graph, BranchingPolicy::Forbidden);

        let tip = codec.encode(b"GATTA").unwrap();
        let dead_end = codec.encode(b"ACAGG").unwrap();
        assert!(!surveyor.is_branching(tip));
        assert!(!surveyor.is_branching(dead_end));
        assert!(surveyor.is_branching(codec.encode(b"ATTAC").unwrap()));
        assert_eq!(surveyor.survey(tip, dead_end), Survey::Clean);
    }

    #[test]
    fn test_survey_policies() {
        // ATTAC gains a second successor TTACT.
        let graph = KmerSetGraph::from_sequences(5, [&b"GATTACAGG"[..], b"ATTACT"]);
        let codec = *graph.codec();
        let clean = codec.encode(b"TTACA").unwrap();
        let fork = codec.encode(b"ATTAC").unwrap();

        let forbidden = BranchSurveyor::new(&graph, BranchingPolicy::Forbidden);
        assert_eq!(forbidden.survey(clean, clean), Survey::Clean);
        assert_eq!(forbidden.survey(clean, fork), Survey::Rejected);

        let recorded = BranchSurveyor::new(&graph, BranchingPolicy::AcceptedRecorded);
        assert_eq!(recorded.survey(fork, clean), Survey::Branching);
        let unrecorded = BranchSurveyor::new(&graph, BranchingPolicy::AcceptedUnrecorded);
        assert_eq!(unrecorded.survey(fork, fork), Survey::Branching);
    }
}
