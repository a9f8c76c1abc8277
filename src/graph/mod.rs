//! De Bruijn graph query capability.
//!
//! The bubble search never builds or mutates a graph; it only asks a
//! [`DeBruijnGraph`] which oriented k-mers are present and who their
//! neighbours are. Nodes are identified by canonical k-mers, edges are the
//! k-1 overlaps between present k-mers (node-centric model), so a k-mer's
//! successors are the one-symbol right shifts that exist in the graph.

pub mod kmer;
pub mod kmer_set;

use smallvec::SmallVec;

pub use kmer::{CanonicalKmer, KmerCodec, MAX_KMER_SIZE};
pub use kmer_set::{GraphBuildConfig, KmerSetGraph};

/// Oriented neighbour k-mers, ordered by the symbol that was shifted in.
pub type Neighbors = SmallVec<[u64; 4]>;

pub trait DeBruijnGraph: Sync {
    fn kmer_size(&self) -> usize;

    fn codec(&self) -> &KmerCodec;

    /// Whether the oriented `kmer` (in either strand) is a node.
    fn contains(&self, kmer: u64) -> bool;

    /// Every node, in ascending canonical order.
    fn nodes(&self) -> Vec<CanonicalKmer>;

    fn num_nodes(&self) -> usize;

    #[inline]
    fn canonical(&self, kmer: u64) -> CanonicalKmer {
        self.codec().canonical(kmer)
    }

    fn successors(&self, kmer: u64) -> Neighbors {
        let codec = self.codec();
        (0..4)
            .map(|code| codec.push_right(kmer, code))
            .filter(|&next| self.contains(next))
            .collect()
    }

    fn predecessors(&self, kmer: u64) -> Neighbors {
        let codec = self.codec();
        (0..4)
            .map(|code| codec.push_left(code, kmer))
            .filter(|&prev| self.contains(prev))
            .collect()
    }

    fn out_degree(&self, kmer: u64) -> usize {
        self.successors(kmer).len()
    }

    fn in_degree(&self, kmer: u64) -> usize {
        self.predecessors(kmer).len()
    }
}
