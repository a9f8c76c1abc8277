//! Low-complexity scoring of closed bubbles.
//!
//! The score is the DUST trinucleotide score summed over both core arms:
//! for each arm the 64 overlapping 3-mer counts `c` contribute
//! `c * (c - 1) / 2`. Repeats and homopolymers score high, random sequence
//! scores low. Reverse complementing an arm only permutes its 3-mer counts,
//! so the score does not depend on the strand a bubble was found from.

use super::config::FinderConfig;
use crate::graph::kmer::encode_base;

/// DUST score of one sequence. Windows touching a non-ACGT symbol are
/// skipped.
pub fn dust_score(seq: &[u8]) -> u32 {
    let mut counts = [0u32; 64];
    for window in seq.windows(3) {
        let code = window
            .iter()
            .try_fold(0usize, |acc, &b| Some((acc << 2) | encode_base(b)? as usize));
        if let Some(code) = code {
            counts[code] += 1;
        }
    }
    counts.iter().map(|&c| c * c.saturating_sub(1) / 2).sum()
}

#[derive(Debug, Clone, Copy)]
pub struct ComplexityScorer {
    ceiling: u32,
}

impl ComplexityScorer {
    pub fn new(ceiling: u32) -> Self {
        Self { ceiling }
    }

    pub fn for_config(config: &FinderConfig) -> Self {
        Self::new(config.complexity_ceiling())
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    pub fn score(&self, higher: &[u8], lower: &[u8]) -> u32 {
        dust_score(higher) + dust_score(lower)
    }

    pub fn is_low_complexity(&self, score: u32) -> bool {
        score > self.ceiling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::kmer::reverse_complement;

    #[test]
    fn test_dust_homopolymer() {
        // 39 copies of AAA.
        let seq = vec![b'A'; 41];
        assert_eq!(dust_score(&seq), 39 * 38 / 2);
    }

    #[test]
    fn test_dust_distinct_triplets() {
        assert_eq!(dust_score(b"ACGTTGCA"), 0);
        assert_eq!(dust_score(b"AC"), 0);
        // ACA twice, CAC once.
        assert_eq!(dust_score(b"ACACA"), 1);
    }

    #[test]
    fn test_dust_skips_ambiguous_windows() {
        assert_eq!(dust_score(b"AANAA"), 0);
        // AAA twice, once on each side of the N.
        assert_eq!(dust_score(b"AAANAAA"), 1);
    }

    #[test]
    fn test_score_symmetric_under_reverse_complement() {
        let higher = b"ATTGCAGGCATTACGGATCCAAAGTCTTGCAGATTACCGTA";
        let mut lower = higher.to_vec();
        lower[20] = b'T';
        let scorer = ComplexityScorer::new(110);

        let forward = scorer.score(higher, &lower);
        let reverse = scorer.score(&reverse_complement(higher), &reverse_complement(&lower));
        assert_eq!(forward, reverse);
        assert_eq!(forward, scorer.score(&lower, higher));
    }

    #[test]
    fn test_ceiling_from_config() {
        let config = FinderConfig {
            kmer_size: 21,
            ..Default::default()
        };
        let scorer = ComplexityScorer::for_config(&config);
        assert_eq!(scorer.ceiling(), 110);
        assert!(!scorer.is_low_complexity(110));
        assert!(scorer.is_low_complexity(111));

        let poly_a = vec![b'A'; 41];
        assert!(scorer.is_low_complexity(scorer.score(&poly_a, &poly_a)));
    }
}
