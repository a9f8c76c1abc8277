//! Genome mutator for producing test data with known variants.
//!
//! Substitutions are applied first, at distinct positions in increasing
//! order. Insertions are then applied right to left so that every logged
//! position refers to the original genome. Each event is logged as an
//! `upper` record (neighbourhood before the event) and a `lower` record
//! (neighbourhood after it).

use anyhow::{Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::io::SequenceRecord;

/// Symbols logged on each side of an event.
pub const NEIGHBOURHOOD: usize = 20;

const BASES: &[u8; 4] = b"ACGT";

#[derive(Debug, Clone)]
pub struct MutationPlan {
    pub nb_snps: usize,
    pub nb_insertions: usize,
    pub min_insertion: usize,
    pub max_insertion: usize,
    pub seed: u64,
}

impl Default for MutationPlan {
    fn default() -> Self {
        Self {
            nb_snps: 0,
            nb_insertions: 0,
            min_insertion: 1,
            max_insertion: 1,
            seed: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Snp {
        position: usize,
        reference: u8,
        alternate: u8,
    },
    Insertion {
        position: usize,
        inserted: Vec<u8>,
    },
}

#[derive(Debug, Clone)]
pub struct MutatedGenome {
    pub sequence: Vec<u8>,
    /// Events in the order they were applied.
    pub mutations: Vec<Mutation>,
    /// `upper`/`lower` neighbourhood records, two per event.
    pub log: Vec<SequenceRecord>,
}

fn random_base(rng: &mut StdRng) -> u8 {
    BASES[rng.gen_range(0..4)]
}

fn mutated_base(rng: &mut StdRng, reference: u8) -> u8 {
    let others: Vec<u8> = BASES
        .iter()
        .copied()
        .filter(|&b| b != reference.to_ascii_uppercase())
        .collect();
    others[rng.gen_range(0..others.len())]
}

fn neighbourhood(seq: &[u8], start: isize, end: usize) -> Vec<u8> {
    let start = start.max(0) as usize;
    let end = end.min(seq.len());
    seq[start.min(end)..end].to_vec()
}

/// Apply `plan` to `genome`.
pub fn mutate(genome: &[u8], plan: &MutationPlan) -> Result<MutatedGenome> {
    if genome.is_empty() {
        bail!("cannot mutate an empty genome");
    }
    if plan.nb_snps > genome.len() {
        bail!(
            "{} SNPs requested but the genome only has {} positions",
            plan.nb_snps,
            genome.len()
        );
    }
    if plan.nb_insertions > 0 && (plan.min_insertion == 0 || plan.min_insertion > plan.max_insertion)
    {
        bail!(
            "invalid insertion size range [{}, {}]",
            plan.min_insertion,
            plan.max_insertion
        );
    }

    let mut rng = StdRng::seed_from_u64(plan.seed);
    let mut seq = genome.to_vec();
    let mut mutations = Vec::with_capacity(plan.nb_snps + plan.nb_insertions);
    let mut log = Vec::with_capacity(2 * (plan.nb_snps + plan.nb_insertions));
    let radius = NEIGHBOURHOOD as isize;

    let mut positions = rand::seq::index::sample(&mut rng, seq.len(), plan.nb_snps).into_vec();
    positions.sort_unstable();
    for (snp_id, &pos) in positions.iter().enumerate() {
        let reference = seq[pos];
        let alternate = mutated_base(&mut rng, reference);
        let tag = format!("{}|{}/{}", pos, reference as char, alternate as char);

        log.push(SequenceRecord {
            header: format!("SNP_{}|upper|{}", snp_id, tag),
            sequence: neighbourhood(&seq, pos as isize - radius, pos + NEIGHBOURHOOD),
        });
        seq[pos] = alternate;
        log.push(SequenceRecord {
            header: format!("SNP_{}|lower|{}", snp_id, tag),
            sequence: neighbourhood(&seq, pos as isize - radius, pos + NEIGHBOURHOOD),
        });
        mutations.push(Mutation::Snp {
            position: pos,
            reference,
            alternate,
        });
    }

    let mut positions: Vec<usize> = (0..plan.nb_insertions)
        .map(|_| rng.gen_range(0..=genome.len()))
        .collect();
    positions.sort_unstable_by(|a, b| b.cmp(a));
    for (insertion_id, &pos) in positions.iter().enumerate() {
        let size = rng.gen_range(plan.min_insertion..=plan.max_insertion);
        let inserted: Vec<u8> = (0..size).map(|_| random_base(&mut rng)).collect();
        let tag = format!("{}|{}|{}", pos, size, String::from_utf8_lossy(&inserted));

        log.push(SequenceRecord {
            header: format!("INS_{}|upper|{}", insertion_id, tag),
            sequence: neighbourhood(&seq, pos as isize - radius, pos + NEIGHBOURHOOD),
        });
        seq.splice(pos..pos, inserted.iter().copied());
        log.push(SequenceRecord {
            header: format!("INS_{}|lower|{}", insertion_id, tag),
            sequence: neighbourhood(&seq, pos as isize - radius, pos + NEIGHBOURHOOD + size),
        });
        mutations.push(Mutation::Insertion {
            position: pos,
            inserted,
        });
    }

    Ok(MutatedGenome {
        sequence: seq,
        mutations,
        log,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn genome(len: usize) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(7);
        (0..len).map(|_| random_base(&mut rng)).collect()
    }

    #[test]
    fn test_snps_only() {
        let original = genome(500);
        let plan = MutationPlan {
            nb_snps: 10,
            seed: 42,
            ..Default::default()
        };
        let mutated = mutate(&original, &plan).unwrap();

        assert_eq!(mutated.sequence.len(), original.len());
        let diffs = original
            .iter()
            .zip(&mutated.sequence)
            .filter(|(a, b)| a != b)
            .count();
        assert_eq!(diffs, 10);
        assert_eq!(mutated.log.len(), 20);

        for m in &mutated.mutations {
            let Mutation::Snp {
                position,
                reference,
                alternate,
            } = *m
            else {
                panic!("unexpected insertion");
            };
            assert_eq!(original[position], reference);
            assert_eq!(mutated.sequence[position], alternate);
            assert_ne!(reference, alternate);
        }
        assert!(mutated.log[0].header.starts_with("SNP_0|upper|"));
        assert!(mutated.log[1].header.starts_with("SNP_0|lower|"));
    }

    #[test]
    fn test_insertions_refer_to_original_positions() {
        let original = genome(300);
        let plan = MutationPlan {
            nb_insertions: 4,
            min_insertion: 2,
            max_insertion: 6,
            seed: 3,
            ..Default::default()
        };
        let mutated = mutate(&original, &plan).unwrap();

        let mut total = 0;
        let mut last = usize::MAX;
        for m in &mutated.mutations {
            let Mutation::Insertion { position, inserted } = m else {
                panic!("unexpected SNP");
            };
            assert!(*position <= last);
            assert!((2..=6).contains(&inserted.len()));
            last = *position;
            total += inserted.len();
        }
        assert_eq!(mutated.sequence.len(), original.len() + total);
        // Left of the leftmost insertion the genome is untouched.
        assert_eq!(&mutated.sequence[..last], &original[..last]);
        assert!(mutated.log[0].header.starts_with("INS_0|upper|"));
    }

    #[test]
    fn test_same_seed_same_result() {
        let original = genome(200);
        let plan = MutationPlan {
            nb_snps: 5,
            nb_insertions: 2,
            min_insertion: 1,
            max_insertion: 3,
            seed: 11,
        };
        let a = mutate(&original, &plan).unwrap();
        let b = mutate(&original, &plan).unwrap();
        assert_eq!(a.sequence, b.sequence);
        assert_eq!(a.mutations, b.mutations);
    }

    #[test]
    fn test_neighbourhood_is_clipped() {
        let original = genome(30);
        let plan = MutationPlan {
            nb_snps: 30,
            ..Default::default()
        };
        let mutated = mutate(&original, &plan).unwrap();
        // Every position is mutated; the first event sits at position 0.
        assert_eq!(mutated.log[0].sequence, &original[..20]);
        assert!(mutated.log.iter().all(|r| r.sequence.len() <= 2 * NEIGHBOURHOOD));
    }

    #[test]
    fn test_invalid_plans() {
        let original = genome(10);
        let too_many = MutationPlan {
            nb_snps: 11,
            ..Default::default()
        };
        assert!(mutate(&original, &too_many).is_err());
        let bad_range = MutationPlan {
            nb_insertions: 1,
            min_insertion: 5,
            max_insertion: 2,
            ..Default::default()
        };
        assert!(mutate(&original, &bad_range).is_err());
        assert!(mutate(b"", &MutationPlan::default()).is_err());
    }
}
