//! In-memory node-centric de Bruijn graph.
//!
//! The graph is just the set of solid canonical k-mers: k-mers seen at least
//! `min_abundance` times across the input reads. Edges are implicit (see
//! [`DeBruijnGraph`]).
//!
//! Construction uses one producer thread reading FASTA/FASTQ batches and
//! worker threads counting canonical k-mers into a shared `DashMap`. Solid
//! k-mers are moved into a fixed hash set once every worker is done.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::RandomState;
use anyhow::{Context, Result, bail};
use crossbeam::channel;
use dashmap::DashMap;
use tracing::{debug, info};

use super::kmer::{CanonicalKmer, KmerCodec, MAX_KMER_SIZE};
use super::DeBruijnGraph;
use crate::io::fastx::read_sequence_batches;

/// Deterministic hasher state so node iteration order is stable across runs.
pub(crate) fn fixed_hash_state() -> RandomState {
    RandomState::with_seeds(
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0x2545f4914f6cdd1d,
    )
}

type KmerSet = HashSet<u64, RandomState>;

/// Options for building a [`KmerSetGraph`] from read files.
#[derive(Debug, Clone)]
pub struct GraphBuildConfig {
    pub k: usize,
    /// Minimum number of occurrences for a k-mer to become a node.
    pub min_abundance: u32,
    /// Number of counting threads (0 = all cores).
    pub threads: usize,
}

impl Default for GraphBuildConfig {
    fn default() -> Self {
        Self {
            k: 31,
            min_abundance: 2,
            threads: 0,
        }
    }
}

pub struct KmerSetGraph {
    codec: KmerCodec,
    kmers: KmerSet,
}

impl KmerSetGraph {
    /// Empty graph for k-mers of size `k`.
    pub fn new(k: usize) -> Self {
        Self {
            codec: KmerCodec::new(k),
            kmers: HashSet::with_hasher(fixed_hash_state()),
        }
    }

    /// Graph holding every k-mer of every sequence (abundance 1).
    pub fn from_sequences<I, S>(k: usize, sequences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut graph = Self::new(k);
        for seq in sequences {
            graph.insert_sequence(seq.as_ref());
        }
        graph
    }

    /// Insert all k-mers of `seq`; returns how many were new.
    pub fn insert_sequence(&mut self, seq: &[u8]) -> usize {
        let codec = self.codec;
        codec
            .canonical_kmers(seq)
            .filter(|kmer| self.kmers.insert(kmer.as_u64()))
            .count()
    }

    pub fn insert(&mut self, kmer: CanonicalKmer) -> bool {
        self.kmers.insert(kmer.as_u64())
    }

    pub fn len(&self) -> usize {
        self.kmers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kmers.is_empty()
    }

    /// Count canonical k-mers of all reads in `paths` and keep the solid ones.
    pub fn build_from_reads(paths: &[String], config: &GraphBuildConfig) -> Result<Self> {
        if config.k == 0 || config.k > MAX_KMER_SIZE {
            bail!(
                "k-mer size {} is outside the supported range 1..={}",
                config.k,
                MAX_KMER_SIZE
            );
        }
        if paths.is_empty() {
            bail!("no read files specified");
        }

        let threads = if config.threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            config.threads
        };
        let codec = KmerCodec::new(config.k);

        info!(
            "Counting {}-mers with {} threads from {} file(s)",
            config.k,
            threads,
            paths.len()
        );

        let counts: DashMap<u64, u32> = DashMap::with_capacity(1 << 16);
        let total_kmers = AtomicU64::new(0);
        let (sender, receiver) = channel::bounded::<Vec<Vec<u8>>>(threads * 4);

        let counts_ref = &counts;
        let total_kmers_ref = &total_kmers;

        let num_seqs = crossbeam::scope(|s| {
            // Producer: batches of sequences, channel closes when it returns
            let producer = s.spawn(move |_| read_sequence_batches(paths, &sender));

            for _ in 0..threads {
                let recv = receiver.clone();
                s.spawn(move |_| {
                    let mut local_kmers = 0u64;
                    for batch in recv {
                        for seq in &batch {
                            for kmer in codec.canonical_kmers(seq) {
                                *counts_ref.entry(kmer.as_u64()).or_insert(0) += 1;
                                local_kmers += 1;
                            }
                        }
                    }
                    total_kmers_ref.fetch_add(local_kmers, Ordering::Relaxed);
                });
            }
            drop(receiver);

            producer
                .join()
                .map_err(|_| anyhow::anyhow!("sequence reader thread panicked"))?
        })
        .map_err(|e| anyhow::anyhow!("thread panicked: {:?}", e))?
        .context("failed to read input sequences")?;

        let distinct = counts.len();
        let mut kmers: KmerSet = HashSet::with_capacity_and_hasher(distinct, fixed_hash_state());
        kmers.extend(
            counts
                .into_iter()
                .filter(|&(_, count)| count >= config.min_abundance)
                .map(|(kmer, _)| kmer),
        );
        debug!("{} distinct k-mers before abundance filtering", distinct);

        info!(
            "Graph built from {} sequences ({} k-mers): {} solid nodes (min abundance {})",
            num_seqs,
            total_kmers.load(Ordering::Relaxed),
            kmers.len(),
            config.min_abundance,
        );

        Ok(Self { codec, kmers })
    }
}

impl DeBruijnGraph for KmerSetGraph {
    #[inline]
    fn kmer_size(&self) -> usize {
        self.codec.k()
    }

    #[inline]
    fn codec(&self) -> &KmerCodec {
        &self.codec
    }

    #[inline]
    fn contains(&self, kmer: u64) -> bool {
        self.kmers.contains(&self.codec.canonical(kmer).as_u64())
    }

    fn nodes(&self) -> Vec<CanonicalKmer> {
        let mut nodes: Vec<CanonicalKmer> =
            self.kmers.iter().map(|&k| CanonicalKmer::new(k)).collect();
        nodes.sort_unstable();
        nodes
    }

    fn num_nodes(&self) -> usize {
        self.kmers.len()
    }
}

impl std::fmt::Debug for KmerSetGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KmerSetGraph")
            .field("k", &self.codec.k())
            .field("num_nodes", &self.kmers.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
