//! Run coordinator: dispatches graph nodes to worker threads.
//!
//! The calling thread feeds chunks of canonical nodes through a bounded
//! channel; each worker owns a [`NodeProcessor`] with its own expander,
//! extension scratch and rejection tally. The bank and the emission counters
//! are the only shared state. A write error raises the abort flag, which
//! stops node hand-out; the first error is returned once every worker has
//! finished. Records written before the error stay written.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crossbeam::channel;
use indicatif::ProgressBar;
use tracing::{debug, info};

use super::complexity::ComplexityScorer;
use super::config::FinderConfig;
use super::emitter::BubbleEmitter;
use super::error::FinderError;
use super::expander::{Expansion, PathExpander};
use super::extension::ExtensionBuilder;
use super::stats::{BubbleStats, RejectionTally, StatsSummary};
use super::BubblePair;
use crate::graph::{CanonicalKmer, DeBruijnGraph};
use crate::io::SequenceBank;

/// Nodes per work unit handed to a worker.
const CHUNK_SIZE: usize = 4096;

pub struct BubbleFinder<'g, G> {
    graph: &'g G,
    config: FinderConfig,
}

impl<'g, G: DeBruijnGraph> BubbleFinder<'g, G> {
    /// Fails if `config` is invalid or does not match the graph's k.
    pub fn new(graph: &'g G, config: FinderConfig) -> Result<Self, FinderError> {
        config.validate_for_graph(graph.kmer_size())?;
        Ok(Self { graph, config })
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Search every node of the graph with `threads` workers (0 = all cores)
    /// and write bubbles to `bank`.
    pub fn run<B: SequenceBank>(
        &self,
        bank: &Mutex<B>,
        threads: usize,
        progress: &ProgressBar,
    ) -> Result<StatsSummary, FinderError> {
        let threads = if threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            threads
        };

        let nodes = self.graph.nodes();
        info!(
            "Searching bubbles from {} nodes with {} threads (k={}, branching={:?})",
            nodes.len(),
            threads,
            self.config.kmer_size,
            self.config.branching_policy
        );

        let stats = BubbleStats::new();
        let abort = AtomicBool::new(false);
        let first_error: Mutex<Option<FinderError>> = Mutex::new(None);

        crossbeam::scope(|s| {
            let (sender, receiver) = channel::bounded::<&[CanonicalKmer]>(threads * 4);

            for worker_id in 0..threads {
                let receiver = receiver.clone();
                let stats = &stats;
                let abort = &abort;
                let first_error = &first_error;
                s.spawn(move |_| {
                    let mut processor = NodeProcessor::new(self.graph, &self.config, bank, stats);
                    let mut num_nodes = 0usize;
                    'chunks: for chunk in receiver.iter() {
                        for &node in chunk {
                            if abort.load(Ordering::Relaxed) {
                                break 'chunks;
                            }
                            if let Err(e) = processor.process_node(node) {
                                abort.store(true, Ordering::Relaxed);
                                first_error
                                    .lock()
                                    .unwrap_or_else(PoisonError::into_inner)
                                    .get_or_insert(e);
                                break 'chunks;
                            }
                        }
                        num_nodes += chunk.len();
                        progress.inc(chunk.len() as u64);
                    }
                    let tally = processor.finish();
                    debug!(
                        "worker {} done: {} nodes, {} not closed, {} duplicates",
                        worker_id, num_nodes, tally.not_closed, tally.duplicates
                    );
                });
            }
            drop(receiver);

            for chunk in nodes.chunks(CHUNK_SIZE) {
                if abort.load(Ordering::Relaxed) || sender.send(chunk).is_err() {
                    break;
                }
            }
            drop(sender);
        })
        .map_err(|_| FinderError::WorkerPanicked)?;

        if let Some(e) = first_error
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
        {
            return Err(e);
        }

        bank.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
            .map_err(FinderError::Output)?;

        let summary = stats.summary();
        info!(
            "Found {} bubbles ({} high, {} low branching)",
            summary.nb_bubbles, summary.nb_bubbles_high, summary.nb_bubbles_low
        );
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// NodeProcessor
// ---------------------------------------------------------------------------

/// Per-worker state for processing start nodes one at a time.
pub struct NodeProcessor<'a, G, B> {
    graph: &'a G,
    config: &'a FinderConfig,
    expander: PathExpander<'a, G>,
    extension: Option<ExtensionBuilder<'a, G>>,
    scorer: ComplexityScorer,
    emitter: BubbleEmitter<'a, B>,
    stats: &'a BubbleStats,
    closed: Vec<BubblePair>,
    tally: RejectionTally,
}

impl<'a, G: DeBruijnGraph, B: SequenceBank> NodeProcessor<'a, G, B> {
    pub fn new(
        graph: &'a G,
        config: &'a FinderConfig,
        bank: &'a Mutex<B>,
        stats: &'a BubbleStats,
    ) -> Self {
        Self {
            graph,
            config,
            expander: PathExpander::new(graph, config),
            extension: config
                .extension_enabled
                .then(|| ExtensionBuilder::new(graph, config.max_extension_length)),
            scorer: ComplexityScorer::for_config(config),
            emitter: BubbleEmitter::new(bank, stats, config),
            stats,
            closed: Vec::new(),
            tally: RejectionTally::default(),
        }
    }

    /// Search bubbles starting at `node` in both orientations.
    pub fn process_node(&mut self, node: CanonicalKmer) -> Result<(), FinderError> {
        let forward = node.as_u64();
        let reverse = self.graph.codec().reverse_complement(forward);
        self.start(forward)?;
        self.start(reverse)
    }

    fn start(&mut self, kmer: u64) -> Result<(), FinderError> {
        let mut closed = std::mem::take(&mut self.closed);
        closed.clear();
        for outcome in self.expander.expand_from(kmer, &mut closed) {
            match outcome {
                Expansion::Closed(_) => {}
                Expansion::RejectedBranching => self.tally.rejected_branching += 1,
                Expansion::NotClosed => self.tally.not_closed += 1,
            }
        }
        let result = closed.iter().try_for_each(|pair| self.accept(pair));
        self.closed = closed;
        result
    }

    fn accept(&mut self, pair: &BubblePair) -> Result<(), FinderError> {
        if !self.emitter.is_canonical(pair) {
            self.tally.duplicates += 1;
            return Ok(());
        }
        let score = self.scorer.score(&pair.higher, &pair.lower);
        if self.config.low_complexity_filter && self.scorer.is_low_complexity(score) {
            self.tally.rejected_complexity += 1;
            return Ok(());
        }
        let flanks = self.extension.as_mut().map(|builder| {
            builder.extend_bubble(
                pair,
                self.config.extension_style,
                self.config.min_extension_length,
            )
        });
        self.emitter.emit(pair, score, flanks.as_ref())?;
        Ok(())
    }

    /// Fold the local tally into the run counters and return it.
    pub fn finish(&mut self) -> RejectionTally {
        let tally = std::mem::take(&mut self.tally);
        self.stats.add_rejections(&tally);
        tally
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::KmerSetGraph;
    use crate::io::MemoryBank;

    const K: usize = 7;
    const GENOME: &[u8] = b"TCGGATCAAGTCATGGCTTACCGAT";

    fn snp_graph() -> KmerSetGraph {
        let mut alt = GENOME.to_vec();
        alt[12] = b'G';
        KmerSetGraph::from_sequences(K, [GENOME.to_vec(), alt])
    }

    fn config() -> FinderConfig {
        FinderConfig {
            kmer_size: K,
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_mismatched_k() {
        let graph = snp_graph();
        let config = FinderConfig {
            kmer_size: 9,
            ..Default::default()
        };
        assert!(matches!(
            BubbleFinder::new(&graph, config),
            Err(FinderError::KmerMismatch { config: 9, graph: 7 })
        ));
    }

    #[test]
    fn test_run_emits_once() {
        let graph = snp_graph();
        let finder = BubbleFinder::new(&graph, config()).unwrap();
        let bank = Mutex::new(MemoryBank::new());

        let summary = finder.run(&bank, 2, &ProgressBar::hidden()).unwrap();

        assert_eq!(summary.nb_bubbles, 1);
        assert_eq!(summary.nb_bubbles_low, 1);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.not_closed, 0);
        let records = bank.into_inner().unwrap().into_records();
        assert_eq!(records.len(), 2);
        // Found from the reverse strand: C/T rather than A/G.
        assert_eq!(records[0].header, "SNP_higher_path_1|P_1:6_C/T|score_0|branching_low");
        assert_eq!(records[0].sequence, b"AAGCCACGACTTG");
        assert_eq!(records[1].sequence, b"AAGCCATGACTTG");
    }

    #[test]
    fn test_run_with_extension() {
        let graph = snp_graph();
        let config = FinderConfig {
            extension_enabled: true,
            min_extension_length: 6,
            ..config()
        };
        let finder = BubbleFinder::new(&graph, config).unwrap();
        let bank = Mutex::new(MemoryBank::new());

        finder.run(&bank, 1, &ProgressBar::hidden()).unwrap();

        let records = bank.into_inner().unwrap().into_records();
        assert_eq!(
            records[0].header,
            "SNP_higher_path_1|P_1:12_C/T|score_0|branching_low|ext_3|left_unitig_length_6|right_unitig_length_6"
        );
        assert_eq!(records[0].sequence, b"atcggtAAGCCACGACTTGatccga");
    }

    #[test]
    fn test_processor_counts_duplicate_orientation() {
        let graph = snp_graph();
        let config = config();
        let bank = Mutex::new(MemoryBank::new());
        let stats = BubbleStats::new();
        let mut processor = NodeProcessor::new(&graph, &config, &bank, &stats);

        // The forward start of the bubble is the non-canonical orientation.
        let start = graph.codec().encode(&GENOME[5..5 + K]).unwrap();
        processor.process_node(graph.canonical(start)).unwrap();
        let tally = processor.finish();

        assert_eq!(tally.duplicates, 1);
        assert_eq!(stats.summary().duplicates, 1);
        assert_eq!(stats.summary().nb_bubbles, 0);
    }

    struct FailingBank;

    impl SequenceBank for FailingBank {
        fn append_record(&mut self, _header: &str, _sequence: &[u8]) -> std::io::Result<()> {
            Err(std::io::Error::other("read-only file system"))
        }
    }

    #[test]
    fn test_write_error_aborts_run() {
        let graph = snp_graph();
        let finder = BubbleFinder::new(&graph, config()).unwrap();
        let bank = Mutex::new(FailingBank);

        let err = finder.run(&bank, 2, &ProgressBar::hidden()).unwrap_err();
        assert!(matches!(err, FinderError::Output(_)));
    }
}
