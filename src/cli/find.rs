//! CLI command for bubble search.

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use crate::bubble::{BranchingPolicy, BubbleFinder, ExtensionStyle, FinderConfig};
use crate::graph::{DeBruijnGraph, GraphBuildConfig, KmerSetGraph};
use crate::io::FastaBank;
use crate::io::run_info::write_run_info;

#[derive(Args, Debug)]
pub struct FindArgs {
    /// Read files, FASTA or FASTQ, optionally compressed (comma-separated)
    #[arg(short = 'i', long, value_delimiter = ',', required = true)]
    pub input: Vec<String>,
    /// Output FASTA file for bubble records
    #[arg(short = 'o', long)]
    pub output: String,
    /// K-mer length (odd, 5 to 31)
    #[arg(short = 'k', long, default_value = "31")]
    pub klen: usize,
    /// Minimum number of occurrences for a k-mer to enter the graph
    #[arg(long, default_value = "2")]
    pub min_abundance: u32,
    /// Number of threads (0 = all cores)
    #[arg(short = 't', long, default_value = "0")]
    pub threads: usize,
    /// Keep bubbles whose complexity score is above the ceiling
    #[arg(long)]
    pub keep_low_complexity: bool,
    /// Branching policy (forbidden, accepted-recorded or accepted-unrecorded)
    #[arg(short = 'b', long, default_value = "forbidden")]
    pub branching: String,
    /// Extend bubbles into unbranched flanking sequence
    #[arg(short = 'e', long)]
    pub extend: bool,
    /// Extension style (strict or contig)
    #[arg(long, default_value = "strict")]
    pub extension_style: String,
    /// Strict style: shortest flank kept, anchor included
    #[arg(long, default_value = "0")]
    pub min_extension_length: usize,
    /// Longest flank on either side, anchor included
    #[arg(long, default_value = "10000")]
    pub max_extension_length: usize,
    /// Write a JSON run summary to this path
    #[arg(long)]
    pub summary: Option<String>,
    /// Suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

pub fn run(args: FindArgs) -> Result<()> {
    let start = Instant::now();

    let branching_policy: BranchingPolicy = args.branching.parse()?;
    let extension_style: ExtensionStyle = args.extension_style.parse()?;
    let config = FinderConfig {
        kmer_size: args.klen,
        low_complexity_filter: !args.keep_low_complexity,
        branching_policy,
        extension_enabled: args.extend,
        extension_style,
        min_extension_length: args.min_extension_length,
        max_extension_length: args.max_extension_length,
    };
    // Reject a bad k before spending time on the graph.
    config.validate()?;

    info!(
        "Building graph from {} file(s) (k={}, min abundance {})",
        args.input.len(),
        args.klen,
        args.min_abundance
    );
    let build_start = Instant::now();
    let graph = KmerSetGraph::build_from_reads(
        &args.input,
        &GraphBuildConfig {
            k: args.klen,
            min_abundance: args.min_abundance,
            threads: args.threads,
        },
    )?;
    info!(
        "Graph built: {} nodes ({:.2}s)",
        graph.num_nodes(),
        build_start.elapsed().as_secs_f64()
    );
    if graph.is_empty() {
        warn!("graph is empty; no bubble can be found");
    }

    let finder = BubbleFinder::new(&graph, config)?;
    let output = Path::new(&args.output);
    let bank = Mutex::new(FastaBank::create(output)?);
    let progress = super::make_progress_bar(args.quiet);

    let summary = finder
        .run(&bank, args.threads, &progress)
        .with_context(|| format!("bubble search into {} failed", output.display()))?;
    progress.finish_and_clear();

    info!(
        "{} bubbles written to {} ({} not closed, {} rejected for branching, {} for low complexity)",
        summary.nb_bubbles,
        output.display(),
        summary.not_closed,
        summary.rejected_branching,
        summary.rejected_complexity
    );

    let elapsed = start.elapsed().as_secs_f64();
    if let Some(path) = &args.summary {
        write_run_info(
            Path::new(path),
            &summary,
            finder.config(),
            graph.num_nodes(),
            elapsed,
        )?;
        info!("Run summary written to {}", path);
    }
    info!("Done in {:.2}s", elapsed);
    Ok(())
}
