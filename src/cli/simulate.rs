//! CLI command for the genome mutator.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::io::fastx::read_first_sequence;
use crate::io::{FastaBank, SequenceBank};
use crate::simulate::{MutationPlan, mutate};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Genome FASTA (only the first record is used)
    #[arg(short = 'i', long)]
    pub input: String,
    /// Output FASTA for the mutated genome
    #[arg(short = 'o', long)]
    pub output: String,
    /// Output FASTA logging the neighbourhood of every event
    #[arg(short = 'l', long)]
    pub log: String,
    /// Number of substitutions
    #[arg(long, default_value = "0")]
    pub snps: usize,
    /// Number of insertions
    #[arg(long, default_value = "0")]
    pub insertions: usize,
    /// Minimum insertion size
    #[arg(long, default_value = "1")]
    pub min_insertion: usize,
    /// Maximum insertion size
    #[arg(long, default_value = "10")]
    pub max_insertion: usize,
    /// Random seed
    #[arg(short = 's', long, default_value = "1")]
    pub seed: u64,
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let genome = read_first_sequence(&args.input)?;
    info!("Mutating {} ({} bp)", genome.name, genome.seq.len());

    let plan = MutationPlan {
        nb_snps: args.snps,
        nb_insertions: args.insertions,
        min_insertion: args.min_insertion,
        max_insertion: args.max_insertion,
        seed: args.seed,
    };
    let mutated = mutate(&genome.seq, &plan)?;

    let output = Path::new(&args.output);
    let mut bank = FastaBank::create(output)?;
    let header = format!(
        "{} with {} SNPs and {} insertions",
        genome.name, plan.nb_snps, plan.nb_insertions
    );
    bank.append_record(&header, &mutated.sequence)
        .and_then(|_| bank.flush())
        .with_context(|| format!("failed to write {}", output.display()))?;

    let log_path = Path::new(&args.log);
    let mut log = FastaBank::create(log_path)?;
    for record in &mutated.log {
        log.append_record(&record.header, &record.sequence)
            .with_context(|| format!("failed to write {}", log_path.display()))?;
    }
    log.flush()
        .with_context(|| format!("failed to write {}", log_path.display()))?;

    info!(
        "Wrote {} bp to {} and {} log records to {}",
        mutated.sequence.len(),
        output.display(),
        log.num_records(),
        log_path.display()
    );
    Ok(())
}
