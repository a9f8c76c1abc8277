pub mod find;
pub mod simulate;

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

#[derive(Parser, Debug)]
#[command(name = "kissnp-rs", version)]
#[command(about = "Reference-free SNP discovery from de Bruijn graph bubbles")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a graph from reads and report SNP bubbles
    Find(find::FindArgs),
    /// Mutate a genome with random SNPs and insertions
    Simulate(simulate::SimulateArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Find(args) => find::run(args),
        Commands::Simulate(args) => simulate::run(args),
    }
}

/// Spinner counting processed graph nodes.
pub(crate) fn make_progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(1));
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {human_pos} nodes searched ({per_sec})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(1_000));
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_find() {
        let cli = Cli::try_parse_from([
            "kissnp-rs", "find", "-i", "a.fa,b.fq.gz", "-o", "out.fa", "-k", "21", "-b",
            "accepted-recorded", "-e",
        ])
        .unwrap();
        let Commands::Find(args) = cli.command else {
            panic!("expected find");
        };
        assert_eq!(args.input, ["a.fa", "b.fq.gz"]);
        assert_eq!(args.klen, 21);
        assert!(args.extend);
        assert_eq!(args.min_abundance, 2);
    }
}
